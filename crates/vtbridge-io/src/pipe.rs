//! Blocking pipe sink over a raw file descriptor

use crate::IoError;
use nix::fcntl::{fcntl, FcntlArg};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use vtbridge_render::ByteSink;

/// The write end of the pipe to the attached terminal
///
/// Takes ownership of the descriptor; it is closed on drop.
pub struct PipeSink {
    fd: RawFd,
}

impl PipeSink {
    /// Wrap a descriptor, verifying it refers to an open file
    pub fn new(fd: RawFd) -> Result<Self, IoError> {
        fcntl(fd, FcntlArg::F_GETFD).map_err(|_| IoError::InvalidHandle)?;
        Ok(Self { fd })
    }
}

impl ByteSink for PipeSink {
    /// One blocking write of the whole buffer
    ///
    /// Interruptions are surfaced, never retried: the shutdown watchdog
    /// unblocks a stuck write by signalling this thread, and re-entering
    /// the write would block again with nobody left to interrupt it. A
    /// blocking pipe write comes back short only when a signal landed
    /// mid-transfer, so a short count is reported the same way as EINTR.
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        let written = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        if written < 0 {
            return Err(io::Error::last_os_error());
        }
        if written as usize != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "pipe write interrupted mid-transfer",
            ));
        }
        Ok(())
    }
}

impl AsRawFd for PipeSink {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for PipeSink {
    fn drop(&mut self) {
        if self.fd != -1 {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}
