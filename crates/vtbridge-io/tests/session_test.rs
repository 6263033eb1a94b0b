//! End-to-end session tests over a real pipe

use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use vtbridge_io::{IoError, VtSession};
use vtbridge_render::{CursorPos, Viewport};

fn read_available(fd: RawFd) -> Vec<u8> {
    let mut received = vec![0u8; 64 * 1024];
    let n = unsafe { libc::read(fd, received.as_mut_ptr().cast(), received.len()) };
    assert!(n >= 0, "read failed");
    received.truncate(n as usize);
    received
}

fn has_pending_bytes(fd: RawFd) -> bool {
    let mut fds = [libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }];
    let ready = unsafe { libc::poll(fds.as_mut_ptr(), 1, 0) };
    assert!(ready >= 0, "poll failed");
    ready > 0
}

#[test]
fn test_session_rejects_invalid_handle() {
    let result = VtSession::new(-1, Viewport::from_dimensions(0, 0, 80, 24));
    assert!(matches!(result, Err(IoError::InvalidHandle)));
}

#[test]
fn test_first_frame_reaches_the_terminal() {
    let (read_end, write_end) = nix::unistd::pipe().unwrap();
    let mut session = VtSession::new(
        write_end.into_raw_fd(),
        Viewport::from_dimensions(0, 0, 20, 5),
    )
    .unwrap();

    let engine = session.engine_mut();
    assert!(engine.start_paint());
    engine.paint_buffer_line("attached", CursorPos::new(0, 0));
    engine.end_paint().unwrap();

    let sent = String::from_utf8(read_available(read_end.as_raw_fd())).unwrap();
    assert!(sent.starts_with("\x1b[2J"));
    assert!(sent.contains("attached"));
}

#[test]
fn test_inheriting_session_sends_the_cursor_query_up_front() {
    let (read_end, write_end) = nix::unistd::pipe().unwrap();
    let mut session = VtSession::new_inheriting_cursor(
        write_end.into_raw_fd(),
        Viewport::from_dimensions(0, 0, 80, 24),
    )
    .unwrap();

    let sent = read_available(read_end.as_raw_fd());
    assert_eq!(sent, b"\x1b[6n");

    // The reply would arrive on the input channel; simulate it.
    session.engine_mut().inherit_cursor(CursorPos::new(7, 0));
    assert!(!session.engine_mut().start_paint());
}

#[test]
fn test_dropping_the_session_signals_shutdown() {
    let (_read_end, write_end) = nix::unistd::pipe().unwrap();
    let session = VtSession::new(
        write_end.into_raw_fd(),
        Viewport::from_dimensions(0, 0, 80, 24),
    )
    .unwrap();

    let shutdown = session.shutdown_signal();
    assert!(!shutdown.is_set());

    drop(session);
    assert!(shutdown.is_set());
}

#[test]
fn test_explicit_shutdown_turns_frames_into_noops() {
    let (read_end, write_end) = nix::unistd::pipe().unwrap();
    let mut session = VtSession::new(
        write_end.into_raw_fd(),
        Viewport::from_dimensions(0, 0, 20, 5),
    )
    .unwrap();

    session.shutdown();

    let engine = session.engine_mut();
    assert!(engine.start_paint());
    engine.paint_buffer_line("late", CursorPos::new(0, 0));
    engine.end_paint().unwrap();

    // Nothing was transmitted.
    assert!(!has_pending_bytes(read_end.as_raw_fd()));
}
