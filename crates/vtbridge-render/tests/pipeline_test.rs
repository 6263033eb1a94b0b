//! Tests for the buffered output pipeline

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vtbridge_render::pipeline::{BlockedThreadMarker, ByteSink, OutputPipeline};
use vtbridge_render::{RenderError, ShutdownSignal};

/// Records each flushed payload separately
#[derive(Clone, Default)]
struct FlushRecorder {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ByteSink for FlushRecorder {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.payloads.lock().unwrap().push(buf.to_vec());
        Ok(())
    }
}

/// Fails every write, counting attempts
#[derive(Clone, Default)]
struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

impl ByteSink for FailingSink {
    fn write_bytes(&mut self, _buf: &[u8]) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "no reader"))
    }
}

fn pipeline_over(sink: impl ByteSink + Send + 'static, shutdown: ShutdownSignal) -> OutputPipeline {
    OutputPipeline::new(
        Box::new(sink),
        shutdown,
        Arc::new(BlockedThreadMarker::new()),
    )
}

#[test]
fn test_two_flushes_deliver_separate_ordered_payloads() {
    let recorder = FlushRecorder::default();
    let payloads = recorder.payloads.clone();
    let mut pipeline = pipeline_over(recorder, ShutdownSignal::new());

    pipeline.write(b"first ");
    pipeline.write_str("fragment");
    pipeline.flush().unwrap();

    pipeline.write(b"second");
    pipeline.flush().unwrap();

    let delivered = payloads.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0], b"first fragment");
    assert_eq!(delivered[1], b"second");
}

#[test]
fn test_flush_after_shutdown_performs_no_sink_io() {
    let recorder = FlushRecorder::default();
    let payloads = recorder.payloads.clone();
    let shutdown = ShutdownSignal::new();
    let mut pipeline = pipeline_over(recorder, shutdown.clone());

    pipeline.write(b"never sent");
    shutdown.set();

    // Teardown in progress: skipped write, reported success.
    pipeline.flush().unwrap();
    assert!(payloads.lock().unwrap().is_empty());
}

#[test]
fn test_flush_on_empty_buffer_is_a_noop_that_still_checks_shutdown() {
    let recorder = FlushRecorder::default();
    let payloads = recorder.payloads.clone();
    let shutdown = ShutdownSignal::new();
    let mut pipeline = pipeline_over(recorder, shutdown.clone());

    pipeline.flush().unwrap();
    assert_eq!(payloads.lock().unwrap().len(), 1);
    assert!(payloads.lock().unwrap()[0].is_empty());

    shutdown.set();
    pipeline.flush().unwrap();
    assert_eq!(payloads.lock().unwrap().len(), 1);
}

#[test]
fn test_write_failure_sets_shutdown_and_later_flushes_stand_down() {
    let sink = FailingSink::default();
    let attempts = sink.attempts.clone();
    let shutdown = ShutdownSignal::new();
    let mut pipeline = pipeline_over(sink, shutdown.clone());

    pipeline.write(b"doomed");
    let result = pipeline.flush();
    assert!(matches!(result, Err(RenderError::SinkWrite(_))));
    assert!(shutdown.is_set());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // The failure is terminal for the session: no retry, no further I/O.
    pipeline.write(b"more");
    pipeline.flush().unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_writes_accumulate_until_flush() {
    let recorder = FlushRecorder::default();
    let payloads = recorder.payloads.clone();
    let mut pipeline = pipeline_over(recorder, ShutdownSignal::new());

    assert!(pipeline.is_empty());
    pipeline.write(b"a");
    pipeline.write(b"b");
    pipeline.write(b"c");
    assert!(!pipeline.is_empty());

    // Nothing reaches the sink before the flush
    assert!(payloads.lock().unwrap().is_empty());

    pipeline.flush().unwrap();
    assert!(pipeline.is_empty());
    assert_eq!(payloads.lock().unwrap()[0], b"abc");
}
