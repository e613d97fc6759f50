//! Connection double shared by the engine tests.

use async_trait::async_trait;
use sse::error::Error as SseError;
use crate::Id;
use sse::{Frame, LiveConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub(crate) struct RecordingConnection {
    subscriber_id: Id,
    frames: Mutex<Vec<Frame>>,
    failing: AtomicBool,
}

impl RecordingConnection {
    pub(crate) fn new(subscriber_id: Id) -> Self {
        Self {
            subscriber_id,
            frames: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Every later write fails as if the peer had reset the stream.
    pub(crate) fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Encoded frames written after the handshake.
    pub(crate) fn data_frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|frame| **frame != Frame::handshake(self.subscriber_id))
            .map(Frame::encode)
            .collect()
    }
}

#[async_trait]
impl LiveConnection for RecordingConnection {
    async fn write_frame(&self, frame: &Frame) -> Result<(), SseError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SseError::write(self.subscriber_id));
        }
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }

    async fn closed(&self) {
        futures::future::pending::<()>().await
    }

    fn is_closed(&self) -> bool {
        false
    }
}
