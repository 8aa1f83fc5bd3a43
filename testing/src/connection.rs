//! Recording connection double.

use rollcall_runtime::{Connection, ConnectionId, SendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// A [`Connection`] that records every frame sent to it.
///
/// Call [`sever`](Self::sever) to make all further sends fail, which is how
/// dead-subscriber pruning gets exercised.
pub struct RecordingConnection {
    id: ConnectionId,
    healthy: AtomicBool,
    frames: Mutex<Vec<String>>,
}

impl RecordingConnection {
    /// A healthy connection with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            healthy: AtomicBool::new(true),
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Make every send from now on fail.
    pub fn sever(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }

    /// Every frame delivered so far, in order.
    #[must_use]
    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivered frames parsed as JSON; malformed frames become `null`.
    #[must_use]
    pub fn json_frames(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// The most recent frame, parsed as JSON.
    #[must_use]
    pub fn last_json(&self) -> Option<serde_json::Value> {
        self.json_frames().pop()
    }

    /// Number of frames delivered so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: &str) -> Result<(), SendError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(SendError);
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.to_string());
        Ok(())
    }
}
