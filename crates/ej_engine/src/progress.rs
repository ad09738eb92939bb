use std::sync::mpsc;

use crate::EngineEvent;

/// Observer notified after every processed task.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Forwards events to a channel; a dropped receiver is ignored.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
