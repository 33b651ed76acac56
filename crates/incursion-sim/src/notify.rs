//! Notice sinks. The engine publishes and moves on; a slow or absent
//! consumer never stalls a tick.

use std::sync::mpsc;
use std::sync::Mutex;

use tracing::warn;

use incursion_core::events::Notice;

pub trait NoticeSink: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn publish(&self, _notice: Notice) {}
}

/// Bounded channel the presentation layer drains. Drops on overflow.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::SyncSender<Notice>,
}

impl ChannelSink {
    /// Sink plus the receiving end, holding at most `capacity` notices.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self { tx }, rx)
    }
}

impl NoticeSink for ChannelSink {
    fn publish(&self, notice: Notice) {
        match self.tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::TrySendError::Full(dropped)) => {
                warn!(?dropped, "notice channel full, dropping notice");
            }
            Err(mpsc::TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Keeps every notice in memory; for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for RecordingSink {
    fn publish(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast(n: u32) -> Notice {
        Notice::Broadcast {
            message: format!("message {n}"),
        }
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, rx) = ChannelSink::bounded(2);
        sink.publish(broadcast(1));
        sink.publish(broadcast(2));
        sink.publish(broadcast(3));
        let received: Vec<Notice> = rx.try_iter().collect();
        assert_eq!(received, vec![broadcast(1), broadcast(2)]);
    }

    #[test]
    fn test_channel_sink_survives_disconnect() {
        let (sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        sink.publish(broadcast(1));
    }

    #[test]
    fn test_recording_sink_drain() {
        let sink = RecordingSink::new();
        sink.publish(broadcast(1));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.drain(), vec![broadcast(1)]);
        assert!(sink.is_empty());
    }
}
