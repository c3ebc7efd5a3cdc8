use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use webhook_tui_core::WebhookRecord;

/// Receiving side of the live queue.
///
/// Each drained record frees one slot for the next capture. Dropping the feed
/// stops live delivery; ingestion and persistence carry on.
#[derive(Debug)]
pub struct LiveFeed {
    rx: mpsc::Receiver<WebhookRecord>,
}

impl LiveFeed {
    pub(crate) fn new(rx: mpsc::Receiver<WebhookRecord>) -> Self {
        Self { rx }
    }

    /// Next queued record without blocking.
    pub fn poll(&mut self) -> Option<WebhookRecord> {
        match self.rx.try_recv() {
            Ok(record) => Some(record),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next record. `None` once the server is gone and the queue is drained.
    /// Cancel-safe: dropping the future loses nothing.
    pub async fn next(&mut self) -> Option<WebhookRecord> {
        self.rx.recv().await
    }

    /// Everything currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<WebhookRecord> {
        std::iter::from_fn(|| self.poll()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webhook_tui_core::testing;

    #[test]
    fn poll_on_empty_feed_returns_none() {
        let (_tx, rx) = mpsc::channel(4);
        let mut feed = LiveFeed::new(rx);
        assert!(feed.poll().is_none());
    }

    #[test]
    fn draining_frees_capacity() {
        let (tx, rx) = mpsc::channel(1);
        let mut feed = LiveFeed::new(rx);

        tx.try_send(testing::record(1)).unwrap();
        assert!(tx.try_send(testing::record(2)).is_err());

        assert_eq!(feed.poll().map(|r| r.id), Some(1));
        tx.try_send(testing::record(3)).unwrap();
        assert_eq!(feed.drain().iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn closed_sender_drains_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        let mut feed = LiveFeed::new(rx);
        tx.try_send(testing::record(1)).unwrap();
        drop(tx);

        assert_eq!(feed.poll().map(|r| r.id), Some(1));
        assert!(feed.poll().is_none());
    }
}
