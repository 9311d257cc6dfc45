//! Typed event feed with a subscription registry.
//!
//! Each subscriber owns a bounded receiver. Delivery applies backpressure:
//! a full subscriber queue makes `send` wait instead of dropping events, so
//! slow consumers slow producers rather than losing data. Closing the feed
//! disconnects every subscriber.

use std::sync::Mutex;
use tokio::sync::mpsc;

/// A broadcast feed over bounded per-subscriber channels.
pub struct Feed<T> {
    /// `None` once the feed is closed.
    senders: Mutex<Option<Vec<mpsc::Sender<T>>>>,
}

impl<T: Clone + Send + 'static> Feed<T> {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Some(Vec::new())),
        }
    }

    /// Register a subscriber with the given queue capacity.
    ///
    /// Subscribing to a closed feed returns a receiver that yields nothing.
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let mut guard = self.senders.lock().expect("feed lock poisoned");
        if let Some(senders) = guard.as_mut() {
            senders.push(tx);
        }
        rx
    }

    /// Deliver `item` to every live subscriber, waiting on full queues.
    /// Returns the number of subscribers reached.
    pub async fn send(&self, item: T) -> usize {
        let snapshot = {
            let guard = self.senders.lock().expect("feed lock poisoned");
            match guard.as_ref() {
                Some(senders) => senders.clone(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for sender in &snapshot {
            if sender.send(item.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        // Prune subscribers whose receivers have been dropped.
        let mut guard = self.senders.lock().expect("feed lock poisoned");
        if let Some(senders) = guard.as_mut() {
            senders.retain(|s| !s.is_closed());
        }
        delivered
    }

    /// Close the registry: all receivers see end-of-stream.
    pub fn close(&self) {
        *self.senders.lock().expect("feed lock poisoned") = None;
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders
            .lock()
            .expect("feed lock poisoned")
            .as_ref()
            .map_or(0, |s| s.len())
    }
}

impl<T: Clone + Send + 'static> Default for Feed<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_to_all_subscribers() {
        let feed = Feed::new();
        let mut rx1 = feed.subscribe(4);
        let mut rx2 = feed.subscribe(4);

        assert_eq!(feed.send(7u32).await, 2);
        assert_eq!(rx1.recv().await, Some(7));
        assert_eq!(rx2.recv().await, Some(7));
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned() {
        let feed = Feed::new();
        let rx = feed.subscribe(4);
        drop(rx);

        assert_eq!(feed.send(1u32).await, 0);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn close_disconnects_receivers() {
        let feed: Feed<u32> = Feed::new();
        let mut rx = feed.subscribe(4);
        feed.close();
        assert_eq!(rx.recv().await, None);
        assert_eq!(feed.send(1).await, 0);
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let feed = Arc::new(Feed::new());
        let mut rx = feed.subscribe(1);

        feed.send(1u32).await;

        // The second send must wait until the subscriber drains.
        let f = Arc::clone(&feed);
        let sender = tokio::spawn(async move { f.send(2u32).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sender.is_finished());

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(sender.await.unwrap(), 1);
        assert_eq!(rx.recv().await, Some(2));
    }
}
