//! Event subscriptions.
//!
//! A [`Broadcaster`] fans events out to any number of [`Subscription`]s. Subscribers that have been
//! dropped are pruned on the next publish.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::mpsc;

/// A stream of events of type `T`.
///
/// Wraps an unbounded channel receiver and implements [`futures::Stream`] so consumers can await
/// events, or drain them synchronously with [`Subscription::try_next_event`].
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Creates a new subscription from an unbounded receiver.
    pub const fn from_receiver(receiver: mpsc::UnboundedReceiver<T>) -> Subscription<T> {
        Subscription { receiver }
    }

    /// Returns the number of events waiting to be consumed.
    pub fn backlog(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the next pending event without waiting.
    pub fn try_next_event(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> futures::Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// Delivers every published event to all live subscriptions.
#[derive(Debug)]
pub struct Broadcaster<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Registers a new subscriber.
    pub fn subscribe(&mut self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push(sender);

        Subscription::from_receiver(receiver)
    }

    /// Sends `event` to every live subscriber and forgets the ones that hung up.
    pub fn publish(&mut self, event: T) {
        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// The number of subscribers that were alive at the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn events_reach_every_subscriber() {
        let mut broadcaster = Broadcaster::default();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.publish(1u32);
        broadcaster.publish(2u32);

        assert_eq!(first.backlog(), 2);
        assert_eq!(first.next().await, Some(1));
        assert_eq!(first.next().await, Some(2));
        assert_eq!(second.try_next_event(), Some(1));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut broadcaster = Broadcaster::default();
        let kept = broadcaster.subscribe();
        drop(broadcaster.subscribe());

        broadcaster.publish("event");

        assert_eq!(broadcaster.subscriber_count(), 1);
        assert_eq!(kept.backlog(), 1);
    }
}
