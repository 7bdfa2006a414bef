//! Lock-free event feed for simulation observers
//!
//! Every subscriber owns a bounded crossbeam channel, so each one sees
//! every event published after it subscribed. Publishing never blocks: a
//! subscriber whose queue is full misses the event and the miss is
//! counted. Subscribers that went away are pruned on the next publish.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::game::game_loop::GameLoopEvent;

/// Event tagged with the simulation it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEvent {
    /// Simulation generation (bumped on reset)
    pub generation: u64,
    /// Simulation tick the event was produced at
    pub tick: u64,
    pub event: GameLoopEvent,
}

/// Fan-out event feed
pub struct EventFeed {
    subscribers: Mutex<Vec<Sender<FeedEvent>>>,
    /// Per-subscriber queue capacity
    capacity: usize,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Register a new observer; it receives events published from now on
    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.lock().push(sender);
        EventReceiver { receiver }
    }

    /// Deliver `event` to every subscriber (non-blocking)
    ///
    /// Returns how many subscribers had to drop it. With no subscribers the
    /// event is simply discarded.
    pub fn publish(&self, event: FeedEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut dropped = 0;
        subscribers.retain(|sender| match try_deliver(sender, event.clone()) {
            Ok(()) => true,
            Err(EventFeedError::Full) => {
                dropped += 1;
                true
            }
            Err(EventFeedError::Disconnected) => false,
        });
        dropped
    }

    /// Publish a batch, returning the total number of drops
    pub fn publish_all(
        &self,
        generation: u64,
        tick: u64,
        events: impl IntoIterator<Item = GameLoopEvent>,
    ) -> usize {
        events
            .into_iter()
            .map(|event| {
                self.publish(FeedEvent {
                    generation,
                    tick,
                    event,
                })
            })
            .sum()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[inline]
fn try_deliver(sender: &Sender<FeedEvent>, event: FeedEvent) -> Result<(), EventFeedError> {
    sender.try_send(event).map_err(|e| match e {
        TrySendError::Full(_) => EventFeedError::Full,
        TrySendError::Disconnected(_) => EventFeedError::Disconnected,
    })
}

/// Receiving end owned by one observer
pub struct EventReceiver {
    receiver: Receiver<FeedEvent>,
}

impl EventReceiver {
    /// Take one event if any is pending
    #[inline]
    pub fn try_recv(&self) -> Option<FeedEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain all pending events
    pub fn drain(&self) -> Vec<FeedEvent> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Event delivery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventFeedError {
    /// Subscriber queue is full (backpressure)
    #[error("subscriber queue is full")]
    Full,
    /// Subscriber dropped its receiver
    #[error("subscriber disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(wave: u32) -> FeedEvent {
        FeedEvent {
            generation: 0,
            tick: u64::from(wave),
            event: GameLoopEvent::WaveStarted { wave, count: 4 },
        }
    }

    fn miss(i: usize) -> GameLoopEvent {
        GameLoopEvent::Miss {
            text: format!("miss{}", i),
        }
    }

    #[test]
    fn test_publish_and_drain() {
        let feed = EventFeed::new(10);
        let receiver = feed.subscribe();
        assert_eq!(feed.publish(create_test_event(1)), 0);
        assert_eq!(feed.publish(create_test_event(2)), 0);
        assert_eq!(receiver.pending_count(), 2);

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tick, 1);
        assert_eq!(events[1].tick, 2);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_no_subscribers_discards_without_drops() {
        let feed = EventFeed::new(8);
        assert_eq!(feed.publish_all(0, 1, (0..20).map(miss)), 0);

        // A late subscriber starts from current events, not a stale backlog
        let receiver = feed.subscribe();
        feed.publish_all(0, 2, [miss(99)]);
        let events = receiver.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, miss(99));
    }

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let feed = EventFeed::new(8);
        let first = feed.subscribe();
        let second = feed.subscribe();

        feed.publish_all(0, 5, [miss(0), miss(1)]);
        assert_eq!(first.drain().len(), 2);
        assert_eq!(second.drain().len(), 2);
    }

    #[test]
    fn test_full_subscriber_drops_newest() {
        let feed = EventFeed::new(2);
        let slow = feed.subscribe();
        let fast = feed.subscribe();

        assert_eq!(feed.publish(create_test_event(1)), 0);
        assert_eq!(feed.publish(create_test_event(2)), 0);
        fast.drain();
        // Only the slow subscriber is full
        assert_eq!(feed.publish(create_test_event(3)), 1);

        let ticks: Vec<_> = slow.drain().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, [1, 2]);
        assert_eq!(fast.drain(), vec![create_test_event(3)]);
    }

    #[test]
    fn test_publish_all_counts_drops() {
        let feed = EventFeed::new(3);
        let receiver = feed.subscribe();
        let events = (1..=5).map(|wave| GameLoopEvent::WaveStarted { wave, count: 4 });
        assert_eq!(feed.publish_all(7, 100, events), 2);

        let drained = receiver.drain();
        assert_eq!(drained.len(), 3);
        assert!(drained.iter().all(|e| e.generation == 7 && e.tick == 100));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let feed = EventFeed::default();
        let kept = feed.subscribe();
        let gone = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        drop(gone);
        assert_eq!(feed.publish(create_test_event(3)), 0);
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Some(create_test_event(3)));
        assert_eq!(feed.capacity(), 1024);
    }
}
