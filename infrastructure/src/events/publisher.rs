//! Channel-backed event publisher that bridges runtimes and threads.
//!
//! Stages may report progress from the controller's runtime, from another
//! runtime, or from a plain worker thread. `publish` must never block and
//! never fail the caller, and events from one producer must reach the
//! subscriber in the order they were published. Delivery walks a ladder:
//!
//! 1. Non-blocking `try_send` into the subscriber's channel. This is the
//!    common path and works from any thread.
//! 2. Channel full: the event joins the destination's overflow queue and a
//!    single drainer task, scheduled on the runtime that owns the
//!    subscriber, feeds it into the channel as capacity frees up.
//! 3. No runtime is reachable from the publishing thread: the drain job
//!    runs on a dedicated forwarder thread with blocking sends instead.
//!
//! The overflow queue is sticky: while it holds pending events, every
//! later publish for that destination queues behind them rather than
//! racing past through the fast path, so the per-producer order survives
//! backpressure. If every rung fails (subscriber gone, forwarder dead) the
//! events are dropped and logged at WARN. Event loss is observable, never
//! fatal.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, RwLock};

use planwright_application::ports::event_publisher::{AgentEvent, ChannelKey, EventPublisher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 256;

/// Events waiting behind a full channel, plus whether a drainer owns them.
#[derive(Default)]
struct OverflowQueue {
    events: VecDeque<AgentEvent>,
    draining: bool,
}

impl OverflowQueue {
    /// Discard everything and release the drainer slot.
    fn abandon(&mut self) -> usize {
        let dropped = self.events.len();
        self.events.clear();
        self.draining = false;
        dropped
    }
}

struct Destination {
    sender: mpsc::Sender<AgentEvent>,
    /// Runtime the subscriber lives on, captured at registration
    handle: Handle,
    overflow: Arc<Mutex<OverflowQueue>>,
}

/// A drain job handed to the forwarder thread.
struct DrainJob {
    sender: mpsc::Sender<AgentEvent>,
    overflow: Arc<Mutex<OverflowQueue>>,
    channel: String,
}

pub struct RuntimeBridgePublisher {
    destinations: RwLock<HashMap<ChannelKey, Destination>>,
    forwarder: Mutex<Option<std_mpsc::Sender<DrainJob>>>,
    capacity: usize,
}

impl Default for RuntimeBridgePublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RuntimeBridgePublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            destinations: RwLock::new(HashMap::new()),
            forwarder: Mutex::new(None),
            capacity,
        }
    }

    /// Subscribe to a run's event stream. Must be called from within a
    /// tokio runtime; the runtime's handle is captured for the drain
    /// path. A second registration for the same key replaces the first.
    pub fn register(&self, key: &ChannelKey) -> mpsc::Receiver<AgentEvent> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let destination = Destination {
            sender,
            handle: Handle::current(),
            overflow: Arc::new(Mutex::new(OverflowQueue::default())),
        };
        self.destinations
            .write()
            .unwrap()
            .insert(key.clone(), destination);
        debug!(channel = %key.channel_name(), "event subscriber registered");
        receiver
    }

    pub fn unregister(&self, key: &ChannelKey) {
        self.destinations.write().unwrap().remove(key);
        debug!(channel = %key.channel_name(), "event subscriber removed");
    }

    fn drop_destination(&self, key: &ChannelKey) {
        self.destinations.write().unwrap().remove(key);
    }

    /// Start the single drainer for a destination whose channel just
    /// overflowed. Runs as a task on the subscriber's runtime when the
    /// publishing thread can schedule one, otherwise on the forwarder
    /// thread.
    fn start_drainer(
        &self,
        sender: mpsc::Sender<AgentEvent>,
        handle: Handle,
        overflow: Arc<Mutex<OverflowQueue>>,
        channel: String,
    ) {
        if Handle::try_current().is_ok() {
            handle.spawn(async move {
                drain_async(sender, overflow, channel).await;
            });
            return;
        }

        let job = DrainJob {
            sender,
            overflow: overflow.clone(),
            channel: channel.clone(),
        };
        if self.forward_to_thread(job).is_err() {
            let dropped = overflow.lock().unwrap().abandon();
            warn!(channel, dropped, "events dropped: forwarder unavailable");
        }
    }

    /// Queue a drain job on the forwarder thread, starting it on first use.
    fn forward_to_thread(&self, job: DrainJob) -> Result<(), ()> {
        let mut guard = self.forwarder.lock().unwrap();
        if guard.is_none() {
            let (tx, rx) = std_mpsc::channel::<DrainJob>();
            std::thread::Builder::new()
                .name("event-forwarder".to_string())
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        drain_blocking(job.sender, job.overflow, job.channel);
                    }
                })
                .map_err(|_| ())?;
            *guard = Some(tx);
        }
        match guard.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| ()),
            None => Err(()),
        }
    }
}

impl EventPublisher for RuntimeBridgePublisher {
    fn publish(&self, key: &ChannelKey, event: AgentEvent) {
        let (sender, handle, overflow) = {
            let destinations = self.destinations.read().unwrap();
            let Some(destination) = destinations.get(key) else {
                debug!(channel = %key.channel_name(), "event dropped: no subscriber");
                return;
            };
            (
                destination.sender.clone(),
                destination.handle.clone(),
                destination.overflow.clone(),
            )
        };

        // Sticky slow path: while earlier events are still queued, later
        // ones line up behind them instead of overtaking via try_send.
        {
            let mut queue = overflow.lock().unwrap();
            if queue.draining {
                queue.events.push_back(event);
                return;
            }
        }

        match sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(channel = %key.channel_name(), "event dropped: subscriber closed");
                self.drop_destination(key);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                let start = {
                    let mut queue = overflow.lock().unwrap();
                    queue.events.push_back(event);
                    if queue.draining {
                        // A drainer claimed the queue between our check and
                        // the failed try_send; it will pick this event up.
                        false
                    } else {
                        queue.draining = true;
                        true
                    }
                };
                if start {
                    self.start_drainer(sender, handle, overflow, key.channel_name());
                }
            }
        }
    }
}

/// Feed the overflow queue into the channel until it is empty, then
/// release the drainer slot.
async fn drain_async(
    sender: mpsc::Sender<AgentEvent>,
    overflow: Arc<Mutex<OverflowQueue>>,
    channel: String,
) {
    loop {
        let event = {
            let mut queue = overflow.lock().unwrap();
            match queue.events.pop_front() {
                Some(event) => event,
                None => {
                    queue.draining = false;
                    return;
                }
            }
        };
        if sender.send(event).await.is_err() {
            let dropped = overflow.lock().unwrap().abandon() + 1;
            warn!(channel, dropped, "events dropped: subscriber closed during drain");
            return;
        }
    }
}

/// Same drain loop, for threads with no runtime to schedule on.
fn drain_blocking(
    sender: mpsc::Sender<AgentEvent>,
    overflow: Arc<Mutex<OverflowQueue>>,
    channel: String,
) {
    loop {
        let event = {
            let mut queue = overflow.lock().unwrap();
            match queue.events.pop_front() {
                Some(event) => event,
                None => {
                    queue.draining = false;
                    return;
                }
            }
        };
        if sender.blocking_send(event).is_err() {
            let dropped = overflow.lock().unwrap().abandon() + 1;
            warn!(channel, dropped, "events dropped: subscriber closed during drain");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use planwright_application::ports::event_publisher::{EventMetadata, StageEmitter};
    use std::time::Duration;

    fn event(key: &ChannelKey, text: &str) -> AgentEvent {
        AgentEvent {
            user_id: key.user_id.clone(),
            run_id: key.run_id.clone(),
            stage_name: "test".to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            metadata: EventMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_registered_subscriber() {
        let publisher = RuntimeBridgePublisher::new(8);
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);

        publisher.publish(&key, event(&key, "hello"));
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.text, "hello");
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_is_silent() {
        let publisher = RuntimeBridgePublisher::new(8);
        let key = ChannelKey::new("alice", "run-1");
        // No panic, no error
        publisher.publish(&key, event(&key, "nobody listening"));
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let publisher = RuntimeBridgePublisher::new(8);
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);
        publisher.unregister(&key);

        publisher.publish(&key, event(&key, "late"));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channels_are_isolated_per_run() {
        let publisher = RuntimeBridgePublisher::new(8);
        let key_a = ChannelKey::new("alice", "run-1");
        let key_b = ChannelKey::new("alice", "run-2");
        let mut rx_a = publisher.register(&key_a);
        let mut rx_b = publisher.register(&key_b);

        publisher.publish(&key_a, event(&key_a, "for a"));
        publisher.publish(&key_b, event(&key_b, "for b"));

        assert_eq!(rx_a.recv().await.unwrap().text, "for a");
        assert_eq!(rx_b.recv().await.unwrap().text, "for b");
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_thread_events_arrive_in_emission_order() {
        let publisher = Arc::new(RuntimeBridgePublisher::new(64));
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);

        let worker = {
            let publisher = publisher.clone();
            let key = key.clone();
            std::thread::spawn(move || {
                let emitter = StageEmitter::new(&*publisher, key, "implementation");
                for i in 0..20 {
                    emitter.emit(format!("step {i}"));
                }
            })
        };
        worker.join().unwrap();

        let mut received = Vec::new();
        for _ in 0..20 {
            received.push(receiver.recv().await.unwrap());
        }
        for (i, event) in received.iter().enumerate() {
            assert_eq!(event.text, format!("step {i}"));
        }
        for pair in received.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overflow_preserves_publish_order() {
        // Capacity 1: the first event fills the channel, the second lands
        // in the overflow queue, and later events must line up behind it
        // instead of overtaking through the fast path.
        let publisher = Arc::new(RuntimeBridgePublisher::new(1));
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);

        publisher.publish(&key, event(&key, "event 0")); // fills the channel
        publisher.publish(&key, event(&key, "event 1")); // overflows

        // Drain the first event so the channel has free capacity again,
        // then publish more while event 1 is still pending.
        assert_eq!(receiver.recv().await.unwrap().text, "event 0");
        publisher.publish(&key, event(&key, "event 2"));
        publisher.publish(&key, event(&key, "event 3"));

        for i in 1..4 {
            let received = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
                .await
                .expect("event not delivered")
                .unwrap();
            assert_eq!(received.text, format!("event {i}"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sustained_overflow_stays_ordered() {
        let publisher = Arc::new(RuntimeBridgePublisher::new(1));
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);

        for i in 0..10 {
            publisher.publish(&key, event(&key, &format!("event {i}")));
        }

        for i in 0..10 {
            let received = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
                .await
                .expect("event not delivered")
                .unwrap();
            assert_eq!(received.text, format!("event {i}"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_foreign_thread_overflow_drains_in_order() {
        // The publishing thread has no runtime, so overflow drains on the
        // forwarder thread. Order must still hold.
        let publisher = Arc::new(RuntimeBridgePublisher::new(1));
        let key = ChannelKey::new("alice", "run-1");
        let mut receiver = publisher.register(&key);

        let worker = {
            let publisher = publisher.clone();
            let key = key.clone();
            std::thread::spawn(move || {
                for i in 0..5 {
                    publisher.publish(&key, event(&key, &format!("event {i}")));
                }
            })
        };

        for i in 0..5 {
            let received = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
                .await
                .expect("event not delivered")
                .unwrap();
            assert_eq!(received.text, format!("event {i}"));
        }
        worker.join().unwrap();
    }
}
