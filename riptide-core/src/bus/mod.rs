//! The event bus: a single bounded ring buffer carrying [`MarketDataEvent`]s
//! from many producers (exchange feed handlers, out of scope here) to one
//! consumer, the [`Distributor`].
//!
//! The distributor owns a subscriber registry keyed by `(instrument_id,
//! topic_id)` and fans each event out to every matching subscriber on its
//! own thread. A producer blocks on `publish` when the ring is full rather
//! than dropping the event, so a slow distributor applies backpressure all
//! the way to the feed handler instead of opening a sequence gap; a
//! subscriber that panics while handling an event is the only thing logged
//! and moved past without being retried.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, warn};

use crate::core::Price;
use crate::event::MarketDataEvent;
use crate::monitoring::BusMetrics;
use crate::orderbook::OrderBook;

/// A callback invoked by the distributor thread for every event matching
/// its `(instrument_id, topic_id)` key. Boxed rather than generic so the
/// registry can hold a heterogeneous set of subscribers.
pub type Subscriber = Box<dyn FnMut(&MarketDataEvent) + Send>;

/// Producer handle for the ring buffer. Cheap to clone: every producer
/// thread gets its own `Sender` clone over the same bounded channel.
#[derive(Clone)]
pub struct EventBusProducer {
    sender: Sender<MarketDataEvent>,
    metrics: Option<Arc<BusMetrics>>,
}

impl EventBusProducer {
    /// Publishes an event, blocking the calling thread while the ring is
    /// full. This is the default wait strategy: a blocked producer is
    /// backpressure working as intended, not a fault, since dropping a
    /// market-data event here is exactly the sequence gap the book's
    /// sequence check exists to catch downstream. The only event ever
    /// actually dropped is one published after every receiver has gone
    /// away, which only happens during shutdown.
    pub fn publish(&self, event: MarketDataEvent) {
        match self.sender.send(event) {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.events_published_total.inc();
                    metrics.ring_depth.set(self.sender.len() as i64);
                }
            }
            Err(_) => {
                error!("event bus has no consumer, dropping event");
                if let Some(metrics) = &self.metrics {
                    metrics.events_dropped_total.inc();
                }
            }
        }
    }
}

/// Constructs a bounded ring buffer and returns a producer handle plus the
/// receiver the [`Distributor`] will own. `capacity` must be a power of two
/// to match the ring-buffer convention used elsewhere in the data path.
pub fn event_bus(capacity: usize, metrics: Option<Arc<BusMetrics>>) -> (EventBusProducer, Receiver<MarketDataEvent>) {
    assert!(capacity.is_power_of_two(), "event bus capacity must be a power of two");
    let (sender, receiver) = channel::bounded(capacity);
    (EventBusProducer { sender, metrics }, receiver)
}

/// Owns the consumer side of the ring buffer and the subscriber registry.
/// Runs its dispatch loop on a dedicated thread; the thread never awaits,
/// so handing an `async` order-gateway call to a subscriber means the
/// subscriber itself must hand off to the shared tokio runtime rather than
/// block the distributor.
pub struct Distributor {
    receiver: Receiver<MarketDataEvent>,
    subscribers: Arc<DashMap<(i32, u32), Vec<Mutex<Subscriber>>>>,
    metrics: Option<Arc<BusMetrics>>,
}

impl Distributor {
    pub fn new(receiver: Receiver<MarketDataEvent>, metrics: Option<Arc<BusMetrics>>) -> Self {
        Self {
            receiver,
            subscribers: Arc::new(DashMap::new()),
            metrics,
        }
    }

    /// A handle that can register subscribers before or after the
    /// distributor thread is spawned; registration is lock-free from the
    /// registry's perspective (`DashMap` shards internally).
    pub fn handle(&self) -> DistributorHandle {
        DistributorHandle {
            subscribers: self.subscribers.clone(),
        }
    }

    /// Spawns the dispatch loop on a dedicated OS thread and returns its
    /// `JoinHandle`. The loop exits once every producer has been dropped
    /// and the ring is drained.
    pub fn spawn(self) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name("riptide-distributor".into())
            .spawn(move || self.run())
            .expect("failed to spawn distributor thread")
    }

    fn run(self) {
        for event in self.receiver.iter() {
            let start = std::time::Instant::now();
            if let Some(mut subscribers) = self.subscribers.get_mut(&(event.instrument_id, event.topic_id)) {
                for subscriber in subscribers.iter_mut() {
                    let mut guard = subscriber.lock();
                    let result = catch_unwind(AssertUnwindSafe(|| (guard)(&event)));
                    if result.is_err() {
                        error!(
                            instrument_id = event.instrument_id,
                            topic_id = event.topic_id,
                            "subscriber panicked handling event; isolated and continuing"
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics
                                .subscriber_errors_total
                                .with_label_values(&["panic"])
                                .inc();
                        }
                    }
                }
            }
            if let Some(metrics) = &self.metrics {
                metrics
                    .dispatch_latency_us
                    .observe(start.elapsed().as_micros() as f64);
            }
        }
    }
}

/// A cloneable reference to a running (or not-yet-running) distributor's
/// subscriber registry.
#[derive(Clone)]
pub struct DistributorHandle {
    subscribers: Arc<DashMap<(i32, u32), Vec<Mutex<Subscriber>>>>,
}

impl DistributorHandle {
    /// Registers `subscriber` for every event matching `(instrument_id,
    /// topic_id)`.
    pub fn subscribe(&self, instrument_id: i32, topic_id: u32, subscriber: Subscriber) {
        self.subscribers
            .entry((instrument_id, topic_id))
            .or_default()
            .push(Mutex::new(subscriber));
    }

    /// Removes every subscriber registered for `(instrument_id, topic_id)`.
    pub fn unsubscribe_all(&self, instrument_id: i32, topic_id: u32) {
        self.subscribers.remove(&(instrument_id, topic_id));
    }

    /// Convenience subscription that keeps a shared [`OrderBook`] up to
    /// date by applying every event routed to it. `topic_id` is the venue's
    /// book-update topic for `instrument_id`; trades and other topics need
    /// their own subscription.
    pub fn subscribe_order_book(&self, instrument_id: i32, topic_id: u32, book: Arc<Mutex<OrderBook>>) {
        self.subscribe(
            instrument_id,
            topic_id,
            Box::new(move |event: &MarketDataEvent| {
                if let Err(err) = book.lock().apply_event(event) {
                    warn!(instrument_id, topic_id, %err, "order book rejected event");
                }
            }),
        );
    }
}

/// Reads the current mid price for a registered order book, for use as an
/// [`crate::fx::MidPriceSource`] backed by the distributor's own book set
/// rather than a separate lookup table.
pub struct BookRegistry {
    books: Arc<DashMap<i32, Arc<Mutex<OrderBook>>>>,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self {
            books: Arc::new(DashMap::new()),
        }
    }

    pub fn register(&self, instrument_id: i32) -> Arc<Mutex<OrderBook>> {
        self.books
            .entry(instrument_id)
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new(instrument_id))))
            .clone()
    }

    pub fn get(&self, instrument_id: i32) -> Option<Arc<Mutex<OrderBook>>> {
        self.books.get(&instrument_id).map(|entry| entry.clone())
    }
}

impl Default for BookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::fx::MidPriceSource for BookRegistry {
    fn mid_price(&self, instrument_id: i32) -> Option<Price> {
        let book = self.get(instrument_id)?;
        let mid = book.lock().get_mid_price();
        if mid.is_zero() {
            None
        } else {
            Some(mid)
        }
    }
}
