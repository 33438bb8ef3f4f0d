//! The wire-level market data event.
//!
//! A single [`MarketDataEvent`] batches up to [`MAX_UPDATES`] price-level
//! changes so a burst of book updates for one instrument can cross the
//! event bus as one allocation-free value instead of one event per level.
//! This mirrors the fixed-capacity event batching used by the book's own
//! snapshot application path.

use crate::core::{Price, Quantity, Side};

/// Inline capacity for a single [`MarketDataEvent`]. Chosen to cover the
/// overwhelming majority of exchange delta messages without spilling to the
/// heap; anything larger arrives as a `Snapshot` and is applied a level at
/// a time by the caller across multiple events.
pub const MAX_UPDATES: usize = 32;

/// What kind of change a [`MarketDataEvent`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Insert new price levels.
    Add,
    /// Replace the quantity at existing price levels.
    Update,
    /// Remove price levels entirely (quantity is ignored).
    Delete,
    /// A trade print; `updates` holds exactly one level, the trade price/qty.
    Trade,
    /// A full-book snapshot; the book clears both sides before applying.
    Snapshot,
}

/// One price-level change within a [`MarketDataEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceLevelEntry {
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// A batch of up to [`MAX_UPDATES`] price-level changes for one instrument,
/// stamped with the exchange's sequence number and a receive timestamp.
///
/// Fixed-size and `Copy`-free but allocation-free: `updates` is a plain
/// array, and only the first `update_count` entries are meaningful.
#[derive(Debug, Clone)]
pub struct MarketDataEvent {
    pub sequence: u64,
    pub timestamp_us: u64,
    pub kind: EventKind,
    pub instrument_id: i32,
    pub exchange_id: i32,
    pub topic_id: u32,
    pub update_count: u8,
    pub updates: [PriceLevelEntry; MAX_UPDATES],
}

impl MarketDataEvent {
    /// Builds an event from an iterator of updates, silently truncating at
    /// [`MAX_UPDATES`] entries. Truncation is a caller bug (the wire
    /// protocol never sends more than `MAX_UPDATES` levels per message) so
    /// this does not surface an error; it is only a defensive bound.
    pub fn new(
        sequence: u64,
        timestamp_us: u64,
        kind: EventKind,
        instrument_id: i32,
        exchange_id: i32,
        topic_id: u32,
        entries: impl IntoIterator<Item = PriceLevelEntry>,
    ) -> Self {
        let mut updates = [PriceLevelEntry::default(); MAX_UPDATES];
        let mut count = 0u8;
        for entry in entries.into_iter().take(MAX_UPDATES) {
            updates[count as usize] = entry;
            count += 1;
        }
        Self {
            sequence,
            timestamp_us,
            kind,
            instrument_id,
            exchange_id,
            topic_id,
            update_count: count,
            updates,
        }
    }

    #[inline(always)]
    pub fn updates(&self) -> &[PriceLevelEntry] {
        &self.updates[..self.update_count as usize]
    }
}
