//! The quoting engine (§4.4): ladder derivation plus the stateful engine
//! that drives it against a live order gateway.

pub mod engine;
pub mod ladder;

pub use engine::{QuotingEngine, SideState, SlotAction};
pub use ladder::{derive_side_ladder, QuoteTarget};
