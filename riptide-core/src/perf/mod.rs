//! Low-level performance utilities: CPU affinity for the distributor
//! thread. Kept as its own module, separate from the event bus itself,
//! since the teacher's codebase drew the same line between mechanism
//! (where a thread runs) and policy (what it does).

pub mod cpu;

pub use cpu::{num_cores, pin_to_core};
