//! The repair loop controller.

mod runner;

pub use runner::{CancelSignal, NeverCancelled, RepairEngine};
