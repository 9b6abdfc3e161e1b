//! Pin Controller: the top-level state machine.
//!
//! All controller state lives in one actor task. Public calls go through a
//! [`PinHandle`]; strategy callbacks and mode decisions arrive on channels
//! and are processed on the same task, so nothing here needs a lock.
//!
//! Every pin and unpin bumps a generation counter. Async work (the
//! permission grace period, capture start) and strategy reports carry the
//! generation they were created for, and anything stale is dropped.

mod controller;
mod decision;
mod errors;
mod handle;
mod state;


pub use controller::PinController;
pub use errors::ControllerError;
pub use handle::{PinHandle, StateObserver};
pub use state::{PinState, TARGET_LOST_MESSAGE};
