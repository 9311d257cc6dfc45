//! Mediator scheduling and chain maintenance.
//!
//! Decides *who* may seal the next unit: a deterministic shuffle of the
//! active mediator set, time→slot→producer arithmetic, missed-slot
//! accounting, last-irreversible advancement and the periodic maintenance
//! cycle.

pub mod error;
pub mod maintenance;
pub mod slots;

pub use error::ScheduleError;
pub use maintenance::{ChainMaintainer, UnitOutcome};
pub use slots::{
    scheduled_mediator, shuffle_mediators, slot_at_time, slot_time, SHUFFLE_MULTIPLIER,
};
