//! Job composition and hand-off to the command engine

pub mod driver;
pub mod reserve;
pub mod submit;

pub use driver::{compose, JobBatch, Stage};
pub use reserve::{EngineReservations, Reservation};
pub use submit::{serve, CommandQueue, DryRunEngine, Submission};
