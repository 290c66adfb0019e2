//! Command-queue batch construction.
//!
//! Blocks never touch registers directly: every operation appends entries to a
//! [`CmdBuilder`], and the finished list is handed to an external engine that
//! executes it in append order.

pub mod command;
pub mod encode;
pub mod event;

pub use command::{CmdBuilder, Command, RegBase, MAX_POLL_RETRIES};
pub use encode::{encode, resolve, RawCommand, RECORD_SIZE};
pub use event::{CompEvent, EventTable};
