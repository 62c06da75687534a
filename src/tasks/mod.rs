//! Background Tasks Module
//!
//! Contains background tasks that run periodically during bot operation.
//!
//! # Tasks
//! - Event polling: Posts reminders for events about to start

mod poll;

pub use poll::spawn_poll_task;
