#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for coordination primitives (locker, terminator).
pub const TRACING_TARGET_COORDINATION: &str = "synd_core::coordination";

mod error;
pub mod health;
mod locker;
mod stub;
mod terminator;

pub use error::{BoxedError, Error, Result};
pub use locker::Locker;
pub use stub::{DEFAULT_DATE, Stub, date_or_default};
pub use terminator::Terminator;
