//! External process lifecycle for the asset stream manager.
//!
//! The manager shells out to provisioning tools whose standard output has to
//! be captured while the caller waits for the process to finish. This crate
//! owns spawning, streaming output to a caller-supplied handler from a
//! background task, and waiting for exit.

pub mod error;
pub mod process;

pub use error::{ProcessError, Result};
pub use process::{OutputHandler, Process, ProcessFactory, ProcessStartInfo, TokioProcess, TokioProcessFactory, quoted};
