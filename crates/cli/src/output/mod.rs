//! Structured output envelope for client commands.

mod format;
mod model;
mod result_builder;

pub use format::OutputFormat;
pub use model::{CommandError, CommandResult, SCHEMA_VERSION, SessionData, ShutdownData, StatusData};
pub use result_builder::{ResultBuilder, print_result};
