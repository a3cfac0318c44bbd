//! Wire types for the asset stream manager RPC surface.
//!
//! This crate contains the serde-serializable types exchanged between the
//! `asset_stream_manager` daemon and its clients (the CLI and the partner
//! portal bridge). Requests are framed as one JSON object per line.
//!
//! Types in this crate are pure data. Behavior lives in `asset-stream`.

pub mod messages;
pub mod origin;
pub mod status;

pub use messages::*;
pub use origin::*;
pub use status::*;
