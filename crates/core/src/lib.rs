//! Bootstrap and teardown of asset streaming sessions.
//!
//! A session streams a developer's local asset tree to a remote gamelet.
//! Starting one means parsing the gamelet's resource name, resolving its SSH
//! address through `ggp ssh init`, and handing off to a [`SessionRegistry`]
//! that owns the streaming lifecycle. Each start attempt produces exactly one
//! telemetry record, routed by [`TelemetryRoute`].

pub mod config;
pub mod error;
pub mod instance_name;
pub mod metrics;
pub mod output_fields;
pub mod resolver;
pub mod sdk;
pub mod service;
pub mod session;
pub mod session_manager;
pub mod telemetry;

pub use config::{AssetStreamConfig, SessionConfig};
pub use error::{Error, OutputField, Result};
pub use instance_name::ResourceScope;
pub use metrics::{DeveloperLogEvent, EventType, LogMetricsRecorder, MetricsRecorder, SessionStartStatus};
pub use resolver::{AddressResolver, ResolvedAddress};
pub use service::LocalAssetsStreamManager;
pub use session::{MultiSessionHandle, RegistryStartOutcome, SessionRegistry, StartSessionParams};
pub use session_manager::{MultiSession, SessionManager};
pub use telemetry::TelemetryRoute;
