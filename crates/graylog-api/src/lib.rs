// graylog-api: Async Rust client for the Graylog REST API

pub mod alert_receivers;
pub mod control;
pub mod dashboards;
pub mod error;
pub mod monitoring;
pub mod resource;
pub mod rules;
pub mod schema;
pub mod session;
pub mod streams;
pub mod transport;
pub mod users;

pub use alert_receivers::{AlertReceiver, EraseReport, ReceiverType};
pub use control::{ControlOutcome, InputCommand, StreamCommand, parse_command, perform};
pub use dashboards::Dashboard;
pub use error::Error;
pub use monitoring::{CheckReport, InputCheck, NagiosStatus, StreamCheck, run_check};
pub use resource::{Document, Resource, ResourceKind, ResourceState};
pub use rules::Rule;
pub use session::{ApiPath, ApiResponse, DEFAULT_PORT, Session, SessionConfig, StatusClass};
pub use streams::Stream;
pub use transport::{TlsMode, TransportConfig};
pub use users::User;
