//! Business services layer.
//!
//! Services sit between the command line front end and the infrastructure
//! layer:
//!
//! ```text
//! Application Layer (CLI commands, rendering)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! # Services Overview
//!
//! - [`Session`]: Sender identity, theme, last report and the busy flag
//! - [`ListService`]: Named recipient lists
//! - [`DeliveryEngine`]: Sequential, paced sending through a transport
//! - [`DeliveryService`]: Runs a batch for a session and reports the outcome
//! - [`Notifier`]: Where user-facing notifications go

mod delivery_engine;
mod delivery_service;
mod list_service;
mod notification_service;
mod session_service;

pub use delivery_engine::{
    DeliveryEngine, DeliveryError, DeliveryObserver, EngineOptions, NoopObserver, Pacer,
    TokioPacer,
};
pub use delivery_service::{summary_notification, BatchSummary, DeliveryService};
pub use list_service::{ListError, ListService, CLIENTS_KEY};
pub use notification_service::{Notification, NotificationLevel, NotificationLog, Notifier};
pub use session_service::{
    BatchGuard, Session, SessionError, REPORT_KEY, SENDER_KEY, THEME_KEY,
};
