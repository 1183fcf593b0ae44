//! Ring-buffer history windows and smoothed Top-N rankings for real-time
//! network telemetry dashboards.
//!
//! A view owns a [`Dashboard`], feeds it decoded [`Message`]s as they arrive
//! and hands [`Dashboard::snapshot`] to whatever draws the charts.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod util;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{Error, Result};
pub use models::message::Message;
pub use models::observation::{Observation, RankedEntity, RawObservation};
pub use util::ring_buffer::RingBuffer;
pub use util::top_n::{TopNTracker, TrackerConfig};
