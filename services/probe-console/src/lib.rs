//! Probe Console - client-side coordinator for the probe monitoring dashboard
//!
//! Loads probes and stories from the monitoring API, derives filtered views,
//! tracks the operator's selection, runs bulk re-triggers, and drives the
//! result side panel.

pub mod api;
pub mod bulk;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod filter;
pub mod io;
pub mod model;
pub mod panel;
pub mod selection;
pub mod state;


pub use config::{load_config, Config};
pub use dashboard::Dashboard;
pub use error::{ConsoleError, Result};
pub use model::{MonitorItem, MonitorKind, ResultRecord, SelectionKey, Tag};
