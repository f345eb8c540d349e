//! # Attendance Backend
//!
//! Non-UI logic behind the attendance page of the admin console.
//!
//! The page shows a grid of children against a short trailing window of
//! dates. Everything needed to build and edit that grid lives here:
//! - **domain**: the reconciliation engine (date windows, record normalization,
//!   grid assembly, status cycling, optimistic edits, bulk present)
//! - **storage**: the gateway trait the engine talks to, plus a file-backed
//!   implementation
//! - **config**: engine configuration loaded from YAML
//!
//! ## Architecture
//!
//! ```text
//! UI / CLI
//!     ↓
//! AttendanceService (domain orchestration)
//!     ↓
//! AttendanceGateway (remote record-keeping API, or CSV files)
//! ```

pub mod config;
pub mod domain;
pub mod storage;

pub use config::{ConfigError, EngineConfig};
pub use domain::*;
pub use storage::{AttendanceGateway, CsvAttendanceGateway, CsvConnection};
