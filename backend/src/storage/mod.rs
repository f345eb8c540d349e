//! # Storage Module
//!
//! Access to attendance data from the domain layer.
//!
//! - **traits**: `AttendanceGateway`, the interface the engine depends on
//! - **csv**: a file-backed gateway (YAML config + CSV roster and attendance
//!   files per class) used by the CLI and integration tests

pub mod csv;
pub mod traits;

pub use self::csv::{CsvAttendanceGateway, CsvConnection};
pub use traits::AttendanceGateway;
