//! # CSV Storage
//!
//! File-backed implementation of `AttendanceGateway`.
//!
//! Rosters live per class; attendance rows live in one file shared by every
//! class and are filtered through the class roster on read. Rows are kept as
//! loose text and returned in the same inconsistent shape the remote API
//! uses, so the domain's normalizer sees realistic input.
//!
//! All writes rewrite the file through a temp file and rename.

pub mod attendance_repository;
pub mod connection;
pub mod gateway;
pub mod roster_repository;

#[cfg(test)]
pub mod test_utils;

pub use attendance_repository::{AttendanceRepository, AttendanceRow};
pub use connection::CsvConnection;
pub use gateway::CsvAttendanceGateway;
pub use roster_repository::{RosterRepository, RosterRow};
