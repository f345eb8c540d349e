//! # Domain Module
//!
//! The attendance grid reconciliation engine.
//!
//! ## Module Organization
//!
//! - **date_range**: trailing window of calendar dates ending at the anchor date
//! - **record_normalizer**: the single chokepoint turning loosely-shaped wire
//!   records into typed `AttendanceRecord`s
//! - **grid_assembler**: roster × window cross-product with explicit
//!   `Unrecorded` placeholders
//! - **status_cycle**: the four-state status cycle used by single-cell clicks
//! - **optimistic_update**: local-first cell edits with generation-checked rollback
//! - **bulk_present**: "mark everyone else present" for the anchor date
//! - **notifications**: auto-expiring messages surfaced to the operator
//! - **attendance_service**: wires the pieces to an `AttendanceGateway`
//!
//! ## Flow
//!
//! ```text
//! DateRangeCalculator → RecordNormalizer → GridAssembler   (display)
//! StatusCycleEngine → OptimisticUpdateCoordinator          (single cell)
//! BulkPresentOperation → full rebuild                      (whole class)
//! ```
//!
//! Only the anchor column (index 0 of the window) is ever edited. A full
//! rebuild always supersedes in-place patches made to the previous grid.

pub mod attendance_service;
pub mod bulk_present;
pub mod commands;
pub mod date_range;
pub mod errors;
pub mod grid_assembler;
pub mod models;
pub mod notifications;
pub mod optimistic_update;
pub mod record_normalizer;
pub mod status_cycle;

pub use attendance_service::{AttendanceService, LoadReport};
pub use bulk_present::{BulkOutcome, BulkPresentOperation};
pub use commands::bulk::BulkPresentCommand;
pub use commands::cell::{CellEdit, CellField, CellRef, CellValue};
pub use date_range::{compute_window, DateRangeCalculator};
pub use errors::{EngineError, ServiceError};
pub use grid_assembler::GridAssembler;
pub use models::attendance_record::AttendanceRecord;
pub use models::date_window::DateWindow;
pub use models::grid::{AttendanceGrid, ColumnSummary, GridRow};
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
pub use optimistic_update::{EditOutcome, OptimisticUpdateCoordinator};
pub use record_normalizer::{DataQualityWarning, NormalizedBatch, RecordNormalizer, SkippedRecord};
pub use status_cycle::StatusCycleEngine;
