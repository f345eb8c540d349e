//! Test utilities for CSV storage tests
//!
//! Each test gets its own temporary data directory, removed when the
//! environment is dropped (including when the test panics).

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;

pub struct TestEnvironment {
    /// Kept alive so the directory survives until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("ATTENDANCE_DEBUG_TESTS").is_ok() {
            println!("🧹 Cleaning up test environment: {:?}", self.base_path);
        }
    }
}
