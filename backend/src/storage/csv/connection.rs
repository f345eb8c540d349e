use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header line of the attendance file
pub const ATTENDANCE_HEADER: &str = "child_id,date,status,notes,recorded_by\n";
/// Header line of a class roster file
pub const ROSTER_HEADER: &str = "child_id,name,joined_on,left_on\n";

/// CsvConnection manages file paths under the attendance data directory
///
/// ```text
/// data/
/// ├── attendance.yaml
/// ├── attendance.csv              ← every class, one row per (child, date)
/// └── classes/
///     └── {class_id}/
///         └── roster.csv
/// ```
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
            info!("📁 Created attendance data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn attendance_file_path(&self) -> PathBuf {
        self.base_directory.join("attendance.csv")
    }

    /// Directory holding one class's files. Class ids become directory
    /// names, so only `[A-Za-z0-9_-]` is accepted.
    pub fn class_directory(&self, class_id: &str) -> Result<PathBuf> {
        let valid = !class_id.is_empty()
            && class_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid class id: {:?}", class_id);
        }
        Ok(self.base_directory.join("classes").join(class_id))
    }

    pub fn roster_file_path(&self, class_id: &str) -> Result<PathBuf> {
        Ok(self.class_directory(class_id)?.join("roster.csv"))
    }

    /// Create the attendance file with its header if it doesn't exist
    pub fn ensure_attendance_file_exists(&self) -> Result<()> {
        let path = self.attendance_file_path();
        if !path.exists() {
            fs::write(&path, ATTENDANCE_HEADER)?;
            info!("Created attendance file: {}", path.display());
        }
        Ok(())
    }

    /// Create a class directory and an empty roster if they don't exist
    pub fn ensure_class_exists(&self, class_id: &str) -> Result<()> {
        let class_dir = self.class_directory(class_id)?;
        if !class_dir.exists() {
            fs::create_dir_all(&class_dir)?;
        }
        let roster = class_dir.join("roster.csv");
        if !roster.exists() {
            fs::write(&roster, ROSTER_HEADER)?;
            info!("Created roster for class {}", class_id);
        }
        Ok(())
    }
}

/// Replace `path` with `contents` via a temp file and rename
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    #[test]
    fn test_class_directory_rejects_path_tricks() {
        let env = TestEnvironment::new().unwrap();

        assert!(env.connection.class_directory("room-4_b").is_ok());
        assert!(env.connection.class_directory("").is_err());
        assert!(env.connection.class_directory("../etc").is_err());
        assert!(env.connection.class_directory("a/b").is_err());
    }

    #[test]
    fn test_ensure_files_write_headers_once() {
        let env = TestEnvironment::new().unwrap();

        env.connection.ensure_attendance_file_exists().unwrap();
        env.connection.ensure_class_exists("room-4").unwrap();

        let attendance = fs::read_to_string(env.connection.attendance_file_path()).unwrap();
        assert_eq!(attendance, ATTENDANCE_HEADER);

        fs::write(env.connection.attendance_file_path(), "child_id,date,status,notes,recorded_by\n1,2025-06-10,present,,\n").unwrap();
        env.connection.ensure_attendance_file_exists().unwrap();
        let attendance = fs::read_to_string(env.connection.attendance_file_path()).unwrap();
        assert!(attendance.contains("present"));

        let roster = fs::read_to_string(env.connection.roster_file_path("room-4").unwrap()).unwrap();
        assert_eq!(roster, ROSTER_HEADER);
    }
}
