use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{Child, ChildId};
use tracing::debug;

use super::connection::{write_atomically, CsvConnection};

/// One line of `classes/{class_id}/roster.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub child_id: ChildId,
    pub name: String,
    /// First day in the class; empty means "always"
    pub joined_on: Option<NaiveDate>,
    /// Last day in the class; empty means "still enrolled"
    pub left_on: Option<NaiveDate>,
}

impl RosterRow {
    pub fn new(child_id: ChildId, name: impl Into<String>) -> Self {
        Self {
            child_id,
            name: name.into(),
            joined_on: None,
            left_on: None,
        }
    }

    pub fn is_member_on(&self, date: NaiveDate) -> bool {
        self.joined_on.map_or(true, |joined| joined <= date)
            && self.left_on.map_or(true, |left| date <= left)
    }
}

/// Class rosters stored as one CSV file per class
#[derive(Debug, Clone)]
pub struct RosterRepository {
    connection: CsvConnection,
}

impl RosterRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Every roster line of a class, whatever the dates. A class without a
    /// roster file has nobody in it.
    pub fn list_rows(&self, class_id: &str) -> Result<Vec<RosterRow>> {
        let path = self.connection.roster_file_path(class_id)?;
        if !path.exists() {
            debug!("No roster file for class {}", class_id);
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open roster {}", path.display()))?;
        reader
            .deserialize()
            .collect::<Result<Vec<RosterRow>, csv::Error>>()
            .with_context(|| format!("Failed to read roster {}", path.display()))
    }

    /// Children in the class on `date`, ordered by name
    pub fn roster_for_date(&self, class_id: &str, date: NaiveDate) -> Result<Vec<Child>> {
        let mut children: Vec<Child> = self
            .list_rows(class_id)?
            .into_iter()
            .filter(|row| row.is_member_on(date))
            .map(|row| Child::new(row.child_id, row.name))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    /// Replace the roster of a class
    pub fn save_rows(&self, class_id: &str, rows: &[RosterRow]) -> Result<()> {
        let path = self.connection.roster_file_path(class_id)?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer.into_inner().context("Failed to flush roster")?;
        write_atomically(&path, &bytes)
    }
}
