//! In-memory gateway for driving `AttendanceService` in tests.
//!
//! Writes can be held open with `hold_next_write` so tests decide the order
//! in which responses come back.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use attendance_backend::AttendanceGateway;
use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::{
    AttendanceStatus, BulkPresentRequest, BulkPresentResponse, Child, RawAttendanceRecord,
    WriteNotesRequest, WriteStatusRequest,
};
use tokio::sync::oneshot;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn raw(value: Value) -> RawAttendanceRecord {
    RawAttendanceRecord::new(value)
}

/// Answer for a held write: `Ok(())` or the failure message
pub type WriteReply = std::result::Result<(), String>;

#[derive(Default)]
pub struct ScriptedGateway {
    roster: Mutex<Vec<Child>>,
    history: Mutex<Vec<RawAttendanceRecord>>,
    fetch_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
    held_writes: Mutex<VecDeque<oneshot::Receiver<WriteReply>>>,
    pub status_writes: Mutex<Vec<WriteStatusRequest>>,
    pub notes_writes: Mutex<Vec<WriteNotesRequest>>,
    pub bulk_writes: Mutex<Vec<BulkPresentRequest>>,
}

impl ScriptedGateway {
    pub fn new(roster: Vec<Child>, history: Vec<RawAttendanceRecord>) -> Self {
        Self {
            roster: Mutex::new(roster),
            history: Mutex::new(history),
            ..Self::default()
        }
    }

    pub fn set_history(&self, history: Vec<RawAttendanceRecord>) {
        *self.history.lock().unwrap() = history;
    }

    pub fn fail_fetches(&self, reason: &str) {
        *self.fetch_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_writes(&self, reason: &str) {
        *self.write_failure.lock().unwrap() = Some(reason.to_string());
    }

    /// The next write to arrive waits until the returned sender answers
    pub fn hold_next_write(&self) -> oneshot::Sender<WriteReply> {
        let (tx, rx) = oneshot::channel();
        self.held_writes.lock().unwrap().push_back(rx);
        tx
    }

    pub fn write_count(&self) -> usize {
        self.status_writes.lock().unwrap().len()
            + self.notes_writes.lock().unwrap().len()
            + self.bulk_writes.lock().unwrap().len()
    }

    /// Wait until `count` writes have reached the gateway
    pub async fn wait_for_writes(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.write_count() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("writes never arrived");
    }

    async fn answer_write(&self) -> Result<()> {
        let held = self.held_writes.lock().unwrap().pop_front();
        if let Some(rx) = held {
            return match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(reason)) => Err(anyhow!(reason)),
                Err(_) => bail!("held write was dropped"),
            };
        }
        match self.write_failure.lock().unwrap().clone() {
            Some(reason) => Err(anyhow!(reason)),
            None => Ok(()),
        }
    }

    fn has_status(&self, child_id: i64, date: NaiveDate) -> bool {
        let date = date.to_string();
        self.history.lock().unwrap().iter().any(|record| {
            let value = record.as_value();
            value["childId"] == json!(child_id)
                && value["date"] == json!(date)
                && value["status"].as_str().map_or(false, |s| !s.is_empty() && s != "unrecorded")
        })
    }
}

#[async_trait]
impl AttendanceGateway for ScriptedGateway {
    async fn fetch_history(
        &self,
        _class_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>> {
        if let Some(reason) = self.fetch_failure.lock().unwrap().clone() {
            bail!(reason);
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn fetch_roster_for_date(&self, _class_id: &str, _date: NaiveDate) -> Result<Vec<Child>> {
        if let Some(reason) = self.fetch_failure.lock().unwrap().clone() {
            bail!(reason);
        }
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn write_status(&self, request: &WriteStatusRequest) -> Result<()> {
        self.status_writes.lock().unwrap().push(request.clone());
        self.answer_write().await?;
        self.history.lock().unwrap().push(raw(json!({
            "childId": request.child_id,
            "date": request.date.to_string(),
            "status": request.status.as_str(),
        })));
        Ok(())
    }

    async fn write_notes(&self, request: &WriteNotesRequest) -> Result<()> {
        self.notes_writes.lock().unwrap().push(request.clone());
        self.answer_write().await
    }

    async fn write_bulk_present(&self, request: &BulkPresentRequest) -> Result<BulkPresentResponse> {
        self.bulk_writes.lock().unwrap().push(request.clone());
        self.answer_write().await?;

        let mut marked_count = 0;
        for &child_id in &request.child_ids {
            if !self.has_status(child_id, request.date) {
                self.history.lock().unwrap().push(raw(json!({
                    "childId": child_id,
                    "date": request.date.to_string(),
                    "status": AttendanceStatus::Present.as_str(),
                })));
                marked_count += 1;
            }
        }
        Ok(BulkPresentResponse { marked_count })
    }
}
