//! Common test utilities for ingestion pipeline tests
//!
//! - [`MemoryTarget`]: an in-memory write target with insert-or-skip
//!   semantics, scripted batch failures and name tables
//! - [`StubJob`]: a job over a fixed list of records
//! - [`quiet_pipeline`]: a pipeline with no inter-batch delay

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ppn_ingest::error::{Rejection, Result};
use ppn_ingest::framework::{
    EntityKey, IngestJob, NameLookupError, NameSource, Pipeline, RunMode, RunReport, SourceBatch,
    WriteRejection, WriteTarget,
};
use serde::Serialize;
use serde_json::Value;

/// One insert call as seen by the target
#[derive(Debug, Clone)]
pub struct InsertCall {
    pub table: String,
    pub on_conflict: Option<String>,
    pub rows: usize,
}

#[derive(Default)]
struct Store {
    calls: Vec<InsertCall>,
    rows: HashMap<String, Vec<Value>>,
    keys: HashSet<(String, String)>,
}

/// In-memory database honoring insert-or-skip on the conflict columns
#[derive(Default)]
pub struct MemoryTarget {
    store: Mutex<Store>,
    failing_calls: HashSet<usize>,
    names: HashMap<&'static str, Vec<String>>,
    missing_tables: HashSet<&'static str>,
    broken_tables: HashSet<&'static str>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `n`th insert call (1-based) with HTTP 400
    pub fn failing_call(mut self, n: usize) -> Self {
        self.failing_calls.insert(n);
        self
    }

    pub fn with_names(mut self, table: &'static str, names: &[&str]) -> Self {
        self.names
            .insert(table, names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Answer lookups on `table` with "not found"
    pub fn missing_table(mut self, table: &'static str) -> Self {
        self.missing_tables.insert(table);
        self
    }

    /// Answer lookups on `table` with a server error
    pub fn broken_table(mut self, table: &'static str) -> Self {
        self.broken_tables.insert(table);
        self
    }

    pub fn calls(&self) -> Vec<InsertCall> {
        self.store.lock().expect("store lock").calls.clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|c| c.rows).collect()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.store
            .lock()
            .expect("store lock")
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn conflict_key(row: &Value, on_conflict: Option<&str>) -> String {
    match on_conflict {
        Some(columns) => columns
            .split(',')
            .map(|c| row.get(c.trim()).map(Value::to_string).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("|"),
        None => row.to_string(),
    }
}

#[async_trait]
impl WriteTarget for MemoryTarget {
    async fn insert_ignoring_conflicts(
        &self,
        table: &str,
        on_conflict: Option<&str>,
        rows: &Value,
    ) -> std::result::Result<(), WriteRejection> {
        let mut store = self.store.lock().expect("store lock");
        let batch = rows.as_array().cloned().unwrap_or_default();
        store.calls.push(InsertCall {
            table: table.to_string(),
            on_conflict: on_conflict.map(str::to_string),
            rows: batch.len(),
        });

        if self.failing_calls.contains(&store.calls.len()) {
            return Err(WriteRejection {
                status: Some(400),
                body: "invalid input syntax".to_string(),
            });
        }

        for row in batch {
            let key = (table.to_string(), conflict_key(&row, on_conflict));
            if store.keys.insert(key) {
                store.rows.entry(table.to_string()).or_default().push(row);
            }
        }
        Ok(())
    }

    async fn fetch_names(
        &self,
        source: &NameSource,
    ) -> std::result::Result<Vec<String>, NameLookupError> {
        if self.missing_tables.contains(source.table) {
            return Err(NameLookupError::TableMissing);
        }
        if self.broken_tables.contains(source.table) {
            return Err(NameLookupError::Failed("HTTP 500: boom".to_string()));
        }
        Ok(self.names.get(source.table).cloned().unwrap_or_default())
    }
}

/// Pipeline without the inter-batch pause
pub fn quiet_pipeline<T: WriteTarget>(target: &T, mode: RunMode) -> Pipeline<'_, T> {
    Pipeline::new(target, mode).with_batch_delay(Duration::ZERO)
}

/// Raw record of the stub job
#[derive(Debug, Clone)]
pub struct StubRecord {
    pub id: Option<String>,
    pub name: String,
    pub category: String,
}

impl StubRecord {
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            category: category.to_string(),
        }
    }

    pub fn without_id(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            category: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StubRow {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Job over a fixed list of records
pub struct StubJob {
    records: Option<Vec<StubRecord>>,
    batch_size: usize,
    name_sources: Vec<NameSource>,
}

impl StubJob {
    pub fn new(records: Vec<StubRecord>) -> Self {
        Self {
            records: Some(records),
            batch_size: 50,
            name_sources: Vec::new(),
        }
    }

    /// `count` distinct records `id-0 .. id-{count-1}`
    pub fn numbered(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| StubRecord::new(&format!("id-{}", i), &format!("name-{}", i), "stub"))
                .collect(),
        )
    }

    /// Job whose source does not exist
    pub fn unavailable() -> Self {
        Self {
            records: None,
            batch_size: 50,
            name_sources: Vec::new(),
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_name_sources(mut self, sources: &[NameSource]) -> Self {
        self.name_sources = sources.to_vec();
        self
    }
}

#[async_trait]
impl IngestJob for StubJob {
    type Raw = StubRecord;
    type Row = StubRow;

    fn name(&self) -> &'static str {
        "stub"
    }

    fn table(&self) -> &'static str {
        "stub_table"
    }

    fn conflict_key(&self) -> Option<&'static str> {
        Some("id")
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn name_sources(&self) -> &[NameSource] {
        &self.name_sources
    }

    async fn fetch(&self, _report: &mut RunReport) -> Result<SourceBatch<StubRecord>> {
        Ok(match &self.records {
            Some(records) => SourceBatch::Records(records.clone()),
            None => SourceBatch::Unavailable {
                reason: "stub source missing".to_string(),
            },
        })
    }

    fn raw_label(&self, raw: &StubRecord) -> String {
        raw.name.clone()
    }

    fn normalize(&self, raw: &StubRecord) -> std::result::Result<StubRow, Rejection> {
        Ok(StubRow {
            id: raw.id.clone().ok_or(Rejection::MissingPrimaryIdentifier)?,
            name: raw.name.clone(),
            category: raw.category.clone(),
        })
    }

    fn entity_key(&self, row: &StubRow) -> EntityKey {
        EntityKey::identifier(row.id.clone())
    }

    fn names<'r>(&self, row: &'r StubRow) -> Vec<&'r str> {
        vec![row.name.as_str()]
    }

    fn category(&self, row: &StubRow) -> String {
        row.category.clone()
    }

    fn preview(&self, row: &StubRow) -> String {
        format!("{} | {}", row.id, row.name)
    }
}
