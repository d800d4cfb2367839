//! In-memory data access port.
//!
//! Each statement runs under one write lock, so the existence check and the
//! write it guards are atomic with respect to concurrent requests.

use crate::domain::{value_key, DataAccessError, Operation, Row, RowExpectation, SysColumns};
use crate::ports::{DataAccessPort, ReadQuery, WriteResult, WriteStatement};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub row: Row,
    pub sys_columns: SysColumns,
}

type Table = HashMap<String, StoredRecord>;

#[derive(Default)]
pub struct InMemoryDataStore {
    tables: RwLock<HashMap<String, Table>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    failure: RwLock<Option<String>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `message`; `None` heals.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(str::to_owned);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Total port invocations.
    pub fn calls(&self) -> usize {
        self.reads() + self.writes()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }

    pub fn record(&self, table: &str, pk: &str) -> Option<StoredRecord> {
        self.tables.read().get(table)?.get(pk).cloned()
    }

    pub fn sys_columns(&self, table: &str, pk: &str) -> Option<SysColumns> {
        self.record(table, pk).map(|r| r.sys_columns)
    }

    fn check_failure(&self) -> Result<(), DataAccessError> {
        match self.failure.read().as_ref() {
            Some(message) => Err(DataAccessError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataAccessPort for InMemoryDataStore {
    async fn read(&self, query: &ReadQuery) -> Result<Option<Row>, DataAccessError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let tables = self.tables.read();
        let row = tables
            .get(&query.table)
            .and_then(|table| table.get(&value_key(&query.pk_value)))
            .map(|record| &record.row)
            .filter(|row| query.condition.matches(row))
            .cloned();
        Ok(row)
    }

    async fn write(&self, statement: &WriteStatement) -> Result<WriteResult, DataAccessError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let pk = value_key(&statement.pk_value);
        let mut tables = self.tables.write();
        let table = tables.entry(statement.table.clone()).or_default();

        let exists = table.contains_key(&pk);
        let holds = match statement.expectation {
            RowExpectation::Any => true,
            RowExpectation::MustExist => exists,
            RowExpectation::MustNotExist => !exists,
        };
        if !holds {
            return Ok(WriteResult::PreconditionFailed);
        }

        match statement.operation {
            Operation::Create => {
                let mut row = statement.row.clone();
                row.insert(statement.pk_column.clone(), statement.pk_value.clone());
                table.insert(
                    pk,
                    StoredRecord {
                        row,
                        sys_columns: statement.sys_columns.clone(),
                    },
                );
            }
            Operation::Update => {
                let record = table.entry(pk).or_insert_with(|| StoredRecord {
                    row: Row::new(),
                    sys_columns: SysColumns::default(),
                });
                for (column, value) in &statement.row {
                    record.row.insert(column.clone(), value.clone());
                }
                record
                    .row
                    .insert(statement.pk_column.clone(), statement.pk_value.clone());
                record.sys_columns = statement.sys_columns.clone();
            }
            Operation::Delete => {
                table.remove(&pk);
            }
            Operation::Read => {
                return Err(DataAccessError::new(format!(
                    "read is not a write statement on table '{}'",
                    statement.table
                )))
            }
        }
        Ok(WriteResult::Applied)
    }
}
