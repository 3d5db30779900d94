//! Event recording for agent ledgers and preference schedules.
//!
//! A `tracing` subscriber that turns each info-level event into one row of a
//! table named after the event's target. Columns appear the first time a
//! field is seen; rows that lack a field get that column's zero value.
//!
//! ```ignore
//! // In library code:
//! tracing::info!(target: "trade", agent_id, trade_id, price, quantity);
//!
//! // In a test:
//! let (basket, log) = instrument::record(|| endowment.current_basket());
//! let trades = log.tables["trade"].to_dataframe()?;
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// One recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

/// A column of same-typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    fn empty_like(cell: &FieldValue, rows: usize) -> Self {
        match cell {
            FieldValue::U64(_) => TypedColumn::U64(vec![0; rows]),
            FieldValue::I64(_) => TypedColumn::I64(vec![0; rows]),
            FieldValue::F64(_) => TypedColumn::F64(vec![0.0; rows]),
            FieldValue::Bool(_) => TypedColumn::Bool(vec![false; rows]),
            FieldValue::Str(_) => TypedColumn::Str(vec![String::new(); rows]),
        }
    }

    /// Append `cell`, or the zero value if absent or of another type.
    fn push(&mut self, cell: Option<FieldValue>) {
        match (self, cell) {
            (TypedColumn::U64(v), Some(FieldValue::U64(x))) => v.push(x),
            (TypedColumn::I64(v), Some(FieldValue::I64(x))) => v.push(x),
            (TypedColumn::F64(v), Some(FieldValue::F64(x))) => v.push(x),
            (TypedColumn::Bool(v), Some(FieldValue::Bool(x))) => v.push(x),
            (TypedColumn::Str(v), Some(FieldValue::Str(x))) => v.push(x),
            (TypedColumn::U64(v), _) => v.push(0),
            (TypedColumn::I64(v), _) => v.push(0),
            (TypedColumn::F64(v), _) => v.push(0.0),
            (TypedColumn::Bool(v), _) => v.push(false),
            (TypedColumn::Str(v), _) => v.push(String::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            TypedColumn::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<&[u64]> {
        match self {
            TypedColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&[String]> {
        match self {
            TypedColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            TypedColumn::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Rows from one event target, stored column-wise.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: HashMap<String, TypedColumn>,
    pub row_count: usize,
}

impl EventTable {
    /// Append a row. Every column, old or new, ends up `row_count` long.
    pub fn push_row(&mut self, row: Vec<(String, FieldValue)>) {
        let mut row: HashMap<String, FieldValue> = row.into_iter().collect();

        for (name, column) in self.columns.iter_mut() {
            column.push(row.remove(name));
        }
        for (name, cell) in row {
            let mut column = TypedColumn::empty_like(&cell, self.row_count);
            column.push(Some(cell));
            self.columns.insert(name, column);
        }
        self.row_count += 1;
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.get(name)
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();

        let columns: Vec<Column> = names
            .into_iter()
            .map(|name| match &self.columns[name] {
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();

        DataFrame::new(columns)
    }
}

/// Tables keyed by tracing target (`"trade"`, `"schedule"`, ...).
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub tables: HashMap<String, EventTable>,
}

impl EventLog {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    pub fn rows(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, |t| t.row_count)
    }

    pub fn to_dataframes(&self) -> PolarsResult<HashMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }

    /// Write each table as `{dir}/{target}.parquet`.
    pub fn write_parquet(&self, dir: &Path) -> PolarsResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| PolarsError::IO {
            error: e.into(),
            msg: None,
        })?;
        for (name, mut df) in self.to_dataframes()? {
            let file = std::fs::File::create(dir.join(format!("{name}.parquet"))).map_err(|e| {
                PolarsError::IO {
                    error: e.into(),
                    msg: None,
                }
            })?;
            ParquetWriter::new(file).finish(&mut df)?;
        }
        Ok(())
    }
}

thread_local! {
    static LOG: RefCell<EventLog> = RefCell::default();
}

#[derive(Default)]
struct RowVisitor {
    row: Vec<(String, FieldValue)>,
}

impl RowVisitor {
    fn put(&mut self, field: &Field, cell: FieldValue) {
        self.row.push((field.name().to_string(), cell));
    }
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, FieldValue::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, FieldValue::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, FieldValue::Str(format!("{value:?}")));
    }
}

/// Collects info-level events into the thread-local `EventLog`. Spans are ignored.
pub struct TableSubscriber;

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);

        let target = event.metadata().target().to_string();
        LOG.with(|log| {
            log.borrow_mut()
                .tables
                .entry(target)
                .or_default()
                .push_row(visitor.row)
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything recorded on this thread so far.
pub fn drain() -> EventLog {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn clear() {
    LOG.with(|log| *log.borrow_mut() = EventLog::default());
}

/// Run `f` with `TableSubscriber` as this thread's default and return what
/// it recorded. Anything recorded earlier on the thread is discarded.
pub fn record<T>(f: impl FnOnce() -> T) -> (T, EventLog) {
    clear();
    let out = tracing::subscriber::with_default(TableSubscriber, f);
    (out, drain())
}
