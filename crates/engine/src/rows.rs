// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Materialized query results
//!
//! A [`RowSet`] holds every row of a result in memory, so it can be
//! iterated any number of times. Each [`Row`] is an ordered mapping from
//! column name to [`Value`]; lookups by name go through an index shared
//! by all rows of the set.

use crate::error::Result;
use arrow::datatypes::{DataType, Float64Type, Int64Type, SchemaRef, UInt64Type};
use arrow::record_batch::RecordBatch;
use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef};
use arrow_cast::cast::cast;
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Strings, and every other type in its display form (dates,
    /// decimals, nested values)
    Text(String),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

type ColumnIndex = Arc<HashMap<String, usize>>;

#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    index: ColumnIndex,
    values: Vec<Value>,
}

impl Row {
    /// The value of the named column, or `None` if there is no such column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.index.get(column).map(|&i| &self.values[i])
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

#[derive(Debug, Clone)]
pub struct RowSet {
    schema: SchemaRef,
    columns: Arc<[String]>,
    rows: Vec<Row>,
    batches: Vec<RecordBatch>,
}

impl RowSet {
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        let columns: Arc<[String]> = schema.fields().iter().map(|f| f.name().clone()).collect();

        // Duplicate names resolve to the first column carrying them
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            _ = index.entry(name.clone()).or_insert(i);
        }
        let index: ColumnIndex = Arc::new(index);

        let mut rows = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
        for batch in &batches {
            let decoded = batch
                .columns()
                .iter()
                .map(column_values)
                .collect::<Result<Vec<_>>>()?;
            for r in 0..batch.num_rows() {
                rows.push(Row {
                    columns: columns.clone(),
                    index: index.clone(),
                    values: decoded.iter().map(|col| col[r].clone()).collect(),
                });
            }
        }

        Ok(Self {
            schema,
            columns,
            rows,
            batches,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The Arrow batches the rows were decoded from, for tabular output.
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// The named column of the first row.
    #[must_use]
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(column))
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn column_values(array: &ArrayRef) -> Result<Vec<Value>> {
    let len = array.len();
    let data_type = array.data_type();

    let values = if matches!(data_type, DataType::Null) {
        vec![Value::Null; len]
    } else if matches!(data_type, DataType::Boolean) {
        let values = array.as_boolean();
        (0..len)
            .map(|i| nullable(values, i, || Value::Boolean(values.value(i))))
            .collect()
    } else if data_type.is_signed_integer() {
        let widened = cast(array, &DataType::Int64)?;
        let values = widened.as_primitive::<Int64Type>();
        (0..len)
            .map(|i| nullable(values, i, || Value::Int(values.value(i))))
            .collect()
    } else if data_type.is_unsigned_integer() {
        let widened = cast(array, &DataType::UInt64)?;
        let values = widened.as_primitive::<UInt64Type>();
        (0..len)
            .map(|i| nullable(values, i, || Value::UInt(values.value(i))))
            .collect()
    } else if data_type.is_floating() {
        let widened = cast(array, &DataType::Float64)?;
        let values = widened.as_primitive::<Float64Type>();
        (0..len)
            .map(|i| nullable(values, i, || Value::Float(values.value(i))))
            .collect()
    } else {
        let options = FormatOptions::default();
        let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
        (0..len)
            .map(|i| nullable(array, i, || Value::Text(formatter.value(i).to_string())))
            .collect()
    };
    Ok(values)
}

fn nullable<A: Array + ?Sized>(array: &A, i: usize, value: impl FnOnce() -> Value) -> Value {
    if array.is_null(i) { Value::Null } else { value() }
}
