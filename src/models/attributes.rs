//! Socioeconomic attribute records keyed by canonical municipality name.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::str::FromStr;

/// A single field of a reference row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    /// Exact value as read from the source table
    Decimal(Decimal),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret a raw table cell.
    ///
    /// Integers stay integers and positional decimals stay exact. Exponent notation and
    /// numbers beyond the decimal range become floats, non-finite ones become text.
    pub fn parse_cell(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if !raw.contains(['e', 'E']) {
            if let Ok(d) = Decimal::from_str(raw) {
                return FieldValue::Decimal(d);
            }
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => FieldValue::Float(f),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    /// JSON form used by the resolution cache.
    ///
    /// Decimals are lowered to plain `f64` here and only here; precision loss is accepted so the
    /// cache stays ordinary JSON numbers. Non-finite floats become `null`.
    pub fn to_json_lossy(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Decimal(d) => d
                .to_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        FieldValue::Decimal(d)
    }
}

/// One row of the reference table: field name -> value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reference attribute table keyed by canonical municipality name.
///
/// Keys keep the order rows were inserted in, which is the order fuzzy matching
/// visits them and so decides ties.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: Vec<(String, AttributeRecord)>,
    positions: HashMap<String, usize>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row. A later row with the same name replaces the earlier one's
    /// record but keeps its position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        record: AttributeRecord,
    ) -> Option<AttributeRecord> {
        let name = name.into();
        match self.positions.get(&name) {
            Some(&idx) => Some(mem::replace(&mut self.rows[idx].1, record)),
            None => {
                self.positions.insert(name.clone(), self.rows.len());
                self.rows.push((name, record));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeRecord> {
        self.positions.get(name).map(|&idx| &self.rows[idx].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(String, AttributeRecord)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (String, AttributeRecord)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, record) in iter {
            table.insert(name, record);
        }
        table
    }
}
