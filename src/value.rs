// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Typed scalar values and the row-view abstraction the predicate evaluator
//! is built against. The evaluator never depends on a row's storage layout;
//! it only ever calls through the [`Row`] trait.

use std::cmp::Ordering;

use crate::codec::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::schema::ScalarType;

/// A literal or column value. Ordering follows each scalar type's natural
/// total order; `Null` sorts before everything and compares equal only to
/// itself, matching the convention that comparisons against a null value
/// are handled by the caller (predicate leaves special-case nullness, see
/// [`crate::predicate::Predicate`]) rather than by `Ord`.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Utf8(String),
    /// Days since the UNIX epoch.
    Date(i32),
    /// Microseconds since the UNIX epoch.
    Timestamp(i64),
}

impl ScalarValue {
    pub fn data_type(&self) -> ScalarType {
        match self {
            Self::Null => ScalarType::Null,
            Self::Boolean(_) => ScalarType::Boolean,
            Self::Byte(_) => ScalarType::Byte,
            Self::Short(_) => ScalarType::Short,
            Self::Int(_) => ScalarType::Int,
            Self::Long(_) => ScalarType::Long,
            Self::Utf8(_) => ScalarType::Utf8,
            Self::Date(_) => ScalarType::Date,
            Self::Timestamp(_) => ScalarType::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Total order used by statistics min/max widening and range tests.
    /// Only meaningful for two values of the same, orderable, non-null type.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use ScalarValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a.partial_cmp(b),
            (Byte(a), Byte(b)) => a.partial_cmp(b),
            (Short(a), Short(b)) => a.partial_cmp(b),
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Long(a), Long(b)) => a.partial_cmp(b),
            (Utf8(a), Utf8(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => a.partial_cmp(b),
            (Timestamp(a), Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Canonical byte encoding used by the bloom column filter and by the
    /// header/statistics codecs to serialize literal bounds.
    pub(crate) fn encode(&self, w: &mut ByteWriter) {
        match self {
            ScalarValue::Null => w.put_u8(0),
            ScalarValue::Boolean(v) => w.put_u8(*v as u8),
            ScalarValue::Byte(v) => w.put_u8(*v as u8),
            ScalarValue::Short(v) => {
                w.put_i32(*v as i32);
            }
            ScalarValue::Int(v) => w.put_i32(*v),
            ScalarValue::Long(v) => w.put_i64(*v),
            ScalarValue::Utf8(v) => w.put_str(v),
            ScalarValue::Date(v) => w.put_i32(*v),
            ScalarValue::Timestamp(v) => w.put_i64(*v),
        }
    }

    pub(crate) fn decode(data_type: ScalarType, r: &mut ByteReader) -> Result<Self> {
        let v = match data_type {
            ScalarType::Null => {
                r.get_u8()?;
                ScalarValue::Null
            }
            ScalarType::Boolean => ScalarValue::Boolean(r.get_u8()? != 0),
            ScalarType::Byte => ScalarValue::Byte(r.get_u8()? as i8),
            ScalarType::Short => ScalarValue::Short(r.get_i32()? as i16),
            ScalarType::Int => ScalarValue::Int(r.get_i32()?),
            ScalarType::Long => ScalarValue::Long(r.get_i64()?),
            ScalarType::Utf8 => ScalarValue::Utf8(r.get_str()?),
            ScalarType::Date => ScalarValue::Date(r.get_i32()?),
            ScalarType::Timestamp => ScalarValue::Timestamp(r.get_i64()?),
        };
        Ok(v)
    }

    /// Bytes hashed by [`crate::filter::BloomColumnFilter`]; kept distinct
    /// from `encode` so filter membership doesn't depend on the on-disk
    /// framing (no length prefixes, no type tag).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            ScalarValue::Null => vec![],
            ScalarValue::Boolean(v) => vec![*v as u8],
            ScalarValue::Byte(v) => vec![*v as u8],
            ScalarValue::Short(v) => v.to_be_bytes().to_vec(),
            ScalarValue::Int(v) => v.to_be_bytes().to_vec(),
            ScalarValue::Long(v) => v.to_be_bytes().to_vec(),
            ScalarValue::Utf8(v) => v.as_bytes().to_vec(),
            ScalarValue::Date(v) => v.to_be_bytes().to_vec(),
            ScalarValue::Timestamp(v) => v.to_be_bytes().to_vec(),
        }
    }
}

/// A row-view: either a concrete in-memory row or a view over a decoded
/// stripe buffer. The predicate evaluator only ever goes through this
/// trait, never through a concrete storage type.
pub trait Row {
    fn is_null_at(&self, ord: usize) -> bool;
    fn get_boolean(&self, ord: usize) -> bool;
    fn get_byte(&self, ord: usize) -> i8;
    fn get_short(&self, ord: usize) -> i16;
    fn get_int(&self, ord: usize) -> i32;
    fn get_long(&self, ord: usize) -> i64;
    fn get_utf8(&self, ord: usize) -> &str;
    fn get_date(&self, ord: usize) -> i32;
    fn get_timestamp(&self, ord: usize) -> i64;

    /// Materializes the value at `ord` as a [`ScalarValue`], respecting
    /// nullness. Used by generic (non-hot-path) callers; row-oriented scan
    /// code should prefer the typed accessors above.
    fn value_at(&self, ord: usize, data_type: ScalarType) -> ScalarValue {
        if self.is_null_at(ord) {
            return ScalarValue::Null;
        }
        match data_type {
            ScalarType::Null => ScalarValue::Null,
            ScalarType::Boolean => ScalarValue::Boolean(self.get_boolean(ord)),
            ScalarType::Byte => ScalarValue::Byte(self.get_byte(ord)),
            ScalarType::Short => ScalarValue::Short(self.get_short(ord)),
            ScalarType::Int => ScalarValue::Int(self.get_int(ord)),
            ScalarType::Long => ScalarValue::Long(self.get_long(ord)),
            ScalarType::Utf8 => ScalarValue::Utf8(self.get_utf8(ord).to_string()),
            ScalarType::Date => ScalarValue::Date(self.get_date(ord)),
            ScalarType::Timestamp => ScalarValue::Timestamp(self.get_timestamp(ord)),
        }
    }
}

/// Simplest [`Row`] implementer: a materialized vector of [`ScalarValue`]s.
/// Used throughout this crate's own tests, and as the reference row type a
/// caller can use before wiring up a real stripe-buffer-backed row.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRow {
    values: Vec<ScalarValue>,
}

impl InMemoryRow {
    pub fn new(values: Vec<ScalarValue>) -> Self {
        Self { values }
    }

    fn get(&self, ord: usize) -> &ScalarValue {
        &self.values[ord]
    }
}

impl Row for InMemoryRow {
    fn is_null_at(&self, ord: usize) -> bool {
        self.get(ord).is_null()
    }

    fn get_boolean(&self, ord: usize) -> bool {
        match self.get(ord) {
            ScalarValue::Boolean(v) => *v,
            other => panic!("expected Boolean at {ord}, found {other:?}"),
        }
    }

    fn get_byte(&self, ord: usize) -> i8 {
        match self.get(ord) {
            ScalarValue::Byte(v) => *v,
            other => panic!("expected Byte at {ord}, found {other:?}"),
        }
    }

    fn get_short(&self, ord: usize) -> i16 {
        match self.get(ord) {
            ScalarValue::Short(v) => *v,
            other => panic!("expected Short at {ord}, found {other:?}"),
        }
    }

    fn get_int(&self, ord: usize) -> i32 {
        match self.get(ord) {
            ScalarValue::Int(v) => *v,
            other => panic!("expected Int at {ord}, found {other:?}"),
        }
    }

    fn get_long(&self, ord: usize) -> i64 {
        match self.get(ord) {
            ScalarValue::Long(v) => *v,
            other => panic!("expected Long at {ord}, found {other:?}"),
        }
    }

    fn get_utf8(&self, ord: usize) -> &str {
        match self.get(ord) {
            ScalarValue::Utf8(v) => v.as_str(),
            other => panic!("expected Utf8 at {ord}, found {other:?}"),
        }
    }

    fn get_date(&self, ord: usize) -> i32 {
        match self.get(ord) {
            ScalarValue::Date(v) => *v,
            other => panic!("expected Date at {ord}, found {other:?}"),
        }
    }

    fn get_timestamp(&self, ord: usize) -> i64 {
        match self.get(ord) {
            ScalarValue::Timestamp(v) => *v,
            other => panic!("expected Timestamp at {ord}, found {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_orders_same_type() {
        assert_eq!(
            ScalarValue::Int(1).compare(&ScalarValue::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(ScalarValue::Int(1).compare(&ScalarValue::Utf8("x".into())), None);
    }

    #[test]
    fn row_round_trips_values() {
        let row = InMemoryRow::new(vec![ScalarValue::Int(7), ScalarValue::Null]);
        assert!(!row.is_null_at(0));
        assert_eq!(row.get_int(0), 7);
        assert!(row.is_null_at(1));
    }
}
