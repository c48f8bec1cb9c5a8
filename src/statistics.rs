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

//! Per-column, per-stripe summary statistics and the typed comparison
//! entry points ([`Statistics::eq_expr`] and friends) the predicate
//! evaluator uses for stripe pruning.

use crate::codec::{ByteReader, ByteWriter};
use crate::compare::{eval_cmp, CompareOp};
use crate::error::{CorruptHeaderSnafu, Result};
use crate::schema::ScalarType;
use crate::value::{Row, ScalarValue};

/// Pseudo-row ordinal pointing at the stripe minimum.
pub const ORD_MIN: usize = 0;
/// Pseudo-row ordinal pointing at the stripe maximum.
pub const ORD_MAX: usize = 1;

/// Summary of one indexed column's values across one stripe (or, for
/// `Statistics` attached at the file level, across the whole file).
///
/// Contract: for every row in the summarized range, `min <= value <= max`
/// under the scalar type's total order, and `has_nulls` is true iff at
/// least one null was observed. A column that saw no non-null values is
/// the "empty" state: `min`/`max` are absent and every typed comparison
/// below returns `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    data_type: ScalarType,
    has_nulls: bool,
    bounds: Option<(ScalarValue, ScalarValue)>,
}

impl Statistics {
    pub fn empty(data_type: ScalarType) -> Self {
        Self {
            data_type,
            has_nulls: false,
            bounds: None,
        }
    }

    pub fn data_type(&self) -> ScalarType {
        self.data_type
    }

    pub fn has_nulls(&self) -> bool {
        self.has_nulls
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn min(&self) -> Option<&ScalarValue> {
        self.bounds.as_ref().map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<&ScalarValue> {
        self.bounds.as_ref().map(|(_, max)| max)
    }

    /// Widens `min`/`max` with the value at `ord` in `row`, or flips
    /// `has_nulls` if that value is null.
    pub fn update(&mut self, row: &dyn Row, ord: usize) {
        if row.is_null_at(ord) {
            self.has_nulls = true;
            return;
        }
        let value = row.value_at(ord, self.data_type);
        self.bounds = Some(match self.bounds.take() {
            None => (value.clone(), value),
            Some((min, max)) => {
                let new_min = if matches!(value.compare(&min), Some(std::cmp::Ordering::Less)) {
                    value.clone()
                } else {
                    min
                };
                let new_max = if matches!(value.compare(&max), Some(std::cmp::Ordering::Greater)) {
                    value
                } else {
                    max
                };
                (new_min, new_max)
            }
        });
    }

    /// `min <= literal <= max` (and statistics non-empty).
    pub fn eq_expr(&self, literal: &ScalarValue) -> bool {
        self.le_expr(literal) && self.ge_expr(literal)
    }

    /// `max > literal`.
    pub fn gt_expr(&self, literal: &ScalarValue) -> bool {
        !self.is_empty() && eval_cmp(CompareOp::Gt, self, ORD_MAX, literal)
    }

    /// `min < literal`.
    pub fn lt_expr(&self, literal: &ScalarValue) -> bool {
        !self.is_empty() && eval_cmp(CompareOp::Lt, self, ORD_MIN, literal)
    }

    /// `max >= literal`.
    pub fn ge_expr(&self, literal: &ScalarValue) -> bool {
        !self.is_empty() && eval_cmp(CompareOp::Ge, self, ORD_MAX, literal)
    }

    /// `min <= literal`.
    pub fn le_expr(&self, literal: &ScalarValue) -> bool {
        !self.is_empty() && eval_cmp(CompareOp::Le, self, ORD_MIN, literal)
    }

    /// `exists x in set: min <= x <= max`.
    pub fn in_expr(&self, set: &[ScalarValue]) -> bool {
        set.iter().any(|x| self.eq_expr(x))
    }

    pub fn is_null_expr(&self) -> bool {
        self.has_nulls
    }

    pub(crate) fn encode(&self, w: &mut ByteWriter) {
        w.put_u8(self.data_type.tag());
        w.put_u8(self.has_nulls as u8);
        match &self.bounds {
            None => w.put_u8(0),
            Some((min, max)) => {
                w.put_u8(1);
                min.encode(w);
                max.encode(w);
            }
        }
    }

    pub(crate) fn decode(r: &mut ByteReader) -> Result<Self> {
        let data_type = ScalarType::from_tag(r.get_u8()?)?;
        let has_nulls = r.get_u8()? != 0;
        let present = r.get_u8()?;
        let bounds = match present {
            0 => None,
            1 => {
                let min = ScalarValue::decode(data_type, r)?;
                let max = ScalarValue::decode(data_type, r)?;
                Some((min, max))
            }
            other => {
                return CorruptHeaderSnafu {
                    msg: format!("invalid statistics presence flag {other}"),
                }
                .fail()
            }
        };
        Ok(Self {
            data_type,
            has_nulls,
            bounds,
        })
    }
}

/// Exposes the stripe minimum/maximum as a two-element pseudo-row so the
/// same [`crate::compare::eval_cmp`] machinery that evaluates row-level
/// predicate leaves can evaluate statistics leaves: ordinal [`ORD_MIN`]
/// reads the minimum, ordinal [`ORD_MAX`] the maximum.
impl Row for Statistics {
    fn is_null_at(&self, _ord: usize) -> bool {
        false
    }

    fn get_boolean(&self, ord: usize) -> bool {
        match self.pseudo(ord) {
            ScalarValue::Boolean(v) => *v,
            other => panic!("expected Boolean, found {other:?}"),
        }
    }

    fn get_byte(&self, ord: usize) -> i8 {
        match self.pseudo(ord) {
            ScalarValue::Byte(v) => *v,
            other => panic!("expected Byte, found {other:?}"),
        }
    }

    fn get_short(&self, ord: usize) -> i16 {
        match self.pseudo(ord) {
            ScalarValue::Short(v) => *v,
            other => panic!("expected Short, found {other:?}"),
        }
    }

    fn get_int(&self, ord: usize) -> i32 {
        match self.pseudo(ord) {
            ScalarValue::Int(v) => *v,
            other => panic!("expected Int, found {other:?}"),
        }
    }

    fn get_long(&self, ord: usize) -> i64 {
        match self.pseudo(ord) {
            ScalarValue::Long(v) => *v,
            other => panic!("expected Long, found {other:?}"),
        }
    }

    fn get_utf8(&self, ord: usize) -> &str {
        match self.pseudo(ord) {
            ScalarValue::Utf8(v) => v.as_str(),
            other => panic!("expected Utf8, found {other:?}"),
        }
    }

    fn get_date(&self, ord: usize) -> i32 {
        match self.pseudo(ord) {
            ScalarValue::Date(v) => *v,
            other => panic!("expected Date, found {other:?}"),
        }
    }

    fn get_timestamp(&self, ord: usize) -> i64 {
        match self.pseudo(ord) {
            ScalarValue::Timestamp(v) => *v,
            other => panic!("expected Timestamp, found {other:?}"),
        }
    }
}

impl Statistics {
    fn pseudo(&self, ord: usize) -> &ScalarValue {
        let (min, max) = self.bounds.as_ref().expect("pseudo-row read on empty statistics");
        match ord {
            ORD_MIN => min,
            ORD_MAX => max,
            other => panic!("statistics pseudo-row only has ordinals 0 and 1, got {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InMemoryRow;

    fn stats_with(data_type: ScalarType, values: &[i64]) -> Statistics {
        let mut stats = Statistics::empty(data_type);
        for &v in values {
            let row = InMemoryRow::new(vec![ScalarValue::Long(v)]);
            stats.update(&row, 0);
        }
        stats
    }

    #[test]
    fn empty_statistics_never_match() {
        let stats = Statistics::empty(ScalarType::Long);
        assert!(!stats.eq_expr(&ScalarValue::Long(1)));
        assert!(!stats.gt_expr(&ScalarValue::Long(1)));
        assert!(!stats.is_null_expr());
    }

    #[test]
    fn update_widens_min_max_and_has_nulls() {
        let mut stats = Statistics::empty(ScalarType::Long);
        let present = InMemoryRow::new(vec![ScalarValue::Long(5)]);
        let null = InMemoryRow::new(vec![ScalarValue::Null]);
        stats.update(&present, 0);
        stats.update(&null, 0);
        stats.update(&InMemoryRow::new(vec![ScalarValue::Long(1)]), 0);
        stats.update(&InMemoryRow::new(vec![ScalarValue::Long(9)]), 0);

        assert_eq!(stats.min(), Some(&ScalarValue::Long(1)));
        assert_eq!(stats.max(), Some(&ScalarValue::Long(9)));
        assert!(stats.has_nulls());
    }

    #[test]
    fn eq_expr_checks_range() {
        let stats = stats_with(ScalarType::Long, &[4, 5]);
        assert!(stats.eq_expr(&ScalarValue::Long(4)));
        assert!(stats.eq_expr(&ScalarValue::Long(5)));
        assert!(!stats.eq_expr(&ScalarValue::Long(6)));
    }

    #[test]
    fn gt_lt_ge_le() {
        let stats = stats_with(ScalarType::Long, &[1, 3]);
        assert!(stats.gt_expr(&ScalarValue::Long(2)));
        assert!(!stats.gt_expr(&ScalarValue::Long(3)));
        assert!(stats.lt_expr(&ScalarValue::Long(2)));
        assert!(!stats.lt_expr(&ScalarValue::Long(1)));
        assert!(stats.ge_expr(&ScalarValue::Long(3)));
        assert!(stats.le_expr(&ScalarValue::Long(1)));
    }

    #[test]
    fn in_expr_true_if_any_member_in_range() {
        let stats = stats_with(ScalarType::Long, &[1, 3]);
        let set = vec![ScalarValue::Long(10), ScalarValue::Long(2)];
        assert!(stats.in_expr(&set));
        let set = vec![ScalarValue::Long(10), ScalarValue::Long(20)];
        assert!(!stats.in_expr(&set));
    }

    #[test]
    fn round_trips_through_codec() {
        let stats = stats_with(ScalarType::Long, &[1, 3]);
        let mut w = ByteWriter::new();
        stats.encode(&mut w);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let decoded = Statistics::decode(&mut r).unwrap();
        assert_eq!(stats, decoded);
    }
}
