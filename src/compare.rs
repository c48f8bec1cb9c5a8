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

//! The five scalar comparison operators, shared between row-level predicate
//! evaluation (spec section 4.3, "Row evaluation") and statistics pushdown
//! (same section, "Statistics test"). Both evaluate the same operator
//! against a [`Row`]; statistics pushdown just points `ord` at the stripe's
//! min/max pseudo-row (see [`crate::statistics::Statistics`]) instead of an
//! actual column value.

use std::cmp::Ordering;

use crate::value::{Row, ScalarValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    fn matches(self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (CompareOp::Eq, Some(Ordering::Equal)) => true,
            (CompareOp::Gt, Some(Ordering::Greater)) => true,
            (CompareOp::Lt, Some(Ordering::Less)) => true,
            (CompareOp::Ge, Some(Ordering::Greater | Ordering::Equal)) => true,
            (CompareOp::Le, Some(Ordering::Less | Ordering::Equal)) => true,
            _ => false,
        }
    }
}

/// `row[ord] <op> literal`, treating a null at `ord` as never satisfying
/// any comparison (mirrors the "v is not null ∧ ..." leaf contract).
pub fn eval_cmp(op: CompareOp, row: &dyn Row, ord: usize, literal: &ScalarValue) -> bool {
    if row.is_null_at(ord) {
        return false;
    }
    let value = row.value_at(ord, literal.data_type());
    op.matches(value.compare(literal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InMemoryRow;

    #[test]
    fn eq_requires_non_null_and_equal() {
        let row = InMemoryRow::new(vec![ScalarValue::Int(5), ScalarValue::Null]);
        assert!(eval_cmp(CompareOp::Eq, &row, 0, &ScalarValue::Int(5)));
        assert!(!eval_cmp(CompareOp::Eq, &row, 0, &ScalarValue::Int(6)));
        assert!(!eval_cmp(CompareOp::Eq, &row, 1, &ScalarValue::Int(5)));
    }

    #[test]
    fn ordering_operators() {
        let row = InMemoryRow::new(vec![ScalarValue::Int(5)]);
        assert!(eval_cmp(CompareOp::Gt, &row, 0, &ScalarValue::Int(4)));
        assert!(!eval_cmp(CompareOp::Gt, &row, 0, &ScalarValue::Int(5)));
        assert!(eval_cmp(CompareOp::Ge, &row, 0, &ScalarValue::Int(5)));
        assert!(eval_cmp(CompareOp::Lt, &row, 0, &ScalarValue::Int(6)));
        assert!(eval_cmp(CompareOp::Le, &row, 0, &ScalarValue::Int(5)));
    }
}
