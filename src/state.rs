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

//! A predicate tree resolved against one [`TypeDescription`]: bound,
//! simplified, and with its trivial tag precomputed. Immutable once built,
//! so a single instance is shared read-only across every stripe the
//! planner evaluates.

use crate::error::Result;
use crate::filter::ColumnFilter;
use crate::predicate::{Binder, Predicate, Simplifier, Trivial, TrivialDetector};
use crate::schema::TypeDescription;
use crate::statistics::Statistics;
use crate::value::Row;

/// Resolved predicate: bind, then simplify, recording whether the whole
/// tree collapsed to an unconditional `true`/`false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateState {
    bound_tree: Predicate,
    trivial: Trivial,
}

impl PredicateState {
    /// Binds `tree` against `type_description` and simplifies it. Binding
    /// failures (`UnknownColumn`, `TypeMismatch`) are fatal to the caller.
    pub fn new(tree: Predicate, type_description: &TypeDescription) -> Result<Self> {
        let bound_tree = tree
            .transform(&mut Binder::new(type_description))?
            .transform(&mut Simplifier::new())?;
        let trivial = TrivialDetector::detect(&bound_tree);
        Ok(Self { bound_tree, trivial })
    }

    pub fn bound_tree(&self) -> &Predicate {
        &self.bound_tree
    }

    pub fn is_trivially_true(&self) -> bool {
        self.trivial == Trivial::True
    }

    pub fn is_trivially_false(&self) -> bool {
        self.trivial == Trivial::False
    }

    /// Used by the stripe planner before opening a stripe's data.
    pub fn evaluate_stats(&self, stats: &[Statistics]) -> bool {
        match self.trivial {
            Trivial::True => true,
            Trivial::False => false,
            Trivial::None => self.bound_tree.evaluate_stats(stats),
        }
    }

    /// Used by the stripe planner when a stripe carries column filters.
    pub fn evaluate_filters<F: ColumnFilter>(&self, filters: &[F]) -> bool {
        match self.trivial {
            Trivial::True => true,
            Trivial::False => false,
            Trivial::None => self.bound_tree.evaluate_filters(filters),
        }
    }

    /// Used during the row scan over a surviving stripe.
    pub fn evaluate_row(&self, row: &dyn Row) -> bool {
        match self.trivial {
            Trivial::True => true,
            Trivial::False => false,
            Trivial::None => self.bound_tree.evaluate_row(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::ColumnRef;
    use crate::schema::{ColumnDef, ScalarType};
    use crate::value::{InMemoryRow, ScalarValue};

    fn type_description() -> TypeDescription {
        TypeDescription::new(
            &[
                ColumnDef::new("col0", ScalarType::Utf8, true),
                ColumnDef::new("col1", ScalarType::Int, true),
                ColumnDef::new("col2", ScalarType::Long, true),
            ],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn s2_statistics_pruning() {
        let td = type_description();
        let tree = Predicate::Eq(ColumnRef::name("col1"), ScalarValue::Int(5));
        let state = PredicateState::new(tree, &td).unwrap();
        assert!(!state.is_trivially_true());
        assert!(!state.is_trivially_false());

        let make_stats = |lo: i32, hi: i32| {
            let mut s = Statistics::empty(ScalarType::Int);
            s.update(&InMemoryRow::new(vec![ScalarValue::Int(lo)]), 0);
            s.update(&InMemoryRow::new(vec![ScalarValue::Int(hi)]), 0);
            s
        };
        let col0 = Statistics::empty(ScalarType::Utf8);
        let col2 = Statistics::empty(ScalarType::Long);

        assert!(!state.evaluate_stats(&[col0.clone(), make_stats(1, 3), col2.clone()]));
        assert!(state.evaluate_stats(&[col0.clone(), make_stats(4, 5), col2.clone()]));
        assert!(!state.evaluate_stats(&[col0, make_stats(1, 3), col2]));
    }

    #[test]
    fn s1_null_predicate_leaves_unindexed_stripes() {
        let td = type_description();
        let tree = Predicate::not(Predicate::IsNull(ColumnRef::name("col1")));
        let state = PredicateState::new(tree, &td).unwrap();
        // no statistics present for any ordinal: cannot prove skip.
        assert!(state.evaluate_stats(&[]));
    }

    #[test]
    fn negated_predicate_never_drops_a_matching_stripe() {
        // A stripe with has_nulls=true and a non-null range of [1,3] contains
        // a row (value 2) satisfying `Not(IsNull(col1))`. Naive negation of
        // the child's stats verdict (`!has_nulls` = `false`) would prune this
        // stripe and lose that row; the sound answer is "cannot skip".
        let td = type_description();
        let tree = Predicate::not(Predicate::IsNull(ColumnRef::name("col1")));
        let state = PredicateState::new(tree, &td).unwrap();

        let mut col1 = Statistics::empty(ScalarType::Int);
        col1.update(&InMemoryRow::new(vec![ScalarValue::Null]), 0);
        col1.update(&InMemoryRow::new(vec![ScalarValue::Int(1)]), 0);
        col1.update(&InMemoryRow::new(vec![ScalarValue::Int(3)]), 0);

        let col0 = Statistics::empty(ScalarType::Utf8);
        let col2 = Statistics::empty(ScalarType::Long);
        assert!(state.evaluate_stats(&[col0, col1, col2]));
    }

    #[test]
    fn unknown_column_binding_fails() {
        let td = type_description();
        let tree = Predicate::Eq(ColumnRef::name("ghost"), ScalarValue::Int(1));
        let err = PredicateState::new(tree, &td).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::UnknownColumn { .. }));
    }

    #[test]
    fn trivially_false_short_circuits_everything() {
        let td = type_description();
        let x = Predicate::Eq(ColumnRef::name("col1"), ScalarValue::Int(1));
        let tree = Predicate::and(x.clone(), Predicate::not(x));
        let state = PredicateState::new(tree, &td).unwrap();
        assert!(state.is_trivially_false());
        assert!(!state.evaluate_stats(&[]));
        let row = InMemoryRow::new(vec![
            ScalarValue::Null,
            ScalarValue::Int(1),
            ScalarValue::Null,
        ]);
        assert!(!state.evaluate_row(&row));
    }
}
