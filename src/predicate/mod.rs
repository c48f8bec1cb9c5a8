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

//! The predicate tree: a tagged, structurally-hashable expression over
//! column comparisons, plus the three evaluation modes (row, statistics,
//! column filter) it supports once bound to a [`crate::schema::TypeDescription`].

mod rule;

pub use rule::{Binder, Simplifier, TrivialDetector};

use crate::compare::{eval_cmp, CompareOp};
use crate::error::Result;
use crate::filter::ColumnFilter;
use crate::statistics::Statistics;
use crate::value::{Row, ScalarValue};

/// A column reference inside a predicate leaf: by name before binding, by
/// ordinal after. [`Binder`] rewrites one into the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Unbound(String),
    Bound(usize),
}

impl ColumnRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Unbound(name.into())
    }

    /// The ordinal, if this reference has already been bound.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            Self::Bound(ord) => Some(*ord),
            Self::Unbound(_) => None,
        }
    }
}

/// The predicate tree. Leaves compare one column to a literal (or set of
/// literals); logical nodes combine child predicates. Equality is purely
/// structural: `And`/`Or` are not canonicalized, so `And(a,b) != And(b,a)`
/// unless a rule makes them so.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Eq(ColumnRef, ScalarValue),
    Gt(ColumnRef, ScalarValue),
    Lt(ColumnRef, ScalarValue),
    Ge(ColumnRef, ScalarValue),
    Le(ColumnRef, ScalarValue),
    In(ColumnRef, Vec<ScalarValue>),
    IsNull(ColumnRef),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    True,
    False,
}

impl Predicate {
    pub fn and(l: Predicate, r: Predicate) -> Self {
        Self::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Predicate, r: Predicate) -> Self {
        Self::Or(Box::new(l), Box::new(r))
    }

    pub fn not(child: Predicate) -> Self {
        Self::Not(Box::new(child))
    }

    /// Rewrites this tree bottom-up: children are transformed first, then
    /// the (possibly already-rewritten) node itself is handed to `rule`.
    /// This lets a [`Rule`] assume its children are already in normal form,
    /// which is what [`Simplifier`]'s folding laws rely on.
    pub fn transform(self, rule: &mut dyn Rule) -> Result<Predicate> {
        let node = match self {
            Predicate::And(l, r) => {
                Predicate::And(Box::new(l.transform(rule)?), Box::new(r.transform(rule)?))
            }
            Predicate::Or(l, r) => {
                Predicate::Or(Box::new(l.transform(rule)?), Box::new(r.transform(rule)?))
            }
            Predicate::Not(c) => Predicate::Not(Box::new(c.transform(rule)?)),
            other => other,
        };
        rule.apply(node)
    }

    /// Row-level evaluation (spec "Row evaluation" table): every leaf
    /// requires a non-null value, compared via [`eval_cmp`].
    pub fn evaluate_row(&self, row: &dyn Row) -> bool {
        match self {
            Predicate::Eq(col, lit) => eval_cmp(CompareOp::Eq, row, bound_ord(col), lit),
            Predicate::Gt(col, lit) => eval_cmp(CompareOp::Gt, row, bound_ord(col), lit),
            Predicate::Lt(col, lit) => eval_cmp(CompareOp::Lt, row, bound_ord(col), lit),
            Predicate::Ge(col, lit) => eval_cmp(CompareOp::Ge, row, bound_ord(col), lit),
            Predicate::Le(col, lit) => eval_cmp(CompareOp::Le, row, bound_ord(col), lit),
            Predicate::In(col, set) => {
                let ord = bound_ord(col);
                !row.is_null_at(ord) && set.iter().any(|lit| eval_cmp(CompareOp::Eq, row, ord, lit))
            }
            Predicate::IsNull(col) => row.is_null_at(bound_ord(col)),
            Predicate::And(l, r) => l.evaluate_row(row) && r.evaluate_row(row),
            Predicate::Or(l, r) => l.evaluate_row(row) || r.evaluate_row(row),
            Predicate::Not(c) => !c.evaluate_row(row),
            Predicate::True => true,
            Predicate::False => false,
        }
    }

    /// Statistics pushdown (spec "Statistics test" table). Must be sound:
    /// `false` proves no row in the stripe can match. `stats` is indexed by
    /// column ordinal and only covers indexed columns (`0..num_indexed`); a
    /// leaf on an ordinal outside that range has no statistics available
    /// and conservatively answers `true` ("cannot prove skip"). `Not` is not
    /// a sound stats test over its child's result: `!child.evaluate_stats()`
    /// would claim a stripe can't satisfy `Not(p)` whenever it merely *can*
    /// satisfy `p`, which is not the same as *every* row satisfying `p` —
    /// so `Not` conservatively answers `true` rather than negating the
    /// child's pruning verdict.
    pub fn evaluate_stats(&self, stats: &[Statistics]) -> bool {
        match self {
            Predicate::Eq(col, lit) => with_stats(stats, bound_ord(col), |s| s.eq_expr(lit)),
            Predicate::Gt(col, lit) => with_stats(stats, bound_ord(col), |s| s.gt_expr(lit)),
            Predicate::Lt(col, lit) => with_stats(stats, bound_ord(col), |s| s.lt_expr(lit)),
            Predicate::Ge(col, lit) => with_stats(stats, bound_ord(col), |s| s.ge_expr(lit)),
            Predicate::Le(col, lit) => with_stats(stats, bound_ord(col), |s| s.le_expr(lit)),
            Predicate::In(col, set) => with_stats(stats, bound_ord(col), |s| s.in_expr(set)),
            Predicate::IsNull(col) => with_stats(stats, bound_ord(col), |s| s.is_null_expr()),
            Predicate::And(l, r) => l.evaluate_stats(stats) && r.evaluate_stats(stats),
            Predicate::Or(l, r) => l.evaluate_stats(stats) || r.evaluate_stats(stats),
            Predicate::Not(_) => true,
            Predicate::True => true,
            Predicate::False => false,
        }
    }

    /// Column-filter pushdown. Only equality-flavored leaves (`Eq`, `In`)
    /// consult the oracle; inequality leaves and `IsNull` carry no range
    /// information a membership filter could rule out, so they answer
    /// `true` unconditionally. `Not` answers `true` for the same soundness
    /// reason as in [`Predicate::evaluate_stats`]: negating a membership
    /// oracle's "may contain" verdict is not a sound "cannot match" proof.
    pub fn evaluate_filters<F: ColumnFilter>(&self, filters: &[F]) -> bool {
        match self {
            Predicate::Eq(col, lit) => with_filter(filters, bound_ord(col), |f| f.may_contain(lit)),
            Predicate::In(col, set) => {
                with_filter(filters, bound_ord(col), |f| set.iter().any(|lit| f.may_contain(lit)))
            }
            Predicate::Gt(..) | Predicate::Lt(..) | Predicate::Ge(..) | Predicate::Le(..) => true,
            Predicate::IsNull(..) => true,
            Predicate::Not(_) => true,
            Predicate::And(l, r) => l.evaluate_filters(filters) && r.evaluate_filters(filters),
            Predicate::Or(l, r) => l.evaluate_filters(filters) || r.evaluate_filters(filters),
            Predicate::True => true,
            Predicate::False => false,
        }
    }
}

fn bound_ord(col: &ColumnRef) -> usize {
    col.ordinal()
        .expect("predicate evaluated before binding: leaf still holds a column name")
}

fn with_stats(stats: &[Statistics], ord: usize, f: impl FnOnce(&Statistics) -> bool) -> bool {
    match stats.get(ord) {
        Some(s) => f(s),
        None => true,
    }
}

fn with_filter<F: ColumnFilter>(filters: &[F], ord: usize, f: impl FnOnce(&F) -> bool) -> bool {
    match filters.get(ord) {
        Some(filter) => f(filter),
        None => true,
    }
}

/// A tree-rewriting pass applied bottom-up by [`Predicate::transform`].
pub trait Rule {
    fn apply(&mut self, node: Predicate) -> Result<Predicate>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InMemoryRow;

    #[test]
    fn row_evaluation_and_or_not() {
        let row = InMemoryRow::new(vec![ScalarValue::Int(5), ScalarValue::Null]);
        let p = Predicate::and(
            Predicate::Eq(ColumnRef::Bound(0), ScalarValue::Int(5)),
            Predicate::not(Predicate::IsNull(ColumnRef::Bound(0))),
        );
        assert!(p.evaluate_row(&row));

        let p = Predicate::or(
            Predicate::Eq(ColumnRef::Bound(0), ScalarValue::Int(1)),
            Predicate::IsNull(ColumnRef::Bound(1)),
        );
        assert!(p.evaluate_row(&row));
    }

    #[test]
    fn in_expr_row_evaluation() {
        let row = InMemoryRow::new(vec![ScalarValue::Int(5)]);
        let p = Predicate::In(
            ColumnRef::Bound(0),
            vec![ScalarValue::Int(1), ScalarValue::Int(5)],
        );
        assert!(p.evaluate_row(&row));
        let p = Predicate::In(ColumnRef::Bound(0), vec![ScalarValue::Int(1)]);
        assert!(!p.evaluate_row(&row));
    }

    #[test]
    fn trivial_nodes_short_circuit_row_eval() {
        let row = InMemoryRow::new(vec![]);
        assert!(Predicate::True.evaluate_row(&row));
        assert!(!Predicate::False.evaluate_row(&row));
    }

    #[test]
    fn statistics_missing_for_ordinal_defaults_to_cannot_skip() {
        let p = Predicate::Eq(ColumnRef::Bound(3), ScalarValue::Int(5));
        assert!(p.evaluate_stats(&[]));
    }

    #[test]
    fn filter_pushdown_only_applies_to_equality_leaves() {
        use crate::filter::BloomColumnFilter;
        let mut bloom = BloomColumnFilter::with_capacity(10, 0.01);
        bloom.insert(&ScalarValue::Int(5));
        let filters = vec![bloom];

        let eq = Predicate::Eq(ColumnRef::Bound(0), ScalarValue::Int(7));
        assert!(!eq.evaluate_filters(&filters));

        let gt = Predicate::Gt(ColumnRef::Bound(0), ScalarValue::Int(7));
        assert!(gt.evaluate_filters(&filters));

        let is_null = Predicate::IsNull(ColumnRef::Bound(0));
        assert!(is_null.evaluate_filters(&filters));
    }

    #[test]
    fn negated_stats_and_filter_tests_are_conservative() {
        // `Not(Eq(col, 5))` with a filter that may-contain 5 must not be
        // pruned: a row holding some other value the filter also reports as
        // "may contain" (a false positive, or simply a different member)
        // still satisfies the negated predicate, so naive `!child` negation
        // (which would return `false` here) is unsound.
        use crate::filter::BloomColumnFilter;
        let mut bloom = BloomColumnFilter::with_capacity(10, 0.01);
        bloom.insert(&ScalarValue::Int(5));
        let filters = vec![bloom];

        let not_eq = Predicate::not(Predicate::Eq(ColumnRef::Bound(0), ScalarValue::Int(5)));
        assert!(not_eq.evaluate_filters(&filters));

        let stats = vec![Statistics::empty(crate::schema::ScalarType::Int)];
        let not_is_null = Predicate::not(Predicate::IsNull(ColumnRef::Bound(0)));
        assert!(not_is_null.evaluate_stats(&stats));
    }
}
