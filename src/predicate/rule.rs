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

//! Standard [`super::Rule`] implementations: name-to-ordinal binding,
//! boolean-algebra simplification, and trivial-tree detection.

use snafu::ensure;

use crate::error::{Result, TypeMismatchSnafu};
use crate::schema::{ScalarType, TypeDescription};

use super::{ColumnRef, Predicate, Rule};

/// Rewrites every unbound `(name, ...)` leaf to `(ordinal, ...)` by looking
/// the name up in a [`TypeDescription`], and checks each leaf's literal
/// type against the column's declared scalar type. Leaves already bound
/// (ordinal present) pass through unchanged, which is what makes applying
/// the same `Binder` twice a no-op.
pub struct Binder<'a> {
    type_description: &'a TypeDescription,
}

impl<'a> Binder<'a> {
    pub fn new(type_description: &'a TypeDescription) -> Self {
        Self { type_description }
    }

    fn bind(&self, col: ColumnRef) -> Result<ColumnRef> {
        match col {
            ColumnRef::Bound(ord) => Ok(ColumnRef::Bound(ord)),
            ColumnRef::Unbound(name) => {
                let ord = self.type_description.position(&name)?;
                Ok(ColumnRef::Bound(ord))
            }
        }
    }

    fn check_type(&self, ord: usize, literal_type: ScalarType) -> Result<()> {
        let spec = self.type_description.at(ord);
        ensure!(
            spec.data_type() == literal_type,
            TypeMismatchSnafu {
                name: spec.name().to_string(),
                column_type: spec.data_type(),
                literal_type,
            }
        );
        Ok(())
    }
}

impl<'a> Rule for Binder<'a> {
    fn apply(&mut self, node: Predicate) -> Result<Predicate> {
        let node = match node {
            Predicate::Eq(col, lit) => {
                let col = self.bind(col)?;
                self.check_type(col.ordinal().unwrap(), lit.data_type())?;
                Predicate::Eq(col, lit)
            }
            Predicate::Gt(col, lit) => {
                let col = self.bind(col)?;
                self.check_type(col.ordinal().unwrap(), lit.data_type())?;
                Predicate::Gt(col, lit)
            }
            Predicate::Lt(col, lit) => {
                let col = self.bind(col)?;
                self.check_type(col.ordinal().unwrap(), lit.data_type())?;
                Predicate::Lt(col, lit)
            }
            Predicate::Ge(col, lit) => {
                let col = self.bind(col)?;
                self.check_type(col.ordinal().unwrap(), lit.data_type())?;
                Predicate::Ge(col, lit)
            }
            Predicate::Le(col, lit) => {
                let col = self.bind(col)?;
                self.check_type(col.ordinal().unwrap(), lit.data_type())?;
                Predicate::Le(col, lit)
            }
            Predicate::In(col, set) => {
                let col = self.bind(col)?;
                let ord = col.ordinal().unwrap();
                for lit in &set {
                    self.check_type(ord, lit.data_type())?;
                }
                Predicate::In(col, set)
            }
            Predicate::IsNull(col) => Predicate::IsNull(self.bind(col)?),
            other => other,
        };
        Ok(node)
    }
}

/// Folds boolean-algebra identities bottom-up. Because [`Predicate::transform`]
/// already simplified both children before calling `apply` on a logical
/// node, each match arm only has to consider already-simplified children.
pub struct Simplifier;

impl Simplifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `b` is the structural negation of `a` (or vice versa), used to
/// fold `And(x, Not(x)) -> False` and `Or(x, Not(x)) -> True`.
fn is_negation(a: &Predicate, b: &Predicate) -> bool {
    matches!(b, Predicate::Not(inner) if inner.as_ref() == a)
        || matches!(a, Predicate::Not(inner) if inner.as_ref() == b)
}

impl Rule for Simplifier {
    fn apply(&mut self, node: Predicate) -> Result<Predicate> {
        let node = match node {
            Predicate::And(l, r) => match (*l, *r) {
                (Predicate::False, _) | (_, Predicate::False) => Predicate::False,
                (Predicate::True, x) | (x, Predicate::True) => x,
                (l, r) if is_negation(&l, &r) => Predicate::False,
                (l, r) => Predicate::and(l, r),
            },
            Predicate::Or(l, r) => match (*l, *r) {
                (Predicate::True, _) | (_, Predicate::True) => Predicate::True,
                (Predicate::False, x) | (x, Predicate::False) => x,
                (l, r) if is_negation(&l, &r) => Predicate::True,
                (l, r) => Predicate::or(l, r),
            },
            Predicate::Not(c) => match *c {
                Predicate::True => Predicate::False,
                Predicate::False => Predicate::True,
                Predicate::Not(inner) => *inner,
                other => Predicate::not(other),
            },
            other => other,
        };
        Ok(node)
    }
}

/// The outcome of inspecting a (simplified) tree's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trivial {
    True,
    False,
    None,
}

/// Reports whether a tree reduced entirely to `True` or `False`. Meant to
/// run after [`Simplifier`]; it does not itself rewrite anything.
pub struct TrivialDetector;

impl TrivialDetector {
    pub fn detect(tree: &Predicate) -> Trivial {
        match tree {
            Predicate::True => Trivial::True,
            Predicate::False => Trivial::False,
            _ => Trivial::None,
        }
    }
}
