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

//! Scalar type tags and the column layout ([`TypeDescription`]) that backs
//! statistics, column filters, predicate binding and the header codec.

use std::collections::HashSet;

use snafu::ensure;

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CorruptHeaderSnafu, Result, SchemaErrorSnafu, UnknownColumnSnafu};

/// The closed scalar type set. Discriminants are the stable on-disk tags
/// used by the type description codec (spec section 4.5) — never reorder
/// these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Null = 0,
    Boolean = 1,
    Byte = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Utf8 = 6,
    Date = 7,
    Timestamp = 8,
}

impl ScalarType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        let ty = match tag {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::Byte,
            3 => Self::Short,
            4 => Self::Int,
            5 => Self::Long,
            6 => Self::Utf8,
            7 => Self::Date,
            8 => Self::Timestamp,
            other => {
                return CorruptHeaderSnafu {
                    msg: format!("unknown scalar type tag {other}"),
                }
                .fail()
            }
        };
        Ok(ty)
    }

    /// `Null` has no total order and cannot back an indexed column.
    pub fn is_orderable(self) -> bool {
        !matches!(self, Self::Null)
    }
}

/// One named column in a [`TypeDescription`].
///
/// `position` is this column's ordinal in the reordered read layout
/// (indexed columns first); `orig_position` is its ordinal in the
/// caller-supplied schema and is preserved through round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    name: String,
    data_type: ScalarType,
    nullable: bool,
    indexed: bool,
    position: usize,
    orig_position: usize,
    /// Opaque extension slot named by the header codec (spec section 4.5)
    /// but not part of the logical data model (spec section 3). Readers
    /// that don't understand it just carry it through unchanged.
    metadata: String,
}

impl TypeSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> ScalarType {
        self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn indexed(&self) -> bool {
        self.indexed
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn orig_position(&self) -> usize {
        self.orig_position
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }
}

/// Caller-supplied column definition, before indexed-first reordering.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: ScalarType,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: ScalarType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Ordered sequence of [`TypeSpec`]s: indexed columns occupy a contiguous
/// prefix (stable by original position), followed by the remaining columns
/// in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    specs: Vec<TypeSpec>,
}

impl TypeDescription {
    pub fn new(schema: &[ColumnDef], indexed_names: &[String]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(schema.len());
        for col in schema {
            ensure!(
                seen.insert(col.name.as_str()),
                SchemaErrorSnafu {
                    msg: format!("duplicate column name '{}'", col.name),
                }
            );
        }

        let names: HashSet<&str> = schema.iter().map(|c| c.name.as_str()).collect();
        for indexed in indexed_names {
            ensure!(
                names.contains(indexed.as_str()),
                SchemaErrorSnafu {
                    msg: format!("indexed column '{indexed}' not present in schema"),
                }
            );
        }
        let indexed_set: HashSet<&str> = indexed_names.iter().map(String::as_str).collect();

        for col in schema {
            if indexed_set.contains(col.name.as_str()) {
                ensure!(
                    col.data_type.is_orderable(),
                    SchemaErrorSnafu {
                        msg: format!(
                            "indexed column '{}' has non-orderable type {:?}",
                            col.name, col.data_type
                        ),
                    }
                );
            }
        }

        let mut indexed = Vec::new();
        let mut rest = Vec::new();
        for (orig_position, col) in schema.iter().enumerate() {
            if indexed_set.contains(col.name.as_str()) {
                indexed.push((orig_position, col));
            } else {
                rest.push((orig_position, col));
            }
        }

        let specs = indexed
            .into_iter()
            .chain(rest)
            .enumerate()
            .map(|(position, (orig_position, col))| TypeSpec {
                name: col.name.clone(),
                data_type: col.data_type,
                nullable: col.nullable,
                indexed: indexed_set.contains(col.name.as_str()),
                position,
                orig_position,
                metadata: String::new(),
            })
            .collect();

        Ok(Self { specs })
    }

    pub fn position(&self, name: &str) -> Result<usize> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.position)
            .ok_or_else(|| {
                UnknownColumnSnafu {
                    name: name.to_string(),
                }
                .build()
            })
    }

    /// Panics if `ord >= size()`; callers always derive `ord` from either
    /// `position()` or a previously-bound predicate leaf.
    pub fn at(&self, ord: usize) -> &TypeSpec {
        &self.specs[ord]
    }

    pub fn size(&self) -> usize {
        self.specs.len()
    }

    pub fn num_indexed(&self) -> usize {
        self.specs.iter().filter(|s| s.indexed).count()
    }

    pub fn specs(&self) -> &[TypeSpec] {
        &self.specs
    }

    pub(crate) fn encode(&self, w: &mut ByteWriter) {
        w.put_i32(self.specs.len() as i32);
        for spec in &self.specs {
            w.put_u8(spec.indexed as u8);
            w.put_i32(spec.position as i32);
            w.put_i32(spec.orig_position as i32);
            w.put_u8(spec.nullable as u8);
            w.put_str(&spec.name);
            w.put_u8(spec.data_type.tag());
            w.put_str(&spec.metadata);
        }
    }

    pub(crate) fn decode(r: &mut ByteReader) -> Result<Self> {
        let count = r.get_i32()?;
        ensure!(
            count >= 0,
            CorruptHeaderSnafu {
                msg: format!("negative type description count {count}"),
            }
        );
        let mut specs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let indexed = r.get_u8()? != 0;
            let position = r.get_i32()?;
            let orig_position = r.get_i32()?;
            let nullable = r.get_u8()? != 0;
            let name = r.get_str()?;
            let data_type = ScalarType::from_tag(r.get_u8()?)?;
            let metadata = r.get_str()?;
            ensure!(
                position >= 0 && orig_position >= 0,
                CorruptHeaderSnafu {
                    msg: "negative position in type description".to_string(),
                }
            );
            specs.push(TypeSpec {
                name,
                data_type,
                nullable,
                indexed,
                position: position as usize,
                orig_position: orig_position as usize,
                metadata,
            });
        }
        Ok(Self { specs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("a", ScalarType::Utf8, true),
            ColumnDef::new("b", ScalarType::Int, false),
            ColumnDef::new("c", ScalarType::Long, true),
        ]
    }

    #[test]
    fn reorders_indexed_columns_first() {
        let td = TypeDescription::new(&schema(), &["c".to_string()]).unwrap();
        assert_eq!(td.size(), 3);
        assert_eq!(td.num_indexed(), 1);
        assert_eq!(td.position("c").unwrap(), 0);
        assert_eq!(td.position("a").unwrap(), 1);
        assert_eq!(td.position("b").unwrap(), 2);
        assert_eq!(td.at(0).orig_position(), 2);
        assert_eq!(td.at(1).orig_position(), 0);
        assert_eq!(td.at(2).orig_position(), 1);
    }

    #[test]
    fn stable_within_indexed_group() {
        let schema = vec![
            ColumnDef::new("x", ScalarType::Int, false),
            ColumnDef::new("y", ScalarType::Int, false),
            ColumnDef::new("z", ScalarType::Int, false),
        ];
        let td = TypeDescription::new(&schema, &["z".to_string(), "x".to_string()]).unwrap();
        // indexed group keeps original relative order: x before z
        assert_eq!(td.position("x").unwrap(), 0);
        assert_eq!(td.position("z").unwrap(), 1);
        assert_eq!(td.position("y").unwrap(), 2);
    }

    #[test]
    fn rejects_unknown_indexed_name() {
        let err = TypeDescription::new(&schema(), &["ghost".to_string()]).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::SchemaError { .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let schema = vec![
            ColumnDef::new("a", ScalarType::Int, false),
            ColumnDef::new("a", ScalarType::Long, false),
        ];
        let err = TypeDescription::new(&schema, &[]).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::SchemaError { .. }));
    }

    #[test]
    fn rejects_non_orderable_indexed_column() {
        let schema = vec![ColumnDef::new("a", ScalarType::Null, true)];
        let err = TypeDescription::new(&schema, &["a".to_string()]).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::SchemaError { .. }));
    }

    #[test]
    fn position_unknown_column_fails() {
        let td = TypeDescription::new(&schema(), &[]).unwrap();
        let err = td.position("ghost").unwrap_err();
        assert!(matches!(err, crate::error::RiffError::UnknownColumn { .. }));
    }

    #[test]
    fn round_trips_through_codec() {
        let td = TypeDescription::new(&schema(), &["c".to_string()]).unwrap();
        let mut w = ByteWriter::new();
        td.encode(&mut w);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let decoded = TypeDescription::decode(&mut r).unwrap();
        assert_eq!(td, decoded);
    }
}
