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

//! Per-stripe, per-indexed-column membership oracle. A [`ColumnFilter`] may
//! only ever say "definitely absent"; it must never produce a false
//! negative, so equality-flavored predicate leaves can trust a `false`
//! answer enough to skip a stripe outright.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CorruptHeaderSnafu, Result};
use crate::value::ScalarValue;
use snafu::ensure;

/// Abstract set-membership oracle over one indexed column's non-null values
/// within a stripe. `may_contain(v) == false` means `v` is definitely not
/// present; `true` is always a safe (if possibly imprecise) answer.
pub trait ColumnFilter {
    fn may_contain(&self, value: &ScalarValue) -> bool;
}

/// Bloom filter backed by a flat `u64` bitset, mirroring the
/// `num_hash_functions` / `bitset` shape of a conventional on-disk bloom
/// filter message: a hash-function count plus the raw word array, nothing
/// else persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomColumnFilter {
    num_hash_functions: u32,
    bitset: Vec<u64>,
}

impl BloomColumnFilter {
    /// Sizes a filter for `expected_items` entries at target false-positive
    /// probability `fpp`, using the standard optimal-bloom-filter formulas.
    pub fn with_capacity(expected_items: usize, fpp: f64) -> Self {
        let expected_items = expected_items.max(1) as f64;
        let num_bits = (-expected_items * fpp.ln() / (std::f64::consts::LN_2.powi(2))).ceil();
        let num_bits = (num_bits as usize).max(64);
        let num_words = num_bits.div_ceil(64);
        let num_hash_functions =
            ((num_words * 64) as f64 / expected_items * std::f64::consts::LN_2).round() as u32;
        Self {
            num_hash_functions: num_hash_functions.clamp(1, 16),
            bitset: vec![0u64; num_words],
        }
    }

    fn num_bits(&self) -> usize {
        self.bitset.len() * 64
    }

    /// Double hashing (Kirsch-Mitzenmacher): derives `num_hash_functions`
    /// bit positions from two independent 64-bit hashes of the value's
    /// canonical byte encoding.
    fn bit_positions(&self, value: &ScalarValue) -> Vec<usize> {
        let bytes = value.canonical_bytes();
        let mut h1_state = DefaultHasher::new();
        0u64.hash(&mut h1_state);
        bytes.hash(&mut h1_state);
        let h1 = h1_state.finish();

        let mut h2_state = DefaultHasher::new();
        1u64.hash(&mut h2_state);
        bytes.hash(&mut h2_state);
        let h2 = h2_state.finish();

        let num_bits = self.num_bits() as u64;
        (0..self.num_hash_functions)
            .map(|i| (h1.wrapping_add((i as u64).wrapping_mul(h2)) % num_bits) as usize)
            .collect()
    }

    pub fn insert(&mut self, value: &ScalarValue) {
        if value.is_null() {
            return;
        }
        for bit in self.bit_positions(value) {
            self.bitset[bit / 64] |= 1u64 << (bit % 64);
        }
    }

    pub fn may_contain_value(&self, value: &ScalarValue) -> bool {
        if value.is_null() {
            return false;
        }
        self.bit_positions(value)
            .into_iter()
            .all(|bit| self.bitset[bit / 64] & (1u64 << (bit % 64)) != 0)
    }

    pub(crate) fn encode(&self, w: &mut ByteWriter) {
        w.put_u32(self.num_hash_functions);
        w.put_i32(self.bitset.len() as i32);
        for word in &self.bitset {
            w.put_u64(*word);
        }
    }

    pub(crate) fn decode(r: &mut ByteReader) -> Result<Self> {
        let num_hash_functions = r.get_u32()?;
        let num_words = r.get_i32()?;
        ensure!(
            num_words >= 0,
            CorruptHeaderSnafu {
                msg: format!("negative bloom filter word count {num_words}"),
            }
        );
        let mut bitset = Vec::with_capacity(num_words as usize);
        for _ in 0..num_words {
            bitset.push(r.get_u64()?);
        }
        Ok(Self {
            num_hash_functions,
            bitset,
        })
    }
}

impl ColumnFilter for BloomColumnFilter {
    fn may_contain(&self, value: &ScalarValue) -> bool {
        self.may_contain_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_values_are_found() {
        let mut filter = BloomColumnFilter::with_capacity(100, 0.01);
        for v in [1, 2, 3, 42, 1000] {
            filter.insert(&ScalarValue::Long(v));
        }
        for v in [1, 2, 3, 42, 1000] {
            assert!(filter.may_contain(&ScalarValue::Long(v)));
        }
    }

    #[test]
    fn null_never_inserted_or_matched() {
        let mut filter = BloomColumnFilter::with_capacity(10, 0.01);
        filter.insert(&ScalarValue::Null);
        assert!(!filter.may_contain(&ScalarValue::Null));
    }

    #[test]
    fn round_trips_through_codec() {
        let mut filter = BloomColumnFilter::with_capacity(50, 0.05);
        filter.insert(&ScalarValue::Utf8("hello".to_string()));
        let mut w = ByteWriter::new();
        filter.encode(&mut w);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let decoded = BloomColumnFilter::decode(&mut r).unwrap();
        assert_eq!(filter, decoded);
        assert!(decoded.may_contain(&ScalarValue::Utf8("hello".to_string())));
    }
}
