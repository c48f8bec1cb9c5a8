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

//! Stripe index: one entry per stripe, carrying its data-file location plus
//! the optional per-indexed-column statistics and bloom filters the planner
//! uses for pushdown (spec section 4.6).

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CorruptHeaderSnafu, Result};
use crate::filter::BloomColumnFilter;
use crate::statistics::Statistics;
use snafu::ensure;

/// One stripe's location in the data file, plus whatever pushdown summaries
/// were written for it. `stats`/`filter`, when present, have exactly
/// `num_indexed` entries, aligned by ordinal to the type description.
#[derive(Debug, Clone, PartialEq)]
pub struct StripeInformation {
    id: u8,
    offset: i64,
    length: i32,
    stats: Option<Vec<Statistics>>,
    filter: Option<Vec<BloomColumnFilter>>,
}

impl StripeInformation {
    pub fn new(
        id: u8,
        offset: i64,
        length: i32,
        stats: Option<Vec<Statistics>>,
        filter: Option<Vec<BloomColumnFilter>>,
    ) -> Self {
        Self {
            id,
            offset,
            length,
            stats,
            filter,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn stats(&self) -> Option<&[Statistics]> {
        self.stats.as_deref()
    }

    pub fn filter(&self) -> Option<&[BloomColumnFilter]> {
        self.filter.as_deref()
    }

    fn encode(&self, w: &mut ByteWriter) {
        w.put_u8(self.id);
        w.put_i64(self.offset);
        w.put_i32(self.length);
        match &self.stats {
            None => w.put_u8(0),
            Some(stats) => {
                w.put_u8(1);
                w.put_i32(stats.len() as i32);
                for s in stats {
                    s.encode(w);
                }
            }
        }
        match &self.filter {
            None => w.put_u8(0),
            Some(filters) => {
                w.put_u8(1);
                w.put_i32(filters.len() as i32);
                for f in filters {
                    f.encode(w);
                }
            }
        }
    }

    fn decode(r: &mut ByteReader) -> Result<Self> {
        let id = r.get_u8()?;
        let offset = r.get_i64()?;
        let length = r.get_i32()?;
        ensure!(
            length >= 0,
            CorruptHeaderSnafu {
                msg: format!("negative stripe length {length}"),
            }
        );

        let stats = if r.get_u8()? == 0 {
            None
        } else {
            let count = r.get_i32()?;
            ensure!(
                count >= 0,
                CorruptHeaderSnafu {
                    msg: format!("negative stripe statistics count {count}"),
                }
            );
            let mut stats = Vec::with_capacity(count as usize);
            for _ in 0..count {
                stats.push(Statistics::decode(r)?);
            }
            Some(stats)
        };

        let filter = if r.get_u8()? == 0 {
            None
        } else {
            let count = r.get_i32()?;
            ensure!(
                count >= 0,
                CorruptHeaderSnafu {
                    msg: format!("negative stripe filter count {count}"),
                }
            );
            let mut filters = Vec::with_capacity(count as usize);
            for _ in 0..count {
                filters.push(BloomColumnFilter::decode(r)?);
            }
            Some(filters)
        };

        Ok(Self {
            id,
            offset,
            length,
            stats,
            filter,
        })
    }
}

/// Encodes the trailing stripe index block: `num_stripes: i32` followed by
/// each stripe entry in the order given.
pub fn encode_stripe_table(stripes: &[StripeInformation], w: &mut ByteWriter) {
    w.put_i32(stripes.len() as i32);
    for stripe in stripes {
        stripe.encode(w);
    }
}

pub fn decode_stripe_table(r: &mut ByteReader) -> Result<Vec<StripeInformation>> {
    let count = r.get_i32()?;
    ensure!(
        count >= 0,
        CorruptHeaderSnafu {
            msg: format!("negative stripe count {count}"),
        }
    );
    let mut stripes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        stripes.push(StripeInformation::decode(r)?);
    }
    Ok(stripes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;
    use crate::value::{InMemoryRow, ScalarValue};

    fn stats(lo: i64, hi: i64) -> Statistics {
        let mut s = Statistics::empty(ScalarType::Long);
        s.update(&InMemoryRow::new(vec![ScalarValue::Long(lo)]), 0);
        s.update(&InMemoryRow::new(vec![ScalarValue::Long(hi)]), 0);
        s
    }

    #[test]
    fn round_trips_stripe_table() {
        let stripes = vec![
            StripeInformation::new(0, 0, 100, Some(vec![stats(1, 3)]), None),
            StripeInformation::new(1, 100, 50, None, None),
        ];
        let mut w = ByteWriter::new();
        encode_stripe_table(&stripes, &mut w);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let decoded = decode_stripe_table(&mut r).unwrap();
        assert_eq!(stripes, decoded);
    }

    #[test]
    fn rejects_negative_length() {
        let mut w = ByteWriter::new();
        w.put_i32(1);
        w.put_u8(0);
        w.put_i64(0);
        w.put_i32(-1);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let err = decode_stripe_table(&mut r).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::CorruptHeader { .. }));
    }
}
