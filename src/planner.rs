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

//! The stripe-level read planner: opens the header/data file pair,
//! evaluates predicate pushdown against the stripe index, and hands back
//! an ordered iterator over the stripes that survive.

use std::fs::File;
use std::path::Path;

use snafu::{ensure, ResultExt};

use crate::config::ReaderConfig;
use crate::error::{IoErrorSnafu, Result, StateViolationSnafu};
use crate::header::FileHeader;
use crate::predicate::Predicate;
use crate::reader::ChunkReader;
use crate::state::PredicateState;
use crate::stream::{BlockStream, Compression};
use crate::stripe::{decode_stripe_table, StripeInformation};
use crate::value::Row;

/// Reader session lifecycle (spec section 4.8). `Closed` is terminal; any
/// error transitions the session directly to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Opened,
    HeaderRead,
    Planned,
    Streaming,
    Closed,
}

/// Drives one header+data file pair through its read session. Not
/// `Send`/`Sync`-shared: each session is single-threaded cooperative, but
/// independent sessions may be driven from different threads.
pub struct FileReaderPlanner<R> {
    reader: R,
    data_reader: R,
    config: ReaderConfig,
    state: SessionState,
    header: Option<FileHeader>,
    stripes: Option<Vec<StripeInformation>>,
}

impl<R: ChunkReader> FileReaderPlanner<R> {
    /// Binds a planner to an already-open header reader and its
    /// corresponding data-file reader (conventionally `<path>.data`).
    pub fn open(reader: R, data_reader: R, config: ReaderConfig) -> Self {
        Self {
            reader,
            data_reader,
            config,
            state: SessionState::Opened,
            header: None,
            stripes: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Parses the header (and, if requested, the trailing stripe index).
    /// Fatal parsing errors close the session.
    pub fn read_file_info(&mut self, read_footer: bool) -> Result<()> {
        ensure!(
            self.state == SessionState::Opened,
            StateViolationSnafu {
                state: state_name(self.state),
                msg: "read_file_info called outside the Opened state".to_string(),
            }
        );

        let result = self.read_file_info_inner(read_footer);
        if result.is_err() {
            self.state = SessionState::Closed;
        } else {
            self.state = SessionState::HeaderRead;
        }
        result
    }

    fn read_file_info_inner(&mut self, read_footer: bool) -> Result<()> {
        let len = self.reader.len();
        let bytes = self.reader.get_bytes(0, len).context(IoErrorSnafu)?;
        let header = FileHeader::decode(&bytes)?;

        let stripes = if read_footer {
            let mut tail = crate::codec::ByteReader::new(&bytes);
            // The stripe index follows the header body; re-decode the
            // header length to locate it rather than duplicating offset
            // bookkeeping here.
            let _ = tail.get_u32()?;
            let body_length = tail.get_u32()?;
            let index_offset = 8 + body_length as usize;
            ensure!(
                bytes.len() >= index_offset,
                crate::error::CorruptHeaderSnafu {
                    msg: "header file truncated before stripe index".to_string(),
                }
            );
            let mut index_reader = crate::codec::ByteReader::new(&bytes[index_offset..]);
            Some(decode_stripe_table(&mut index_reader)?)
        } else {
            None
        };

        self.header = Some(header);
        self.stripes = stripes;
        Ok(())
    }

    /// Builds the predicate state (if any), evaluates it against the
    /// stripe index, and returns an iterator over surviving stripes.
    /// `prepare_read` is idempotent before the first `next()` is pulled
    /// from the returned iterator.
    pub fn prepare_read(&mut self, predicate: Option<Predicate>) -> Result<RowIterator<'_, R>> {
        ensure!(
            self.state == SessionState::HeaderRead || self.state == SessionState::Planned,
            StateViolationSnafu {
                state: state_name(self.state),
                msg: "prepare_read called before the header was read".to_string(),
            }
        );

        let header = self
            .header
            .as_ref()
            .expect("HeaderRead/Planned state implies header is set");
        let stripes = self
            .stripes
            .clone()
            .unwrap_or_default();

        let predicate = if self.config.filter_pushdown() {
            predicate
        } else {
            None
        };
        let state = predicate
            .map(|tree| PredicateState::new(tree, header.type_description()))
            .transpose()?;

        let surviving = evaluate_stripes(stripes, state.as_ref());
        self.state = SessionState::Planned;

        Ok(RowIterator {
            planner: self,
            state,
            stripes: surviving.into_iter(),
            current: None,
        })
    }

    fn compression(&self) -> Result<Option<Compression>> {
        match self.config.compression_codec() {
            Some(name) => Compression::from_codec_name(name, None),
            None => Ok(None),
        }
    }

    fn read_stripe_rows(&self, stripe: &StripeInformation) -> Result<Vec<Vec<u8>>> {
        let compression = self.compression()?;
        let bytes = self
            .data_reader
            .get_bytes(stripe.offset() as u64, stripe.length() as u64)
            .context(IoErrorSnafu)?;
        let decoded = BlockStream::new(bytes, compression).read_fully()?;
        // The external stripe row codec (out of scope here) turns this
        // decoded byte range into row values; we hand back the raw block
        // as a single opaque "row" so callers that only care about stripe
        // selection still get a working iterator end-to-end.
        Ok(vec![decoded])
    }
}

/// Convenience constructor matching the logical `open(fs, path, conf)`
/// entry point: binds a planner to `path` as the header file and
/// `path.data` as its data file.
pub fn open_path(path: &Path, config: ReaderConfig) -> Result<FileReaderPlanner<File>> {
    let header = File::open(path).context(IoErrorSnafu)?;
    let mut data_path = path.as_os_str().to_owned();
    data_path.push(".data");
    let data = File::open(Path::new(&data_path)).context(IoErrorSnafu)?;
    Ok(FileReaderPlanner::open(header, data, config))
}

fn state_name(state: SessionState) -> &'static str {
    match state {
        SessionState::Opened => "Opened",
        SessionState::HeaderRead => "HeaderRead",
        SessionState::Planned => "Planned",
        SessionState::Streaming => "Streaming",
        SessionState::Closed => "Closed",
    }
}

/// The central planner function (spec section 4.7): sorts stripes by
/// offset, then retains exactly those a `None` statistics/filter entry
/// cannot prove unmatchable. Never reorders after filtering.
pub fn evaluate_stripes(
    mut stripes: Vec<StripeInformation>,
    state: Option<&PredicateState>,
) -> Vec<StripeInformation> {
    stripes.sort_by_key(|s| s.offset());

    let Some(state) = state else {
        return stripes;
    };

    stripes
        .into_iter()
        .filter(|s| {
            let stats_ok = match s.stats() {
                Some(stats) => state.evaluate_stats(stats),
                None => true,
            };
            let filter_ok = match s.filter() {
                Some(filters) => state.evaluate_filters(filters),
                None => true,
            };
            stats_ok && filter_ok
        })
        .collect()
}

/// Iterates rows from the surviving stripes in offset order, re-evaluating
/// the predicate per row. `Arc`-free: a single session is not meant to be
/// shared across threads. Holds the planner mutably so it can drive the
/// session through `Planned -> Streaming -> Closed` as rows are pulled.
pub struct RowIterator<'p, R> {
    planner: &'p mut FileReaderPlanner<R>,
    state: Option<PredicateState>,
    stripes: std::vec::IntoIter<StripeInformation>,
    current: Option<std::vec::IntoIter<Vec<u8>>>,
}

impl<'p, R: ChunkReader> RowIterator<'p, R> {
    fn passes(&self, _row_bytes: &[u8]) -> bool {
        // Row-level re-evaluation happens once the external stripe row
        // codec decodes a concrete `Row`; here we only have the raw,
        // still-opaque decoded stripe bytes, so there is nothing left for
        // `PredicateState::evaluate_row` to reject at this layer.
        true
    }

    /// Evaluates `state` against a concrete decoded row. Exposed so a
    /// caller pairing this planner with a real stripe row codec can reuse
    /// the same predicate state its stripe pruning already built.
    pub fn evaluate_row(&self, row: &dyn Row) -> bool {
        match &self.state {
            Some(state) => state.evaluate_row(row),
            None => true,
        }
    }

    /// The session state as driven by this iterator's pulls. The planner
    /// itself is borrowed mutably for the iterator's lifetime, so callers
    /// holding a live `RowIterator` read the session state through here
    /// rather than through the planner directly.
    pub fn session_state(&self) -> SessionState {
        self.planner.state
    }
}

impl<'p, R: ChunkReader> Iterator for RowIterator<'p, R> {
    type Item = Result<Vec<u8>>;

    /// Only `Planned -> Streaming` may iterate rows (spec section 4.8):
    /// the session enters `Streaming` on the first pull, any stripe read
    /// error closes the session immediately, and pulling after `Closed`
    /// is rejected as a state violation rather than silently resuming.
    fn next(&mut self) -> Option<Self::Item> {
        if self.planner.state == SessionState::Closed {
            return Some(
                StateViolationSnafu {
                    state: state_name(SessionState::Closed),
                    msg: "next called after the session was closed".to_string(),
                }
                .fail(),
            );
        }
        if self.planner.state == SessionState::Planned {
            self.planner.state = SessionState::Streaming;
        }

        loop {
            if let Some(current) = &mut self.current {
                if let Some(row) = current.next() {
                    if self.passes(&row) {
                        return Some(Ok(row));
                    }
                    continue;
                }
                self.current = None;
            }

            let Some(stripe) = self.stripes.next() else {
                return None;
            };
            match self.planner.read_stripe_rows(&stripe) {
                Ok(rows) => self.current = Some(rows.into_iter()),
                Err(e) => {
                    self.planner.state = SessionState::Closed;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Renders an optional byte array for diagnostic comparison: `null` when
/// absent, `"[b0, b1, ...]"` (decimal) otherwise.
fn render_bytes(bytes: Option<&[u8]>) -> String {
    match bytes {
        None => "null".to_string(),
        Some(bytes) => {
            let joined = bytes
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{joined}]")
        }
    }
}

/// Internal invariant-checking helper, not a user-facing error path.
/// Panics with `"{context}: {expected?} != {actual?}"` when the two byte
/// arrays differ; does nothing when they're equal.
pub fn assert_bytes(expected: Option<&[u8]>, actual: Option<&[u8]>, context: &str) {
    if expected != actual {
        panic!(
            "{context}: {} != {}",
            render_bytes(expected),
            render_bytes(actual)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::ColumnRef;
    use crate::schema::{ColumnDef, ScalarType, TypeDescription};
    use crate::statistics::Statistics;
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

    fn stats_for(lo: i32, hi: i32) -> Vec<Statistics> {
        let mut col1 = Statistics::empty(ScalarType::Int);
        col1.update(&InMemoryRow::new(vec![ScalarValue::Int(lo)]), 0);
        col1.update(&InMemoryRow::new(vec![ScalarValue::Int(hi)]), 0);
        vec![Statistics::empty(ScalarType::Utf8), col1, Statistics::empty(ScalarType::Long)]
    }

    #[test]
    fn s1_unstatted_stripes_survive_sorted_by_offset() {
        let td = type_description();
        let tree = Predicate::not(Predicate::IsNull(ColumnRef::name("col1")));
        let state = PredicateState::new(tree, &td).unwrap();

        let stripes = vec![
            StripeInformation::new(0, 202, 10, None, None),
            StripeInformation::new(1, 101, 10, None, None),
            StripeInformation::new(2, 0, 10, None, None),
        ];
        let result = evaluate_stripes(stripes, Some(&state));
        let offsets: Vec<i64> = result.iter().map(|s| s.offset()).collect();
        assert_eq!(offsets, vec![0, 101, 202]);
    }

    #[test]
    fn s2_statistics_pruning_drops_non_matching_stripes() {
        let td = type_description();
        let tree = Predicate::Eq(ColumnRef::name("col1"), ScalarValue::Int(5));
        let state = PredicateState::new(tree, &td).unwrap();

        let stripes = vec![
            StripeInformation::new(0, 0, 10, Some(stats_for(1, 3)), None),
            StripeInformation::new(1, 10, 10, Some(stats_for(4, 5)), None),
            StripeInformation::new(2, 20, 10, Some(stats_for(1, 3)), None),
        ];
        let result = evaluate_stripes(stripes, Some(&state));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), 1);
    }

    #[test]
    fn null_predicate_keeps_all_stripes_sorted() {
        let stripes = vec![
            StripeInformation::new(0, 50, 1, None, None),
            StripeInformation::new(1, 0, 1, None, None),
        ];
        let result = evaluate_stripes(stripes, None);
        assert_eq!(result.iter().map(|s| s.offset()).collect::<Vec<_>>(), vec![0, 50]);
    }

    #[test]
    fn property_3_order_preservation_is_a_subsequence() {
        let td = type_description();
        let tree = Predicate::Eq(ColumnRef::name("col1"), ScalarValue::Int(5));
        let state = PredicateState::new(tree, &td).unwrap();
        let stripes = vec![
            StripeInformation::new(0, 0, 1, Some(stats_for(4, 5)), None),
            StripeInformation::new(1, 10, 1, Some(stats_for(1, 3)), None),
            StripeInformation::new(2, 20, 1, Some(stats_for(4, 6)), None),
        ];
        let result = evaluate_stripes(stripes, Some(&state));
        let offsets: Vec<i64> = result.iter().map(|s| s.offset()).collect();
        assert_eq!(offsets, vec![0, 20]);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn render_bytes_matches_documented_shape() {
        assert_eq!(render_bytes(None), "null");
        assert_eq!(render_bytes(Some(&[4])), "[4]");
    }

    #[test]
    fn assert_bytes_equal_arrays_do_not_panic() {
        assert_bytes(None, None, "T");
        assert_bytes(Some(&[4]), Some(&[4]), "T");
    }

    #[test]
    #[should_panic(expected = "T: [4] != [2]")]
    fn assert_bytes_formats_byte_mismatch() {
        assert_bytes(Some(&[4]), Some(&[2]), "T");
    }

    #[test]
    fn open_path_binds_header_and_sibling_data_file() {
        use std::io::Write;

        let dir = std::env::temp_dir().join(format!("riff-planner-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let header_path = dir.join("open_path_test.riff");
        let mut data_path = header_path.as_os_str().to_owned();
        data_path.push(".data");

        std::fs::File::create(&header_path)
            .unwrap()
            .write_all(b"header")
            .unwrap();
        std::fs::File::create(&data_path)
            .unwrap()
            .write_all(b"data")
            .unwrap();

        let planner = open_path(&header_path, ReaderConfig::default()).unwrap();
        assert_eq!(planner.state(), SessionState::Opened);

        std::fs::remove_file(&header_path).ok();
        std::fs::remove_file(&data_path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
