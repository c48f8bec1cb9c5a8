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

//! Reader configuration: string-keyed properties consumed by the planner,
//! parsed and clamped up front so later code never re-validates them.

use std::collections::HashMap;

pub const BUFFER_SIZE_MIN: usize = 4 * 1024;
pub const BUFFER_SIZE_MAX: usize = 16 * 1024 * 1024;
pub const BUFFER_SIZE_DEFAULT: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    buffer_size: usize,
    compression_codec: Option<String>,
    /// Writer-only (rows per stripe); a reader carries it through
    /// unused so round-tripping a writer's configuration doesn't lose it.
    stripe_rows: Option<u32>,
    column_filter_enabled: bool,
    filter_pushdown: bool,
    metadata_count_enabled: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: BUFFER_SIZE_DEFAULT,
            compression_codec: None,
            stripe_rows: None,
            column_filter_enabled: true,
            filter_pushdown: true,
            metadata_count_enabled: true,
        }
    }
}

impl ReaderConfig {
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn compression_codec(&self) -> Option<&str> {
        self.compression_codec.as_deref()
    }

    pub fn stripe_rows(&self) -> Option<u32> {
        self.stripe_rows
    }

    pub fn column_filter_enabled(&self) -> bool {
        self.column_filter_enabled
    }

    pub fn filter_pushdown(&self) -> bool {
        self.filter_pushdown
    }

    pub fn metadata_count_enabled(&self) -> bool {
        self.metadata_count_enabled
    }

    /// Builds a config from string properties (spec section 6). Every key
    /// is optional; `buffer_size` is always clamped to
    /// `[BUFFER_SIZE_MIN, BUFFER_SIZE_MAX]`, including when the configured
    /// value under- or over-shoots the range.
    pub fn from_props(props: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = props.get("buffer_size") {
            if let Ok(parsed) = raw.parse::<usize>() {
                config.buffer_size = parsed.clamp(BUFFER_SIZE_MIN, BUFFER_SIZE_MAX);
            }
        }
        if let Some(codec) = props.get("compression_codec") {
            config.compression_codec = Some(codec.clone());
        }
        if let Some(rows) = props.get("stripe_rows").and_then(|v| v.parse().ok()) {
            config.stripe_rows = Some(rows);
        }
        if let Some(flag) = props.get("column_filter_enabled").and_then(|v| v.parse().ok()) {
            config.column_filter_enabled = flag;
        }
        if let Some(flag) = props.get("filter_pushdown").and_then(|v| v.parse().ok()) {
            config.filter_pushdown = flag;
        }
        if let Some(flag) = props
            .get("metadata_count_enabled")
            .and_then(|v| v.parse().ok())
        {
            config.metadata_count_enabled = flag;
        }
        config
    }
}
