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

use std::io;

use snafu::prelude::*;
use snafu::Location;

use crate::schema::ScalarType;

/// Closed error taxonomy for the reader. Parsing and binding failures are
/// fatal to the owning session (see [`crate::planner::SessionState`]).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RiffError {
    #[snafu(display("Corrupt header: {}", msg))]
    CorruptHeader {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Schema error: {}",
        msg
    ))]
    SchemaError {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unknown column: {}", name))]
    UnknownColumn {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Type mismatch: column '{}' is {:?}, literal is {:?}",
        name,
        column_type,
        literal_type
    ))]
    TypeMismatch {
        name: String,
        column_type: ScalarType,
        literal_type: ScalarType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("I/O error: {}", source))]
    IoError {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid operation in state {:?}: {}", state, msg))]
    StateViolation {
        state: &'static str,
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to build zstd decoder: {}", source))]
    BuildZstdDecoder {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to build snappy decoder: {}", source))]
    BuildSnappyDecoder {
        source: snap::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to build lzo decoder: {}", source))]
    BuildLzoDecoder {
        source: lzokay_native::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to build lz4 decoder: {}", source))]
    BuildLz4Decoder {
        source: lz4_flex::block::DecompressError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = RiffError> = std::result::Result<T, E>;
