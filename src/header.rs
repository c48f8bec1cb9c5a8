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

//! Fixed-layout header file codec (magic, body length, reserved state
//! bytes, type description, properties map).

use std::collections::HashMap;

use crate::codec::{ByteReader, ByteWriter, MAX_FIELD_LEN};
use crate::error::{CorruptHeaderSnafu, Result};
use crate::schema::TypeDescription;
use snafu::ensure;

/// Fixed format tag; a mismatch at decode time is always `CorruptHeader`.
pub const MAGIC: u32 = 0x52494646; // "RIFF"

/// `{ state, type_description, properties }` (spec section 4.5). `state`
/// is eight reserved flag bytes whose meaning this codec does not
/// interpret; callers are free to use them as they see fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    state: [u8; 8],
    type_description: TypeDescription,
    properties: Option<HashMap<String, String>>,
}

impl FileHeader {
    pub fn new(
        state: [u8; 8],
        type_description: TypeDescription,
        properties: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            state,
            type_description,
            properties,
        }
    }

    pub fn state(&self) -> &[u8; 8] {
        &self.state
    }

    pub fn type_description(&self) -> &TypeDescription {
        &self.type_description
    }

    pub fn properties(&self) -> Option<&HashMap<String, String>> {
        self.properties.as_ref()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = ByteWriter::new();
        body.put_bytes(&self.state);
        self.type_description.encode(&mut body);
        match &self.properties {
            None => body.put_i32(-1),
            Some(props) => {
                body.put_i32(props.len() as i32);
                for (k, v) in props {
                    body.put_str(k);
                    body.put_str(v);
                }
            }
        }
        let mut body = body.into_inner();
        // The body is 8-byte aligned at its end (spec section 4.5) and
        // `body_length` is measured after this padding, so whatever follows
        // the header (the stripe index) starts on an 8-byte boundary.
        let padding = (8 - body.len() % 8) % 8;
        body.extend(std::iter::repeat(0u8).take(padding));

        let mut out = ByteWriter::new();
        out.put_u32(MAGIC);
        out.put_u32(body.len() as u32);
        out.put_bytes(&body);
        out.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let magic = r.get_u32()?;
        ensure!(
            magic == MAGIC,
            CorruptHeaderSnafu {
                msg: format!("magic mismatch: expected {MAGIC:#x}, found {magic:#x}"),
            }
        );
        let body_length = r.get_u32()?;
        ensure!(
            body_length as i64 <= MAX_FIELD_LEN as i64 * 4,
            CorruptHeaderSnafu {
                msg: format!("header body length {body_length} exceeds configured cap"),
            }
        );
        ensure!(
            r.remaining() >= body_length as usize,
            CorruptHeaderSnafu {
                msg: format!(
                    "truncated header body: expected {body_length} bytes, found {}",
                    r.remaining()
                ),
            }
        );

        let remaining_before_body = r.remaining();

        let mut state = [0u8; 8];
        state.copy_from_slice(&r.get_bytes(8)?);
        let type_description = TypeDescription::decode(&mut r)?;
        let props_count = r.get_i32()?;
        let properties = if props_count < 0 {
            None
        } else {
            let mut props = HashMap::with_capacity(props_count as usize);
            for _ in 0..props_count {
                let key = r.get_str()?;
                let value = r.get_str()?;
                props.insert(key, value);
            }
            Some(props)
        };

        // Skip the padding that aligned the body to an 8-byte boundary at
        // encode time, so a caller continuing to read from `r` (none do
        // today, but the stripe index that follows in the header file
        // relies on `body_length` alone) lands past it rather than inside it.
        let consumed = remaining_before_body - r.remaining();
        ensure!(
            body_length as usize >= consumed,
            CorruptHeaderSnafu {
                msg: format!(
                    "header body shorter than its declared contents: {body_length} < {consumed}"
                ),
            }
        );
        r.get_bytes(body_length as usize - consumed)?;

        Ok(Self {
            state,
            type_description,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ScalarType};

    fn sample() -> FileHeader {
        let schema = vec![
            ColumnDef::new("a", ScalarType::Utf8, true),
            ColumnDef::new("col2", ScalarType::Int, true),
            ColumnDef::new("c", ScalarType::Long, false),
        ];
        let type_description = TypeDescription::new(&schema, &["col2".to_string()]).unwrap();
        let mut properties = HashMap::new();
        properties.insert("k".to_string(), "v".to_string());
        FileHeader::new([1, 2, 3, 4, 5, 6, 7, 8], type_description, Some(properties))
    }

    #[test]
    fn s3_header_round_trips() {
        let header = sample();
        let bytes = header.encode();
        let decoded = FileHeader::decode(&bytes).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn s4_magic_mismatch_is_corrupt_header() {
        let mut bytes = sample().encode();
        bytes[0] ^= 0xFF;
        let err = FileHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::CorruptHeader { .. }));
    }

    #[test]
    fn body_is_padded_to_an_eight_byte_boundary() {
        let bytes = sample().encode();
        let body_length = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(body_length % 8, 0);
        assert_eq!(bytes.len(), 8 + body_length as usize);

        // Round-trips regardless of whether the unpadded content already
        // happened to land on a boundary.
        let decoded = FileHeader::decode(&bytes).unwrap();
        assert_eq!(sample(), decoded);
    }

    #[test]
    fn no_properties_round_trips_as_none() {
        let schema = vec![ColumnDef::new("a", ScalarType::Int, false)];
        let type_description = TypeDescription::new(&schema, &[]).unwrap();
        let header = FileHeader::new([0; 8], type_description, None);
        let decoded = FileHeader::decode(&header.encode()).unwrap();
        assert_eq!(header, decoded);
        assert!(decoded.properties().is_none());
    }

    #[test]
    fn truncated_body_is_corrupt_header() {
        let bytes = sample().encode();
        let truncated = &bytes[..bytes.len() - 4];
        let err = FileHeader::decode(truncated).unwrap_err();
        assert!(matches!(err, crate::error::RiffError::CorruptHeader { .. }));
    }
}
