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

// Adapted from the block-compressed stream handling used to read stripe
// payloads: a stream is a sequence of blocks, each prefixed with a 3-byte
// header giving its length and whether it's stored raw or compressed.
//! The block-compressed stream abstraction the stripe reader is built on:
//! [`BlockStream`] exposes `read_fully`, decoding every block of a stripe's
//! compressed byte range into one contiguous buffer.

use std::io::Read;

use bytes::{Bytes, BytesMut};
use fallible_streaming_iterator::FallibleStreamingIterator;
use snafu::ResultExt;

use crate::error::{self, CorruptHeaderSnafu, Result, RiffError};

const DEFAULT_COMPRESSION_BLOCK_SIZE: u64 = 256 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionType {
    Zlib,
    Snappy,
    Lzo,
    Lz4,
    Zstd,
}

#[derive(Clone, Copy, Debug)]
pub struct Compression {
    compression_type: CompressionType,
    /// No decompressed block will exceed this size; used to size scratch
    /// buffers up front.
    max_decompressed_block_size: usize,
}

impl Compression {
    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    /// Resolves the `compression_codec` configuration value (spec section 6)
    /// to a concrete codec, or `None` for `"none"`/absent.
    pub fn from_codec_name(name: &str, compression_block_size: Option<u64>) -> Result<Option<Self>> {
        let max_decompressed_block_size =
            compression_block_size.unwrap_or(DEFAULT_COMPRESSION_BLOCK_SIZE) as usize;
        let compression_type = match name {
            "" | "none" => return Ok(None),
            "zlib" => CompressionType::Zlib,
            "snappy" => CompressionType::Snappy,
            "lzo" => CompressionType::Lzo,
            "lz4" => CompressionType::Lz4,
            "zstd" => CompressionType::Zstd,
            other => {
                return CorruptHeaderSnafu {
                    msg: format!("unknown compression codec '{other}'"),
                }
                .fail()
            }
        };
        Ok(Some(Self {
            compression_type,
            max_decompressed_block_size,
        }))
    }
}

/// Indicates length of block and whether it's compressed or not.
#[derive(Debug, PartialEq, Eq)]
enum BlockHeader {
    Original(u32),
    Compressed(u32),
}

fn decode_header(bytes: [u8; 3]) -> BlockHeader {
    let bytes = [bytes[0], bytes[1], bytes[2], 0];
    let length_and_flag = u32::from_le_bytes(bytes);
    let is_original = length_and_flag & 1 == 1;
    let length = length_and_flag >> 1;
    if is_original {
        BlockHeader::Original(length)
    } else {
        BlockHeader::Compressed(length)
    }
}

trait BlockDecoder: Send {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()>;
}

struct Zlib;
struct Zstd;
struct Snappy;
struct Lzo;
struct Lz4 {
    max_decompressed_block_size: usize,
}

impl BlockDecoder for Zlib {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let mut gz = flate2::read::DeflateDecoder::new(compressed_bytes);
        scratch.clear();
        gz.read_to_end(scratch).context(error::IoErrorSnafu)?;
        Ok(())
    }
}

impl BlockDecoder for Zstd {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let mut reader =
            zstd::Decoder::new(compressed_bytes).context(error::BuildZstdDecoderSnafu)?;
        scratch.clear();
        reader.read_to_end(scratch).context(error::IoErrorSnafu)?;
        Ok(())
    }
}

impl BlockDecoder for Snappy {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let len =
            snap::raw::decompress_len(compressed_bytes).context(error::BuildSnappyDecoderSnafu)?;
        scratch.resize(len, 0);
        let mut decoder = snap::raw::Decoder::new();
        decoder
            .decompress(compressed_bytes, scratch)
            .context(error::BuildSnappyDecoderSnafu)?;
        Ok(())
    }
}

impl BlockDecoder for Lzo {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let decompressed = lzokay_native::decompress_all(compressed_bytes, None)
            .context(error::BuildLzoDecoderSnafu)?;
        scratch.clear();
        scratch.extend(decompressed);
        Ok(())
    }
}

impl BlockDecoder for Lz4 {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let decompressed =
            lz4_flex::block::decompress(compressed_bytes, self.max_decompressed_block_size)
                .context(error::BuildLz4DecoderSnafu)?;
        scratch.clear();
        scratch.extend(decompressed);
        Ok(())
    }
}

fn decoder_for(compression: Compression) -> Box<dyn BlockDecoder> {
    match compression.compression_type {
        CompressionType::Zlib => Box::new(Zlib),
        CompressionType::Snappy => Box::new(Snappy),
        CompressionType::Lzo => Box::new(Lzo),
        CompressionType::Lz4 => Box::new(Lz4 {
            max_decompressed_block_size: compression.max_decompressed_block_size,
        }),
        CompressionType::Zstd => Box::new(Zstd),
    }
}

enum BlockState {
    Original(Bytes),
    Decoded(Vec<u8>),
}

struct BlockIter {
    remaining: BytesMut,
    current: Option<BlockState>,
    decoder: Option<Box<dyn BlockDecoder>>,
    scratch: Vec<u8>,
}

impl BlockIter {
    fn new(bytes: Bytes, compression: Option<Compression>) -> Self {
        Self {
            remaining: BytesMut::from(bytes.as_ref()),
            current: None,
            decoder: compression.map(decoder_for),
            scratch: Vec::new(),
        }
    }
}

impl FallibleStreamingIterator for BlockIter {
    type Item = [u8];
    type Error = RiffError;

    fn advance(&mut self) -> Result<()> {
        if self.remaining.is_empty() {
            self.current = None;
            return Ok(());
        }
        match &self.decoder {
            Some(decoder) => {
                let header = self.remaining.split_to(3);
                let header = [header[0], header[1], header[2]];
                match decode_header(header) {
                    BlockHeader::Original(length) => {
                        let block = self.remaining.split_to(length as usize);
                        self.current = Some(BlockState::Original(block.freeze()));
                    }
                    BlockHeader::Compressed(length) => {
                        let block = self.remaining.split_to(length as usize);
                        decoder.decompress_block(&block, &mut self.scratch)?;
                        self.current = Some(BlockState::Decoded(std::mem::take(&mut self.scratch)));
                    }
                }
                Ok(())
            }
            None => {
                self.current = Some(BlockState::Original(self.remaining.clone().freeze()));
                self.remaining.clear();
                Ok(())
            }
        }
    }

    fn get(&self) -> Option<&Self::Item> {
        self.current.as_ref().map(|x| match x {
            BlockState::Original(x) => x.as_ref(),
            BlockState::Decoded(x) => x.as_ref(),
        })
    }
}

/// A stripe's (or stripe footer's) compressed byte range, exposed as a plain
/// [`Read`]er. Stripe I/O never needs random access within this range: the
/// planner reads one stripe's bytes at a time via [`BlockStream::read_fully`].
pub struct BlockStream {
    blocks: BlockIter,
    offset: usize,
    started: bool,
}

impl BlockStream {
    pub fn new(bytes: Bytes, compression: Option<Compression>) -> Self {
        Self {
            blocks: BlockIter::new(bytes, compression),
            offset: 0,
            started: false,
        }
    }

    /// Decodes every block in this stream and returns the concatenated
    /// decompressed bytes.
    pub fn read_fully(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out).context(error::IoErrorSnafu)?;
        Ok(out)
    }
}

impl Read for BlockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.started {
            self.started = true;
            self.blocks
                .advance()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        }
        let current = match self.blocks.get() {
            Some(current) => {
                if current.len() == self.offset {
                    self.blocks
                        .advance()
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                    self.offset = 0;
                    match self.blocks.get() {
                        Some(current) => current,
                        None => return Ok(0),
                    }
                } else {
                    &self.blocks.get().unwrap()[self.offset..]
                }
            }
            None => return Ok(0),
        };

        let n = current.len().min(buf.len());
        buf[..n].copy_from_slice(&current[..n]);
        self.offset += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_uncompressed_header() {
        let bytes = [0b1011, 0, 0];
        assert_eq!(decode_header(bytes), BlockHeader::Original(5));
    }

    #[test]
    fn decode_compressed_header() {
        let bytes = [0b0100_0000, 0b0000_1101, 0b0000_0011];
        assert_eq!(decode_header(bytes), BlockHeader::Compressed(100_000));
    }

    #[test]
    fn read_fully_passes_through_uncompressed_bytes() {
        let payload = Bytes::from_static(b"hello stripe payload");
        let stream = BlockStream::new(payload.clone(), None);
        let out = stream.read_fully().unwrap();
        assert_eq!(out, payload.to_vec());
    }

    #[test]
    fn unknown_codec_name_is_rejected() {
        let err = Compression::from_codec_name("bogus", None).unwrap_err();
        assert!(matches!(err, RiffError::CorruptHeader { .. }));
    }
}
