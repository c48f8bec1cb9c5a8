//! Small big-endian binary cursor shared by the header, type description and
//! stripe-index codecs (spec sections 4.5 and 4.6 both use the same framing:
//! fixed-width integers plus `i32`-length-prefixed byte strings).

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{CorruptHeaderSnafu, Result};
use snafu::ensure;

/// Caps any single length-prefixed field we decode, so a corrupt or
/// adversarial header cannot make us attempt a multi-gigabyte allocation.
pub const MAX_FIELD_LEN: i32 = 64 * 1024 * 1024;

#[derive(Default)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// `i32` length prefix followed by the raw bytes.
    pub fn put_len_bytes(&mut self, bytes: &[u8]) {
        self.put_i32(bytes.len() as i32);
        self.put_bytes(bytes);
    }

    pub fn put_str(&mut self, s: &str) {
        self.put_len_bytes(s.as_bytes());
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn require(&self, n: usize) -> Result<()> {
        ensure!(
            self.buf.remaining() >= n,
            CorruptHeaderSnafu {
                msg: format!("expected {n} more bytes, found {}", self.buf.remaining()),
            }
        );
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        self.require(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.require(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        self.require(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn get_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.require(n)?;
        let mut out = vec![0u8; n];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// `i32` length prefix followed by the raw bytes; `-1` is reserved by
    /// callers (e.g. the properties map) to mean "absent" and is rejected
    /// here since a byte-string length can never be negative.
    pub fn get_len_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.get_i32()?;
        ensure!(
            (0..=MAX_FIELD_LEN).contains(&len),
            CorruptHeaderSnafu {
                msg: format!("invalid length-prefixed field length {len}"),
            }
        );
        self.get_bytes(len as usize)
    }

    pub fn get_str(&mut self) -> Result<String> {
        let bytes = self.get_len_bytes()?;
        String::from_utf8(bytes).map_err(|e| {
            CorruptHeaderSnafu {
                msg: format!("invalid utf-8: {e}"),
            }
            .build()
        })
    }
}
