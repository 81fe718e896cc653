//! # Commit Report Wire Codec
//!
//! Fixed-layout big-endian binary encoding of [`CommitReport`]:
//!
//! ```text
//! min: u64 | max: u64 | merkle_root: 32B
//! | gas_count: u32 | (selector: u64, value: 32B) * gas_count
//! | token_count: u32 | (address: 20B, value: 32B) * token_count
//! ```
//!
//! The layout round-trips exactly: `decode(encode(r)) == r`.

use lane_types::{Address, Hash, U256};
use thiserror::Error;

use super::entities::{CommitReport, GasPrice, Interval, TokenPrice};

/// Report encoding/decoding error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the expected field.
    #[error("truncated report: need {need} more bytes for {field}")]
    Truncated {
        /// Field being decoded when input ran out.
        field: &'static str,
        /// Bytes missing.
        need: usize,
    },

    /// Input has bytes left over after a complete report.
    #[error("trailing bytes after report: {0}")]
    TrailingBytes(usize),

    /// A declared list length exceeds the remaining input.
    #[error("implausible {field} count: {count}")]
    ImplausibleCount {
        /// List whose length prefix is implausible.
        field: &'static str,
        /// Declared element count.
        count: u32,
    },
}

/// Encode a commit report into its fixed binary layout.
pub fn encode_commit_report(report: &CommitReport) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        8 + 8 + 32 + 4 + report.gas_prices.len() * 40 + 4 + report.token_prices.len() * 52,
    );
    out.extend_from_slice(&report.interval.min.to_be_bytes());
    out.extend_from_slice(&report.interval.max.to_be_bytes());
    out.extend_from_slice(&report.merkle_root);

    out.extend_from_slice(&(report.gas_prices.len() as u32).to_be_bytes());
    for gas in &report.gas_prices {
        out.extend_from_slice(&gas.dest_chain_selector.to_be_bytes());
        out.extend_from_slice(&u256_be(gas.value));
    }

    out.extend_from_slice(&(report.token_prices.len() as u32).to_be_bytes());
    for token in &report.token_prices {
        out.extend_from_slice(&token.token);
        out.extend_from_slice(&u256_be(token.value));
    }
    out
}

/// Decode a commit report from its fixed binary layout.
pub fn decode_commit_report(bytes: &[u8]) -> Result<CommitReport, CodecError> {
    let mut cursor = Cursor { bytes, pos: 0 };

    let min = cursor.read_u64("interval.min")?;
    let max = cursor.read_u64("interval.max")?;
    let merkle_root: Hash = cursor.read_array("merkle_root")?;

    let gas_count = cursor.read_u32("gas_prices.len")?;
    if gas_count as usize * 40 > cursor.remaining() {
        return Err(CodecError::ImplausibleCount {
            field: "gas_prices",
            count: gas_count,
        });
    }
    let mut gas_prices = Vec::with_capacity(gas_count as usize);
    for _ in 0..gas_count {
        let dest_chain_selector = cursor.read_u64("gas_price.selector")?;
        let value = U256::from_big_endian(&cursor.read_array::<32>("gas_price.value")?);
        gas_prices.push(GasPrice {
            dest_chain_selector,
            value,
        });
    }

    let token_count = cursor.read_u32("token_prices.len")?;
    if token_count as usize * 52 > cursor.remaining() {
        return Err(CodecError::ImplausibleCount {
            field: "token_prices",
            count: token_count,
        });
    }
    let mut token_prices = Vec::with_capacity(token_count as usize);
    for _ in 0..token_count {
        let token: Address = cursor.read_array("token_price.token")?;
        let value = U256::from_big_endian(&cursor.read_array::<32>("token_price.value")?);
        token_prices.push(TokenPrice { token, value });
    }

    if cursor.remaining() > 0 {
        return Err(CodecError::TrailingBytes(cursor.remaining()));
    }

    Ok(CommitReport {
        interval: Interval { min, max },
        merkle_root,
        gas_prices,
        token_prices,
    })
}

fn u256_be(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&[u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                field,
                need: n - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, field)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, field)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, field)?);
        Ok(buf)
    }
}
