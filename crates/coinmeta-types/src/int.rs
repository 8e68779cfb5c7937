//! Integer encodings used by the ledger wire format.
//!
//! Integers travel as big-endian two's-complement atoms in their shortest
//! form. Values read back out of a payload are treated as unsigned and may be
//! arbitrarily wide, so decimal conversion works on byte strings rather than
//! fixed-width machine integers.

use crate::error::TypeError;

/// Serialize `v` into the fewest big-endian two's-complement bytes.
///
/// Zero is the empty sequence. A leading `0x00` or `0xFF` is dropped whenever
/// the following byte's sign bit already carries the same sign.
pub fn int_to_bytes(v: i128) -> Vec<u8> {
    if v == 0 {
        return Vec::new();
    }
    let full = v.to_be_bytes();
    let mut start = 0;
    while full.len() - start > 1 {
        let redundant = if full[start + 1] & 0x80 != 0 { 0xFF } else { 0x00 };
        if full[start] != redundant {
            break;
        }
        start += 1;
    }
    full[start..].to_vec()
}

/// Render big-endian unsigned bytes as a decimal string. Empty input is `"0"`.
pub fn be_bytes_to_decimal(bytes: &[u8]) -> String {
    const CHUNK: u64 = 1_000_000_000;

    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let mut num: Vec<u8> = bytes[first_nonzero..].to_vec();
    if num.is_empty() {
        return "0".to_string();
    }

    // Repeated long division by 10^9; remainders are the base-10^9 digits.
    let mut chunks: Vec<u64> = Vec::new();
    while !num.is_empty() {
        let mut rem: u64 = 0;
        let mut quotient = Vec::with_capacity(num.len());
        for &b in &num {
            let acc = (rem << 8) | u64::from(b);
            let q = acc / CHUNK;
            rem = acc % CHUNK;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q as u8);
            }
        }
        chunks.push(rem);
        num = quotient;
    }

    let mut out = String::with_capacity(chunks.len() * 9);
    let mut iter = chunks.iter().rev();
    if let Some(head) = iter.next() {
        out.push_str(&head.to_string());
    }
    for chunk in iter {
        out.push_str(&format!("{chunk:09}"));
    }
    out
}

/// Parse a non-negative decimal string into its minimal two's-complement
/// big-endian encoding (a `0x00` sign byte is kept when the top bit is set).
pub fn decimal_to_be_bytes(s: &str) -> Result<Vec<u8>, TypeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypeError::InvalidDecimal(s.to_string()));
    }

    let mut magnitude: Vec<u8> = Vec::new();
    for digit in s.bytes().map(|b| u32::from(b - b'0')) {
        let mut carry = digit;
        for byte in magnitude.iter_mut().rev() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xFF) as u8;
            carry = v >> 8;
        }
        while carry > 0 {
            magnitude.insert(0, (carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let first_nonzero = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let mut out = magnitude.split_off(first_nonzero);
    if out.first().is_some_and(|b| b & 0x80 != 0) {
        out.insert(0, 0x00);
    }
    Ok(out)
}
