//! Bech32m human-readable addresses for identifiers.
//!
//! An address is the bech32m encoding of a 32-byte puzzle hash under a
//! human-readable prefix (`xch` on mainnet, `txch` on testnet).

use crate::error::TypeError;
use crate::identifier::{Identifier, IDENTIFIER_LEN};

/// Prefix used when none is configured.
pub const DEFAULT_ADDRESS_PREFIX: &str = "xch";

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32M_CONST: u32 = 0x2bc8_30a3;
const CHECKSUM_LEN: usize = 6;

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(v);
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 31));
    out
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; CHECKSUM_LEN]);
    let pm = polymod(&values) ^ BECH32M_CONST;
    let mut out = [0u8; CHECKSUM_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = ((pm >> (5 * (5 - i))) & 31) as u8;
    }
    out
}

/// Regroup a bit stream from `from`-bit to `to`-bit words.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, TypeError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for &value in data {
        let v = u32::from(value);
        if v >> from != 0 {
            return Err(TypeError::InvalidAddress(format!("value {v} exceeds {from} bits")));
        }
        acc = ((acc << from) | v) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & maxv) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & maxv) != 0 {
        return Err(TypeError::InvalidAddress("non-zero padding".into()));
    }
    Ok(out)
}

/// Encode an identifier as a bech32m address under `prefix`.
pub fn encode_address(id: &Identifier, prefix: &str) -> String {
    let hrp = prefix.to_ascii_lowercase();
    // 8 -> 5 with padding cannot fail: every input byte fits in 8 bits.
    let data = convert_bits(id.as_bytes(), 8, 5, true).unwrap_or_default();
    let checksum = create_checksum(&hrp, &data);
    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + CHECKSUM_LEN);
    out.push_str(&hrp);
    out.push('1');
    for &d in data.iter().chain(checksum.iter()) {
        out.push(CHARSET[d as usize] as char);
    }
    out
}

/// Decode a bech32m address into its identifier. The prefix is not checked.
pub fn decode_address(address: &str) -> Result<Identifier, TypeError> {
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(TypeError::InvalidAddress("mixed case".into()));
    }
    if address.bytes().any(|b| !(33..=126).contains(&b)) {
        return Err(TypeError::InvalidAddress("invalid character".into()));
    }
    let lowered = address.to_ascii_lowercase();
    let sep = lowered
        .rfind('1')
        .ok_or_else(|| TypeError::InvalidAddress("missing separator".into()))?;
    if sep == 0 || sep + CHECKSUM_LEN + 1 > lowered.len() {
        return Err(TypeError::InvalidAddress("bad separator position".into()));
    }
    let (hrp, rest) = lowered.split_at(sep);
    let data: Vec<u8> = rest[1..]
        .bytes()
        .map(|c| {
            CHARSET
                .iter()
                .position(|&x| x == c)
                .map(|p| p as u8)
                .ok_or_else(|| TypeError::InvalidAddress(format!("invalid data character {:?}", c as char)))
        })
        .collect::<Result<_, _>>()?;

    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    if polymod(&values) != BECH32M_CONST {
        return Err(TypeError::InvalidAddress("checksum mismatch".into()));
    }

    let payload = convert_bits(&data[..data.len() - CHECKSUM_LEN], 5, 8, false)?;
    if payload.len() != IDENTIFIER_LEN {
        return Err(TypeError::InvalidLength {
            expected: IDENTIFIER_LEN,
            actual: payload.len(),
        });
    }
    Identifier::try_from(payload.as_slice())
}
