//! Program trees and their compact binary serialization.
//!
//! Wire format, one node at a time:
//!
//! - `0xFF` starts a pair: the serialization of `first`, then of `rest`.
//! - `0x80` is the empty atom (nil).
//! - A one-byte atom `<= 0x7F` is written as itself.
//! - Any other atom is a length prefix followed by its bytes. The number of
//!   leading one bits in the first prefix byte gives the prefix width.
//!
//! Both directions walk the tree with an explicit stack, so the depth of a
//! program is bounded by memory, not by the call stack.

use crate::error::{CodecError, CodecResult};

const CONS_BOX_MARKER: u8 = 0xFF;
const NIL_MARKER: u8 = 0x80;
const MAX_SINGLE_BYTE: u8 = 0x7F;
const MAX_ATOM_LEN: u64 = 0x4_0000_0000;

/// A binary tree of atoms and pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Atom(Vec<u8>),
    Pair(Box<Program>, Box<Program>),
}

impl Default for Program {
    fn default() -> Self {
        Self::nil()
    }
}

impl Program {
    /// The empty atom, which also terminates lists.
    pub const fn nil() -> Self {
        Self::Atom(Vec::new())
    }

    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Atom(bytes.into())
    }

    pub fn cons(first: Program, rest: Program) -> Self {
        Self::Pair(Box::new(first), Box::new(rest))
    }

    /// Build a nil-terminated list from `items`.
    pub fn list(items: impl IntoIterator<Item = Program>) -> Self {
        let items: Vec<Program> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Self::nil(), |rest, item| Self::cons(item, rest))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Atom(bytes) if bytes.is_empty())
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(bytes) => Some(bytes),
            Self::Pair(..) => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Program, &Program)> {
        match self {
            Self::Atom(_) => None,
            Self::Pair(first, rest) => Some((first, rest)),
        }
    }

    pub fn first(&self) -> CodecResult<&Program> {
        self.as_pair().map(|(f, _)| f).ok_or(CodecError::ExpectedPair)
    }

    pub fn rest(&self) -> CodecResult<&Program> {
        self.as_pair().map(|(_, r)| r).ok_or(CodecError::ExpectedPair)
    }

    /// Items of a nil-terminated list. A non-nil terminating atom is an error.
    pub fn list_items(&self) -> CodecResult<Vec<&Program>> {
        let mut items = Vec::new();
        let mut cursor = self;
        loop {
            match cursor {
                Self::Pair(first, rest) => {
                    items.push(first.as_ref());
                    cursor = rest;
                }
                Self::Atom(bytes) if bytes.is_empty() => return Ok(items),
                Self::Atom(_) => return Err(CodecError::ImproperList),
            }
        }
    }

    /// Serialize to the compact wire format.
    pub fn serialize(&self) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut stack: Vec<&Program> = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Pair(first, rest) => {
                    out.push(CONS_BOX_MARKER);
                    stack.push(rest);
                    stack.push(first);
                }
                Self::Atom(bytes) => write_atom(&mut out, bytes)?,
            }
        }
        Ok(out)
    }

    /// Parse exactly one program from `data`; trailing bytes are an error.
    pub fn deserialize(data: &[u8]) -> CodecResult<Self> {
        enum Op {
            Parse,
            Cons,
        }

        let mut cursor = 0usize;
        let mut ops = vec![Op::Parse];
        let mut values: Vec<Program> = Vec::new();

        while let Some(op) = ops.pop() {
            match op {
                Op::Parse => {
                    let b = *data.get(cursor).ok_or(CodecError::Truncated(cursor))?;
                    cursor += 1;
                    if b == CONS_BOX_MARKER {
                        ops.push(Op::Cons);
                        ops.push(Op::Parse);
                        ops.push(Op::Parse);
                    } else {
                        values.push(read_atom(data, b, &mut cursor)?);
                    }
                }
                Op::Cons => {
                    let rest = values.pop().ok_or(CodecError::Truncated(cursor))?;
                    let first = values.pop().ok_or(CodecError::Truncated(cursor))?;
                    values.push(Self::cons(first, rest));
                }
            }
        }

        if cursor != data.len() {
            return Err(CodecError::TrailingBytes(data.len() - cursor));
        }
        values.pop().ok_or(CodecError::Truncated(cursor))
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        // Unlink children iteratively so long lists do not recurse on drop.
        let mut pending = Vec::new();
        if let Self::Pair(first, rest) = self {
            pending.push(std::mem::take(first.as_mut()));
            pending.push(std::mem::take(rest.as_mut()));
        }
        while let Some(mut node) = pending.pop() {
            if let Self::Pair(first, rest) = &mut node {
                pending.push(std::mem::take(first.as_mut()));
                pending.push(std::mem::take(rest.as_mut()));
            }
        }
    }
}

fn write_atom(out: &mut Vec<u8>, bytes: &[u8]) -> CodecResult<()> {
    let len = bytes.len() as u64;
    match bytes {
        [] => {
            out.push(NIL_MARKER);
            return Ok(());
        }
        [b] if *b <= MAX_SINGLE_BYTE => {
            out.push(*b);
            return Ok(());
        }
        _ => {}
    }

    if len < 0x40 {
        out.push(0x80 | len as u8);
    } else if len < 0x2000 {
        out.push(0xC0 | (len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x10_0000 {
        out.push(0xE0 | (len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x800_0000 {
        out.push(0xF0 | (len >> 24) as u8);
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else if len < MAX_ATOM_LEN {
        out.push(0xF8 | (len >> 32) as u8);
        out.push((len >> 24) as u8);
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else {
        return Err(CodecError::AtomTooLarge(len));
    }
    out.extend_from_slice(bytes);
    Ok(())
}

fn read_atom(data: &[u8], first: u8, cursor: &mut usize) -> CodecResult<Program> {
    if first == NIL_MARKER {
        return Ok(Program::nil());
    }
    if first <= MAX_SINGLE_BYTE {
        return Ok(Program::Atom(vec![first]));
    }

    let mut prefix = first;
    let mut bit_count = 0usize;
    let mut mask = 0x80u8;
    while prefix & mask != 0 {
        bit_count += 1;
        prefix &= !mask;
        mask >>= 1;
    }

    let mut len = u64::from(prefix);
    for _ in 1..bit_count {
        let b = *data.get(*cursor).ok_or(CodecError::Truncated(*cursor))?;
        *cursor += 1;
        len = (len << 8) | u64::from(b);
    }
    if len >= MAX_ATOM_LEN {
        return Err(CodecError::AtomTooLarge(len));
    }

    let start = *cursor;
    let end = start
        .checked_add(len as usize)
        .filter(|end| *end <= data.len())
        .ok_or(CodecError::Truncated(data.len()))?;
    *cursor = end;
    Ok(Program::Atom(data[start..end].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_serializes_to_marker() {
        assert_eq!(Program::nil().serialize().unwrap(), vec![0x80]);
        assert_eq!(Program::deserialize(&[0x80]).unwrap(), Program::nil());
    }

    #[test]
    fn small_atoms_are_bare_bytes() {
        assert_eq!(Program::atom(vec![0x41]).serialize().unwrap(), vec![0x41]);
        assert_eq!(Program::atom(vec![0x00]).serialize().unwrap(), vec![0x00]);
    }

    #[test]
    fn high_single_byte_gets_prefix() {
        assert_eq!(
            Program::atom(vec![0x80]).serialize().unwrap(),
            vec![0x81, 0x80]
        );
    }

    #[test]
    fn short_atom_prefix() {
        let bytes = Program::atom(b"alice".to_vec()).serialize().unwrap();
        assert_eq!(bytes[0], 0x85);
        assert_eq!(&bytes[1..], b"alice");
    }

    #[test]
    fn two_byte_prefix_for_64_bytes() {
        let atom = Program::atom(vec![7u8; 64]);
        let bytes = atom.serialize().unwrap();
        assert_eq!(&bytes[..2], &[0xC0, 0x40]);
        assert_eq!(Program::deserialize(&bytes).unwrap(), atom);
    }

    #[test]
    fn three_byte_prefix_for_large_atom() {
        let atom = Program::atom(vec![1u8; 0x2000]);
        let bytes = atom.serialize().unwrap();
        assert_eq!(&bytes[..3], &[0xE0, 0x20, 0x00]);
        assert_eq!(Program::deserialize(&bytes).unwrap(), atom);
    }

    #[test]
    fn pair_layout() {
        let p = Program::cons(Program::atom(b"a".to_vec()), Program::atom(b"b".to_vec()));
        assert_eq!(p.serialize().unwrap(), vec![0xFF, b'a', b'b']);
        assert_eq!(Program::deserialize(&[0xFF, b'a', b'b']).unwrap(), p);
    }

    #[test]
    fn list_construction_and_items() {
        let list = Program::list(vec![
            Program::atom(b"x".to_vec()),
            Program::atom(b"y".to_vec()),
        ]);
        let items = list.list_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_atom(), Some(&b"y"[..]));
        assert_eq!(list.first().unwrap().as_atom(), Some(&b"x"[..]));
        assert!(list.rest().unwrap().rest().unwrap().is_nil());
    }

    #[test]
    fn improper_list_is_rejected() {
        let p = Program::cons(Program::atom(b"x".to_vec()), Program::atom(b"tail".to_vec()));
        assert_eq!(p.list_items().unwrap_err(), CodecError::ImproperList);
    }

    #[test]
    fn first_of_atom_fails() {
        assert_eq!(Program::nil().first().unwrap_err(), CodecError::ExpectedPair);
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(Program::deserialize(&[]), Err(CodecError::Truncated(_))));
        assert!(matches!(Program::deserialize(&[0xFF, 0x01]), Err(CodecError::Truncated(_))));
        assert!(matches!(Program::deserialize(&[0x85, b'a']), Err(CodecError::Truncated(_))));
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert_eq!(
            Program::deserialize(&[0x80, 0x80]).unwrap_err(),
            CodecError::TrailingBytes(1)
        );
    }

    #[test]
    fn oversized_length_prefix_rejected() {
        let data = [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            Program::deserialize(&data),
            Err(CodecError::AtomTooLarge(_))
        ));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let depth = 200_000;
        let mut data = vec![0xFF; depth];
        data.extend(std::iter::repeat(0x80).take(depth + 1));
        let program = Program::deserialize(&data).unwrap();
        assert_eq!(program.serialize().unwrap(), data);
    }
}
