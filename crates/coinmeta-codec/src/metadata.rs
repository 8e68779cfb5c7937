//! Key/value metadata carried in spend payloads.
//!
//! On the wire a metadata node is a nil-terminated list of `(key . value)`
//! pairs. A value that is an atom is a scalar; a value that is itself a list
//! is a nested node.

use std::fmt;

use coinmeta_types::{be_bytes_to_decimal, decimal_to_be_bytes, int_to_bytes};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, CodecResult};
use crate::program::Program;
use crate::serialized::SerializedProgram;

/// Deepest nested node accepted by [`decode_metadata`] and [`encode_metadata`].
pub const MAX_NESTING: usize = 128;

/// A single metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataValue {
    /// Raw bytes that decoded as UTF-8.
    Text(String),
    /// Decimal digits, optionally with a leading `-` (only on the encode
    /// path; decoded integers are always non-negative and arbitrarily wide).
    Integer(String),
    /// A nested node, either decoded inline or resolved from a child record.
    Node(MetadataNode),
}

impl MetadataValue {
    pub fn integer(v: i128) -> Self {
        Self::Integer(v.to_string())
    }

    /// Apply the decode type-inference rule to raw atom bytes.
    pub fn from_atom(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Integer(be_bytes_to_decimal(bytes)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&MetadataNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The value as it will read back after an encode/decode round trip.
    pub fn coerced(&self) -> CodecResult<Self> {
        Ok(match self {
            Self::Text(s) => Self::Text(s.clone()),
            Self::Integer(s) => Self::from_atom(&integer_atom(s)?),
            Self::Node(node) if node.is_empty() => Self::Text(String::new()),
            Self::Node(node) => Self::Node(node.coerced()?),
        })
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<MetadataNode> for MetadataValue {
    fn from(node: MetadataNode) -> Self {
        Self::Node(node)
    }
}

/// Ordered mapping from string keys to [`MetadataValue`]s.
///
/// Keys keep their first-insertion position; inserting an existing key
/// replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataNode {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut MetadataValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// This node as it will read back after an encode/decode round trip.
    pub fn coerced(&self) -> CodecResult<Self> {
        self.entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.coerced()?)))
            .collect()
    }
}

impl FromIterator<(String, MetadataValue)> for MetadataNode {
    fn from_iter<I: IntoIterator<Item = (String, MetadataValue)>>(iter: I) -> Self {
        let mut node = Self::new();
        for (k, v) in iter {
            node.insert(k, v);
        }
        node
    }
}

impl IntoIterator for MetadataNode {
    type Item = (String, MetadataValue);
    type IntoIter = std::vec::IntoIter<(String, MetadataValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

fn integer_atom(digits: &str) -> CodecResult<Vec<u8>> {
    if let Ok(v) = digits.parse::<i128>() {
        return Ok(int_to_bytes(v));
    }
    decimal_to_be_bytes(digits).map_err(|_| CodecError::InvalidInteger(digits.to_string()))
}

/// Encode a node as a list of `(key . value)` pairs.
pub fn encode_metadata(node: &MetadataNode) -> CodecResult<Program> {
    encode_node(node, 0)
}

fn encode_node(node: &MetadataNode, depth: usize) -> CodecResult<Program> {
    if depth > MAX_NESTING {
        return Err(CodecError::TooDeep(MAX_NESTING));
    }
    let mut items = Vec::with_capacity(node.len());
    for (key, value) in node.iter() {
        let encoded = match value {
            MetadataValue::Text(s) => Program::atom(s.as_bytes()),
            MetadataValue::Integer(digits) => Program::atom(integer_atom(digits)?),
            MetadataValue::Node(child) => encode_node(child, depth + 1)?,
        };
        items.push(Program::cons(Program::atom(key.as_bytes()), encoded));
    }
    Ok(Program::list(items))
}

/// Decode a list of `(key . value)` pairs into a node.
///
/// Atom values go through [`MetadataValue::from_atom`]; list values become
/// nested nodes. A repeated key keeps its first position and its last value.
pub fn decode_metadata(program: &Program) -> CodecResult<MetadataNode> {
    decode_node(program, 0)
}

fn decode_node(program: &Program, depth: usize) -> CodecResult<MetadataNode> {
    if depth > MAX_NESTING {
        return Err(CodecError::TooDeep(MAX_NESTING));
    }
    let mut node = MetadataNode::new();
    for item in program.list_items()? {
        let (key, value) = item.as_pair().ok_or(CodecError::ExpectedPair)?;
        let key = key
            .as_atom()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .ok_or(CodecError::InvalidKey)?;
        let value = match value {
            Program::Atom(bytes) => MetadataValue::from_atom(bytes),
            Program::Pair(..) => MetadataValue::Node(decode_node(value, depth + 1)?),
        };
        node.insert(key, value);
    }
    Ok(node)
}

/// Decode the metadata carried by a spend solution: the solution's first
/// element is the metadata list.
pub fn solution_metadata(solution: &SerializedProgram) -> CodecResult<MetadataNode> {
    let program = solution.to_program()?;
    decode_metadata(program.first()?)
}

// ---------------------------------------------------------------------------
// serde
// ---------------------------------------------------------------------------

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) | Self::Integer(s) => serializer.serialize_str(s),
            Self::Node(node) => node.serialize(serializer),
        }
    }
}

impl Serialize for MetadataNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = MetadataNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a metadata object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut node = MetadataNode::new();
        while let Some((key, value)) = access.next_entry::<String, MetadataValue>()? {
            node.insert(key, value);
        }
        Ok(node)
    }
}

impl<'de> Deserialize<'de> for MetadataNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NodeVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = MetadataValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, an integer, or a metadata object")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MetadataValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MetadataValue::Text(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(MetadataValue::Integer(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MetadataValue::Integer(v.to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
        NodeVisitor.visit_map(access).map(MetadataValue::Node)
    }
}

impl<'de> Deserialize<'de> for MetadataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair(key: &str, value: Program) -> Program {
        Program::cons(Program::atom(key.as_bytes()), value)
    }

    #[test]
    fn utf8_atoms_decode_as_text() {
        let program = Program::list(vec![pair("name", Program::atom(b"alice".to_vec()))]);
        let node = decode_metadata(&program).unwrap();
        assert_eq!(node.get("name"), Some(&MetadataValue::from("alice")));
    }

    #[test]
    fn non_utf8_atoms_decode_as_integers() {
        let program = Program::list(vec![
            pair("amount", Program::atom(vec![0x00, 0xFF])),
            pair("raw", Program::atom(vec![0xC3, 0x28])),
        ]);
        let node = decode_metadata(&program).unwrap();
        assert_eq!(node.get("amount"), Some(&MetadataValue::Integer("255".into())));
        assert_eq!(node.get("raw"), Some(&MetadataValue::Integer("49960".into())));
    }

    #[test]
    fn small_integers_that_are_valid_utf8_read_as_text() {
        let mut node = MetadataNode::new();
        node.insert("n", MetadataValue::integer(65));
        let back = decode_metadata(&encode_metadata(&node).unwrap()).unwrap();
        assert_eq!(back.get("n"), Some(&MetadataValue::from("A")));
    }

    #[test]
    fn key_order_is_preserved() {
        let program = Program::list(vec![
            pair("zeta", Program::atom(b"1".to_vec())),
            pair("alpha", Program::atom(b"2".to_vec())),
            pair("mid", Program::atom(b"3".to_vec())),
        ]);
        let node = decode_metadata(&program).unwrap();
        assert_eq!(node.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn repeated_key_keeps_position_and_last_value() {
        let program = Program::list(vec![
            pair("a", Program::atom(b"first".to_vec())),
            pair("b", Program::atom(b"x".to_vec())),
            pair("a", Program::atom(b"second".to_vec())),
        ]);
        let node = decode_metadata(&program).unwrap();
        assert_eq!(node.len(), 2);
        assert_eq!(node.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(node.get("a").and_then(MetadataValue::as_text), Some("second"));
    }

    #[test]
    fn nested_lists_decode_as_nodes() {
        let inner = Program::list(vec![pair("role", Program::atom(b"owner".to_vec()))]);
        let program = Program::list(vec![pair("child", inner)]);
        let node = decode_metadata(&program).unwrap();
        let child = node.get("child").and_then(MetadataValue::as_node).unwrap();
        assert_eq!(child.get("role").and_then(MetadataValue::as_text), Some("owner"));
    }

    #[test]
    fn non_pair_item_is_rejected() {
        let program = Program::list(vec![Program::atom(b"loose".to_vec())]);
        assert_eq!(decode_metadata(&program).unwrap_err(), CodecError::ExpectedPair);
    }

    #[test]
    fn non_utf8_key_is_rejected() {
        let program = Program::list(vec![Program::cons(
            Program::atom(vec![0xFF, 0xFE]),
            Program::atom(b"v".to_vec()),
        )]);
        assert_eq!(decode_metadata(&program).unwrap_err(), CodecError::InvalidKey);
    }

    #[test]
    fn nil_is_an_empty_node() {
        assert!(decode_metadata(&Program::nil()).unwrap().is_empty());
    }

    #[test]
    fn solution_first_element_is_metadata() {
        let metadata = Program::list(vec![pair("name", Program::atom(b"alice".to_vec()))]);
        let solution = Program::list(vec![metadata, Program::atom(b"ignored".to_vec())]);
        let serialized = SerializedProgram::from_program(&solution).unwrap();
        let node = solution_metadata(&serialized).unwrap();
        assert_eq!(node.len(), 1);
        assert_eq!(node.get("name").and_then(MetadataValue::as_text), Some("alice"));
    }

    #[test]
    fn solution_that_is_an_atom_fails() {
        let serialized = SerializedProgram::from_program(&Program::atom(b"x".to_vec())).unwrap();
        assert_eq!(solution_metadata(&serialized).unwrap_err(), CodecError::ExpectedPair);
    }

    #[test]
    fn invalid_integer_rejected_on_encode() {
        let mut node = MetadataNode::new();
        node.insert("bad", MetadataValue::Integer("12x".into()));
        assert!(matches!(
            encode_metadata(&node),
            Err(CodecError::InvalidInteger(_))
        ));
    }

    #[test]
    fn json_preserves_order_and_renders_integers_as_strings() {
        let mut child = MetadataNode::new();
        child.insert("role", "owner");
        let mut node = MetadataNode::new();
        node.insert("name", "alice");
        node.insert("count", MetadataValue::Integer("255".into()));
        node.insert("child", child);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"name":"alice","count":"255","child":{"role":"owner"}}"#
        );
    }

    #[test]
    fn json_input_accepts_numbers_and_objects() {
        let node: MetadataNode =
            serde_json::from_str(r#"{"b": 7, "a": {"x": "y"}, "c": -1}"#).unwrap();
        assert_eq!(node.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(node.get("b"), Some(&MetadataValue::Integer("7".into())));
        assert_eq!(node.get("c"), Some(&MetadataValue::Integer("-1".into())));
        assert!(node.get("a").and_then(MetadataValue::as_node).is_some());
    }

    #[test]
    fn json_input_rejects_booleans() {
        assert!(serde_json::from_str::<MetadataNode>(r#"{"flag": true}"#).is_err());
    }

    fn value_strategy() -> impl Strategy<Value = MetadataValue> {
        let leaf = prop_oneof![
            "[a-zA-Z0-9 ]{0,12}".prop_map(MetadataValue::Text),
            any::<u64>().prop_map(|v| MetadataValue::integer(i128::from(v))),
            any::<i32>().prop_map(|v| MetadataValue::integer(i128::from(v))),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| MetadataValue::Node(m.into_iter().collect()))
        })
    }

    fn node_strategy() -> impl Strategy<Value = MetadataNode> {
        prop::collection::btree_map("[a-z]{1,6}", value_strategy(), 0..6)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn decode_inverts_encode_up_to_coercion(node in node_strategy()) {
            let program = encode_metadata(&node).unwrap();
            let bytes = program.serialize().unwrap();
            let decoded = decode_metadata(&Program::deserialize(&bytes).unwrap()).unwrap();
            prop_assert_eq!(decoded, node.coerced().unwrap());
        }
    }
}
