//! BER-TLV decoding as used by EMV card responses
//!
//! Card data arrives as untrusted bytes, so the decoder never fails: it
//! produces as many complete elements as fit and stops at the first one
//! whose header or value runs past the end of the buffer.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::tags;

/// Nesting depth at which constructed values stop being decoded
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Bit marking a constructed encoding in a tag's leading byte
const CONSTRUCTED: u8 = 0x20;

/// Low bits of a leading tag byte announcing subsequent tag bytes
const MULTI_BYTE_TAG: u8 = 0x1F;

/// One decoded BER-TLV element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvNode {
    /// Tag with all of its encoded bytes folded big-endian, e.g. `0x5F24`
    pub tag: u32,
    /// Declared value length
    pub length: usize,
    /// Exactly `length` value bytes
    pub value: Bytes,
    /// Nested elements, for constructed tags whose value decodes cleanly
    /// into elements that concatenate back to `value`
    pub children: Option<Vec<TlvNode>>,
}

impl TlvNode {
    /// Create a primitive element
    pub fn new(tag: u32, value: impl Into<Bytes>) -> Self {
        let value = value.into();
        Self {
            tag,
            length: value.len(),
            value,
            children: None,
        }
    }

    /// Create a constructed element from its children
    pub fn constructed(tag: u32, children: Vec<Self>) -> Self {
        let mut value = BytesMut::new();
        for child in &children {
            child.encode_into(&mut value);
        }
        let value = value.freeze();
        Self {
            tag,
            length: value.len(),
            value,
            children: (!children.is_empty()).then_some(children),
        }
    }

    /// Whether the tag's leading byte marks a constructed encoding
    pub const fn is_constructed(&self) -> bool {
        is_constructed(self.tag)
    }

    /// Human-readable name of the tag
    pub fn name(&self) -> &'static str {
        tags::tag_name(self.tag)
    }

    /// First element with the given tag, this one included, depth first
    pub fn find(&self, tag: u32) -> Option<&Self> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.as_deref().and_then(|c| find_tlv(c, tag))
    }

    /// Encode this element back into BER-TLV
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.value.len() + 8);
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    fn encode_into(&self, buffer: &mut BytesMut) {
        let tag_bytes = self.tag.to_be_bytes();
        let skip = tag_bytes.iter().take(3).take_while(|b| **b == 0).count();
        buffer.put_slice(&tag_bytes[skip..]);

        let length = self.value.len();
        if length < 0x80 {
            buffer.put_u8(length as u8);
        } else {
            let length_bytes = length.to_be_bytes();
            let skip = length_bytes.iter().take_while(|b| **b == 0).count();
            buffer.put_u8(0x80 | (length_bytes.len() - skip) as u8);
            buffer.put_slice(&length_bytes[skip..]);
        }

        buffer.put_slice(&self.value);
    }
}

/// Leading encoded byte of a folded tag
pub const fn leading_byte(tag: u32) -> u8 {
    let bytes = tag.to_be_bytes();
    let mut i = 0;
    while i < 3 && bytes[i] == 0 {
        i += 1;
    }
    bytes[i]
}

/// Whether a folded tag is constructed
pub const fn is_constructed(tag: u32) -> bool {
    leading_byte(tag) & CONSTRUCTED != 0
}

/// Decode a buffer into a sequence of TLV elements
pub fn parse_tlv(data: &[u8]) -> Vec<TlvNode> {
    parse_tlv_with_depth(data, DEFAULT_MAX_DEPTH)
}

/// Decode a buffer, descending into at most `max_depth` levels
///
/// Level one is the top-level sequence. Constructed elements on the last
/// level keep their value but get no children.
pub fn parse_tlv_with_depth(data: &[u8], max_depth: usize) -> Vec<TlvNode> {
    if max_depth == 0 {
        return Vec::new();
    }
    parse_level(&Bytes::copy_from_slice(data), max_depth).0
}

/// Decode one level, returning the elements and the offset decoding
/// stopped at
fn parse_level(data: &Bytes, depth_left: usize) -> (Vec<TlvNode>, usize) {
    let mut nodes = Vec::new();
    let mut cursor = 0;

    while cursor < data.len() {
        let Some((tag, leading, after_tag)) = read_tag(data, cursor) else {
            trace!(offset = cursor, "Truncated tag");
            break;
        };
        let Some((length, after_length)) = read_length(data, after_tag) else {
            trace!(offset = after_tag, tag = format_args!("{tag:X}"), "Truncated length");
            break;
        };
        let Some(end) = after_length
            .checked_add(length)
            .filter(|end| *end <= data.len())
        else {
            trace!(
                tag = format_args!("{tag:X}"),
                length,
                available = data.len() - after_length,
                "Value runs past end of buffer"
            );
            break;
        };

        let value = data.slice(after_length..end);
        cursor = end;

        let children = if leading & CONSTRUCTED != 0 && !value.is_empty() && depth_left > 1 {
            // Children must account for the whole value
            match parse_level(&value, depth_left - 1) {
                (children, consumed) if consumed == value.len() && !children.is_empty() => {
                    Some(children)
                }
                (_, consumed) => {
                    trace!(tag = format_args!("{tag:X}"), consumed, "Malformed constructed value");
                    None
                }
            }
        } else {
            None
        };

        nodes.push(TlvNode {
            tag,
            length,
            value,
            children,
        });
    }

    (nodes, cursor)
}

/// Read a tag starting at `start`, returning it with its leading byte and
/// the offset of the length field
fn read_tag(data: &[u8], start: usize) -> Option<(u32, u8, usize)> {
    let leading = *data.get(start)?;
    let mut tag = u32::from(leading);
    let mut cursor = start + 1;

    if leading & MULTI_BYTE_TAG == MULTI_BYTE_TAG {
        while let Some(&byte) = data.get(cursor) {
            cursor += 1;
            tag = (tag << 8) | u32::from(byte);
            if byte & 0x80 == 0 {
                break;
            }
        }
    }

    // A tag with no length byte after it is truncated
    (cursor < data.len()).then_some((tag, leading, cursor))
}

/// Read a short or long form length starting at `start`
fn read_length(data: &[u8], start: usize) -> Option<(usize, usize)> {
    let first = *data.get(start)?;
    let mut cursor = start + 1;

    if first & 0x80 == 0 {
        return Some((usize::from(first), cursor));
    }

    let count = usize::from(first & 0x7F);
    let bytes = data.get(cursor..cursor.checked_add(count)?)?;
    cursor += count;

    let mut length = 0usize;
    for &byte in bytes {
        length = length.checked_mul(256)? | usize::from(byte);
    }
    Some((length, cursor))
}

/// First element with the given tag, searching depth first in order
pub fn find_tlv(nodes: &[TlvNode], tag: u32) -> Option<&TlvNode> {
    nodes.iter().find_map(|node| node.find(tag))
}

/// Every element with the given tag, in depth-first order
pub fn find_all(nodes: &[TlvNode], tag: u32) -> Vec<&TlvNode> {
    fn walk<'a>(nodes: &'a [TlvNode], tag: u32, found: &mut Vec<&'a TlvNode>) {
        for node in nodes {
            if node.tag == tag {
                found.push(node);
            }
            if let Some(children) = &node.children {
                walk(children, tag, found);
            }
        }
    }

    let mut found = Vec::new();
    walk(nodes, tag, &mut found);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_parse_primitive() {
        let nodes = parse_tlv(&hex("5A0847617399000011115F24032801319000"));
        assert_eq!(nodes.len(), 3);

        assert_eq!(nodes[0].tag, 0x5A);
        assert_eq!(nodes[0].length, 8);
        assert_eq!(nodes[0].value.as_ref(), &hex("4761739900001111")[..]);
        assert!(nodes[0].children.is_none());

        assert_eq!(nodes[1].tag, 0x5F24);
        assert_eq!(nodes[1].value.as_ref(), &[0x28, 0x01, 0x31]);

        // Trailing status word decodes as an empty element
        assert_eq!(nodes[2].tag, 0x90);
        assert_eq!(nodes[2].length, 0);
    }

    #[test]
    fn test_parse_nested_directory() {
        let ppse = hex(
            "6F23840E325041592E5359532E4444463031A511BF0C0E610C4F07A0000000031010870101",
        );
        let nodes = parse_tlv(&ppse);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_constructed());

        let aid = find_tlv(&nodes, tags::APPLICATION_IDENTIFIER).unwrap();
        assert_eq!(aid.value.as_ref(), &hex("A0000000031010")[..]);

        let fci = find_tlv(&nodes, tags::FCI_ISSUER_DISCRETIONARY_DATA).unwrap();
        assert_eq!(fci.tag, 0xBF0C);
        assert!(fci.is_constructed());

        // Primitive tags are not descended into
        let name = find_tlv(&nodes, tags::DF_NAME).unwrap();
        assert!(name.children.is_none());
        assert_eq!(name.value.as_ref(), b"2PAY.SYS.DDF01");
    }

    #[test]
    fn test_multi_byte_tags() {
        let nodes = parse_tlv(&hex("9F360200015F2000DF810103AABBCC"));
        let tags: Vec<u32> = nodes.iter().map(|n| n.tag).collect();
        assert_eq!(tags, vec![0x9F36, 0x5F20, 0xDF8101]);
        assert_eq!(nodes[1].length, 0);
        assert_eq!(nodes[2].value.as_ref(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_long_form_length() {
        let mut data = hex("9F4681B4");
        data.extend(std::iter::repeat_n(0x11, 0xB4));
        data.extend(hex("820200029000"));

        let nodes = parse_tlv(&data);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].length, 0xB4);
        assert_eq!(nodes[1].tag, 0x82);

        // Two-byte length
        let mut data = hex("70820100");
        data.extend(std::iter::repeat_n(0x00, 0x100));
        assert_eq!(parse_tlv(&data)[0].length, 256);

        // Long form with no length bytes means zero
        let nodes = parse_tlv(&hex("50805A01FF"));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].length, 0);
    }

    #[test]
    fn test_truncated_input_keeps_prefix() {
        // Declared length past the end
        let nodes = parse_tlv(&hex("5A0112570A4761"));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag, 0x5A);

        // Tag without a length byte
        assert_eq!(parse_tlv(&hex("5A01129F")).len(), 1);
        assert_eq!(parse_tlv(&hex("5A011257")).len(), 1);

        // Long form length with missing length bytes
        assert_eq!(parse_tlv(&hex("5A01125782")).len(), 1);

        // Status word of a failed read looks like a long form header
        assert_eq!(parse_tlv(&hex("6A83")).len(), 0);

        assert!(parse_tlv(&[]).is_empty());
    }

    #[test]
    fn test_malformed_constructed_value() {
        // The template fits, its content is truncated
        let nodes = parse_tlv(&hex("70055704476109"));
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].children.is_none());
        assert_eq!(nodes[0].length, 5);

        // A damaged child leaves the template undecoded
        let nodes = parse_tlv(&hex("70075A01125704FFFF"));
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].children.is_none());
        assert_eq!(nodes[0].value.as_ref(), &hex("5A01125704FFFF")[..]);
        assert!(find_tlv(&nodes, tags::PAN).is_none());
    }

    #[test]
    fn test_depth_cap() {
        // Twenty nested templates around a PAN
        let mut node = TlvNode::new(tags::PAN, hex("4761739900001111"));
        for _ in 0..20 {
            node = TlvNode::constructed(tags::RECORD_TEMPLATE, vec![node]);
        }
        let encoded = node.to_bytes();

        assert!(find_tlv(&parse_tlv(&encoded), tags::PAN).is_none());
        assert!(find_tlv(&parse_tlv_with_depth(&encoded, 32), tags::PAN).is_some());

        let shallow = parse_tlv_with_depth(&encoded, 1);
        assert_eq!(shallow.len(), 1);
        assert!(shallow[0].children.is_none());

        assert!(parse_tlv_with_depth(&encoded, 0).is_empty());
    }

    #[test]
    fn test_find_first_depth_first() {
        let nodes = vec![
            TlvNode::constructed(
                tags::RECORD_TEMPLATE,
                vec![TlvNode::new(tags::PAN, vec![0x11])],
            ),
            TlvNode::new(tags::PAN, vec![0x22]),
        ];
        assert_eq!(find_tlv(&nodes, tags::PAN).unwrap().value.as_ref(), &[0x11]);
        assert_eq!(find_all(&nodes, tags::PAN).len(), 2);
        assert!(find_tlv(&nodes, tags::TRACK2_EQUIVALENT_DATA).is_none());
    }

    #[test]
    fn test_constructed_detection() {
        assert!(is_constructed(0x70));
        assert!(is_constructed(0x6F));
        assert!(is_constructed(0xBF0C));
        assert!(!is_constructed(0x5F24));
        assert!(!is_constructed(0x9F38));
        assert!(!is_constructed(0x57));
        assert_eq!(leading_byte(0xDF8101), 0xDF);
        assert_eq!(leading_byte(0), 0);
    }

    #[test]
    fn test_encode() {
        let node = TlvNode::constructed(
            0x77,
            vec![
                TlvNode::new(0x82, vec![0x20, 0x00]),
                TlvNode::new(0x94, vec![0x08, 0x01, 0x01, 0x00]),
            ],
        );
        assert_eq!(node.to_bytes().as_ref(), &hex("770A82022000940408010100")[..]);
        assert_eq!(parse_tlv(&node.to_bytes()), vec![node]);
    }

    /// Primitive tags: one byte, or two bytes under a multi-byte class byte
    fn primitive_tag() -> impl Strategy<Value = u32> {
        prop_oneof![
            any::<u8>()
                .prop_filter("primitive single-byte tag", |b| {
                    b & MULTI_BYTE_TAG != MULTI_BYTE_TAG && b & CONSTRUCTED == 0
                })
                .prop_map(u32::from),
            (prop::sample::select(vec![0x5Fu32, 0x9F, 0xDF]), 0u32..0x80)
                .prop_map(|(class, number)| (class << 8) | number),
        ]
    }

    fn primitive_node() -> impl Strategy<Value = TlvNode> {
        (primitive_tag(), prop::collection::vec(any::<u8>(), 0..300))
            .prop_map(|(tag, value)| TlvNode::new(tag, value))
    }

    fn node() -> impl Strategy<Value = TlvNode> {
        prop_oneof![
            3 => primitive_node(),
            1 => (
                prop::sample::select(vec![0x70u32, 0x77, 0x61, 0xA5, 0xBF0C]),
                prop::collection::vec(primitive_node(), 1..4),
            )
                .prop_map(|(tag, children)| TlvNode::constructed(tag, children)),
        ]
    }

    fn encode_all(nodes: &[TlvNode]) -> Vec<u8> {
        nodes.iter().flat_map(|n| n.to_bytes()).collect()
    }

    fn children_rebuild_value(nodes: &[TlvNode]) -> bool {
        nodes.iter().all(|node| match &node.children {
            Some(children) => {
                encode_all(children) == node.value.as_ref() && children_rebuild_value(children)
            }
            None => true,
        })
    }

    proptest! {
        #[test]
        fn prop_round_trip(nodes in prop::collection::vec(node(), 1..6)) {
            let encoded = encode_all(&nodes);
            let parsed = parse_tlv(&encoded);
            prop_assert_eq!(&parsed, &nodes);

            for node in &parsed {
                prop_assert_eq!(node.value.len(), node.length);
                if let Some(children) = &node.children {
                    prop_assert_eq!(encode_all(children), node.value.to_vec());
                }
            }
        }

        #[test]
        fn prop_truncation_yields_strict_prefix(
            nodes in prop::collection::vec(node(), 1..6),
            cut in any::<prop::sample::Index>(),
        ) {
            let encoded = encode_all(&nodes);
            let full = parse_tlv(&encoded);
            let k = cut.index(encoded.len()) + 1;

            let truncated = parse_tlv(&encoded[..encoded.len() - k]);
            prop_assert!(truncated.len() < full.len());
            prop_assert_eq!(&truncated[..], &full[..truncated.len()]);
        }

        #[test]
        fn prop_corrupted_template_keeps_children_exact(
            children in prop::collection::vec(primitive_node(), 1..4),
            at in any::<prop::sample::Index>(),
            byte in any::<u8>(),
        ) {
            let template = TlvNode::constructed(tags::RECORD_TEMPLATE, children);
            let mut encoded = template.to_bytes().to_vec();
            let header = encoded.len() - template.value.len();
            encoded[header + at.index(template.value.len())] = byte;

            let parsed = parse_tlv(&encoded);
            prop_assert_eq!(parsed.len(), 1);
            prop_assert_eq!(parsed[0].value.len(), template.value.len());
            prop_assert!(children_rebuild_value(&parsed));
        }
    }
}
