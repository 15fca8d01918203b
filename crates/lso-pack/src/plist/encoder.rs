//! `bplist00` encoder for [`Value`] trees.
//!
//! Every node becomes its own object; nothing is deduplicated. Reference
//! and offset widths are the smallest that fit.

use lso_buffers::Writer;

use super::decoder::{MAGIC, VERSION};
use crate::value::Value;

enum Node {
    Leaf(Vec<u8>),
    Array(Vec<usize>),
    Dict(Vec<usize>, Vec<usize>),
}

#[derive(Default)]
pub struct BinaryPlistEncoder {
    nodes: Vec<Node>,
}

/// Encodes `value` as a complete binary property list.
pub fn encode_binary_plist(value: &Value) -> Vec<u8> {
    BinaryPlistEncoder::new().encode(value)
}

impl BinaryPlistEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, value: &Value) -> Vec<u8> {
        self.nodes.clear();
        let top = self.flatten(value);
        self.write(top)
    }

    fn flatten(&mut self, value: &Value) -> usize {
        match value {
            Value::Sequence(items) => {
                let idx = self.push(Node::Array(Vec::new()));
                let refs = items.iter().map(|item| self.flatten(item)).collect();
                self.nodes[idx] = Node::Array(refs);
                idx
            }
            Value::Mapping(map) => {
                let idx = self.push(Node::Dict(Vec::new(), Vec::new()));
                let keys = map
                    .keys()
                    .map(|key| self.push(Node::Leaf(text(key))))
                    .collect();
                let values = map.values().map(|v| self.flatten(v)).collect();
                self.nodes[idx] = Node::Dict(keys, values);
                idx
            }
            scalar => self.push(Node::Leaf(leaf(scalar))),
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn write(&mut self, top: usize) -> Vec<u8> {
        let count = self.nodes.len();
        let ref_size = width_for(count as u64 - 1);
        let mut w = Writer::new();
        w.buf(MAGIC);
        w.buf(VERSION);

        let mut offsets = Vec::with_capacity(count);
        for node in &self.nodes {
            offsets.push(w.position() as u64);
            match node {
                Node::Leaf(bytes) => w.buf(bytes),
                Node::Array(refs) => {
                    marker(&mut w, 0xA, refs.len());
                    for &r in refs {
                        uint(&mut w, r as u64, ref_size);
                    }
                }
                Node::Dict(keys, values) => {
                    marker(&mut w, 0xD, keys.len());
                    for &r in keys.iter().chain(values) {
                        uint(&mut w, r as u64, ref_size);
                    }
                }
            }
        }

        let table_offset = w.position() as u64;
        let offset_size = width_for(table_offset);
        for offset in offsets {
            uint(&mut w, offset, offset_size);
        }
        w.buf(&[0; 6]);
        w.u8(offset_size as u8);
        w.u8(ref_size as u8);
        w.u64_be(count as u64);
        w.u64_be(top as u64);
        w.u64_be(table_offset);
        w.flush()
    }
}

fn leaf(value: &Value) -> Vec<u8> {
    let mut w = Writer::new();
    match value {
        Value::Null => w.u8(0x00),
        Value::Bool(false) => w.u8(0x08),
        Value::Bool(true) => w.u8(0x09),
        Value::Integer(i) => int(&mut w, *i),
        Value::Float(f) => {
            w.u8(0x23);
            w.f64_be(*f);
        }
        Value::Date(d) => {
            w.u8(0x33);
            w.f64_be(*d);
        }
        Value::Text(s) => return text(s),
        Value::Bytes(b) => {
            marker(&mut w, 0x4, b.len());
            w.buf(b);
        }
        Value::Reference(uid) => {
            let width = width_for(*uid);
            w.u8(0x80 | (width as u8 - 1));
            uint(&mut w, *uid, width);
        }
        Value::Placeholder(p) => return text(&p.to_string()),
        Value::Sequence(_) | Value::Mapping(_) => unreachable!("containers are flattened"),
    }
    w.flush()
}

fn text(s: &str) -> Vec<u8> {
    let mut w = Writer::new();
    if s.is_ascii() {
        marker(&mut w, 0x5, s.len());
        w.buf(s.as_bytes());
    } else {
        let units: Vec<u16> = s.encode_utf16().collect();
        marker(&mut w, 0x6, units.len());
        for unit in units {
            w.u16_be(unit);
        }
    }
    w.flush()
}

fn marker(w: &mut Writer, kind: u8, len: usize) {
    if len < 0x0F {
        w.u8(kind << 4 | len as u8);
    } else {
        w.u8(kind << 4 | 0x0F);
        int(w, len as i64);
    }
}

fn int(w: &mut Writer, i: i64) {
    if i < 0 {
        w.u8(0x13);
        w.buf(&i.to_be_bytes());
        return;
    }
    let width = width_for(i as u64);
    w.u8(0x10 | width.trailing_zeros() as u8);
    uint(w, i as u64, width);
}

fn uint(w: &mut Writer, v: u64, width: usize) {
    w.buf(&v.to_be_bytes()[8 - width..]);
}

fn width_for(v: u64) -> usize {
    match v {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}
