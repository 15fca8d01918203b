//! `bplist00` decoder producing [`Value`].
//!
//! Layout: an 8-byte `bplist00` header, the objects, an offset table giving
//! each object's position, and a 32-byte trailer describing the table. All
//! multi-byte integers are big-endian. Containers refer to their members by
//! index into the offset table; those references are inlined here. Keyed
//! archive UIDs (marker `0x8_`) are not followed: they surface as
//! [`Value::Reference`] for the archive resolver.
//!
//! An object referenced from several containers is decoded again for each
//! of them until it has been seen twice, after which the decoded value is
//! cloned. Every node placed in the output counts against `max_nodes`, so a
//! small file that shares objects along many paths fails with
//! [`PlistError::TooManyNodes`] instead of running for exponential time.

use lso_buffers::Reader;

use super::error::PlistError;
use crate::value::{Mapping, Value};

pub const MAGIC: &[u8; 6] = b"bplist";
pub const VERSION: &[u8; 2] = b"00";
pub const DEFAULT_MAX_DEPTH: usize = 512;
pub const DEFAULT_MAX_NODES: usize = 4_000_000;

const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 32;

/// The trailer fields that locate the offset table and the top object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub offset_int_size: u8,
    pub object_ref_size: u8,
    pub num_objects: u64,
    pub top_object: u64,
    pub offset_table_offset: u64,
}

/// Decodes a complete binary property list.
pub fn decode_binary_plist(data: &[u8]) -> Result<Value, PlistError> {
    BinaryPlistDecoder::new(data)?.decode()
}

pub struct BinaryPlistDecoder<'a> {
    /// Header and object area; the offset table and trailer are cut off.
    data: &'a [u8],
    trailer: Trailer,
    offsets: Vec<usize>,
    on_path: Vec<bool>,
    seen: Vec<bool>,
    memo: Vec<Option<Shared>>,
    depth: usize,
    /// Deepest level reached so far, for measuring object heights.
    deepest: usize,
    max_depth: usize,
    nodes: usize,
    max_nodes: usize,
}

/// A decoded object kept for reuse by later references.
struct Shared {
    value: Value,
    nodes: usize,
    height: usize,
}

impl<'a> BinaryPlistDecoder<'a> {
    /// Validates the header and trailer and loads the offset table.
    pub fn new(data: &'a [u8]) -> Result<Self, PlistError> {
        if !data.starts_with(MAGIC) {
            return Err(PlistError::InvalidMagic);
        }
        if data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(PlistError::InvalidTrailer("file too short"));
        }
        let version = &data[MAGIC.len()..HEADER_LEN];
        if version != VERSION {
            return Err(PlistError::UnsupportedVersion(
                String::from_utf8_lossy(version).into_owned(),
            ));
        }

        let objects_end = data.len() - TRAILER_LEN;
        let mut r = Reader::at(data, objects_end);
        r.skip(6)?;
        let trailer = Trailer {
            offset_int_size: r.u8()?,
            object_ref_size: r.u8()?,
            num_objects: r.u64_be()?,
            top_object: r.u64_be()?,
            offset_table_offset: r.u64_be()?,
        };
        if !(1..=8).contains(&trailer.offset_int_size) {
            return Err(PlistError::InvalidTrailer("offset size out of range"));
        }
        if !(1..=8).contains(&trailer.object_ref_size) {
            return Err(PlistError::InvalidTrailer("reference size out of range"));
        }
        if trailer.num_objects == 0 {
            return Err(PlistError::InvalidTrailer("no objects"));
        }
        if trailer.top_object >= trailer.num_objects {
            return Err(PlistError::InvalidTrailer("top object outside the table"));
        }
        let table_len = trailer
            .num_objects
            .checked_mul(trailer.offset_int_size as u64)
            .and_then(|len| len.checked_add(trailer.offset_table_offset));
        match table_len {
            Some(end)
                if trailer.offset_table_offset >= HEADER_LEN as u64
                    && end <= objects_end as u64 => {}
            _ => return Err(PlistError::InvalidTrailer("offset table outside the file")),
        }

        let table_offset = trailer.offset_table_offset as usize;
        let count = trailer.num_objects as usize;
        let mut r = Reader::at(data, table_offset);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = r.uint_be(trailer.offset_int_size as usize)?;
            if offset < HEADER_LEN as u64 || offset >= table_offset as u64 {
                return Err(PlistError::InvalidOffset(offset));
            }
            offsets.push(offset as usize);
        }

        Ok(Self {
            data: &data[..table_offset],
            trailer,
            offsets,
            on_path: vec![false; count],
            seen: vec![false; count],
            memo: std::iter::repeat_with(|| None).take(count).collect(),
            depth: 0,
            deepest: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            nodes: 0,
            max_nodes: DEFAULT_MAX_NODES,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Caps the number of values the decoded tree may contain.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Decodes the top object and everything it contains.
    pub fn decode(&mut self) -> Result<Value, PlistError> {
        self.read_object(self.trailer.top_object)
    }

    fn read_object(&mut self, index: u64) -> Result<Value, PlistError> {
        let idx = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.offsets.len())
            .ok_or(PlistError::InvalidReference(index))?;
        if self.on_path[idx] {
            return Err(PlistError::CyclicObject(index));
        }
        if let Some(shared) = &self.memo[idx] {
            if self.depth + shared.height > self.max_depth {
                return Err(PlistError::TooDeep(self.max_depth));
            }
            let (value, nodes, height) = (shared.value.clone(), shared.nodes, shared.height);
            self.charge(nodes)?;
            self.deepest = self.deepest.max(self.depth + height);
            return Ok(value);
        }
        if self.depth >= self.max_depth {
            return Err(PlistError::TooDeep(self.max_depth));
        }
        self.charge(1)?;

        let entry_depth = self.depth;
        let entry_nodes = self.nodes;
        let outer_deepest = self.deepest;
        self.deepest = entry_depth;
        self.on_path[idx] = true;
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
        let result = self.read_at(self.offsets[idx]);
        self.depth -= 1;
        self.on_path[idx] = false;
        let height = self.deepest - entry_depth;
        self.deepest = self.deepest.max(outer_deepest);

        let value = result?;
        if self.seen[idx] {
            self.memo[idx] = Some(Shared {
                value: value.clone(),
                nodes: self.nodes - entry_nodes,
                height,
            });
        } else {
            self.seen[idx] = true;
        }
        Ok(value)
    }

    fn charge(&mut self, nodes: usize) -> Result<(), PlistError> {
        if nodes > self.max_nodes - self.nodes {
            return Err(PlistError::TooManyNodes(self.max_nodes));
        }
        self.nodes += nodes;
        Ok(())
    }

    fn read_at(&mut self, offset: usize) -> Result<Value, PlistError> {
        let mut r = Reader::at(self.data, offset);
        let marker = r.u8()?;
        let low = marker & 0x0F;
        match marker >> 4 {
            0x0 => match low {
                0x0 | 0xF => Ok(Value::Null),
                0x8 => Ok(Value::Bool(false)),
                0x9 => Ok(Value::Bool(true)),
                _ => Err(PlistError::UnknownMarker(marker)),
            },
            0x1 => match low {
                0..=2 => Ok(Value::Integer(r.uint_be(1 << low)? as i64)),
                3 => Ok(Value::Integer(r.i64_be()?)),
                4 => {
                    let wide = r.i128_be()?;
                    Ok(i64::try_from(wide)
                        .map(Value::Integer)
                        .unwrap_or(Value::Float(wide as f64)))
                }
                _ => Err(PlistError::UnknownMarker(marker)),
            },
            0x2 => match low {
                2 => Ok(Value::Float(r.f32_be()? as f64)),
                3 => Ok(Value::Float(r.f64_be()?)),
                _ => Err(PlistError::UnknownMarker(marker)),
            },
            0x3 if low == 3 => Ok(Value::Date(r.f64_be()?)),
            0x4 => {
                let len = read_len(&mut r, low, offset)?;
                Ok(Value::Bytes(r.buf(len)?.to_vec()))
            }
            0x5 => {
                let len = read_len(&mut r, low, offset)?;
                Ok(Value::Text(r.buf(len)?.iter().map(|&b| b as char).collect()))
            }
            0x6 => {
                let len = read_len(&mut r, low, offset)?;
                let byte_len = len.checked_mul(2).ok_or(PlistError::InvalidLength(offset))?;
                let units: Vec<u16> = r
                    .buf(byte_len)?
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map(Value::Text)
                    .map_err(|_| PlistError::InvalidString(offset))
            }
            0x8 if low < 8 => Ok(Value::Reference(r.uint_be(low as usize + 1)?)),
            0xA | 0xB | 0xC => {
                let len = read_len(&mut r, low, offset)?;
                let refs = self.read_refs(&mut r, len, offset)?;
                let mut items = Vec::with_capacity(refs.len());
                for index in refs {
                    items.push(self.read_object(index)?);
                }
                Ok(Value::Sequence(items))
            }
            0xD => {
                let len = read_len(&mut r, low, offset)?;
                let keys = self.read_refs(&mut r, len, offset)?;
                let values = self.read_refs(&mut r, len, offset)?;
                let mut map = Mapping::with_capacity(len);
                for (key, value) in keys.into_iter().zip(values) {
                    let key = match self.read_object(key)? {
                        Value::Text(key) => key,
                        _ => return Err(PlistError::NonStringKey(offset)),
                    };
                    let value = self.read_object(value)?;
                    map.insert(key, value);
                }
                Ok(Value::Mapping(map))
            }
            _ => Err(PlistError::UnknownMarker(marker)),
        }
    }

    fn read_refs(
        &self,
        r: &mut Reader<'_>,
        count: usize,
        offset: usize,
    ) -> Result<Vec<u64>, PlistError> {
        let size = self.trailer.object_ref_size as usize;
        let len = count
            .checked_mul(size)
            .ok_or(PlistError::InvalidLength(offset))?;
        Ok(r
            .buf(len)?
            .chunks_exact(size)
            .map(|word| word.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
            .collect())
    }
}

/// Reads an object length: the marker's low nibble, or a trailing integer
/// object when the nibble is `0xF`.
fn read_len(r: &mut Reader<'_>, low: u8, offset: usize) -> Result<usize, PlistError> {
    if low != 0x0F {
        return Ok(low as usize);
    }
    let marker = r.u8()?;
    if marker >> 4 != 0x1 || marker & 0x0F > 3 {
        return Err(PlistError::InvalidLength(offset));
    }
    let len = r.uint_be(1 << (marker & 0x0F))?;
    usize::try_from(len).map_err(|_| PlistError::InvalidLength(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a plist from pre-encoded objects, with 1-byte offsets and refs.
    fn plist(objects: &[&[u8]], top: u64) -> Vec<u8> {
        let mut out = b"bplist00".to_vec();
        let mut offsets = Vec::new();
        for object in objects {
            offsets.push(out.len() as u8);
            out.extend_from_slice(object);
        }
        let table = out.len() as u64;
        out.extend_from_slice(&offsets);
        out.extend_from_slice(&[0; 6]);
        out.extend_from_slice(&[1, 1]);
        out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
        out.extend_from_slice(&top.to_be_bytes());
        out.extend_from_slice(&table.to_be_bytes());
        out
    }

    #[test]
    fn decodes_scalars() {
        let data = plist(
            &[
                &[0xA6, 1, 2, 3, 4, 5, 6],
                &[0x09],
                &[0x11, 0x01, 0x00],
                &[0x23, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0],
                &[0x53, b'a', b'b', b'c'],
                &[0x61, 0x00, 0xE9],
                &[0x82, 0x01, 0x02, 0x03],
            ],
            0,
        );
        let value = decode_binary_plist(&data).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![
                Value::Bool(true),
                Value::Integer(256),
                Value::Float(1.5),
                Value::Text("abc".into()),
                Value::Text("é".into()),
                Value::Reference(0x010203),
            ])
        );
    }

    #[test]
    fn decodes_dictionary_with_extended_length() {
        let mut long = vec![0x5F, 0x10, 20];
        long.extend(std::iter::repeat(b'x').take(20));
        let data = plist(&[&[0xD1, 1, 2], &[0x51, b'k'], &long], 0);
        let value = decode_binary_plist(&data).unwrap();
        assert_eq!(value.get("k"), Some(&Value::Text("x".repeat(20))));
    }

    #[test]
    fn rejects_self_containing_array() {
        let data = plist(&[&[0xA1, 0]], 0);
        assert_eq!(
            decode_binary_plist(&data),
            Err(PlistError::CyclicObject(0))
        );
    }

    #[test]
    fn rejects_bad_headers_and_references() {
        assert_eq!(decode_binary_plist(b"nope"), Err(PlistError::InvalidMagic));
        assert!(matches!(
            decode_binary_plist(b"bplist00"),
            Err(PlistError::InvalidTrailer(_))
        ));
        let data = plist(&[&[0xA1, 9]], 0);
        assert_eq!(decode_binary_plist(&data), Err(PlistError::InvalidReference(9)));
        let data = plist(&[&[0xD1, 1, 1], &[0x10, 1]], 0);
        assert!(matches!(
            decode_binary_plist(&data),
            Err(PlistError::NonStringKey(_))
        ));
    }

    #[test]
    fn truncated_object_is_an_error_not_a_panic() {
        let data = plist(&[&[0x4F, 0x13]], 0);
        assert!(decode_binary_plist(&data).is_err());
    }

    /// Object `i` is an array holding object `i + 1` twice.
    fn doubling_chain(len: u8) -> Vec<u8> {
        let mut objects: Vec<Vec<u8>> = (1..len).map(|i| vec![0xA2, i, i]).collect();
        objects.push(vec![0x10, 7]);
        let refs: Vec<&[u8]> = objects.iter().map(Vec::as_slice).collect();
        plist(&refs, 0)
    }

    #[test]
    fn shared_objects_decode_once_per_reference() {
        let data = doubling_chain(3);
        let leaf = Value::Sequence(vec![Value::Integer(7), Value::Integer(7)]);
        assert_eq!(
            decode_binary_plist(&data).unwrap(),
            Value::Sequence(vec![leaf.clone(), leaf])
        );
    }

    #[test]
    fn node_budget_is_exact() {
        let data = doubling_chain(3);
        let mut decoder = BinaryPlistDecoder::new(&data).unwrap().with_max_nodes(7);
        assert!(decoder.decode().is_ok());
        let mut decoder = BinaryPlistDecoder::new(&data).unwrap().with_max_nodes(6);
        assert_eq!(decoder.decode(), Err(PlistError::TooManyNodes(6)));
    }

    #[test]
    fn exponential_sharing_hits_the_node_budget() {
        let data = doubling_chain(60);
        assert_eq!(
            decode_binary_plist(&data),
            Err(PlistError::TooManyNodes(DEFAULT_MAX_NODES))
        );
    }

    #[test]
    fn reused_objects_still_respect_the_depth_limit() {
        // obj2 is decoded twice at depth 1, then reached again through obj1.
        let data = plist(&[&[0xA3, 2, 2, 1], &[0xA1, 2], &[0xA1, 3], &[0x10, 1]], 0);
        let mut decoder = BinaryPlistDecoder::new(&data).unwrap().with_max_depth(3);
        assert_eq!(decoder.decode(), Err(PlistError::TooDeep(3)));
        let mut decoder = BinaryPlistDecoder::new(&data).unwrap().with_max_depth(4);
        assert!(decoder.decode().is_ok());
    }
}
