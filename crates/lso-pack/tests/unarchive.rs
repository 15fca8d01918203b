//! Sidecar archives end to end: gzip, binary plist, keyed archive.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use lso_pack::{
    decode, encode_binary_plist, DecodeError, DecodeOptions, Decoded, Descriptor, Mapping,
    Placeholder, PlistError, ResolveOptions, Value,
};
use serde_json::json;

fn archive(objects: Vec<Value>, root: u64) -> Value {
    let mut top = Mapping::new();
    top.insert("root".into(), Value::Reference(root));
    let mut map = Mapping::new();
    map.insert("$version".into(), Value::Integer(100_000));
    map.insert("$archiver".into(), Value::Text("NSKeyedArchiver".into()));
    map.insert("$top".into(), Value::Mapping(top));
    map.insert("$objects".into(), Value::Sequence(objects));
    Value::Mapping(map)
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::best());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn project_objects() -> Vec<Value> {
    vec![
        Value::Text("$null".into()),
        object(vec![
            ("$class", Value::Reference(5)),
            ("name", Value::Reference(2)),
            ("tracks", Value::Reference(3)),
            ("owner", Value::Reference(1)),
            ("missing", Value::Reference(77)),
        ]),
        Value::Text("Session".into()),
        object(vec![
            ("$class", Value::Reference(6)),
            (
                "NS.objects",
                Value::Sequence(vec![Value::Reference(4), Value::Reference(4)]),
            ),
        ]),
        object(vec![
            ("$class", Value::Reference(5)),
            ("name", Value::Text("Drums".into())),
            ("data", Value::Bytes(vec![1, 2, 3])),
        ]),
        Value::from(json!({"$classname": "Track", "$classes": ["Track", "NSObject"]})),
        Value::from(json!({"$classname": "NSArray", "$classes": ["NSArray", "NSObject"]})),
    ]
}

#[test]
fn gzipped_keyed_archive_resolves() {
    let plist = encode_binary_plist(&archive(project_objects(), 1));
    let packed = gzip(&plist);

    let Decoded::Archive(root) = decode(&packed, &DecodeOptions::default()).unwrap() else {
        panic!("expected an archive");
    };
    let drums = object(vec![
        ("name", Value::Text("Drums".into())),
        ("data", Value::Bytes(vec![1, 2, 3])),
    ]);
    assert_eq!(
        root,
        object(vec![
            ("name", Value::Text("Session".into())),
            (
                "tracks",
                object(vec![("NS.objects", Value::Sequence(vec![drums.clone(), drums]))]),
            ),
            ("owner", Value::Placeholder(Placeholder::Cyclic(1))),
            ("missing", Value::Placeholder(Placeholder::Dangling(77))),
        ])
    );
    assert!(!root.contains_reference());

    let rendered = serde_json::Value::from(root);
    assert_eq!(rendered["owner"], json!("<Cyclic UID 1>"));
    assert_eq!(rendered["missing"], json!("<Invalid UID 77>"));
    assert_eq!(rendered["tracks"]["NS.objects"][0]["data"], json!("AQID"));
}

#[test]
fn uncompressed_archive_and_plain_plist() {
    let plist = encode_binary_plist(&archive(project_objects(), 2));
    match decode(&plist, &DecodeOptions::default()).unwrap() {
        Decoded::Archive(root) => assert_eq!(root, Value::Text("Session".into())),
        other => panic!("unexpected {other:?}"),
    }

    let plain = Value::from(json!({"volume": 0.8, "muted": false}));
    match decode(&encode_binary_plist(&plain), &DecodeOptions::default()).unwrap() {
        Decoded::Plist(value) => assert_eq!(value, plain),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn resolve_depth_follows_options() {
    let objects: Vec<Value> = (0..20u64)
        .map(|i| object(vec![("next", Value::Reference(i + 1))]))
        .chain([Value::Text("end".into())])
        .collect();
    let plist = encode_binary_plist(&archive(objects, 0));

    let shallow = DecodeOptions {
        resolve: ResolveOptions {
            max_depth: 4,
            ..ResolveOptions::default()
        },
        ..DecodeOptions::default()
    };
    let Decoded::Archive(root) = decode(&plist, &shallow).unwrap() else {
        panic!("expected an archive");
    };
    assert_eq!(
        root,
        object(vec![(
            "next",
            object(vec![("next", Value::Placeholder(Placeholder::DepthLimit(2)))])
        )])
    );

    let Decoded::Archive(full) = decode(&plist, &DecodeOptions::default()).unwrap() else {
        panic!("expected an archive");
    };
    let mut cursor = &full;
    for _ in 0..20 {
        cursor = cursor.get("next").unwrap();
    }
    assert_eq!(cursor, &Value::Text("end".into()));
}

#[test]
fn oversized_inflation_is_refused() {
    let packed = gzip(&encode_binary_plist(&archive(project_objects(), 1)));
    let tight = DecodeOptions {
        max_inflated_len: 16,
        ..DecodeOptions::default()
    };
    assert_eq!(
        decode(&packed, &tight).err(),
        Some(DecodeError::InflatedTooLarge(16))
    );
}

#[test]
fn container_buffers_open_as_chunk_streams() {
    let mut enc = lso_pack::ChunkEncoder::new();
    enc.chunk(Descriptor::SONG, b"abc");
    let bytes = enc.finish();
    let Decoded::Chunks(stream) = decode(&bytes, &DecodeOptions::default()).unwrap() else {
        panic!("expected chunks");
    };
    let records: Vec<_> = stream.collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload, b"abc");
}

fn nested(levels: usize, inner: Value) -> Value {
    (0..levels).fold(inner, |acc, _| Value::Sequence(vec![acc]))
}

#[test]
fn deep_entries_chained_by_reference_stop_at_the_depth_limit() {
    let objects: Vec<Value> = (0..4u64)
        .map(|i| nested(300, Value::Reference(i + 1)))
        .chain([Value::Text("end".into())])
        .collect();
    let plist = encode_binary_plist(&archive(objects, 0));

    let Decoded::Archive(root) = decode(&plist, &DecodeOptions::default()).unwrap() else {
        panic!("expected an archive");
    };
    let mut cursor = &root;
    let mut levels = 0;
    while let Value::Sequence(items) = cursor {
        cursor = &items[0];
        levels += 1;
    }
    assert_eq!(levels, 510);
    assert_eq!(cursor, &Value::Placeholder(Placeholder::DepthLimit(1)));
}

/// A plist of `len` arrays where each holds the next one twice.
fn doubling_plist(len: u8) -> Vec<u8> {
    let mut out = b"bplist00".to_vec();
    let mut offsets = Vec::new();
    for i in 1..len {
        offsets.push(out.len() as u8);
        out.extend_from_slice(&[0xA2, i, i]);
    }
    offsets.push(out.len() as u8);
    out.extend_from_slice(&[0x10, 1]);
    let table = out.len() as u64;
    out.extend_from_slice(&offsets);
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 1]);
    out.extend_from_slice(&u64::from(len).to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&table.to_be_bytes());
    out
}

#[test]
fn shared_plist_objects_are_bounded_by_the_node_budget() {
    let small = decode(&doubling_plist(4), &DecodeOptions::default()).unwrap();
    let Decoded::Plist(value) = small else {
        panic!("expected a plist");
    };
    assert_eq!(
        serde_json::Value::from(value),
        json!([[[1, 1], [1, 1]], [[1, 1], [1, 1]]])
    );

    let packed = gzip(&doubling_plist(60));
    assert_eq!(
        decode(&packed, &DecodeOptions::default()).err(),
        Some(DecodeError::Plist(PlistError::TooManyNodes(
            lso_pack::plist::DEFAULT_MAX_NODES
        )))
    );

    let tight = DecodeOptions {
        max_nodes: 10,
        ..DecodeOptions::default()
    };
    assert_eq!(
        decode(&doubling_plist(4), &tight).err(),
        Some(DecodeError::Plist(PlistError::TooManyNodes(10)))
    );
}

#[test]
fn shared_archive_objects_are_bounded_by_the_node_budget() {
    let objects: Vec<Value> = (0..40u64)
        .map(|i| Value::Sequence(vec![Value::Reference(i + 1), Value::Reference(i + 1)]))
        .chain([Value::Integer(1)])
        .collect();
    let plist = encode_binary_plist(&archive(objects, 0));

    let tight = DecodeOptions {
        resolve: ResolveOptions {
            max_nodes: 10_000,
            ..ResolveOptions::default()
        },
        ..DecodeOptions::default()
    };
    let Decoded::Archive(root) = decode(&plist, &tight).unwrap() else {
        panic!("expected an archive");
    };
    fn count(value: &Value) -> usize {
        match value {
            Value::Sequence(items) => 1 + items.iter().map(count).sum::<usize>(),
            _ => 1,
        }
    }
    // Placeholders are uncharged; only pending siblings turn into them.
    assert!(count(&root) < 10_100);
    let rendered = serde_json::to_string(&serde_json::Value::from(root)).unwrap();
    assert!(rendered.contains("too large>"));
}
