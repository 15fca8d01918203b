use lso::cli::{chunks_json, scan_json, unarchive_json, ChunksOptions, CliError};
use lso_pack::{encode_binary_plist, ChunkEncoder, DecodeOptions, Descriptor, ScanOptions, Value};
use serde_json::json;

#[test]
fn chunks_listing() {
    let mut enc = ChunkEncoder::new();
    enc.chunk(Descriptor::SONG, br#"..{"tempo":120}.."#);
    enc.chunk(Descriptor::COMP, &[0; 4]);
    let bytes = enc.finish();

    let options = ChunksOptions {
        documents: true,
        ..ChunksOptions::default()
    };
    let out: serde_json::Value = serde_json::from_str(&chunks_json(&bytes, &options).unwrap()).unwrap();
    assert_eq!(out["header"]["magic"], json!("2347c0ab"));
    assert_eq!(out["chunks"][0]["descriptor"], json!("Song"));
    assert_eq!(out["chunks"][0]["offset"], json!(24));
    assert_eq!(out["chunks"][0]["status"], json!("000000000000"));
    assert_eq!(
        out["chunks"][0]["documents"],
        json!([{"offset": 2, "value": {"tempo": 120}}])
    );
    assert_eq!(out["chunks"][1]["offset"], json!(24 + 36 + 17));
    assert_eq!(out["warnings"], json!([]));
}

#[test]
fn truncation_is_reported_as_a_warning() {
    let mut enc = ChunkEncoder::new();
    enc.chunk(Descriptor::TRACK, &[1; 10]);
    let mut bytes = enc.finish();
    bytes.pop();
    let out: serde_json::Value =
        serde_json::from_str(&chunks_json(&bytes, &ChunksOptions::default()).unwrap()).unwrap();
    assert_eq!(out["chunks"][0]["truncated"], json!(true));
    assert_eq!(out["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn scan_listing() {
    let out = scan_json(br#"xx{"a":1}yy{"b":"}"}"#, &ScanOptions::default()).unwrap();
    let out: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        out,
        json!([
            {"offset": 2, "len": 7, "value": {"a": 1}},
            {"offset": 11, "len": 9, "value": {"b": "}"}},
        ])
    );
}

#[test]
fn unarchive_plain_plist_and_refuse_containers() {
    let plist = encode_binary_plist(&Value::from(json!({"k": [1, 2]})));
    let out: serde_json::Value =
        serde_json::from_str(&unarchive_json(&plist, &DecodeOptions::default()).unwrap()).unwrap();
    assert_eq!(out, json!({"k": [1, 2]}));

    let container = ChunkEncoder::new().finish();
    assert!(matches!(
        unarchive_json(&container, &DecodeOptions::default()),
        Err(CliError::UnexpectedFormat(_))
    ));
}
