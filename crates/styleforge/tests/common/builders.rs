//! Builders for the ZIP bundles and JSON documents the tests exercise.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use serde_json::{json, Value};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Not a decodable image; nothing in the crate inspects image contents.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfakedata";

/// Assembles a ZIP blob from (name, bytes) pairs, in order.
pub fn zip_bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A style bundle: the given root document plus one sprite-sheet pair.
pub fn style_bundle(root: &Value) -> Vec<u8> {
    let root = root.to_string();
    zip_bundle(&[
        ("style.json", root.as_bytes()),
        ("sprite.png", FAKE_PNG),
        ("sprite.json", br#"{"icon":{"x":0,"y":0}}"#),
    ])
}

/// A map configuration bundle with a single-entry root document.
pub fn configuration_bundle(configuration: &Value) -> Vec<u8> {
    let root = configuration.to_string();
    zip_bundle(&[("configuration.json", root.as_bytes())])
}

pub fn sample_style_document() -> Value {
    json!({
        "version": 8,
        "sprite": "https://{{atlasDomain}}/styles/sprites/indoor",
        "glyphs": "https://{{atlasDomain}}/styles/glyphs?api-version=2.0",
        "layers": [
            {"id": "walls", "type": "fill"},
            {"id": "indoor_unit", "type": "fill", "layout": {"visibility": "none"}}
        ]
    })
}

pub fn sample_configuration_document() -> Value {
    json!({
        "version": "1.0",
        "styles": [{
            "name": "indoor",
            "layers": [
                {"styleId": "style-a", "tilesetId": "tileset-1"},
                {"styleId": "style-b", "tilesetId": "tileset-1"}
            ]
        }]
    })
}

pub fn sample_tileset_metadata() -> Value {
    json!({"minZoom": 1, "maxZoom": 5, "bbox": [0.0, 0.0, 2.0, 2.0]})
}
