//! Style-document surgery: placeholder expansion, tileset source binding,
//! indoor layer visibility, camera derivation, and the editor metadata
//! keys carried through a round trip.

use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Placeholder host used in stored style documents; replaced with the
/// account's real domain when a style is resolved for rendering.
pub const DOMAIN_PLACEHOLDER: &str = "{{atlasDomain}}";
pub const LANGUAGE_PLACEHOLDER: &str = "{{atlasLanguage}}";
pub const VIEW_PLACEHOLDER: &str = "{{atlasView}}";

pub const METADATA_ALIAS_KEY: &str = "styleforge:alias";
pub const METADATA_DESCRIPTION_KEY: &str = "styleforge:description";
pub const METADATA_CONFIGURATION_KEY: &str = "styleforge:mapConfiguration";

const STYLE_ID_PREFIX: &str = "atlas-";
const VISIBLE: &str = "visible";
const HIDDEN: &str = "none";

pub fn generate_style_id() -> String {
    format!("{STYLE_ID_PREFIX}{}", Uuid::new_v4())
}

/// Ensures the document carries an `id`, generating one when absent.
/// Returns the id in effect afterwards.
pub fn ensure_style_id(style: &mut Value) -> String {
    if let Some(id) = style.get("id").and_then(Value::as_str) {
        if !id.is_empty() {
            return id.to_string();
        }
    }
    let id = generate_style_id();
    if let Some(object) = style.as_object_mut() {
        object.insert("id".to_string(), Value::String(id.clone()));
    }
    id
}

/// Rewrites every placeholder occurrence in every string value of the
/// document, recursively. A placeholder-host URL that ends up with no query
/// string also gains the `api-version` parameter the service requires.
pub fn expand_domain_placeholders(
    style: &mut Value,
    domain: &str,
    language: &str,
    view: &str,
    api_version: &str,
) {
    rewrite_strings(style, &mut |text| {
        if !text.contains("{{") {
            return None;
        }
        let had_domain = text.contains(DOMAIN_PLACEHOLDER);
        let mut expanded = text
            .replace(DOMAIN_PLACEHOLDER, domain)
            .replace(LANGUAGE_PLACEHOLDER, language)
            .replace(VIEW_PLACEHOLDER, view);
        if had_domain && !expanded.contains('?') {
            expanded.push_str(&format!("?api-version={api_version}"));
        }
        Some(expanded)
    });
}

fn rewrite_strings(value: &mut Value, rewrite: &mut impl FnMut(&str) -> Option<String>) {
    match value {
        Value::String(text) => {
            if let Some(replacement) = rewrite(text) {
                *text = replacement;
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_strings(item, rewrite);
            }
        }
        Value::Object(fields) => {
            for (_, field) in fields.iter_mut() {
                rewrite_strings(field, rewrite);
            }
        }
        _ => {}
    }
}

/// Tile endpoint template for a vector tileset, with `{z}`/`{x}`/`{y}`
/// left for the renderer to substitute.
pub fn tile_url_template(domain: &str, tileset_id: &str, api_version: &str) -> String {
    format!(
        "https://{domain}/map/tile?api-version={api_version}&tilesetId={tileset_id}&zoom={{z}}&x={{x}}&y={{y}}"
    )
}

/// Binds every layer of the document to a tileset-backed vector source and
/// forces indoor-category layers visible. The source entry carries the
/// tileset's zoom range so the renderer does not over-request tiles.
pub fn bind_tileset_source(
    style: &mut Value,
    tileset_id: &str,
    tiles_url: &str,
    min_zoom: f64,
    max_zoom: f64,
) {
    let source = json!({
        "type": "vector",
        "tiles": [tiles_url],
        "minzoom": min_zoom,
        "maxzoom": max_zoom,
    });
    if let Some(object) = style.as_object_mut() {
        let sources = object
            .entry("sources")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(sources) = sources.as_object_mut() {
            sources.insert(tileset_id.to_string(), source);
        }
    }

    for_each_layer(style, |layer| {
        layer.insert("source".to_string(), Value::String(tileset_id.to_string()));
        if is_indoor_layer_map(layer) {
            set_visibility(layer, true);
        }
    });
}

/// Inverse of [`bind_tileset_source`]: removes the editor's transient
/// tileset binding and hides indoor-category layers again, matching how
/// the server stores style artifacts.
pub fn strip_tileset_binding(style: &mut Value, tileset_id: &str) {
    if let Some(sources) = style.get_mut("sources").and_then(Value::as_object_mut) {
        sources.remove(tileset_id);
    }
    for_each_layer(style, |layer| {
        layer.remove("source");
        if is_indoor_layer_map(layer) {
            set_visibility(layer, false);
        }
    });
}

fn for_each_layer(style: &mut Value, mut apply: impl FnMut(&mut Map<String, Value>)) {
    if let Some(layers) = style.get_mut("layers").and_then(Value::as_array_mut) {
        for layer in layers {
            if let Some(layer) = layer.as_object_mut() {
                apply(layer);
            }
        }
    }
}

pub fn is_indoor_layer(layer: &Value) -> bool {
    layer
        .as_object()
        .map(is_indoor_layer_map)
        .unwrap_or(false)
}

fn is_indoor_layer_map(layer: &Map<String, Value>) -> bool {
    layer
        .get("id")
        .and_then(Value::as_str)
        .map(|id| id.to_ascii_lowercase().contains("indoor"))
        .unwrap_or(false)
}

fn set_visibility(layer: &mut Map<String, Value>, visible: bool) {
    let layout = layer
        .entry("layout")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(layout) = layout.as_object_mut() {
        let state = if visible { VISIBLE } else { HIDDEN };
        layout.insert("visibility".to_string(), Value::String(state.to_string()));
    }
}

/// Sets the document's camera to the midpoint of a tileset's bounding box
/// and the middle of its zoom range.
pub fn set_camera_from_bounds(style: &mut Value, bounds: [f64; 4], min_zoom: f64, max_zoom: f64) {
    let (center, zoom) = derive_camera(bounds, min_zoom, max_zoom);
    if let Some(object) = style.as_object_mut() {
        object.insert("center".to_string(), json!([center[0], center[1]]));
        object.insert("zoom".to_string(), json!(zoom));
    }
}

pub fn derive_camera(bounds: [f64; 4], min_zoom: f64, max_zoom: f64) -> ([f64; 2], f64) {
    let center = [
        (bounds[0] + bounds[2]) / 2.0,
        (bounds[1] + bounds[3]) / 2.0,
    ];
    let zoom = (min_zoom + max_zoom) / 2.0;
    (center, zoom)
}

/// Records provenance under the document's `metadata` object so a later
/// upload can reuse the alias and description the style came from.
pub fn set_editor_metadata(style: &mut Value, alias: &str, description: &str, configuration: &str) {
    if let Some(object) = style.as_object_mut() {
        let metadata = object
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(metadata) = metadata.as_object_mut() {
            metadata.insert(
                METADATA_ALIAS_KEY.to_string(),
                Value::String(alias.to_string()),
            );
            metadata.insert(
                METADATA_DESCRIPTION_KEY.to_string(),
                Value::String(description.to_string()),
            );
            metadata.insert(
                METADATA_CONFIGURATION_KEY.to_string(),
                Value::String(configuration.to_string()),
            );
        }
    }
}

/// Removes the editor-private metadata keys before a document goes back to
/// the server. Leaves any other metadata untouched.
pub fn strip_editor_metadata(style: &mut Value) {
    if let Some(metadata) = style.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.remove(METADATA_ALIAS_KEY);
        metadata.remove(METADATA_DESCRIPTION_KEY);
        metadata.remove(METADATA_CONFIGURATION_KEY);
    }
}

pub fn editor_metadata(style: &Value, key: &str) -> Option<String> {
    style
        .get("metadata")
        .and_then(|metadata| metadata.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
