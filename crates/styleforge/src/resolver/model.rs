use std::fmt;

use serde::{Deserialize, Serialize};

/// A map configuration document: an ordered set of styles, each pairing
/// one or more style documents with the tileset they render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfiguration {
    #[serde(default)]
    pub styles: Vec<ConfigurationStyle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStyle {
    #[serde(default)]
    pub layers: Vec<StylePairing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePairing {
    pub style_id: String,
    pub tileset_id: String,
}

/// The addressable unit of selection within a configuration: one
/// (style, tileset) pairing, displayed as `"{styleId} + {tilesetId}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTuple {
    pub style_id: String,
    pub tileset_id: String,
}

impl fmt::Display for StyleTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.style_id, self.tileset_id)
    }
}

/// Flattens a configuration into its selectable pairings, in document
/// order across all styles.
pub fn extract_style_tuples(configuration: &MapConfiguration) -> Vec<StyleTuple> {
    configuration
        .styles
        .iter()
        .flat_map(|style| style.layers.iter())
        .map(|pairing| StyleTuple {
            style_id: pairing.style_id.clone(),
            tileset_id: pairing.tileset_id.clone(),
        })
        .collect()
}

/// The subset of tileset metadata the resolver needs to bind a source
/// and frame the camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetMetadata {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationListing {
    #[serde(default, rename = "mapConfigurations")]
    pub map_configurations: Vec<ConfigurationSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    #[serde(rename = "mapConfigurationId")]
    pub configuration_id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleListing {
    #[serde(default)]
    pub styles: Vec<StyleSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSummary {
    pub style_id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
