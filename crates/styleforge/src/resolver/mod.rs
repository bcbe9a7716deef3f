//! Resolves remote map configurations into renderable style documents and
//! uploads edited results back under their alias.
//!
//! The flow is a one-way chain: a [`Resolver`] lists configurations, selecting
//! one yields a [`SelectedConfiguration`], and resolving one of its pairings
//! yields a [`ResolvedStyle`]. Uploads only exist on the later states, so an
//! upload before a resolve does not typecheck.

pub mod error;
pub mod model;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future;
use log::{debug, info, warn};
use serde_json::Value;

use crate::archive::StyleArchive;
use crate::client::error::ClientError;
use crate::client::poller::{poll_until_complete, PollPolicy};
use crate::client::{
    ArtifactClient, MAP_CONFIGURATION_OPERATIONS, STYLE_OPERATIONS,
};
use crate::config::AccountConfig;
use crate::style;

pub use error::{ResolverError, Result};
pub use model::{
    extract_style_tuples, ConfigurationListing, ConfigurationStyle, ConfigurationSummary,
    MapConfiguration, StyleListing, StylePairing, StyleSummary, StyleTuple, TilesetMetadata,
};

/// Aliases under this prefix belong to the service's built-in artifacts and
/// are rejected before any network call.
pub const RESERVED_ALIAS_PREFIX: &str = "microsoft-";

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_VIEW: &str = "Unified";

/// Cooperative cancellation flag, checked after each suspension point.
/// In-flight requests are not aborted; their results are discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        Ok(())
    }
}

/// Entry point of the resolve chain. Holds the artifact client and the
/// session's account settings.
pub struct Resolver<C> {
    client: C,
    config: AccountConfig,
    policy: PollPolicy,
    language: String,
    view: String,
    cancel: CancelToken,
}

impl<C: ArtifactClient> Resolver<C> {
    pub fn new(client: C, config: AccountConfig) -> Self {
        Self {
            client,
            config,
            policy: PollPolicy::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            view: DEFAULT_VIEW.to_string(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_locale(mut self, language: &str, view: &str) -> Self {
        self.language = language.to_string();
        self.view = view.to_string();
        self
    }

    /// Handle for cancelling this resolver's flows from another task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn list_configurations(&self) -> Result<Vec<ConfigurationSummary>> {
        let body = self
            .client
            .get_json("/styles/mapConfigurations", &[])
            .await
            .map_err(|err| fetch_failed("map configuration listing", err))?;
        let listing: ConfigurationListing =
            serde_json::from_value(body).map_err(|source| ResolverError::Parse {
                context: "map configuration listing",
                source,
            })?;
        debug!(
            "listed {} map configurations",
            listing.map_configurations.len()
        );
        Ok(listing.map_configurations)
    }

    /// Fetches one configuration's archive and derives its selectable
    /// style pairings.
    pub async fn select_configuration(
        &self,
        summary: &ConfigurationSummary,
    ) -> Result<SelectedConfiguration<'_, C>> {
        let path = format!("/styles/mapConfigurations/{}", summary.configuration_id);
        let bytes = self
            .client
            .get_bytes(&path, &[])
            .await
            .map_err(|err| fetch_failed("map configuration", err))?;
        self.cancel.checkpoint()?;

        let archive = StyleArchive::load(bytes)?;
        let configuration: MapConfiguration =
            serde_json::from_value(archive.root_document().clone()).map_err(|source| {
                ResolverError::Parse {
                    context: "map configuration document",
                    source,
                }
            })?;
        let tuples = extract_style_tuples(&configuration);
        if tuples.is_empty() {
            return Err(ResolverError::InvalidConfiguration(
                summary.configuration_id.clone(),
            ));
        }
        debug!(
            "configuration {} offers {} style pairings",
            summary.configuration_id,
            tuples.len()
        );

        Ok(SelectedConfiguration {
            resolver: self,
            configuration_id: summary.configuration_id.clone(),
            alias: summary.alias.clone(),
            description: summary.description.clone(),
            archive,
            tuples,
        })
    }
}

/// A fetched configuration with its pairings, ready to resolve one.
pub struct SelectedConfiguration<'a, C> {
    resolver: &'a Resolver<C>,
    configuration_id: String,
    alias: Option<String>,
    description: Option<String>,
    archive: StyleArchive,
    tuples: Vec<StyleTuple>,
}

impl<C> fmt::Debug for SelectedConfiguration<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedConfiguration")
            .field("configuration_id", &self.configuration_id)
            .field("alias", &self.alias)
            .field("tuples", &self.tuples.len())
            .finish()
    }
}

impl<'a, C: ArtifactClient> SelectedConfiguration<'a, C> {
    pub fn configuration_id(&self) -> &str {
        &self.configuration_id
    }

    pub fn tuples(&self) -> &[StyleTuple] {
        &self.tuples
    }

    /// Fetches the pairing's style archive and tileset metadata, concurrently,
    /// and merges them into a renderable document.
    pub async fn resolve(&self, index: usize) -> Result<ResolvedStyle<'a, C>> {
        let tuple = self
            .tuples
            .get(index)
            .ok_or(ResolverError::TupleOutOfRange {
                index,
                count: self.tuples.len(),
            })?;

        let client = &self.resolver.client;
        let style_path = format!("/styles/{}", tuple.style_id);
        let tileset_path = format!("/tilesets/{}", tuple.tileset_id);
        let style_fut = async {
            client
                .get_bytes(&style_path, &[])
                .await
                .map_err(|err| fetch_failed("style", err))
        };
        let tileset_fut = async {
            client
                .get_json(&tileset_path, &[])
                .await
                .map_err(|err| fetch_failed("tileset metadata", err))
        };
        let (style_bytes, tileset_body) = future::try_join(style_fut, tileset_fut).await?;
        self.resolver.cancel.checkpoint()?;

        let metadata: TilesetMetadata =
            serde_json::from_value(tileset_body).map_err(|source| ResolverError::Parse {
                context: "tileset metadata",
                source,
            })?;

        let archive = StyleArchive::load(style_bytes)?;
        let mut document = archive.root_document().clone();
        let config = &self.resolver.config;

        style::ensure_style_id(&mut document);
        style::expand_domain_placeholders(
            &mut document,
            &config.domain,
            &self.resolver.language,
            &self.resolver.view,
            &config.api_version,
        );
        let tiles_url =
            style::tile_url_template(&config.domain, &tuple.tileset_id, &config.api_version);
        style::bind_tileset_source(
            &mut document,
            &tuple.tileset_id,
            &tiles_url,
            metadata.min_zoom,
            metadata.max_zoom,
        );
        style::set_camera_from_bounds(
            &mut document,
            metadata.bbox,
            metadata.min_zoom,
            metadata.max_zoom,
        );
        style::set_editor_metadata(
            &mut document,
            self.alias.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
            &self.configuration_id,
        );
        info!(
            "resolved style {} against tileset {}",
            tuple.style_id, tuple.tileset_id
        );

        Ok(ResolvedStyle {
            resolver: self.resolver,
            archive,
            document,
            tileset_id: tuple.tileset_id.clone(),
            alias: self.alias.clone(),
            description: self.description.clone(),
            configuration_id: self.configuration_id.clone(),
        })
    }

    /// Uploads the configuration under an alias, rewriting style references
    /// first, then deletes whatever previously held the alias. Create runs
    /// before delete, so a failed delete leaves the new artifact in place
    /// and is reported as a warning rather than an error.
    pub async fn upload_configuration(
        &mut self,
        alias: &str,
        description: &str,
        replacements: &[(String, String)],
    ) -> Result<String> {
        check_alias(alias)?;
        self.resolver.cancel.checkpoint()?;

        let mut document = self.archive.root_document().clone();
        rewrite_style_references(&mut document, replacements);
        let bytes = self.archive.update_root_document(document)?;

        let client = &self.resolver.client;
        let accepted = client
            .create_artifact(
                "/styles/mapConfigurations",
                &[("alias", alias), ("description", description)],
                bytes,
            )
            .await?;
        let new_id = poll_until_complete(
            client,
            MAP_CONFIGURATION_OPERATIONS,
            &accepted.operation_id,
            &self.resolver.policy,
        )
        .await?;
        self.resolver.cancel.checkpoint()?;

        let stale: Vec<String> = match self.resolver.list_configurations().await {
            Ok(summaries) => summaries
                .into_iter()
                .filter(|s| s.alias.as_deref() == Some(alias) && s.configuration_id != new_id)
                .map(|s| s.configuration_id)
                .collect(),
            Err(err) => {
                warn!("could not list configurations to retire alias {alias:?}: {err}");
                Vec::new()
            }
        };
        for id in stale {
            let path = format!("/styles/mapConfigurations/{id}");
            if let Err(err) = client.delete_artifact(&path).await {
                warn!("failed to delete superseded configuration {id}: {err}");
            }
        }

        self.configuration_id = new_id.clone();
        self.alias = Some(alias.to_string());
        self.description = Some(description.to_string());
        self.tuples = self
            .tuples
            .iter()
            .map(|tuple| StyleTuple {
                style_id: replaced(&tuple.style_id, replacements),
                tileset_id: tuple.tileset_id.clone(),
            })
            .collect();
        info!("map configuration uploaded as {new_id} under alias {alias:?}");
        Ok(new_id)
    }
}

/// A merged, renderable style document plus the provenance needed to push
/// an edited version back.
pub struct ResolvedStyle<'a, C> {
    resolver: &'a Resolver<C>,
    archive: StyleArchive,
    document: Value,
    tileset_id: String,
    alias: Option<String>,
    description: Option<String>,
    configuration_id: String,
}

impl<C> fmt::Debug for ResolvedStyle<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedStyle")
            .field("configuration_id", &self.configuration_id)
            .field("tileset_id", &self.tileset_id)
            .field("alias", &self.alias)
            .finish()
    }
}

impl<'a, C: ArtifactClient> ResolvedStyle<'a, C> {
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Value {
        &mut self.document
    }

    pub fn tileset_id(&self) -> &str {
        &self.tileset_id
    }

    pub fn configuration_id(&self) -> &str {
        &self.configuration_id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Looks up a sprite-sheet sidecar by name or placeholder URL.
    pub fn asset(&self, reference: &str) -> Option<&[u8]> {
        self.archive.asset(reference)
    }

    /// Uploads the edited document as a new style artifact under the alias,
    /// then retires any older artifact holding it. The stored form strips
    /// the tileset binding and editor metadata added at resolve time.
    pub async fn upload_style(&mut self, alias: &str, description: &str) -> Result<String> {
        check_alias(alias)?;
        self.resolver.cancel.checkpoint()?;

        let mut stored = self.document.clone();
        style::strip_editor_metadata(&mut stored);
        style::strip_tileset_binding(&mut stored, &self.tileset_id);
        let bytes = self.archive.update_root_document(stored)?;

        let client = &self.resolver.client;
        let accepted = client
            .create_artifact(
                "/styles",
                &[("alias", alias), ("description", description)],
                bytes,
            )
            .await?;
        let new_id = poll_until_complete(
            client,
            STYLE_OPERATIONS,
            &accepted.operation_id,
            &self.resolver.policy,
        )
        .await?;
        self.resolver.cancel.checkpoint()?;

        let stale: Vec<String> = match self.list_styles().await {
            Ok(summaries) => summaries
                .into_iter()
                .filter(|s| s.alias.as_deref() == Some(alias) && s.style_id != new_id)
                .map(|s| s.style_id)
                .collect(),
            Err(err) => {
                warn!("could not list styles to retire alias {alias:?}: {err}");
                Vec::new()
            }
        };
        for id in stale {
            let path = format!("/styles/{id}");
            if let Err(err) = client.delete_artifact(&path).await {
                warn!("failed to delete superseded style {id}: {err}");
            }
        }

        self.alias = Some(alias.to_string());
        self.description = Some(description.to_string());
        info!("style uploaded as {new_id} under alias {alias:?}");
        Ok(new_id)
    }

    async fn list_styles(&self) -> Result<Vec<StyleSummary>> {
        let body = self
            .resolver
            .client
            .get_json("/styles", &[])
            .await
            .map_err(|err| fetch_failed("style listing", err))?;
        let listing: StyleListing =
            serde_json::from_value(body).map_err(|source| ResolverError::Parse {
                context: "style listing",
                source,
            })?;
        Ok(listing.styles)
    }
}

fn check_alias(alias: &str) -> Result<()> {
    if alias
        .to_ascii_lowercase()
        .starts_with(RESERVED_ALIAS_PREFIX)
    {
        return Err(ResolverError::ReservedAlias(alias.to_string()));
    }
    Ok(())
}

fn fetch_failed(stage: &'static str, err: ClientError) -> ResolverError {
    match err.response_body() {
        Some(body) => ResolverError::Resolve {
            stage,
            body: body.to_string(),
        },
        None => ResolverError::Client(err),
    }
}

fn rewrite_style_references(document: &mut Value, replacements: &[(String, String)]) {
    let Some(styles) = document.get_mut("styles").and_then(Value::as_array_mut) else {
        return;
    };
    for style in styles {
        let Some(layers) = style.get_mut("layers").and_then(Value::as_array_mut) else {
            continue;
        };
        for layer in layers {
            if let Some(current) = layer.get("styleId").and_then(Value::as_str) {
                let updated = replaced(current, replacements);
                if updated != current {
                    layer["styleId"] = Value::String(updated);
                }
            }
        }
    }
}

fn replaced(style_id: &str, replacements: &[(String, String)]) -> String {
    replacements
        .iter()
        .find(|(old, _)| old == style_id)
        .map(|(_, new)| new.clone())
        .unwrap_or_else(|| style_id.to_string())
}
