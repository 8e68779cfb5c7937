//! The recursive resolver.
//!
//! For an identifier: list every record ever locked to it, pick the one with
//! the highest spent height, fetch that spend's payload, decode it, and then
//! try every text value as a child identifier, including text inside nodes
//! nested inline in the payload. A child that resolves replaces its string
//! with the nested node; anything else leaves the string alone.

use std::future::Future;
use std::pin::Pin;

use coinmeta_codec::{solution_metadata, MetadataNode, MetadataValue};
use coinmeta_store::{CoinRecord, RecordStore};
use coinmeta_types::{Identifier, TypeError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::TraversalContext;
use crate::error::{ResolveError, ResolveResult};

type BranchFuture<'a> = Pin<Box<dyn Future<Output = ResolveResult<MetadataNode>> + Send + 'a>>;
type ExpandFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Hard ceiling on [`ResolverConfig::max_depth`]. Every level keeps a poll
/// frame on the stack, so deeper limits are clamped to this.
pub const MAX_DEPTH_CEILING: usize = 512;

/// Resolver settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest child level that is still expanded. The root is level 0.
    /// Values above [`MAX_DEPTH_CEILING`] are clamped to it.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Interpret a metadata value as a child identifier: exactly 32 bytes of hex,
/// with or without a `0x` marker.
pub fn parse_child_identifier(value: &str) -> Result<Identifier, TypeError> {
    Identifier::from_hex(value)
}

/// The record whose spend is authoritative: the highest spent height wins and
/// never-spent records are ignored.
///
/// On equal heights the record iterated last wins. Record maps from a store
/// have no defined order, so such ties are resolved arbitrarily.
pub fn select_authoritative<'a>(
    records: impl IntoIterator<Item = &'a CoinRecord>,
) -> Option<&'a CoinRecord> {
    let mut best: Option<&CoinRecord> = None;
    for record in records {
        if record.spent_block_index == 0 {
            continue;
        }
        if best.map_or(true, |b| record.spent_block_index >= b.spent_block_index) {
            best = Some(record);
        }
    }
    best
}

/// Resolves identifiers into nested metadata documents.
pub struct Resolver<S> {
    store: S,
    config: ResolverConfig,
}

impl<S: RecordStore> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ResolverConfig::default())
    }

    pub fn with_config(store: S, mut config: ResolverConfig) -> Self {
        if config.max_depth > MAX_DEPTH_CEILING {
            warn!(
                requested = config.max_depth,
                ceiling = MAX_DEPTH_CEILING,
                "max_depth clamped"
            );
            config.max_depth = MAX_DEPTH_CEILING;
        }
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `root` in a fresh traversal.
    ///
    /// `Ok(None)` means the root has no resolvable spend. `Err` is returned
    /// only when the record store could not be reached for the root itself.
    pub async fn resolve(&self, root: &Identifier) -> ResolveResult<Option<MetadataNode>> {
        let mut ctx = TraversalContext::new();
        self.resolve_with(root, &mut ctx).await
    }

    /// Parse `root` as hex, then [`resolve`](Self::resolve) it.
    pub async fn resolve_hex(&self, root: &str) -> ResolveResult<Option<MetadataNode>> {
        let root = Identifier::from_hex(root)?;
        self.resolve(&root).await
    }

    /// Resolve `root` using a caller-owned context. Identifiers already in
    /// `ctx` are treated as visited.
    pub async fn resolve_with(
        &self,
        root: &Identifier,
        ctx: &mut TraversalContext,
    ) -> ResolveResult<Option<MetadataNode>> {
        match self.resolve_branch(*root, 0, ctx).await {
            Ok(node) => {
                info!(
                    root = %root.short_hex(),
                    visited = ctx.stats().visited,
                    expanded = ctx.stats().expanded,
                    "resolved metadata"
                );
                Ok(Some(node))
            }
            Err(err @ ResolveError::Transport { .. }) => {
                warn!(root = %root.short_hex(), error = %err, "root lookup failed");
                Err(err)
            }
            Err(err) => {
                debug!(root = %root.short_hex(), reason = %err, "root did not resolve");
                Ok(None)
            }
        }
    }

    fn resolve_branch<'a>(
        &'a self,
        id: Identifier,
        depth: usize,
        ctx: &'a mut TraversalContext,
    ) -> BranchFuture<'a> {
        Box::pin(async move {
            if ctx.is_visited(&id) {
                ctx.stats_mut().cycle_hits += 1;
                return Err(ResolveError::AlreadyVisited(id));
            }
            if depth > self.config.max_depth {
                ctx.stats_mut().depth_cutoffs += 1;
                return Err(ResolveError::DepthExceeded {
                    id,
                    limit: self.config.max_depth,
                });
            }
            ctx.enter(id);
            debug!(id = %id.short_hex(), depth, "resolving identifier");

            ctx.stats_mut().listings += 1;
            let records = match self.store.records_by_identifier(&id, true).await {
                Ok(records) => records,
                Err(source) => {
                    ctx.stats_mut().transport_failures += 1;
                    return Err(ResolveError::Transport { id, source });
                }
            };
            let Some(record) = select_authoritative(records.values()) else {
                return Err(ResolveError::NotFound(id));
            };
            let coin_id = record.name();
            let height = record.spent_block_index;

            ctx.stats_mut().payload_fetches += 1;
            let spend = match self.store.spend_payload(&coin_id, height).await {
                Ok(Some(spend)) => spend,
                Ok(None) => return Err(ResolveError::NotFound(id)),
                Err(source) => {
                    ctx.stats_mut().transport_failures += 1;
                    return Err(ResolveError::Transport { id, source });
                }
            };

            let mut node = match solution_metadata(&spend.solution) {
                Ok(node) => node,
                Err(source) => {
                    ctx.stats_mut().decode_failures += 1;
                    return Err(ResolveError::Decode { id, source });
                }
            };
            debug!(id = %id.short_hex(), height, keys = node.len(), "decoded payload");

            self.expand_children(&mut node, depth, ctx).await;
            Ok(node)
        })
    }

    /// Try every text value of a node decoded from the payload at `depth` as
    /// a child identifier. Inline nested nodes belong to the same payload, so
    /// their values are tried at the same child level.
    fn expand_children<'a>(
        &'a self,
        node: &'a mut MetadataNode,
        depth: usize,
        ctx: &'a mut TraversalContext,
    ) -> ExpandFuture<'a> {
        Box::pin(async move {
            for (key, value) in node.iter_mut() {
                let child = match &mut *value {
                    MetadataValue::Text(text) => match parse_child_identifier(text) {
                        Ok(child) => child,
                        Err(_) => continue,
                    },
                    MetadataValue::Node(inline) => {
                        self.expand_children(inline, depth, ctx).await;
                        continue;
                    }
                    MetadataValue::Integer(_) => continue,
                };
                match self.resolve_branch(child, depth + 1, ctx).await {
                    Ok(child_node) => {
                        *value = MetadataValue::Node(child_node);
                        ctx.stats_mut().expanded += 1;
                    }
                    Err(err) => log_unresolved(key, &child, &err),
                }
            }
        })
    }
}

fn log_unresolved(key: &str, child: &Identifier, err: &ResolveError) {
    match err {
        ResolveError::Transport { .. } | ResolveError::Decode { .. } => {
            warn!(key, child = %child.short_hex(), error = %err, "child left unresolved");
        }
        _ => {
            debug!(key, child = %child.short_hex(), reason = %err, "child left unresolved");
        }
    }
}
