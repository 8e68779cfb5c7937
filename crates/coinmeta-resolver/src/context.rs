use std::collections::HashSet;

use coinmeta_types::Identifier;
use serde::Serialize;

/// Counters collected during a traversal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Identifiers entered.
    pub visited: usize,
    /// Record listings issued to the store.
    pub listings: usize,
    /// Spend payloads requested from the store.
    pub payload_fetches: usize,
    /// Values replaced by a resolved child node.
    pub expanded: usize,
    pub transport_failures: usize,
    pub decode_failures: usize,
    /// Identifiers skipped because they were already entered.
    pub cycle_hits: usize,
    /// Identifiers skipped because they were too deep.
    pub depth_cutoffs: usize,
}

/// State for one resolution pass: the visited set and its counters.
///
/// [`Resolver::resolve`](crate::Resolver::resolve) builds a fresh context per
/// call. Passing the same context to several
/// [`Resolver::resolve_with`](crate::Resolver::resolve_with) calls
/// deduplicates across them; call [`TraversalContext::clear`] to start over.
#[derive(Clone, Debug, Default)]
pub struct TraversalContext {
    visited: HashSet<Identifier>,
    stats: ResolveStats,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, id: &Identifier) -> bool {
        self.visited.contains(id)
    }

    /// Mark `id` as entered. Returns `false` if it already was.
    pub fn enter(&mut self, id: Identifier) -> bool {
        let fresh = self.visited.insert(id);
        if fresh {
            self.stats.visited += 1;
        }
        fresh
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ResolveStats {
        &mut self.stats
    }

    /// Forget every visited identifier and reset the counters.
    pub fn clear(&mut self) {
        self.visited.clear();
        self.stats = ResolveStats::default();
    }
}
