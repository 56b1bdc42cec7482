//! Parent/child traversal over a graph that can only be fetched one node
//! (or one page of children) at a time.
//!
//! Cycles are handled asymmetrically: revisiting a key while walking up is
//! a hard error, revisiting one while walking down is skipped.

use crate::error::{AncestryError, Error, Result};
use procwalk_client::{ResourceClient, CHILDREN_PAGE_SIZE};
use procwalk_core::{CallContext, Chain, Edges, Path, ResourceKey};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Parent chain from a start key up to its root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ancestry {
    pub root_key: ResourceKey,
    /// Start key first, root last.
    pub path: Path,
    pub chain: Chain,
}

/// Everything reachable from a root by child links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subtree {
    /// DFS pre-order, root first.
    pub keys: Path,
    pub edges: Edges,
    pub chain: Chain,
}

impl Subtree {
    pub fn contains(&self, key: ResourceKey) -> bool {
        self.chain.contains_key(&key)
    }
}

pub struct Walker {
    client: Arc<dyn ResourceClient>,
}

impl Walker {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self { client }
    }

    /// Follow parent keys from `start` until an instance without a parent.
    pub async fn ancestry(
        &self,
        ctx: &CallContext,
        start: ResourceKey,
    ) -> std::result::Result<Ancestry, AncestryError> {
        let mut visited = HashSet::new();
        let mut path = Path::new();
        let mut chain = Chain::new();
        let mut current = start;

        loop {
            if let Some(e) = ctx.err() {
                return Err(AncestryError::new(path, chain, e));
            }
            if !visited.insert(current) {
                return Err(AncestryError::new(
                    path,
                    chain,
                    Error::CycleDetected { key: current },
                ));
            }

            debug!("ancestry: fetching {current}");
            let instance = match self.client.fetch_by_key(ctx, current).await {
                Ok(instance) => instance,
                Err(source) => {
                    return Err(AncestryError::new(
                        path,
                        chain,
                        Error::Fetch { key: current, source },
                    ))
                }
            };
            let parent = instance.parent();
            path.push(current);
            chain.insert(current, instance);

            match parent {
                Some(parent) => current = parent,
                None => {
                    return Ok(Ancestry {
                        root_key: current,
                        path,
                        chain,
                    })
                }
            }
        }
    }

    /// Depth-first discovery of every descendant of `root`, root included.
    ///
    /// Uses an explicit stack; children are pushed in reverse so they are
    /// visited in the order the search returned them. Any failure discards
    /// the partial tree.
    pub async fn descendants(&self, ctx: &CallContext, root: ResourceKey) -> Result<Subtree> {
        let mut visited = HashSet::new();
        let mut tree = Subtree::default();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            ctx.check()?;
            if !visited.insert(node) {
                // already expanded via another parent
                continue;
            }
            tree.keys.push(node);

            if !tree.chain.contains_key(&node) {
                debug!("descendants: fetching {node}");
                let instance = self
                    .client
                    .fetch_by_key(ctx, node)
                    .await
                    .map_err(|source| Error::Fetch { key: node, source })?;
                tree.chain.insert(node, instance);
            }

            let children = self
                .client
                .search_children(ctx, node, CHILDREN_PAGE_SIZE)
                .await
                .map_err(|source| Error::ListChildren { key: node, source })?;
            debug!("descendants: {node} has {} child(ren)", children.len());

            let edges = tree.edges.entry(node).or_default();
            let first_child = edges.len();
            for child in children {
                edges.push(child.key);
                tree.chain.entry(child.key).or_insert(child);
            }
            stack.extend(edges[first_child..].iter().rev().copied());
        }

        Ok(tree)
    }

    /// The whole tree containing `key`: walk up to the root, then down.
    pub async fn family(&self, ctx: &CallContext, key: ResourceKey) -> Result<Subtree> {
        let ancestry = self
            .ancestry(ctx, key)
            .await
            .map_err(|e| Error::AncestryFetch(Box::new(e)))?;
        debug!("family: {key} has root {}", ancestry.root_key);
        self.descendants(ctx, ancestry.root_key).await
    }
}
