// SPDX-License-Identifier: AGPL-3.0-or-later
// FacetDB - In-Memory Faceted Filtering & Seriation Engine
// Copyright (C) 2026 FacetDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Perceptual Ordering (Seriation)
//!
//! Produces a 1-D order over categories such that categories with similar
//! neighborhood profiles end up adjacent, for matrix / relatedness views.
//!
//! ## Pipeline
//!
//! 1. **Distance** - for every edge (pair with positive co-occurrence on the
//!    requested channel), sum over both endpoints' other set-pairs the
//!    divergence `|coOcc(A,X) - coOcc(B,X)|`, counting a missing counterpart
//!    as co-occurrence 0. Low distance = the endpoints relate to the rest of
//!    the graph interchangeably.
//! 2. **Greedy forest** - Kruskal-style sweep of edges ascending by
//!    distance. Each node starts as its own singleton tree with a unique
//!    tree token; an edge whose endpoints share a token is skipped (cycle),
//!    otherwise the lower-degree endpoint's tree root is attached as a child
//!    of the higher-degree endpoint, and the attached subtree is re-tokened.
//!    Degree stands in for hub-ness, so hubs collect children.
//! 3. **Root ranking** - forest roots sorted by ascending subtree size.
//! 4. **Linearization** - depth-first walk in root rank / child-list order
//!    assigns sequential `order` values.
//!
//! The node table, parent/child links and tree tokens are transient: they
//! are rebuilt from scratch on every call and only the final `order` lands
//! on the category aggregates. The whole pass is recomputed (never patched)
//! because every distance and degree depends on current channel measures.

use facetdb_core::{CatIdx, CategoryArena, Channel};

use crate::set_pair::{PairIdx, SetPairIndex};

const NO_NODE: u32 = u32::MAX;

/// Transient forest node. One per non-removed category.
#[derive(Debug)]
struct SeriationNode {
    cat: CatIdx,
    /// Union-find-lite tree token; equal tokens = same tree.
    tree: u32,
    parent: u32,
    children: Vec<u32>,
    subtree: u32,
}

/// Recompute the perceptual order for an attribute, writing each category's
/// `order` field. Returns the number of trees in the resulting forest.
///
/// Deterministic for fixed measures: edge and root ties break on category
/// ids. Isolated categories stay singleton roots and are ranked by the same
/// subtree-size rule as everything else.
pub fn compute_perceptual_order(
    arena: &mut CategoryArena,
    index: &mut SetPairIndex,
    channel: Channel,
) -> usize {
    // Node table over non-removed categories.
    let mut nodes: Vec<SeriationNode> = Vec::new();
    let mut node_of: Vec<u32> = vec![NO_NODE; arena.len()];
    for cat in arena.indices() {
        if arena.get(cat).is_removed() {
            continue;
        }
        let n = nodes.len() as u32;
        node_of[cat as usize] = n;
        nodes.push(SeriationNode {
            cat,
            tree: n,
            parent: NO_NODE,
            children: Vec::new(),
            subtree: 1,
        });
    }

    // Edges: pairs with positive co-occurrence on the channel.
    let mut edges: Vec<PairIdx> = (0..index.len() as PairIdx)
        .filter(|&p| {
            let pair = index.get(p);
            let (a, b) = pair.endpoints();
            pair.co_occurrence(channel) > 0
                && node_of[a as usize] != NO_NODE
                && node_of[b as usize] != NO_NODE
        })
        .collect();

    // Degree = number of positive-co-occurrence edges per node.
    let mut degree = vec![0u32; nodes.len()];
    for &e in &edges {
        let (a, b) = index.get(e).endpoints();
        degree[node_of[a as usize] as usize] += 1;
        degree[node_of[b as usize] as usize] += 1;
    }

    // Step 1: neighbor-divergence distances.
    let distances: Vec<(PairIdx, f64)> = edges
        .iter()
        .map(|&e| (e, edge_distance(arena, index, e, channel)))
        .collect();
    for &(e, d) in &distances {
        index.get_mut(e).distance = d;
    }

    // Ascending by distance; ties break on canonical endpoint ids so the
    // sweep order is reproducible run-to-run.
    edges.sort_by(|&x, &y| {
        let (xa, xb) = index.get(x).endpoints();
        let (ya, yb) = index.get(y).endpoints();
        index
            .get(x)
            .distance
            .total_cmp(&index.get(y).distance)
            .then_with(|| arena.get(xa).id().cmp(arena.get(ya).id()))
            .then_with(|| arena.get(xb).id().cmp(arena.get(yb).id()))
    });

    // Step 2: greedy forest construction.
    for &e in &edges {
        let (ca, cb) = index.get(e).endpoints();
        let na = node_of[ca as usize] as usize;
        let nb = node_of[cb as usize] as usize;
        if nodes[na].tree == nodes[nb].tree {
            continue; // would create a cycle
        }
        // Hub (higher degree) becomes the parent side; tie goes to the
        // canonical first endpoint.
        let (parent_ep, child_ep) = if degree[nb] > degree[na] {
            (nb, na)
        } else {
            (na, nb)
        };
        let mut root = child_ep;
        while nodes[root].parent != NO_NODE {
            root = nodes[root].parent as usize;
        }
        nodes[root].parent = parent_ep as u32;
        let token = nodes[parent_ep].tree;
        nodes[parent_ep].children.push(root as u32);
        // Re-token the attached subtree.
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            nodes[n].tree = token;
            stack.extend(nodes[n].children.iter().map(|&c| c as usize));
        }
    }

    // Step 3: roots, subtree sizes, rank by ascending size.
    let mut roots: Vec<usize> = (0..nodes.len())
        .filter(|&n| nodes[n].parent == NO_NODE)
        .collect();
    for &r in &roots {
        compute_subtree_sizes(&mut nodes, r);
    }
    roots.sort_by(|&x, &y| {
        nodes[x]
            .subtree
            .cmp(&nodes[y].subtree)
            .then_with(|| arena.get(nodes[x].cat).id().cmp(arena.get(nodes[y].cat).id()))
    });

    // Step 4: depth-first linearization.
    let mut next_order: u32 = 0;
    for &r in &roots {
        let mut stack = vec![r];
        while let Some(n) = stack.pop() {
            arena.get_mut(nodes[n].cat).order = next_order;
            next_order += 1;
            // Reverse push keeps child-list order in the walk.
            for &c in nodes[n].children.iter().rev() {
                stack.push(c as usize);
            }
        }
    }
    // Removed categories trail the permutation in arena order.
    for cat in arena.indices() {
        if arena.get(cat).is_removed() {
            arena.get_mut(cat).order = next_order;
            next_order += 1;
        }
    }

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        trees = roots.len(),
        "seriation pass complete"
    );
    roots.len()
}

/// Divergence of two endpoint neighborhoods: how differently A and B
/// co-occur with the rest of the node set.
fn edge_distance(
    arena: &CategoryArena,
    index: &SetPairIndex,
    edge: PairIdx,
    channel: Channel,
) -> f64 {
    let (a, b) = index.get(edge).endpoints();
    let mut d = 0.0;
    for (p, q) in [(a, b), (b, a)] {
        for &pi in index.pairs_of(p) {
            let pair = index.get(pi);
            let x = pair.other(p);
            if x == q {
                continue;
            }
            let co_px = f64::from(pair.co_occurrence(channel));
            match index.lookup(arena, q, x) {
                Some(qi) => d += (co_px - f64::from(index.get(qi).co_occurrence(channel))).abs(),
                None => d += co_px,
            }
        }
    }
    d
}

/// Iterative post-order subtree sizing under one root.
fn compute_subtree_sizes(nodes: &mut [SeriationNode], root: usize) {
    let mut preorder = vec![root];
    let mut visit = Vec::new();
    while let Some(n) = preorder.pop() {
        visit.push(n);
        preorder.extend(nodes[n].children.iter().map(|&c| c as usize));
    }
    for &n in visit.iter().rev() {
        let size = 1 + nodes[n]
            .children
            .iter()
            .map(|&c| nodes[c as usize].subtree)
            .sum::<u32>();
        nodes[n].subtree = size;
    }
}
