//! From-scratch HNSW (Hierarchical Navigable Small World) vector index.
//!
//! Built directly rather than wrapping a third-party graph crate: a fixed
//! random seed and deterministic tie-breaks are requirements an opaque ANN
//! library can't promise across versions. Layer assignment, greedy descent,
//! and the neighbor-selection heuristic follow the standard HNSW
//! construction (Malkov & Yashunin).
//!
//! The graph is append-only. Re-adding an id only updates the
//! id→embedding mapping; the previously linked node is left behind as
//! unreachable history until [`rebuild`](VectorIndex::rebuild) discards it.
//! Removing an id drops the mapping without touching the graph, so a
//! removed id's old node simply stops being a valid search result.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::RwLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::config::HnswParams;
use crate::error::Result;
use crate::types::{Embedding, EntryId};
use crate::vector::VectorIndex;

const MAX_LEVEL: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedDistance(f32);

impl Eq for OrderedDistance {}

impl PartialOrd for OrderedDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// A traversal candidate: distance to the query plus node index. Ordered
/// by distance first, then node index, so sorting a `Vec<Candidate>`
/// gives a deterministic ascending-distance / ascending-insertion-order
/// tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    distance: OrderedDistance,
    node: usize,
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.cmp(&other.distance).then(self.node.cmp(&other.node))
    }
}

struct Node {
    /// Id this node was created for. Not necessarily the *current* owner —
    /// if `id` was later re-added, `GraphState::id_to_node` points
    /// elsewhere and this node is stale history.
    id: EntryId,
    embedding: Embedding,
    /// `connections[layer]` holds neighbor node indices at that layer.
    connections: Vec<Vec<usize>>,
}

struct GraphState {
    nodes: Vec<Node>,
    id_to_node: HashMap<EntryId, usize>,
    /// First-seen order of currently-or-formerly-live ids, used only to
    /// replay inserts in original order during `rebuild`.
    insertion_order: Vec<EntryId>,
    entry_point: Option<usize>,
    rng: StdRng,
}

impl GraphState {
    fn new(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            id_to_node: HashMap::new(),
            insertion_order: Vec::new(),
            entry_point: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Deterministic HNSW vector index.
///
/// A single `RwLock` guards the whole graph, held for the duration of
/// `add`/`remove`/`query`/`rebuild` — readers can run concurrently, writers
/// are fully serialized against both readers and each other.
pub struct HnswIndex {
    params: HnswParams,
    state: RwLock<GraphState>,
}

impl HnswIndex {
    /// Creates an empty index with the given parameters.
    pub fn new(params: HnswParams) -> Self {
        Self {
            params,
            state: RwLock::new(GraphState::new(params.random_seed)),
        }
    }

    fn distance(a: &[f32], b: &[f32]) -> f32 {
        crate::vector::cosine_distance(a, b)
    }

    /// Draws a node's top layer from the standard HNSW exponential
    /// distribution, scaled by `levelFactor = 1 / ln(M)`.
    fn select_level(rng: &mut StdRng, level_factor: f64) -> usize {
        let uniform: f64 = rng.gen_range(f64::EPSILON..1.0);
        let level = (-uniform.ln() * level_factor).floor();
        (level.max(0.0) as usize).min(MAX_LEVEL - 1)
    }

    /// Best-first search within a single layer, starting from
    /// `entry_points`, returning up to `ef` candidates sorted ascending by
    /// distance (ties broken by node index).
    fn search_layer(
        nodes: &[Node],
        query: &[f32],
        entry_points: &[usize],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<usize> = entry_points.iter().copied().collect();
        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut found: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in entry_points {
            let c = Candidate {
                distance: OrderedDistance(Self::distance(query, &nodes[ep].embedding)),
                node: ep,
            };
            frontier.push(Reverse(c));
            found.push(c);
        }

        while let Some(Reverse(current)) = frontier.pop() {
            if let Some(&farthest) = found.peek() {
                if current.distance.0 > farthest.distance.0 && found.len() >= ef {
                    break;
                }
            }
            if layer >= nodes[current.node].connections.len() {
                continue;
            }
            for &neighbor in &nodes[current.node].connections[layer] {
                if !visited.insert(neighbor) {
                    continue;
                }
                let d = Self::distance(query, &nodes[neighbor].embedding);
                let cand = Candidate {
                    distance: OrderedDistance(d),
                    node: neighbor,
                };
                if found.len() < ef {
                    frontier.push(Reverse(cand));
                    found.push(cand);
                } else if let Some(&farthest) = found.peek() {
                    if d < farthest.distance.0 {
                        frontier.push(Reverse(cand));
                        found.push(cand);
                        found.pop();
                    }
                }
            }
        }

        let mut result = found.into_vec();
        result.sort();
        result
    }

    /// Keeps the `m` closest candidates; candidates are already sorted
    /// ascending by `search_layer`.
    fn select_neighbors(candidates: &[Candidate], m: usize) -> Vec<usize> {
        candidates.iter().take(m).map(|c| c.node).collect()
    }

    /// Re-sorts `node`'s neighbor list at `layer` by distance from `node`
    /// and truncates to `m`, used after a new bidirectional edge pushes a
    /// neighbor over its connection budget.
    fn prune_connections(nodes: &mut [Node], node: usize, layer: usize, m: usize) {
        let origin = nodes[node].embedding.clone();
        let mut conns = std::mem::take(&mut nodes[node].connections[layer]);
        conns.sort_by(|&a, &b| {
            let da = Self::distance(&origin, &nodes[a].embedding);
            let db = Self::distance(&origin, &nodes[b].embedding);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal).then(a.cmp(&b))
        });
        conns.truncate(m);
        nodes[node].connections[layer] = conns;
    }

    fn insert_locked(&self, state: &mut GraphState, id: EntryId, embedding: Embedding) {
        let level = Self::select_level(&mut state.rng, self.params.level_factor());
        let is_new = !state.id_to_node.contains_key(&id);
        let new_index = state.nodes.len();

        let entry_point = state.entry_point;
        match entry_point {
            None => {
                state.nodes.push(Node {
                    id,
                    embedding,
                    connections: vec![Vec::new(); level + 1],
                });
                state.entry_point = Some(new_index);
            }
            Some(ep) => {
                let top_layer = state.nodes[ep].level_of();
                let mut current_ep = ep;
                for layer in (level + 1..=top_layer).rev() {
                    let found = Self::search_layer(&state.nodes, &embedding, &[current_ep], 1, layer);
                    if let Some(best) = found.first() {
                        current_ep = best.node;
                    }
                }

                state.nodes.push(Node {
                    id,
                    embedding: embedding.clone(),
                    connections: vec![Vec::new(); level + 1],
                });

                let m = self.params.m;
                let ef_construction = self.params.ef_construction;
                let mut entry_points = vec![current_ep];
                for layer in (0..=level.min(top_layer)).rev() {
                    let found = Self::search_layer(&state.nodes, &embedding, &entry_points, ef_construction, layer);
                    let neighbors = Self::select_neighbors(&found, m);
                    state.nodes[new_index].connections[layer] = neighbors.clone();
                    for &nb in &neighbors {
                        state.nodes[nb].connections[layer].push(new_index);
                        if state.nodes[nb].connections[layer].len() > m {
                            Self::prune_connections(&mut state.nodes, nb, layer, m);
                        }
                    }
                    entry_points = found.iter().map(|c| c.node).collect();
                }

                if level > top_layer {
                    state.entry_point = Some(new_index);
                }
            }
        }

        state.id_to_node.insert(id, new_index);
        if is_new {
            state.insertion_order.push(id);
        }
    }
}

trait NodeLevel {
    fn level_of(&self) -> usize;
}

impl NodeLevel for Node {
    fn level_of(&self) -> usize {
        self.connections.len() - 1
    }
}

impl VectorIndex for HnswIndex {
    #[instrument(skip(self, embedding), fields(id = %id))]
    fn add(&self, id: EntryId, embedding: &[f32]) -> Result<()> {
        let mut state = self.state.write().expect("hnsw lock poisoned");
        self.insert_locked(&mut state, id, embedding.to_vec());
        debug!(count = state.id_to_node.len(), "vector added");
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    fn remove(&self, id: EntryId) -> Result<()> {
        let mut state = self.state.write().expect("hnsw lock poisoned");
        let removed = state.id_to_node.remove(&id).is_some();
        debug!(removed, "vector removed");
        Ok(())
    }

    fn query(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<(EntryId, f32)>> {
        let state = self.state.read().expect("hnsw lock poisoned");
        let Some(entry) = state.entry_point else {
            return Ok(Vec::new());
        };

        let top_layer = state.nodes[entry].level_of();
        let mut current_ep = entry;
        for layer in (1..=top_layer).rev() {
            let found = Self::search_layer(&state.nodes, query, &[current_ep], 1, layer);
            if let Some(best) = found.first() {
                current_ep = best.node;
            }
        }

        let ef = ef_search.max(k).max(1);
        let found = Self::search_layer(&state.nodes, query, &[current_ep], ef, 0);

        let mut results: Vec<Candidate> = Vec::with_capacity(found.len());
        let mut ids: Vec<EntryId> = Vec::with_capacity(found.len());
        for c in found {
            let node = &state.nodes[c.node];
            if state.id_to_node.get(&node.id) == Some(&c.node) {
                ids.push(node.id);
                results.push(c);
            }
        }
        results.truncate(k.min(results.len()));
        ids.truncate(k);

        Ok(results
            .into_iter()
            .zip(ids)
            .map(|(c, id)| (id, c.distance.0))
            .collect())
    }

    #[instrument(skip(self))]
    fn rebuild(&self) -> Result<()> {
        let mut state = self.state.write().expect("hnsw lock poisoned");
        let pairs: Vec<(EntryId, Embedding)> = state
            .insertion_order
            .iter()
            .filter_map(|id| state.id_to_node.get(id).map(|&idx| (*id, state.nodes[idx].embedding.clone())))
            .collect();

        *state = GraphState::new(self.params.random_seed);
        for (id, embedding) in pairs {
            self.insert_locked(&mut state, id, embedding);
        }
        debug!(count = state.id_to_node.len(), nodes = state.nodes.len(), "rebuilt");
        Ok(())
    }

    fn count(&self) -> usize {
        self.state.read().expect("hnsw lock poisoned").id_to_node.len()
    }
}
