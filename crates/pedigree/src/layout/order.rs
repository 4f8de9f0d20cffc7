//! Horizontal ordering within generations.
//!
//! Starts from a depth-first order of the ranking forest (roots and children
//! visited by id), then runs alternating downward and upward barycenter
//! sweeps over all parent relations. After each layer is sorted, the two
//! members of every union sharing that layer are pulled next to each other;
//! that pull is the weight that keeps partners adjacent. Sweeping stops at a
//! fixed point or after the sweep cap, and the ordering with the fewest
//! crossings wins. Ties always fall back to the previous position, so the
//! result depends only on the ids, not on discovery order.

use std::collections::HashMap;

use log::trace;

use pedigree_core::identifier::Id;

use crate::structure::PedigreeGraph;

use super::rank::Ranking;

type Layers = Vec<Vec<Id>>;

/// Adjacency used by the sweeps.
struct Neighbourhood {
    parents: HashMap<Id, Vec<Id>>,
    children: HashMap<Id, Vec<Id>>,
    partners: Vec<(Id, Id)>,
}

impl Neighbourhood {
    fn new(graph: &PedigreeGraph) -> Self {
        let mut parents: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
        for individual in graph.individuals() {
            for parent in [individual.sire_id(), individual.dam_id()].into_iter().flatten() {
                parents.entry(individual.id()).or_default().push(parent);
                children.entry(parent).or_default().push(individual.id());
            }
        }
        // Barycenters are float sums; a fixed summation order keeps them exact.
        for list in parents.values_mut().chain(children.values_mut()) {
            list.sort();
        }

        let mut unions: Vec<_> = graph.unions().collect();
        unions.sort_by_key(|union| union.key());
        let partners = unions
            .into_iter()
            .map(|union| (union.sire(), union.dam()))
            .collect();

        Self {
            parents,
            children,
            partners,
        }
    }
}

/// Orders every rank of `ranking`; `layers[rank]` lists that rank left to right.
pub(super) fn order_layers(graph: &PedigreeGraph, ranking: &Ranking, max_sweeps: usize) -> Layers {
    let neighbourhood = Neighbourhood::new(graph);
    let mut layers = initial_layers(graph, ranking);
    for layer in &mut layers {
        pull_partners(layer, &neighbourhood.partners);
    }

    let mut positions = HashMap::new();
    for layer in &layers {
        record_positions(layer, &mut positions);
    }

    let mut best = layers.clone();
    let mut best_crossings = crossings(&layers, ranking, &neighbourhood);
    let last = layers.len().saturating_sub(1);

    for sweep in 0..max_sweeps {
        let before = layers.clone();

        for rank in 1..layers.len() {
            reorder(&mut layers[rank], &neighbourhood.parents, &neighbourhood.partners, &mut positions);
        }
        for rank in (0..last).rev() {
            reorder(&mut layers[rank], &neighbourhood.children, &neighbourhood.partners, &mut positions);
        }

        let current = crossings(&layers, ranking, &neighbourhood);
        trace!(sweep, crossings = current; "Ordering sweep");
        if current < best_crossings {
            best = layers.clone();
            best_crossings = current;
        }
        if layers == before {
            break;
        }
    }

    best
}

/// Depth-first order of the ranking forest, roots and children sorted by id.
fn initial_layers(graph: &PedigreeGraph, ranking: &Ranking) -> Layers {
    let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
    let mut has_parent = std::collections::HashSet::new();
    for &(parent, child) in ranking.representative() {
        children.entry(parent).or_default().push(child);
        has_parent.insert(child);
    }
    for list in children.values_mut() {
        list.sort();
    }

    let mut roots: Vec<Id> = graph
        .individuals()
        .map(|individual| individual.id())
        .filter(|id| !has_parent.contains(id))
        .collect();
    roots.sort();

    let mut layers: Layers = vec![Vec::new(); ranking.rank_count()];
    for root in roots {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(rank) = ranking.rank(id) {
                layers[rank].push(id);
            }
            if let Some(list) = children.get(&id) {
                stack.extend(list.iter().rev().copied());
            }
        }
    }
    layers
}

/// Sorts one layer by the barycenter of `neighbours`, then re-pairs partners.
fn reorder(
    layer: &mut Vec<Id>,
    neighbours: &HashMap<Id, Vec<Id>>,
    partners: &[(Id, Id)],
    positions: &mut HashMap<Id, f32>,
) {
    let mut keyed: Vec<(f32, usize, Id)> = layer
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let own = positions.get(&id).copied().unwrap_or_default();
            let barycenter = neighbours
                .get(&id)
                .and_then(|list| barycenter(list, positions))
                .unwrap_or(own);
            (barycenter, index, id)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    *layer = keyed.into_iter().map(|(_, _, id)| id).collect();
    pull_partners(layer, partners);
    record_positions(layer, positions);
}

fn barycenter(neighbours: &[Id], positions: &HashMap<Id, f32>) -> Option<f32> {
    let known: Vec<f32> = neighbours
        .iter()
        .filter_map(|id| positions.get(id).copied())
        .collect();
    if known.is_empty() {
        None
    } else {
        Some(known.iter().sum::<f32>() / known.len() as f32)
    }
}

/// Moves the later partner of each pair in `layer` right after the earlier one.
fn pull_partners(layer: &mut Vec<Id>, partners: &[(Id, Id)]) {
    for &(a, b) in partners {
        let (Some(i), Some(j)) = (
            layer.iter().position(|&id| id == a),
            layer.iter().position(|&id| id == b),
        ) else {
            continue;
        };
        let (lo, hi) = (i.min(j), i.max(j));
        if hi - lo > 1 {
            let moved = layer.remove(hi);
            layer.insert(lo + 1, moved);
        }
    }
}

/// Positions normalized to `(0, 1)` so layers of different widths compare.
fn record_positions(layer: &[Id], positions: &mut HashMap<Id, f32>) {
    let width = layer.len() as f32;
    for (index, &id) in layer.iter().enumerate() {
        positions.insert(id, (index as f32 + 0.5) / width);
    }
}

/// Edge crossings between adjacent ranks, over parent relations spanning one rank.
fn crossings(layers: &Layers, ranking: &Ranking, neighbourhood: &Neighbourhood) -> usize {
    let mut total = 0;
    for rank in 1..layers.len() {
        let upper: HashMap<Id, usize> = layers[rank - 1]
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();

        let mut segments = Vec::new();
        for (lower_index, &child) in layers[rank].iter().enumerate() {
            for parent in neighbourhood.parents.get(&child).into_iter().flatten() {
                if ranking.rank(*parent) == Some(rank - 1) {
                    if let Some(&upper_index) = upper.get(parent) {
                        segments.push((upper_index, lower_index));
                    }
                }
            }
        }

        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}
