//! Generation ranking.
//!
//! Every child first gets one representative parent edge (the sire, else the
//! dam); the other parent's edge is added afterwards. An edge that would close
//! a cycle is left out and reported, so the ranking graph is acyclic by
//! construction even for malformed parentage data.
//!
//! The two members of a union are then merged into one rank group unless one
//! descends from the other, and groups are layered by longest path. Every
//! accepted parent therefore ranks strictly above its child, and partners
//! share a generation wherever that is possible.

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, warn};
use petgraph::{
    algo::{has_path_connecting, toposort},
    graph::{DiGraph, NodeIndex},
};

use pedigree_core::{identifier::Id, individual::Individual};

use crate::{
    error::PedigreeError,
    record::{Diagnostic, DiagnosticKind},
    structure::PedigreeGraph,
};

/// Generation ranks and the edges they were derived from.
#[derive(Debug, Default)]
pub(super) struct Ranking {
    ranks: HashMap<Id, usize>,
    /// Accepted `(parent, child)` representative edges, sorted by child.
    representative: Vec<(Id, Id)>,
    /// Every accepted `(parent, child)` edge, representative ones first.
    edges: Vec<(Id, Id)>,
    diagnostics: Vec<Diagnostic>,
}

impl Ranking {
    pub(super) fn rank(&self, id: Id) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    pub(super) fn rank_count(&self) -> usize {
        self.ranks.values().max().map_or(0, |max| max + 1)
    }

    pub(super) fn representative(&self) -> &[(Id, Id)] {
        &self.representative
    }

    pub(super) fn into_parts(self) -> (Vec<(Id, Id)>, Vec<Diagnostic>) {
        (self.edges, self.diagnostics)
    }
}

/// Parent edges accepted so far, kept acyclic.
struct ParentDag {
    dag: DiGraph<Id, ()>,
    indices: HashMap<Id, NodeIndex>,
    edges: Vec<(Id, Id)>,
    diagnostics: Vec<Diagnostic>,
}

impl ParentDag {
    fn new(ids: &[Id]) -> Self {
        let mut dag = DiGraph::with_capacity(ids.len(), ids.len() * 2);
        let indices = ids.iter().map(|&id| (id, dag.add_node(id))).collect();
        Self {
            dag,
            indices,
            edges: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Adds `parent -> child` unless it would close a cycle; true if added.
    fn link(&mut self, parent: Id, child: Id) -> bool {
        let (Some(&parent_idx), Some(&child_idx)) =
            (self.indices.get(&parent), self.indices.get(&child))
        else {
            return false;
        };
        if has_path_connecting(&self.dag, child_idx, parent_idx, None) {
            warn!(child:% = child, parent:% = parent; "Parentage cycle, ranking edge dropped");
            self.diagnostics
                .push(Diagnostic::new(Some(child), DiagnosticKind::CyclicParentage));
            return false;
        }
        self.dag.add_edge(parent_idx, child_idx, ());
        self.edges.push((parent, child));
        true
    }
}

/// Assigns every individual a rank by longest-path layering from the roots.
///
/// # Errors
///
/// Returns [`PedigreeError::Layout`] if the ranking graph is cyclic, which
/// would mean the cycle filter above is broken.
pub(super) fn assign_ranks(graph: &PedigreeGraph) -> Result<Ranking, PedigreeError> {
    let mut ids: Vec<Id> = graph.individuals().map(Individual::id).collect();
    ids.sort();

    let mut parents = ParentDag::new(&ids);
    let mut representative = Vec::new();
    for &child in &ids {
        let Some(parent) = graph
            .individual(child)
            .and_then(Individual::representative_parent)
        else {
            continue;
        };
        if parents.link(parent, child) {
            representative.push((parent, child));
        }
    }
    for &child in &ids {
        let Some(individual) = graph.individual(child) else { continue };
        if let (Some(_), Some(dam)) = (individual.sire_id(), individual.dam_id()) {
            parents.link(dam, child);
        }
    }

    let groups = partner_groups(graph, &ids, &parents.edges);

    let mut dag: DiGraph<Id, ()> = DiGraph::with_capacity(ids.len(), parents.edges.len());
    let mut group_nodes: HashMap<Id, NodeIndex> = HashMap::new();
    for &id in &ids {
        let root = groups[&id];
        group_nodes.entry(root).or_insert_with(|| dag.add_node(root));
    }
    for &(parent, child) in &parents.edges {
        dag.add_edge(group_nodes[&groups[&parent]], group_nodes[&groups[&child]], ());
    }

    let topo = toposort(&dag, None).map_err(|cycle| {
        PedigreeError::Layout(format!(
            "ranking graph is cyclic at {}",
            dag[cycle.node_id()]
        ))
    })?;

    let mut group_ranks = vec![0usize; dag.node_count()];
    for node in topo {
        let next = group_ranks[node.index()] + 1;
        for successor in dag.neighbors(node) {
            group_ranks[successor.index()] = group_ranks[successor.index()].max(next);
        }
    }

    let ranks: HashMap<Id, usize> = ids
        .iter()
        .map(|&id| (id, group_ranks[group_nodes[&groups[&id]].index()]))
        .collect();

    debug!(
        individuals = ranks.len(),
        edges = parents.edges.len(),
        groups = dag.node_count(),
        generations = ranks.values().max().map_or(0, |max| max + 1);
        "Ranks assigned"
    );

    Ok(Ranking {
        ranks,
        representative,
        edges: parents.edges,
        diagnostics: parents.diagnostics,
    })
}

/// Maps every id to the smallest id of its rank group.
///
/// Unions are visited by key. Two groups are merged only when neither reaches
/// the other through `edges`, so the grouped graph stays acyclic.
fn partner_groups(graph: &PedigreeGraph, ids: &[Id], edges: &[(Id, Id)]) -> HashMap<Id, Id> {
    let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
    for &(parent, child) in edges {
        children.entry(parent).or_default().push(child);
    }

    let mut group: HashMap<Id, Id> = ids.iter().map(|&id| (id, id)).collect();
    let mut members: HashMap<Id, Vec<Id>> = ids.iter().map(|&id| (id, vec![id])).collect();

    let mut unions: Vec<_> = graph.unions().collect();
    unions.sort_by_key(|union| union.key());
    for union in unions {
        let (Some(&a), Some(&b)) = (group.get(&union.sire()), group.get(&union.dam())) else {
            continue;
        };
        if a == b {
            continue;
        }
        if reaches(a, b, &group, &members, &children) || reaches(b, a, &group, &members, &children)
        {
            debug!(union:% = union.key(); "Partners are related by descent, ranked apart");
            continue;
        }
        let (root, merged) = if a < b { (a, b) } else { (b, a) };
        let moved = members.remove(&merged).unwrap_or_default();
        for &id in &moved {
            group.insert(id, root);
        }
        members.entry(root).or_default().extend(moved);
    }
    group
}

/// True if some member of group `from` has a descendant in group `to`.
fn reaches(
    from: Id,
    to: Id,
    group: &HashMap<Id, Id>,
    members: &HashMap<Id, Vec<Id>>,
    children: &HashMap<Id, Vec<Id>>,
) -> bool {
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        for member in members.get(&current).into_iter().flatten() {
            for child in children.get(member).into_iter().flatten() {
                let Some(&next) = group.get(child) else { continue };
                if next == to {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn rank_of(ranking: &Ranking, id: &str) -> usize {
        ranking.rank(Id::new(id)).expect("ranked")
    }

    #[test]
    fn test_three_generations() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("r-grand", "G", "dog"),
            RawRecord::new("r-sire", "S", "dog").with_sire("r-grand"),
            RawRecord::new("r-dam", "D", "dog"),
            RawRecord::new("r-kid", "K", "dog").with_sire("r-sire").with_dam("r-dam"),
        ]);
        let ranking = assign_ranks(&graph).expect("acyclic");

        assert_eq!(rank_of(&ranking, "r-grand"), 0);
        assert_eq!(rank_of(&ranking, "r-sire"), 1);
        assert_eq!(rank_of(&ranking, "r-dam"), 1, "partners share a generation");
        assert_eq!(rank_of(&ranking, "r-kid"), 2);
        assert_eq!(ranking.rank_count(), 3);
        assert_eq!(ranking.representative().len(), 2);
    }

    #[test]
    fn test_dam_is_used_without_sire() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("rd-dam", "D", "cat"),
            RawRecord::new("rd-kid", "K", "cat").with_dam("rd-dam"),
        ]);
        let ranking = assign_ranks(&graph).expect("acyclic");

        assert_eq!(ranking.representative(), &[(Id::new("rd-dam"), Id::new("rd-kid"))]);
        assert_eq!(rank_of(&ranking, "rd-kid"), 1);
    }

    #[test]
    fn test_cycle_is_broken_and_reported() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("rc-a", "A", "pig").with_sire("rc-b"),
            RawRecord::new("rc-b", "B", "pig").with_sire("rc-c"),
            RawRecord::new("rc-c", "C", "pig").with_sire("rc-a"),
        ]);
        let ranking = assign_ranks(&graph).expect("cycle filtered");

        assert_eq!(ranking.representative().len(), 2);
        for &(parent, child) in ranking.representative() {
            assert!(ranking.rank(parent) < ranking.rank(child));
        }
        let (_, diagnostics) = ranking.into_parts();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::CyclicParentage);
    }

    #[test]
    fn test_dam_ranks_above_child_through_deep_line() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("dl-g", "G", "dog"),
            RawRecord::new("dl-m", "M", "dog").with_dam("dl-g"),
            RawRecord::new("dl-d", "D", "dog").with_dam("dl-m"),
            RawRecord::new("dl-s", "S", "dog"),
            RawRecord::new("dl-k", "K", "dog").with_sire("dl-s").with_dam("dl-d"),
        ]);
        let ranking = assign_ranks(&graph).expect("acyclic");

        assert_eq!(rank_of(&ranking, "dl-d"), 2);
        assert_eq!(rank_of(&ranking, "dl-s"), 2);
        assert_eq!(rank_of(&ranking, "dl-k"), 3);
        let (edges, diagnostics) = ranking.into_parts();
        assert_eq!(edges.len(), 4);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_partner_descended_from_partner_ranks_below() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("pd-s", "S", "goat"),
            RawRecord::new("pd-d", "D", "goat").with_sire("pd-s"),
            RawRecord::new("pd-k", "K", "goat").with_sire("pd-s").with_dam("pd-d"),
        ]);
        let ranking = assign_ranks(&graph).expect("acyclic");

        assert_eq!(rank_of(&ranking, "pd-s"), 0);
        assert_eq!(rank_of(&ranking, "pd-d"), 1);
        assert_eq!(rank_of(&ranking, "pd-k"), 2);
    }

    #[test]
    fn test_dam_edge_closing_cycle_is_reported() {
        let graph = PedigreeGraph::from_records(&[
            RawRecord::new("dc-s", "S", "pig"),
            RawRecord::new("dc-d", "D", "pig").with_sire("dc-k"),
            RawRecord::new("dc-k", "K", "pig").with_sire("dc-s").with_dam("dc-d"),
        ]);
        let ranking = assign_ranks(&graph).expect("cycle filtered");

        for &(parent, child) in &ranking.edges {
            assert!(ranking.rank(parent) < ranking.rank(child));
        }
        let (edges, diagnostics) = ranking.into_parts();
        assert_eq!(edges.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id(), Some(Id::new("dc-k")));
    }
}
