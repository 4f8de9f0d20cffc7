//! Partner alignment.
//!
//! Individuals linked through any union form a partner component. Every
//! component is brought onto one row and spread so that neighbouring members
//! sit at least the partner spacing apart. Each row is then swept once more
//! over all of its individuals, so a component moved onto a row never lands
//! on top of the individuals already there. Finally one junction point is
//! placed per union between its two parents. Running the pass on its own
//! output changes nothing.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use pedigree_core::{geometry::Point, identifier::Id};

use crate::structure::UnionKey;

/// Gaps this much below the spacing are not treated as violations.
pub(super) const TOLERANCE: f32 = 0.01;

/// The two parents of a union and its children, as laid out.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct UnionLink {
    pub(super) key: UnionKey,
    pub(super) sire: Id,
    pub(super) dam: Id,
    pub(super) children: Vec<Id>,
}

/// Aligns partners in `positions` and returns the junction of every union.
pub(super) fn align(
    positions: &mut HashMap<Id, Point>,
    links: &[UnionLink],
    partner_spacing: f32,
) -> IndexMap<UnionKey, Point> {
    let mut moved_components = 0;
    for members in partner_components(links) {
        let members: Vec<Id> = members
            .into_iter()
            .filter(|id| positions.contains_key(id))
            .collect();
        if members.len() < 2 {
            continue;
        }
        let ceiling = links
            .iter()
            .filter(|link| members.binary_search(&link.sire).is_ok())
            .flat_map(|link| &link.children)
            .filter_map(|child| positions.get(child))
            .map(|point| point.y())
            .reduce(f32::min);
        let moved_y = share_row(positions, &members, ceiling);
        let moved_x = spread(positions, &members, partner_spacing);
        if moved_y || moved_x {
            moved_components += 1;
        }
    }
    let rows_moved = separate_rows(positions, partner_spacing);
    debug!(components_moved = moved_components, rows_moved; "Partners aligned");

    links
        .iter()
        .filter_map(|link| {
            let sire = positions.get(&link.sire)?;
            let dam = positions.get(&link.dam)?;
            Some((link.key, sire.midpoint(*dam)))
        })
        .collect()
}

/// Groups union members into connected components, each sorted by id.
///
/// Components are returned in order of their smallest member.
fn partner_components(links: &[UnionLink]) -> Vec<Vec<Id>> {
    let mut parent: HashMap<Id, Id> = HashMap::new();

    fn find(parent: &mut HashMap<Id, Id>, id: Id) -> Id {
        let mut root = id;
        while let Some(&next) = parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }
        let mut current = id;
        while current != root {
            let next = parent.insert(current, root).unwrap_or(root);
            current = next;
        }
        root
    }

    for link in links {
        parent.entry(link.sire).or_insert(link.sire);
        parent.entry(link.dam).or_insert(link.dam);
        let a = find(&mut parent, link.sire);
        let b = find(&mut parent, link.dam);
        if a != b {
            // Smallest id becomes the root so the result is order independent.
            let (root, child) = if a < b { (a, b) } else { (b, a) };
            parent.insert(child, root);
        }
    }

    let ids: Vec<Id> = parent.keys().copied().collect();
    let mut groups: HashMap<Id, Vec<Id>> = HashMap::new();
    for id in ids {
        let root = find(&mut parent, id);
        groups.entry(root).or_default().push(id);
    }

    let mut components: Vec<Vec<Id>> = groups
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .collect();
    components.sort_by_key(|members| members[0]);
    components
}

/// Moves every member to the mean row unless they already share one.
///
/// The row is kept above `ceiling`, the highest child of the component: a
/// mean at or below it is replaced by the midpoint between the topmost
/// member and that child.
fn share_row(positions: &mut HashMap<Id, Point>, members: &[Id], ceiling: Option<f32>) -> bool {
    let ys: Vec<f32> = members.iter().map(|id| positions[id].y()).collect();
    if ys.iter().all(|y| y.to_bits() == ys[0].to_bits()) {
        return false;
    }
    let mut row = ys.iter().sum::<f32>() / ys.len() as f32;
    if let Some(ceiling) = ceiling.filter(|&ceiling| row >= ceiling) {
        let top = ys.iter().copied().fold(f32::INFINITY, f32::min);
        row = (top + ceiling) / 2.0;
    }
    for id in members {
        if let Some(point) = positions.get_mut(id) {
            *point = point.with_y(row);
        }
    }
    true
}

/// Spreads every row that holds more than one individual; returns how many moved.
fn separate_rows(positions: &mut HashMap<Id, Point>, spacing: f32) -> usize {
    let mut rows: HashMap<u32, Vec<Id>> = HashMap::new();
    for (&id, point) in positions.iter() {
        rows.entry(point.y().to_bits()).or_default().push(id);
    }
    let mut moved = 0;
    for row in rows.into_values().filter(|row| row.len() > 1) {
        if spread(positions, &row, spacing) {
            moved += 1;
        }
    }
    moved
}

/// Pushes members apart left to right, then re-centres them.
fn spread(positions: &mut HashMap<Id, Point>, members: &[Id], spacing: f32) -> bool {
    let mut row: Vec<(f32, Id)> = members.iter().map(|&id| (positions[&id].x(), id)).collect();
    row.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let old_mid = (row[0].0 + row[row.len() - 1].0) / 2.0;
    let mut moved = false;
    for i in 1..row.len() {
        let min_x = row[i - 1].0 + spacing;
        if row[i].0 < min_x - TOLERANCE {
            row[i].0 = min_x;
            moved = true;
        }
    }
    if !moved {
        return false;
    }

    let new_mid = (row[0].0 + row[row.len() - 1].0) / 2.0;
    let shift = old_mid - new_mid;
    for (x, id) in row {
        if let Some(point) = positions.get_mut(&id) {
            *point = point.with_x(x + shift);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn link(sire: &str, dam: &str) -> UnionLink {
        let (sire, dam) = (Id::new(sire), Id::new(dam));
        UnionLink {
            key: UnionKey::new(sire, dam),
            sire,
            dam,
            children: Vec::new(),
        }
    }

    fn link_with_child(sire: &str, dam: &str, child: &str) -> UnionLink {
        UnionLink {
            children: vec![Id::new(child)],
            ..link(sire, dam)
        }
    }

    fn at(positions: &HashMap<Id, Point>, id: &str) -> Point {
        positions[&Id::new(id)]
    }

    #[test]
    fn test_partners_share_mean_row() {
        let mut positions = HashMap::from([
            (Id::new("al-s"), Point::new(0.0, 0.0)),
            (Id::new("al-d"), Point::new(360.0, 160.0)),
        ]);
        let junctions = align(&mut positions, &[link("al-s", "al-d")], 120.0);

        assert_approx_eq!(f32, at(&positions, "al-s").y(), 80.0);
        assert_approx_eq!(f32, at(&positions, "al-d").y(), 80.0);
        let junction = junctions[&UnionKey::new(Id::new("al-s"), Id::new("al-d"))];
        assert_approx_eq!(f32, junction.x(), 180.0);
        assert_approx_eq!(f32, junction.y(), 80.0);
    }

    #[test]
    fn test_close_partners_are_spread_symmetrically() {
        let mut positions = HashMap::from([
            (Id::new("sp-s"), Point::new(100.0, 0.0)),
            (Id::new("sp-d"), Point::new(140.0, 0.0)),
        ]);
        align(&mut positions, &[link("sp-s", "sp-d")], 120.0);

        assert_approx_eq!(f32, at(&positions, "sp-s").x(), 60.0);
        assert_approx_eq!(f32, at(&positions, "sp-d").x(), 180.0);
    }

    #[test]
    fn test_coincident_partners_split_by_id() {
        let mut positions = HashMap::from([
            (Id::new("co-b"), Point::new(50.0, 10.0)),
            (Id::new("co-a"), Point::new(50.0, 10.0)),
        ]);
        align(&mut positions, &[link("co-b", "co-a")], 100.0);

        assert_approx_eq!(f32, at(&positions, "co-a").x(), 0.0);
        assert_approx_eq!(f32, at(&positions, "co-b").x(), 100.0);
    }

    #[test]
    fn test_gap_within_tolerance_is_left_alone() {
        let mut positions = HashMap::from([
            (Id::new("tol-s"), Point::new(0.0, 0.0)),
            (Id::new("tol-d"), Point::new(119.995, 0.0)),
        ]);
        align(&mut positions, &[link("tol-s", "tol-d")], 120.0);

        assert_eq!(at(&positions, "tol-d").x(), 119.995);
    }

    #[test]
    fn test_shared_partner_forms_one_component() {
        let links = [link("pc-sire", "pc-dam-1"), link("pc-sire", "pc-dam-2")];
        let components = partner_components(&links);

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 3);
        assert_eq!(components[0][0], Id::new("pc-dam-1"));
    }

    #[test]
    fn test_shared_row_stays_above_children() {
        // Two roots with one partner each; one partner is four generations
        // down, which would pull the mean onto the other family's child.
        let mut positions = HashMap::from([
            (Id::new("ce-s"), Point::new(0.0, 0.0)),
            (Id::new("ce-e"), Point::new(200.0, 0.0)),
            (Id::new("ce-d"), Point::new(400.0, 480.0)),
            (Id::new("ce-f"), Point::new(100.0, 160.0)),
            (Id::new("ce-k"), Point::new(400.0, 640.0)),
        ]);
        let links = [
            link_with_child("ce-s", "ce-e", "ce-f"),
            link_with_child("ce-s", "ce-d", "ce-k"),
        ];
        let junctions = align(&mut positions, &links, 120.0);

        assert_approx_eq!(f32, at(&positions, "ce-s").y(), 80.0);
        assert_approx_eq!(f32, at(&positions, "ce-d").y(), 80.0);
        for link in &links {
            for child in &link.children {
                assert!(positions[child].y() > junctions[&link.key].y());
            }
        }
    }

    #[test]
    fn test_partner_moved_onto_row_keeps_clear_of_neighbours() {
        // The dam sits one generation lower than the sire; the shared row is
        // already occupied by an unrelated individual.
        let mut positions = HashMap::from([
            (Id::new("rw-s"), Point::new(180.0, 0.0)),
            (Id::new("rw-d"), Point::new(0.0, 160.0)),
            (Id::new("rw-o"), Point::new(100.0, 80.0)),
        ]);
        align(&mut positions, &[link("rw-s", "rw-d")], 120.0);

        let mut row: Vec<Point> = positions.values().copied().collect();
        assert!(row.iter().all(|point| point.y().to_bits() == 80.0f32.to_bits()));
        row.sort_by(|a, b| a.x().total_cmp(&b.x()));
        for pair in row.windows(2) {
            assert!(pair[1].x() - pair[0].x() >= 120.0 - TOLERANCE);
        }

        let first = positions.clone();
        align(&mut positions, &[link("rw-s", "rw-d")], 120.0);
        for (id, point) in &first {
            assert!(point.bitwise_eq(positions[id]), "{id} moved");
        }
    }

    #[test]
    fn test_second_pass_is_identity() {
        let mut positions = HashMap::from([
            (Id::new("id-s"), Point::new(0.0, 0.0)),
            (Id::new("id-d1"), Point::new(30.0, 160.0)),
            (Id::new("id-d2"), Point::new(-20.0, 320.0)),
        ]);
        let links = [link("id-s", "id-d1"), link("id-s", "id-d2")];

        let first_junctions = align(&mut positions, &links, 120.0);
        let first = positions.clone();
        let second_junctions = align(&mut positions, &links, 120.0);

        for (id, point) in &first {
            assert!(point.bitwise_eq(positions[id]), "{id} moved");
        }
        for (key, point) in &first_junctions {
            assert!(point.bitwise_eq(second_junctions[key]));
        }
    }
}
