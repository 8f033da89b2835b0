//! Brute-force spatial queries over the live cell collection.
//!
//! Every query scans the whole slice and returns indices into it. The
//! querying cell and dead cells are never included. Distances are compared
//! strictly, so a cell exactly on the boundary is out.

use petri_agents::Cell;

/// Indices of other live cells strictly closer than `max_distance` to the
/// cell at `me`.
///
/// A `max_distance` of zero means the cell is blind and returns nothing
/// without scanning.
pub fn in_range(cells: &[Cell], me: usize, max_distance: f64) -> Vec<usize> {
    if max_distance <= 0.0 {
        return Vec::new();
    }
    scan(cells, me, |_, distance| distance < max_distance)
}

/// Indices of other live cells whose disc overlaps the cell at `me`.
pub fn touching(cells: &[Cell], me: usize) -> Vec<usize> {
    let Some(radius) = cells.get(me).map(Cell::radius) else {
        return Vec::new();
    };
    scan(cells, me, |other, distance| distance < radius + other.radius())
}

/// Indices of other live cells whose centre lies inside the cell at `me`.
pub fn engulfed(cells: &[Cell], me: usize) -> Vec<usize> {
    let Some(radius) = cells.get(me).map(Cell::radius) else {
        return Vec::new();
    };
    scan(cells, me, |_, distance| distance < radius)
}

fn scan(cells: &[Cell], me: usize, keep: impl Fn(&Cell, f64) -> bool) -> Vec<usize> {
    let Some(centre) = cells.get(me).map(|c| c.position) else {
        return Vec::new();
    };
    cells
        .iter()
        .enumerate()
        .filter(|&(index, other)| {
            index != me && other.is_alive() && keep(other, centre.distance(other.position))
        })
        .map(|(index, _)| index)
        .collect()
}
