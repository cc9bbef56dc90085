//! Boundary tracing: from a region's pixel set to an ordered cycle of
//! boundary vertices.
//!
//! The trace works on a padded copy of the region's bounding box. An
//! outer flood from the padding marks every region cell reachable from
//! outside; a second flood pass harvests the inner silhouette of each
//! cavity or outer component; the largest silhouette is then walked into
//! an ordered cycle. Vertices come out relative to the bounding-box
//! corner.

use bit_vec::BitVec;

use crate::error::Error;
use crate::geometry::Vertex;
use crate::grid;
use crate::region::Region;

struct BitGrid {
    width: usize,
    bits: BitVec,
}

impl BitGrid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            bits: BitVec::from_elem(width * height, false),
        }
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize) {
        self.bits.set(y * self.width + x, true);
    }
}

/// The four per-cell predicates the trace needs, as parallel bitmaps.
struct CellGrid {
    in_region: BitGrid,
    visited: BitGrid,
    outer: BitGrid,
    inner: BitGrid,
}

impl CellGrid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            in_region: BitGrid::new(width, height),
            visited: BitGrid::new(width, height),
            outer: BitGrid::new(width, height),
            inner: BitGrid::new(width, height),
        }
    }
}

/// Trace the ordered boundary cycle of `region`.
///
/// # Errors
///
/// [`Error::RegionEmpty`] for an empty region, [`Error::RegionTooThin`]
/// when no inner silhouette exists (one-pixel-thin regions),
/// [`Error::ShapeGenerationFailed`] when a boundary vertex does not have
/// exactly two boundary neighbors, and [`Error::CouldNotCloseShape`]
/// when the walk runs past the silhouette size without closing.
pub fn trace_region(region: &Region) -> Result<Vec<Vertex>, Error> {
    if region.is_empty() {
        return Err(Error::RegionEmpty);
    }

    let bounds = region.bounds();
    // two cells of padding so (0, 0) is always outside the region
    let padded_w = bounds.width() as usize + 2;
    let padded_h = bounds.height() as usize + 2;

    let mut cells = CellGrid::new(padded_w, padded_h);
    for pixel in region.pixels() {
        let x = (pixel.x - bounds.min_x) as usize + 1;
        let y = (pixel.y - bounds.min_y) as usize + 1;
        cells.in_region.set(x, y);
    }

    flood_outer(&mut cells, padded_w, padded_h);
    let silhouettes = harvest_inner_silhouettes(&mut cells, padded_w, padded_h);

    if silhouettes.is_empty() {
        return Err(Error::RegionTooThin);
    }
    let mut largest = 0;
    for (i, silhouette) in silhouettes.iter().enumerate() {
        if silhouette.len() > silhouettes[largest].len() {
            largest = i;
        }
    }

    // undo the pad; silhouette cells are region cells so both
    // coordinates are at least 1
    let matrix_w = bounds.width() as usize;
    let matrix_h = bounds.height() as usize;
    let mut matrix = BitGrid::new(matrix_w, matrix_h);
    let mut vertices = Vec::with_capacity(silhouettes[largest].len());
    for vertex in &silhouettes[largest] {
        let vertex = Vertex {
            x: vertex.x - 1,
            y: vertex.y - 1,
        };
        matrix.set(vertex.x as usize, vertex.y as usize);
        vertices.push(vertex);
    }

    walk_cycle(&vertices, &matrix, matrix_w, matrix_h)
}

/// Flood the exterior from `(0, 0)`, marking region cells touched from a
/// non-diagonal neighbor as outer boundary.
fn flood_outer(cells: &mut CellGrid, width: usize, height: usize) {
    let mut to_visit = vec![(0usize, 0usize)];
    while let Some((x, y)) = to_visit.pop() {
        if cells.visited.get(x, y) {
            continue;
        }
        cells.visited.set(x, y);
        let CellGrid {
            in_region,
            visited,
            outer,
            ..
        } = cells;
        grid::neighbors4(x, y, width, height, |nx, ny| {
            if !visited.get(nx, ny) && !outer.get(nx, ny) {
                if in_region.get(nx, ny) {
                    outer.set(nx, ny);
                } else {
                    to_visit.push((nx, ny));
                }
            }
        });
    }
}

/// Scan for unvisited non-boundary cells and flood each one, collecting
/// the outer-boundary cells the flood touches. Each flood yields the
/// inner silhouette of one cavity or exterior pocket.
fn harvest_inner_silhouettes(cells: &mut CellGrid, width: usize, height: usize) -> Vec<Vec<Vertex>> {
    let mut silhouettes = Vec::with_capacity(1);
    for y in 0..height {
        for x in 0..width {
            if cells.visited.get(x, y) || cells.outer.get(x, y) {
                continue;
            }
            let mut silhouette = Vec::new();
            let mut to_visit = vec![(x, y)];
            while let Some((cx, cy)) = to_visit.pop() {
                if cells.visited.get(cx, cy) {
                    continue;
                }
                cells.visited.set(cx, cy);
                let CellGrid {
                    visited,
                    outer,
                    inner,
                    ..
                } = cells;
                grid::neighbors4(cx, cy, width, height, |nx, ny| {
                    if !visited.get(nx, ny) && !inner.get(nx, ny) {
                        if outer.get(nx, ny) {
                            inner.set(nx, ny);
                            silhouette.push(Vertex {
                                x: nx as u16,
                                y: ny as u16,
                            });
                        } else {
                            to_visit.push((nx, ny));
                        }
                    }
                });
            }
            silhouettes.push(silhouette);
        }
    }
    silhouettes
}

/// Order the silhouette into a closed cycle by walking 8-neighbors.
/// Every vertex on the cycle must have exactly two marked neighbors.
fn walk_cycle(
    vertices: &[Vertex],
    matrix: &BitGrid,
    width: usize,
    height: usize,
) -> Result<Vec<Vertex>, Error> {
    let mut previous: Option<Vertex> = None;
    let mut current = vertices[0];
    let mut sorted = Vec::with_capacity(vertices.len());

    loop {
        let mut adjacent: Vec<Vertex> = Vec::with_capacity(8);
        grid::neighbors8(current.x as usize, current.y as usize, width, height, |nx, ny| {
            if matrix.get(nx, ny) {
                adjacent.push(Vertex {
                    x: nx as u16,
                    y: ny as u16,
                });
            }
        });

        if adjacent.len() != 2 {
            return Err(Error::ShapeGenerationFailed);
        }

        let prev = match previous {
            Some(prev) => prev,
            None => {
                // first step: either neighbor works as "where we came from"
                sorted.push(adjacent[0]);
                adjacent[0]
            }
        };

        sorted.push(current);

        let next = if adjacent[0] == prev {
            adjacent[1]
        } else {
            adjacent[0]
        };
        previous = Some(current);
        current = next;

        if current == sorted[0] {
            return Ok(sorted);
        }
        if sorted.len() >= vertices.len() {
            return Err(Error::CouldNotCloseShape);
        }
    }
}
