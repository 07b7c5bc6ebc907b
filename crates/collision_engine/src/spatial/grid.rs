//! Uniform grid broad phase
//!
//! Bounding boxes are bucketed into fixed-size square cells keyed by integer
//! coordinates. An entry is listed in every cell its box overlaps and
//! remembers that list, so removal and moves never scan the whole grid.
//! Queries only touch the cells overlapping the query primitive.
//!
//! Boxes that would span an unreasonable number of cells (or are not finite)
//! are kept in a small overflow list that every query checks directly.

use std::fmt;
use std::hash::Hash;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::foundation::math::{Vec2, AABB};

use super::spatial_query::SpatialQuery;

/// Default edge length of a grid cell in world units
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Entries covering more cells than this go to the overflow list
const MAX_CELLS_PER_ENTRY: u64 = 1024;

type CellCoord = (i32, i32);

/// Map a coordinate to its cell index along one axis, rounding toward -inf
///
/// Out-of-range values saturate to the `i32` limits; NaN maps to cell 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cell_coord(value: f32, origin: f32, cell_size: f32) -> i32 {
    let t = (value - origin) / cell_size;
    let coord = t as i32;

    // The cast truncated toward zero
    if t < 0.0 && (coord as f32) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

/// Inclusive rectangle of cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    x0: i32,
    x1: i32,
    y0: i32,
    y1: i32,
}

impl CellRange {
    #[allow(clippy::cast_sign_loss)]
    fn cell_count(&self) -> u64 {
        let w = (i64::from(self.x1) - i64::from(self.x0) + 1) as u64;
        let h = (i64::from(self.y1) - i64::from(self.y0) + 1) as u64;
        w.saturating_mul(h)
    }

    fn contains(&self, (x, y): CellCoord) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    fn coords(self) -> impl Iterator<Item = CellCoord> {
        (self.x0..=self.x1).flat_map(move |x| (self.y0..=self.y1).map(move |y| (x, y)))
    }
}

struct Cell<K> {
    entries: SmallVec<[K; 8]>,
}

impl<K> Default for Cell<K> {
    fn default() -> Self {
        Self { entries: SmallVec::new() }
    }
}

#[derive(Debug, Clone)]
struct GridEntry {
    aabb: AABB,
    // Cells currently listing this entry; empty for overflow entries
    cells: SmallVec<[CellCoord; 4]>,
}

/// Sparse uniform grid over 2D bounding boxes
pub struct UniformGrid<K> {
    cell_size: f32,
    origin: Vec2,
    cells: HashMap<CellCoord, Cell<K>>,
    entries: HashMap<K, GridEntry>,
    overflow: Vec<K>,
}

impl<K> fmt::Debug for UniformGrid<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformGrid")
            .field("cell_size", &self.cell_size)
            .field("origin", &self.origin)
            .field("entries", &self.entries.len())
            .field("cells", &self.cells.len())
            .field("overflow", &self.overflow.len())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> Default for UniformGrid<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl<K: Copy + Eq + Hash> UniformGrid<K> {
    /// Create a grid with the given cell size and origin at (0, 0)
    pub fn new(cell_size: f32) -> Self {
        Self::with_origin(cell_size, Vec2::zeros())
    }

    /// Create a grid with the given cell size and origin
    ///
    /// `cell_size` must be finite and strictly positive; callers validate it
    /// through the grid configuration.
    pub fn with_origin(cell_size: f32, origin: Vec2) -> Self {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0, "cell_size must be strictly positive");
        Self {
            cell_size,
            origin,
            cells: HashMap::new(),
            entries: HashMap::new(),
            overflow: Vec::new(),
        }
    }

    /// Edge length of a cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the corner of cell (0, 0)
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether `key` is currently indexed
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    fn cell_range(&self, aabb: &AABB) -> CellRange {
        let (x0, x1) = ordered(
            cell_coord(aabb.min.x, self.origin.x, self.cell_size),
            cell_coord(aabb.max.x, self.origin.x, self.cell_size),
        );
        let (y0, y1) = ordered(
            cell_coord(aabb.min.y, self.origin.y, self.cell_size),
            cell_coord(aabb.max.y, self.origin.y, self.cell_size),
        );
        CellRange { x0, x1, y0, y1 }
    }

    #[allow(clippy::cast_precision_loss)]
    fn cell_bounds(&self, (x, y): CellCoord) -> AABB {
        let min = self.origin + Vec2::new(x as f32, y as f32) * self.cell_size;
        // Slightly enlarged so rounding never drops a touched cell
        AABB::new(min, min + Vec2::new(self.cell_size, self.cell_size)).expanded(self.cell_size * 1.0e-4)
    }

    fn place(&mut self, key: K, aabb: AABB) {
        let range = self.cell_range(&aabb);
        let mut cells: SmallVec<[CellCoord; 4]> = SmallVec::new();

        if aabb.is_finite() && range.cell_count() <= MAX_CELLS_PER_ENTRY {
            for coord in range.coords() {
                self.cells.entry(coord).or_default().entries.push(key);
                cells.push(coord);
            }
        } else {
            self.overflow.push(key);
        }

        self.entries.insert(key, GridEntry { aabb, cells });
    }

    fn unplace(&mut self, key: K, entry: &GridEntry) {
        if entry.cells.is_empty() {
            if let Some(pos) = self.overflow.iter().position(|&k| k == key) {
                self.overflow.swap_remove(pos);
            }
            return;
        }

        for coord in &entry.cells {
            let Some(cell) = self.cells.get_mut(coord) else {
                continue;
            };
            if let Some(pos) = cell.entries.iter().position(|&k| k == key) {
                cell.entries.swap_remove(pos);
            }
            if cell.entries.is_empty() {
                // Dropping empty cells keeps the map compact for sparse worlds
                self.cells.remove(coord);
            }
        }
    }

    /// Visit every occupied cell inside `range`
    ///
    /// Walks the range when it is small, otherwise scans the occupied cells,
    /// so unbounded ranges cost no more than the number of occupied cells.
    fn for_each_cell_in<F>(&self, range: CellRange, mut visit: F)
    where
        F: FnMut(CellCoord, &Cell<K>),
    {
        if range.cell_count() <= self.cells.len() as u64 {
            for coord in range.coords() {
                if let Some(cell) = self.cells.get(&coord) {
                    visit(coord, cell);
                }
            }
        } else {
            for (&coord, cell) in &self.cells {
                if range.contains(coord) {
                    visit(coord, cell);
                }
            }
        }
    }

    /// De-duplicated entries from the cells in `range` (plus overflow) whose
    /// box passes `accept`; `cell_filter` prunes whole cells first
    fn gather<C, A>(&self, range: CellRange, cell_filter: C, accept: A) -> Vec<K>
    where
        C: Fn(CellCoord) -> bool,
        A: Fn(&AABB) -> bool,
    {
        let mut seen: HashSet<K> = HashSet::new();
        let mut out = Vec::new();

        self.for_each_cell_in(range, |coord, cell| {
            if !cell_filter(coord) {
                return;
            }
            for &key in &cell.entries {
                if !seen.insert(key) {
                    continue;
                }
                if self.entries.get(&key).is_some_and(|entry| accept(&entry.aabb)) {
                    out.push(key);
                }
            }
        });

        for &key in &self.overflow {
            if self.entries.get(&key).is_some_and(|entry| accept(&entry.aabb)) {
                out.push(key);
            }
        }

        out
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Bounding box of `origin + t * direction` for `t` in `[0, max_t]`
///
/// Axes with no motion stay at the origin even when `max_t` is infinite.
fn segment_bounds(origin: Vec2, direction: Vec2, max_t: f32) -> AABB {
    let mut min = origin;
    let mut max = origin;
    for axis in 0..2 {
        let d = direction[axis];
        if d == 0.0 {
            continue;
        }
        let end = origin[axis] + d * max_t;
        min[axis] = min[axis].min(end);
        max[axis] = max[axis].max(end);
    }
    AABB::new(min, max)
}

impl<K: Copy + Eq + Hash> SpatialQuery<K> for UniformGrid<K> {
    fn insert(&mut self, key: K, aabb: AABB) {
        // Re-insertion clears the previous memberships first
        if let Some(old) = self.entries.remove(&key) {
            self.unplace(key, &old);
        }
        self.place(key, aabb);
    }

    fn remove(&mut self, key: K) -> bool {
        match self.entries.remove(&key) {
            Some(entry) => {
                self.unplace(key, &entry);
                true
            }
            None => false,
        }
    }

    fn update(&mut self, key: K, aabb: AABB) {
        if self.entries.get(&key).is_some_and(|entry| entry.aabb == aabb) {
            return;
        }
        self.insert(key, aabb);
    }

    fn query_region(&self, region: &AABB) -> Vec<K> {
        let range = self.cell_range(region);
        self.gather(range, |_| true, |aabb| aabb.intersects(region))
    }

    fn query_point(&self, point: Vec2) -> Vec<K> {
        let range = self.cell_range(&AABB::new(point, point));
        self.gather(range, |_| true, |aabb| aabb.contains_point(point))
    }

    fn query_segment(&self, origin: Vec2, direction: Vec2, max_t: f32) -> Vec<K> {
        if max_t < 0.0 || max_t.is_nan() {
            return Vec::new();
        }
        let range = self.cell_range(&segment_bounds(origin, direction, max_t));
        self.gather(
            range,
            |coord| self.cell_bounds(coord).clip_segment(origin, direction, max_t).is_some(),
            |aabb| aabb.clip_segment(origin, direction, max_t).is_some(),
        )
    }

    fn bounds_of(&self, key: K) -> Option<AABB> {
        self.entries.get(&key).map(|entry| entry.aabb)
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.overflow.clear();
    }

    fn entity_count(&self) -> usize {
        self.entries.len()
    }
}
