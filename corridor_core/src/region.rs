/// Bounding rectangle of cells touched by an edit, in inclusive cell bounds.
///
/// Starts as the inverted sentinel (`min = resolution - 1`, `max = 0`) and only
/// ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRegion {
    pub min_x: usize,
    pub min_z: usize,
    pub max_x: usize,
    pub max_z: usize,
    resolution: usize,
}

impl EditRegion {
    pub fn empty(resolution: usize) -> Self {
        let last = resolution.saturating_sub(1);
        Self {
            min_x: last,
            min_z: last,
            max_x: 0,
            max_z: 0,
            resolution,
        }
    }

    pub fn full(resolution: usize) -> Self {
        let last = resolution.saturating_sub(1);
        Self {
            min_x: 0,
            min_z: 0,
            max_x: last,
            max_z: last,
            resolution,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_z > self.max_z
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Widens to the union with a box given in (possibly out-of-range) cell
    /// coordinates. The box is clamped to the grid first.
    pub fn include_box(&mut self, min_x: i64, min_z: i64, max_x: i64, max_z: i64) {
        if min_x > max_x || min_z > max_z {
            return;
        }
        let last = self.resolution.saturating_sub(1) as i64;
        if max_x < 0 || max_z < 0 || min_x > last || min_z > last {
            return;
        }
        let clamp = |v: i64| v.clamp(0, last) as usize;
        self.min_x = self.min_x.min(clamp(min_x));
        self.min_z = self.min_z.min(clamp(min_z));
        self.max_x = self.max_x.max(clamp(max_x));
        self.max_z = self.max_z.max(clamp(max_z));
    }

    pub fn include_cell(&mut self, x: usize, z: usize) {
        self.include_box(x as i64, z as i64, x as i64, z as i64);
    }

    pub fn union(&mut self, other: &EditRegion) {
        if !other.is_empty() {
            self.include_box(
                other.min_x as i64,
                other.min_z as i64,
                other.max_x as i64,
                other.max_z as i64,
            );
        }
    }

    /// Grows a non-empty region by `cells` on every side, clamped to the grid.
    pub fn expand(&mut self, cells: usize) {
        if self.is_empty() || cells == 0 {
            return;
        }
        let cells = cells as i64;
        self.include_box(
            self.min_x as i64 - cells,
            self.min_z as i64 - cells,
            self.max_x as i64 + cells,
            self.max_z as i64 + cells,
        );
    }

    pub fn contains(&self, x: usize, z: usize) -> bool {
        !self.is_empty()
            && (self.min_x..=self.max_x).contains(&x)
            && (self.min_z..=self.max_z).contains(&z)
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_x - self.min_x + 1
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_z - self.min_z + 1
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full(self.resolution)
    }

    /// Cells inside the region, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (xs, zs) = if self.is_empty() {
            (1..=0, 1..=0)
        } else {
            (self.min_x..=self.max_x, self.min_z..=self.max_z)
        };
        zs.flat_map(move |z| xs.clone().map(move |x| (x, z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let region = EditRegion::empty(8);
        assert!(region.is_empty());
        assert_eq!(region.cell_count(), 0);
        assert_eq!(region.cells().count(), 0);
    }

    #[test]
    fn widening_is_monotone_and_clamped() {
        let mut region = EditRegion::empty(10);
        region.include_box(2, 3, 4, 5);
        assert_eq!((region.min_x, region.min_z, region.max_x, region.max_z), (2, 3, 4, 5));

        region.include_box(3, 4, 3, 4);
        assert_eq!((region.min_x, region.min_z, region.max_x, region.max_z), (2, 3, 4, 5));

        region.include_box(-5, 4, 20, 4);
        assert_eq!((region.min_x, region.min_z, region.max_x, region.max_z), (0, 3, 9, 5));
        assert_eq!(region.cells().count(), region.cell_count());
    }

    #[test]
    fn boxes_outside_the_grid_are_ignored() {
        let mut region = EditRegion::empty(6);
        region.include_box(-4, -4, -1, -1);
        region.include_box(6, 0, 9, 3);
        assert!(region.is_empty());
    }

    #[test]
    fn single_corner_cell_is_not_empty() {
        let mut region = EditRegion::empty(4);
        region.include_cell(3, 3);
        assert!(!region.is_empty());
        assert!(region.contains(3, 3));
        assert!(!region.contains(2, 3));
    }

    #[test]
    fn expand_grows_each_side() {
        let mut region = EditRegion::empty(8);
        region.include_cell(1, 6);
        region.expand(2);
        assert_eq!((region.min_x, region.min_z, region.max_x, region.max_z), (0, 4, 3, 7));
    }
}
