//! Lattice layout: the site-coordinate ↔ site-index bijection, periodic sanitisation,
//! and neighbour shifts that every other module in this crate builds on.

use crate::error::{CoreError, CoreResult};

/// A fixed-rank periodic hypercubic lattice shape and its coordinate bookkeeping.
///
/// Sites are addressed three ways: as a coordinate tuple, as a canonical *site index*
/// (row-major, last axis fastest), and as a storage *array index*. For this baseline
/// layout the array index is the identity of the site index; the distinction is kept so
/// that a future non-canonical storage order does not need to change any call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
    volume: usize,
}

impl Layout {
    /// Build a layout over the given dimension extents.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `shape` is empty or any extent is zero.
    pub fn new_r(shape: &[usize]) -> CoreResult<Self> {
        if shape.is_empty() {
            return Err(CoreError::invalid_argument("lattice shape must have rank >= 1"));
        }
        if shape.iter().any(|&e| e == 0) {
            return Err(CoreError::invalid_argument("lattice extents must be positive"));
        }
        let mut strides = vec![1usize; shape.len()];
        for d in (0..shape.len() - 1).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }
        let volume = strides[0] * shape[0];
        Ok(Layout {
            shape: shape.to_vec(),
            strides,
            volume,
        })
    }

    /// Build a layout over the given dimension extents.
    ///
    /// # Panics
    /// Panics if [`Layout::new_r`] would return an error.
    pub fn new(shape: &[usize]) -> Self {
        Self::new_r(shape).expect("invalid lattice shape")
    }

    /// Number of dimensions (rank) of the lattice.
    pub fn num_dims(&self) -> usize {
        self.shape.len()
    }

    /// Total number of sites.
    pub fn volume(&self) -> usize {
        self.volume
    }

    /// The declared extent of each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Decompose a site index into its coordinate tuple (mixed-radix, last axis fastest).
    pub fn site_coords_of(&self, site_index: usize) -> Vec<usize> {
        let mut coords = vec![0usize; self.shape.len()];
        let mut rem = site_index;
        for d in 0..self.shape.len() {
            coords[d] = rem / self.strides[d];
            rem %= self.strides[d];
        }
        coords
    }

    /// Compose a coordinate tuple into its site index.
    ///
    /// Undefined (will produce a nonsensical index, not a panic) unless every component
    /// already lies in `[0, extent)`; callers sanitise with [`Layout::sanitise`] first.
    pub fn site_index_of(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(self.strides.iter())
            .map(|(&c, &s)| c * s)
            .sum()
    }

    /// Storage-order array index for a site index. Identity for this layout.
    pub fn array_index_of(&self, site_index: usize) -> usize {
        site_index
    }

    /// Site index for a storage-order array index. Identity for this layout.
    pub fn site_index_of_array(&self, array_index: usize) -> usize {
        array_index
    }

    /// Reduce each signed coordinate component modulo its axis extent, using
    /// mathematical modulo (always non-negative) rather than C-style remainder.
    pub fn sanitise(&self, coords: &[i64]) -> Vec<usize> {
        coords
            .iter()
            .zip(self.shape.iter())
            .map(|(&c, &extent)| {
                let e = extent as i64;
                (((c % e) + e) % e) as usize
            })
            .collect()
    }

    /// The site reached from `site_index` by shifting the coordinate on `axis` by
    /// `delta` (positive or negative, any magnitude) and wrapping periodically.
    pub fn neighbor(&self, site_index: usize, axis: usize, delta: i64) -> usize {
        let mut coords: Vec<i64> = self
            .site_coords_of(site_index)
            .into_iter()
            .map(|c| c as i64)
            .collect();
        coords[axis] += delta;
        let sanitised = self.sanitise(&coords);
        self.site_index_of(&sanitised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_product_of_extents() {
        let layout = Layout::new(&[8, 4, 4, 4]);
        assert_eq!(layout.volume(), 8 * 4 * 4 * 4);
        assert_eq!(layout.num_dims(), 4);
    }

    #[test]
    fn coords_and_index_round_trip() {
        let layout = Layout::new(&[3, 5, 2]);
        for idx in 0..layout.volume() {
            let coords = layout.site_coords_of(idx);
            assert_eq!(layout.site_index_of(&coords), idx);
        }
    }

    #[test]
    fn last_axis_varies_fastest() {
        let layout = Layout::new(&[2, 2, 2]);
        assert_eq!(layout.site_coords_of(0), vec![0, 0, 0]);
        assert_eq!(layout.site_coords_of(1), vec![0, 0, 1]);
        assert_eq!(layout.site_coords_of(2), vec![0, 1, 0]);
        assert_eq!(layout.site_coords_of(4), vec![1, 0, 0]);
    }

    #[test]
    fn sanitise_wraps_negative_coordinates() {
        let layout = Layout::new(&[4, 4]);
        assert_eq!(layout.sanitise(&[-1, 0]), vec![3, 0]);
        assert_eq!(layout.sanitise(&[-5, 9]), vec![3, 1]);
        assert_eq!(layout.sanitise(&[4, 4]), vec![0, 0]);
    }

    #[test]
    fn neighbor_wraps_periodically() {
        let layout = Layout::new(&[4, 4, 4, 4]);
        let site = layout.site_index_of(&[0, 0, 0, 0]);
        let back = layout.neighbor(site, 0, -1);
        assert_eq!(layout.site_coords_of(back), vec![3, 0, 0, 0]);
        let forward = layout.neighbor(site, 2, 5);
        assert_eq!(layout.site_coords_of(forward), vec![0, 0, 1, 0]);
    }

    #[test]
    fn array_index_is_identity() {
        let layout = Layout::new(&[4, 4]);
        for i in 0..layout.volume() {
            assert_eq!(layout.array_index_of(i), i);
            assert_eq!(layout.site_index_of_array(i), i);
        }
    }

    #[test]
    fn rejects_degenerate_shapes() {
        assert!(Layout::new_r(&[]).is_err());
        assert!(Layout::new_r(&[4, 0, 2]).is_err());
    }
}
