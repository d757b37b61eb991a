//! Precomputed "scattered" gauge field and neighbour table, and the nearest-neighbour
//! spin-structured stencil built from them.

use num_complex::Complex;

use crate::error::{CoreError, CoreResult};
use crate::group::{dagger, identity_nc};
use crate::layout::Layout;
use crate::{ColourMatrix, ColourVector, Complex64, LinkField, SpinMatrix, SpinorField};

/// Precomputed scattered gauge field, neighbour table, and (once injected) spin
/// structures for a nearest-neighbour fermion hopping stencil.
///
/// Built once from a borrowed link field; after construction it depends only on its own
/// derived storage, not on the link field that produced it.
pub struct HoppingMatrix {
    layout: Layout,
    nc: usize,
    nd: usize,
    hops: i64,
    ns: usize,
    /// Indexed as `[site * 2*nd + 2*axis + (0 for forward, 1 for backward)]`.
    scattered: Vec<ColourMatrix>,
    /// Same indexing as `scattered`: the neighbour array index reached in that signed
    /// direction.
    neighbor: Vec<usize>,
    spin_structures: Option<Vec<SpinMatrix>>,
}

impl HoppingMatrix {
    /// Build a hopping matrix with `H = 1` (single-link hops) and no spin structures.
    ///
    /// # Errors
    /// Returns [`CoreError::Shape`] if `phases.len() != field.site_size()`.
    pub fn new_r(field: &LinkField, phases: &[Complex64]) -> CoreResult<Self> {
        Self::with_hops_r(field, phases, 1)
    }

    /// Build a hopping matrix with `H = 1`.
    ///
    /// # Panics
    /// Panics if [`HoppingMatrix::new_r`] would return an error.
    pub fn new(field: &LinkField, phases: &[Complex64]) -> Self {
        Self::new_r(field, phases).expect("invalid hopping matrix construction")
    }

    /// Build a hopping matrix with a caller-supplied hop count `H`.
    ///
    /// # Errors
    /// Returns [`CoreError::Shape`] if `phases.len() != field.site_size()`, or
    /// [`CoreError::InvalidArgument`] if `hops == 0`.
    pub fn with_hops_r(field: &LinkField, phases: &[Complex64], hops: usize) -> CoreResult<Self> {
        let nd = field.site_size();
        if phases.len() != nd {
            return Err(CoreError::shape(format!(
                "expected {} phases (one per direction), got {}",
                nd,
                phases.len()
            )));
        }
        if hops == 0 {
            return Err(CoreError::invalid_argument("hop count must be positive"));
        }
        let layout = field.layout().clone();
        let nc = field.get(0, 0).shape()[0];
        let volume = layout.volume();
        let h = hops as i64;

        let mut scattered = vec![identity_nc(nc); volume * 2 * nd];
        let mut neighbor = vec![0usize; volume * 2 * nd];

        for s in 0..volume {
            let coords = layout.site_coords_of(s);
            for d in 0..nd {
                let extent = layout.shape()[d] as i64;
                let c = coords[d] as i64;
                let forward_phase = if c + h >= extent {
                    phases[d]
                } else {
                    Complex::new(1.0, 0.0)
                };
                let backward_phase = if c < h {
                    phases[d]
                } else {
                    Complex::new(1.0, 0.0)
                };

                let mut acc_fwd = identity_nc(nc);
                let mut cur = s;
                for _ in 0..hops {
                    acc_fwd = acc_fwd.dot(field.get(cur, d));
                    cur = layout.neighbor(cur, d, 1);
                }
                scattered[s * 2 * nd + 2 * d] = acc_fwd.map(|x| x * forward_phase);
                neighbor[s * 2 * nd + 2 * d] = cur;

                let start_bwd = layout.neighbor(s, d, -h);
                let mut acc_bwd = identity_nc(nc);
                let mut cur2 = start_bwd;
                for _ in 0..hops {
                    acc_bwd = acc_bwd.dot(field.get(cur2, d));
                    cur2 = layout.neighbor(cur2, d, 1);
                }
                scattered[s * 2 * nd + 2 * d + 1] = acc_bwd.map(|x| x * backward_phase);
                neighbor[s * 2 * nd + 2 * d + 1] = start_bwd;
            }
        }

        Ok(HoppingMatrix {
            layout,
            nc,
            nd,
            hops: h,
            ns: 0,
            scattered,
            neighbor,
            spin_structures: None,
        })
    }

    /// Build a hopping matrix with a caller-supplied hop count `H`.
    ///
    /// # Panics
    /// Panics if [`HoppingMatrix::with_hops_r`] would return an error.
    pub fn with_hops(field: &LinkField, phases: &[Complex64], hops: usize) -> Self {
        Self::with_hops_r(field, phases, hops).expect("invalid hopping matrix construction")
    }

    /// Inject the Dirac spin-projector matrices, two per direction (forward, backward)
    /// in that order.
    ///
    /// # Errors
    /// Returns [`CoreError::Shape`] if the sequence length or any matrix's shape is
    /// wrong.
    pub fn set_spin_structures_r(&mut self, spin_structures: Vec<SpinMatrix>) -> CoreResult<()> {
        if spin_structures.len() != 2 * self.nd {
            return Err(CoreError::shape(format!(
                "expected {} spin structures (2 per direction), got {}",
                2 * self.nd,
                spin_structures.len()
            )));
        }
        let ns = spin_structures[0].shape()[0];
        for m in &spin_structures {
            if m.shape() != [ns, ns] {
                return Err(CoreError::shape("all spin structures must be square and equal-sized"));
            }
        }
        self.ns = ns;
        self.spin_structures = Some(spin_structures);
        Ok(())
    }

    /// Inject the Dirac spin-projector matrices.
    ///
    /// # Panics
    /// Panics if [`HoppingMatrix::set_spin_structures_r`] would return an error.
    pub fn set_spin_structures(&mut self, spin_structures: Vec<SpinMatrix>) {
        self.set_spin_structures_r(spin_structures)
            .expect("invalid spin structures")
    }

    /// Number of spin components, valid once spin structures have been injected
    /// (`0` beforehand).
    pub fn num_spins(&self) -> usize {
        self.ns
    }

    /// Number of colours.
    pub fn num_colours(&self) -> usize {
        self.nc
    }

    /// Number of lattice dimensions.
    pub fn num_dims(&self) -> usize {
        self.nd
    }

    /// Number of hops `H` this matrix was built with.
    pub fn hops(&self) -> i64 {
        self.hops
    }

    /// Apply the stencil: `out = H * input`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if spin structures have not been set, or
    /// [`CoreError::Shape`] if `out`/`input` don't match this matrix's site size and
    /// volume.
    pub fn apply_full_r(&self, out: &mut SpinorField, input: &SpinorField) -> CoreResult<()> {
        let spin_structures = self
            .spin_structures
            .as_ref()
            .ok_or_else(|| CoreError::invalid_argument("spin structures not set"))?;
        let ns = self.ns;
        let volume = self.layout.volume();
        if input.site_size() != ns || out.site_size() != ns {
            return Err(CoreError::shape("spinor site size must equal num_spins"));
        }
        if input.volume() != volume || out.volume() != volume {
            return Err(CoreError::shape("spinor volume must match the hopping matrix's layout"));
        }

        for i in 0..out.size() {
            *out.get_flat_mut(i) = ColourVector::zeros(self.nc);
        }

        let nd = self.nd;
        let zero = Complex::new(0.0, 0.0);
        let mut partial_fwd = vec![ColourVector::zeros(self.nc); volume * nd * ns];
        let mut partial_bwd = vec![ColourVector::zeros(self.nc); volume * nd * ns];

        for s in 0..volume {
            for d in 0..nd {
                let u_fwd = &self.scattered[s * 2 * nd + 2 * d];
                let u_bwd_dagger = dagger(&self.scattered[s * 2 * nd + 2 * d + 1]);
                let gamma_fwd = &spin_structures[2 * d];
                let gamma_bwd = &spin_structures[2 * d + 1];
                for alpha in 0..ns {
                    let mut acc_fwd = ColourVector::zeros(self.nc);
                    let mut acc_bwd = ColourVector::zeros(self.nc);
                    for beta in 0..ns {
                        let g_fwd = gamma_fwd[[alpha, beta]];
                        let g_bwd = gamma_bwd[[alpha, beta]];
                        let v = input.get(s, beta);
                        if g_fwd != zero {
                            let uv = u_fwd.dot(v);
                            acc_fwd = acc_fwd + uv.map(|c| c * g_fwd);
                        }
                        if g_bwd != zero {
                            let uv = u_bwd_dagger.dot(v);
                            acc_bwd = acc_bwd + uv.map(|c| c * g_bwd);
                        }
                    }
                    partial_fwd[(s * nd + d) * ns + alpha] = acc_fwd;
                    partial_bwd[(s * nd + d) * ns + alpha] = acc_bwd;
                }
            }
        }

        for s in 0..volume {
            for d in 0..nd {
                let neigh_fwd = self.neighbor[s * 2 * nd + 2 * d];
                let neigh_bwd = self.neighbor[s * 2 * nd + 2 * d + 1];
                for alpha in 0..ns {
                    let pf = &partial_fwd[(s * nd + d) * ns + alpha];
                    let updated = out.get(neigh_fwd, alpha) + pf;
                    out.set(neigh_fwd, alpha, updated);
                    let pb = &partial_bwd[(s * nd + d) * ns + alpha];
                    let updated = out.get(neigh_bwd, alpha) + pb;
                    out.set(neigh_bwd, alpha, updated);
                }
            }
        }

        Ok(())
    }

    /// Apply the stencil: `out = H * input`.
    ///
    /// # Panics
    /// Panics if [`HoppingMatrix::apply_full_r`] would return an error.
    pub fn apply_full(&self, out: &mut SpinorField, input: &SpinorField) {
        self.apply_full_r(out, input).expect("hopping matrix apply failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::LatticeField;
    use crate::group::identity_nc;
    use crate::Layout;
    use ndarray::Array2;

    fn identity_link_field(shape: &[usize], nc: usize) -> LinkField {
        let layout = Layout::new(shape);
        let nd = layout.num_dims();
        LatticeField::new(layout, identity_nc(nc), nd)
    }

    fn trivial_spin_structures(nd: usize, ns: usize) -> Vec<SpinMatrix> {
        (0..2 * nd)
            .map(|_| {
                Array2::from_shape_fn((ns, ns), |(i, j)| {
                    if i == j {
                        Complex::new(1.0, 0.0)
                    } else {
                        Complex::new(0.0, 0.0)
                    }
                })
            })
            .collect()
    }

    #[test]
    fn apply_full_requires_spin_structures() {
        let field = identity_link_field(&[4, 4, 4, 4], 3);
        let phases = vec![Complex::new(1.0, 0.0); 4];
        let hop = HoppingMatrix::new(&field, &phases);
        let layout = field.layout().clone();
        let mut input = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        let mut out = SpinorField::new(layout, ColourVector::zeros(3), 4);
        input.set(0, 0, ColourVector::from_elem(3, Complex::new(1.0, 0.0)));
        assert!(hop.apply_full_r(&mut out, &input).is_err());
    }

    #[test]
    fn apply_full_is_linear() {
        let field = identity_link_field(&[4, 4, 4, 4], 3);
        let phases = vec![Complex::new(1.0, 0.0); 4];
        let mut hop = HoppingMatrix::new(&field, &phases);
        hop.set_spin_structures(trivial_spin_structures(4, 4));

        let layout = field.layout().clone();
        let mut x = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        let mut y = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        x.set(0, 0, ColourVector::from_elem(3, Complex::new(1.0, 0.5)));
        y.set(5, 2, ColourVector::from_elem(3, Complex::new(-0.3, 2.0)));

        let alpha = Complex::new(2.0, -1.0);
        let beta = Complex::new(0.5, 0.5);

        let mut combined = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        for i in 0..combined.size() {
            let v = x.get_flat(i).map(|c| c * alpha) + y.get_flat(i).map(|c| c * beta);
            *combined.get_flat_mut(i) = v;
        }

        let mut out_combined = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        hop.apply_full(&mut out_combined, &combined);

        let mut out_x = SpinorField::new(layout.clone(), ColourVector::zeros(3), 4);
        hop.apply_full(&mut out_x, &x);
        let mut out_y = SpinorField::new(layout, ColourVector::zeros(3), 4);
        hop.apply_full(&mut out_y, &y);

        for i in 0..out_combined.size() {
            let expected = out_x.get_flat(i).map(|c| c * alpha) + out_y.get_flat(i).map(|c| c * beta);
            let actual = out_combined.get_flat(i);
            for (a, b) in actual.iter().zip(expected.iter()) {
                assert!((a - b).norm() < 1e-9);
            }
        }
    }
}
