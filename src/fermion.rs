//! Fermion operator contract and the concrete Wilson fermion action built from the
//! hopping matrix and a mass term.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex;

use crate::error::{CoreError, CoreResult};
use crate::hopping::HoppingMatrix;
use crate::{ColourVector, Complex64, LinkField, SpinMatrix, SpinorField};

/// Polymorphic fermion operator contract consumed by the conjugate-gradient solver.
///
/// `apply_hermiticity`/`remove_hermiticity` expose whatever involution makes
/// `apply_hermiticity . apply_full . apply_hermiticity` equal `M^dagger`; for every
/// concrete action in this crate the two are literally the same transform (an
/// involution), but CG never assumes that.
pub trait FermionAction {
    /// `out <- M * input`.
    fn apply_full(&self, out: &mut SpinorField, input: &SpinorField);
    /// `x <- (hermiticity transform) * x`.
    fn apply_hermiticity(&self, x: &mut SpinorField);
    /// Inverse of [`FermionAction::apply_hermiticity`].
    fn remove_hermiticity(&self, x: &mut SpinorField);
}

/// Build `M^dagger * input` from an action's `apply_full` and hermiticity transform:
/// `M^dagger = H . M . H` for the involutive `H` every action here uses.
pub fn apply_adjoint<A: FermionAction>(action: &A, out: &mut SpinorField, input: &SpinorField) {
    let mut tmp = input.clone();
    action.apply_hermiticity(&mut tmp);
    action.apply_full(out, &tmp);
    action.remove_hermiticity(out);
}

/// A fermion action that simply scales its input by a positive real constant.
///
/// Used to validate the conjugate-gradient solver in isolation from the gauge/hopping
/// machinery (this is the action behind end-to-end scenario S1).
#[derive(Clone, Copy, Debug)]
pub struct ScalarFermionAction {
    factor: f64,
}

impl ScalarFermionAction {
    /// Build an action that multiplies every input by `factor`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `factor <= 0`.
    pub fn new_r(factor: f64) -> CoreResult<Self> {
        if factor <= 0.0 {
            return Err(CoreError::invalid_argument("scalar factor must be positive"));
        }
        Ok(ScalarFermionAction { factor })
    }

    /// Build an action that multiplies every input by `factor`.
    ///
    /// # Panics
    /// Panics if [`ScalarFermionAction::new_r`] would return an error.
    pub fn new(factor: f64) -> Self {
        Self::new_r(factor).expect("invalid scalar factor")
    }
}

impl FermionAction for ScalarFermionAction {
    fn apply_full(&self, out: &mut SpinorField, input: &SpinorField) {
        let c = Complex::new(self.factor, 0.0);
        for i in 0..out.size() {
            *out.get_flat_mut(i) = input.get_flat(i).map(|x| x * c);
        }
    }

    fn apply_hermiticity(&self, _x: &mut SpinorField) {
        // A real positive multiple of the identity is already hermitian-paired.
    }

    fn remove_hermiticity(&self, _x: &mut SpinorField) {}
}

fn pauli() -> [Array2<Complex64>; 3] {
    let z = Complex::new(0.0, 0.0);
    let o = Complex::new(1.0, 0.0);
    let i = Complex::new(0.0, 1.0);
    [
        Array2::from_shape_vec((2, 2), vec![z, o, o, z]).unwrap(),
        Array2::from_shape_vec((2, 2), vec![z, -i, i, z]).unwrap(),
        Array2::from_shape_vec((2, 2), vec![o, z, z, -o]).unwrap(),
    ]
}

/// Build the four Euclidean gamma matrices in the chiral representation, where
/// `gamma_k = [[0, -i*sigma_k], [i*sigma_k, 0]]` for the three spatial axes and
/// `gamma_4 = [[0, I], [I, 0]]` for the time axis, so that `gamma5 = diag(1,1,-1,-1)`.
/// The `i` factor is what makes each `gamma_k` Hermitian with `gamma_k^2 = I`, satisfying
/// the Euclidean Clifford algebra `{gamma_mu, gamma_nu} = 2*delta_mu_nu`.
fn gamma_matrices() -> [SpinMatrix; 4] {
    let sigmas = pauli();
    let z = Complex::new(0.0, 0.0);
    let o = Complex::new(1.0, 0.0);
    let i = Complex::new(0.0, 1.0);
    let mut out: Vec<SpinMatrix> = sigmas
        .iter()
        .map(|s| {
            Array2::from_shape_fn((4, 4), |(r, c)| match (r < 2, c < 2) {
                (true, false) => -i * s[[r, c - 2]],
                (false, true) => i * s[[r - 2, c]],
                _ => z,
            })
        })
        .collect();
    let gamma4 = Array2::from_shape_fn((4, 4), |(r, c)| match (r, c) {
        (0, 2) | (1, 3) | (2, 0) | (3, 1) => o,
        _ => z,
    });
    out.push(gamma4);
    out.try_into().unwrap_or_else(|_| panic!("gamma matrix count mismatch"))
}

/// The Wilson fermion action: nearest-neighbour hopping plus a mass term,
/// `apply_full(out, in) = (4 + m) * in - 0.5 * hop(in)`.
pub struct WilsonFermionAction {
    mass: f64,
    hop: HoppingMatrix,
    gamma5_diag: [f64; 4],
}

impl WilsonFermionAction {
    /// Build a Wilson fermion action over a four-dimensional link field.
    ///
    /// `twist_fractions` gives the per-direction boundary phase in units of pi
    /// (`phase = exp(2*pi*i*f)`); pass an empty slice for zero twist in every
    /// direction.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if the link field's rank isn't 4 or if
    /// `4 + mass == 0`, or [`CoreError::Shape`] if `twist_fractions` is non-empty and
    /// not of length 4.
    pub fn new_r(mass: f64, link_field: &LinkField, twist_fractions: &[f64]) -> CoreResult<Self> {
        let nd = link_field.site_size();
        if nd != 4 {
            return Err(CoreError::invalid_argument(
                "WilsonFermionAction requires a four-dimensional link field",
            ));
        }
        if (4.0 + mass).abs() < f64::EPSILON {
            return Err(CoreError::invalid_argument("4 + mass must not be zero"));
        }
        let twists: Vec<f64> = if twist_fractions.is_empty() {
            vec![0.0; nd]
        } else {
            if twist_fractions.len() != nd {
                return Err(CoreError::shape(format!(
                    "expected {} twist fractions, got {}",
                    nd,
                    twist_fractions.len()
                )));
            }
            twist_fractions.to_vec()
        };
        let phases: Vec<Complex64> = twists
            .iter()
            .map(|f| Complex::new((2.0 * PI * f).cos(), (2.0 * PI * f).sin()))
            .collect();

        let mut hop = HoppingMatrix::with_hops_r(link_field, &phases, 1)?;
        let gammas = gamma_matrices();
        let mut spin_structures = Vec::with_capacity(8);
        for g in &gammas {
            let plus = identity4() - g;
            let minus = identity4() + g;
            spin_structures.push(plus);
            spin_structures.push(minus);
        }
        hop.set_spin_structures_r(spin_structures)?;

        Ok(WilsonFermionAction {
            mass,
            hop,
            gamma5_diag: [1.0, 1.0, -1.0, -1.0],
        })
    }

    /// Build a Wilson fermion action over a four-dimensional link field.
    ///
    /// # Panics
    /// Panics if [`WilsonFermionAction::new_r`] would return an error.
    pub fn new(mass: f64, link_field: &LinkField, twist_fractions: &[f64]) -> Self {
        Self::new_r(mass, link_field, twist_fractions).expect("invalid Wilson fermion action")
    }

    /// The configured mass.
    pub fn mass(&self) -> f64 {
        self.mass
    }
}

fn identity4() -> SpinMatrix {
    Array2::from_shape_fn((4, 4), |(i, j)| {
        if i == j {
            Complex::new(1.0, 0.0)
        } else {
            Complex::new(0.0, 0.0)
        }
    })
}

impl FermionAction for WilsonFermionAction {
    fn apply_full(&self, out: &mut SpinorField, input: &SpinorField) {
        let nc = self.hop.num_colours();
        let mut hop_out = SpinorField::new(input.layout().clone(), ColourVector::zeros(nc), input.site_size());
        self.hop.apply_full(&mut hop_out, input);
        let coeff = Complex::new(4.0 + self.mass, 0.0);
        let half = Complex::new(0.5, 0.0);
        for i in 0..out.size() {
            let v = input.get_flat(i).map(|c| c * coeff) - hop_out.get_flat(i).map(|c| c * half);
            *out.get_flat_mut(i) = v;
        }
    }

    fn apply_hermiticity(&self, x: &mut SpinorField) {
        let ns = x.site_size();
        for site in 0..x.volume() {
            for alpha in 0..ns {
                let sign = Complex::new(self.gamma5_diag[alpha], 0.0);
                let v = x.get(site, alpha).map(|c| c * sign);
                x.set(site, alpha, v);
            }
        }
    }

    fn remove_hermiticity(&self, x: &mut SpinorField) {
        self.apply_hermiticity(x);
    }
}
