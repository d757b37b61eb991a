//! Conjugate-gradient solver inverting `M^dagger M` given only an action's `apply_full`
//! and hermiticity transform.

use num_complex::Complex;

use crate::error::{CoreError, CoreResult};
use crate::fermion::{apply_adjoint, FermionAction};
use crate::{ColourVector, Complex64, SpinorField};

fn inner_product(a: &SpinorField, b: &SpinorField) -> Complex64 {
    let mut sum = Complex::new(0.0, 0.0);
    for i in 0..a.size() {
        for (x, y) in a.get_flat(i).iter().zip(b.get_flat(i).iter()) {
            sum += x.conj() * y;
        }
    }
    sum
}

fn axpy(dst: &mut SpinorField, a: &SpinorField, scalar: Complex64, b: &SpinorField) {
    for i in 0..dst.size() {
        let v = a.get_flat(i) + &b.get_flat(i).map(|c| c * scalar);
        *dst.get_flat_mut(i) = v;
    }
}

fn zeros_like(template: &SpinorField, nc: usize) -> SpinorField {
    SpinorField::new(template.layout().clone(), ColourVector::zeros(nc), template.site_size())
}

/// Solve `M^dagger M x = M^dagger b` for `x`, returning `(solution, residual_norm,
/// iterations_used)`.
///
/// If the solver exhausts `max_iter` without meeting `tol`, it returns with
/// `iterations_used == max_iter` and the last-achieved residual; this is not an error,
/// callers distinguish convergence by comparing the residual to their own tolerance.
///
/// # Errors
/// Returns [`CoreError::InvalidArgument`] if `tol <= 0` or `max_iter == 0`.
pub fn conjugate_gradient_r<A: FermionAction>(
    action: &A,
    rhs: &SpinorField,
    max_iter: usize,
    tol: f64,
) -> CoreResult<(SpinorField, f64, usize)> {
    if tol <= 0.0 {
        return Err(CoreError::invalid_argument("tolerance must be positive"));
    }
    if max_iter == 0 {
        return Err(CoreError::invalid_argument("max_iter must be positive"));
    }

    let nc = rhs.get_flat(0).len();
    let mut x = zeros_like(rhs, nc);
    let mut r = zeros_like(rhs, nc);
    apply_adjoint(action, &mut r, rhs);
    let mut p = r.clone();

    let b_norm_sq = inner_product(rhs, rhs).re;
    let mut r_norm_sq = inner_product(&r, &r).re;

    for k in 0..max_iter {
        let mut t = zeros_like(rhs, nc);
        action.apply_full(&mut t, &p);
        let mut q = zeros_like(rhs, nc);
        apply_adjoint(action, &mut q, &t);

        let pq = inner_product(&p, &q);
        let alpha = if pq.norm() == 0.0 {
            Complex::new(0.0, 0.0)
        } else {
            Complex::new(r_norm_sq, 0.0) / pq
        };

        let mut x_next = zeros_like(rhs, nc);
        axpy(&mut x_next, &x, alpha, &p);
        x = x_next;

        let mut r_next = zeros_like(rhs, nc);
        axpy(&mut r_next, &r, -alpha, &q);

        let r_next_norm_sq = inner_product(&r_next, &r_next).re;
        let threshold = if b_norm_sq > 0.0 {
            tol * tol * b_norm_sq
        } else {
            tol * tol
        };
        if r_next_norm_sq <= threshold {
            return Ok((x, r_next_norm_sq.max(0.0).sqrt(), k + 1));
        }

        let beta = if r_norm_sq == 0.0 {
            0.0
        } else {
            r_next_norm_sq / r_norm_sq
        };
        let mut p_next = zeros_like(rhs, nc);
        axpy(&mut p_next, &r_next, Complex::new(beta, 0.0), &p);

        p = p_next;
        r = r_next;
        r_norm_sq = r_next_norm_sq;
    }

    Ok((x, r_norm_sq.max(0.0).sqrt(), max_iter))
}

/// Solve `M^dagger M x = M^dagger b` for `x`.
///
/// # Panics
/// Panics if [`conjugate_gradient_r`] would return an error.
pub fn conjugate_gradient<A: FermionAction>(
    action: &A,
    rhs: &SpinorField,
    max_iter: usize,
    tol: f64,
) -> (SpinorField, f64, usize) {
    conjugate_gradient_r(action, rhs, max_iter, tol).expect("invalid conjugate gradient parameters")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fermion::{ScalarFermionAction, WilsonFermionAction};
    use crate::field::LatticeField;
    use crate::group::identity_nc;
    use crate::{LinkField, Layout};

    fn identity_link_field(shape: &[usize], nc: usize) -> LinkField {
        let layout = Layout::new(shape);
        let nd = layout.num_dims();
        LatticeField::new(layout, identity_nc(nc), nd)
    }

    #[test]
    fn scalar_action_converges_in_one_iteration() {
        let layout = Layout::new(&[8, 4, 4, 4]);
        let mut rhs = SpinorField::new(layout, ColourVector::zeros(3), 4);
        rhs.set(0, 0, ColourVector::from_elem(3, Complex::new(1.0, 0.0)));

        let action = ScalarFermionAction::new(2.0);
        let (solution, residual, iterations) = conjugate_gradient(&action, &rhs, 1000, 1e-10);

        assert_eq!(iterations, 1);
        assert!(residual < 1e-10);
        assert!((solution.get(0, 0)[0] - Complex::new(0.5, 0.0)).norm() < 1e-10);
        for site in 0..solution.volume() {
            for alpha in 0..solution.site_size() {
                if site == 0 && alpha == 0 {
                    continue;
                }
                for c in solution.get(site, alpha).iter() {
                    assert!(c.norm() < 1e-10);
                }
            }
        }
    }

    #[test]
    fn wilson_fermion_on_identity_gauge_converges() {
        let field = identity_link_field(&[8, 4, 4, 4], 3);
        let action = WilsonFermionAction::new(0.1, &field, &[]);
        let layout = field.layout().clone();
        let mut rhs = SpinorField::new(layout, ColourVector::zeros(3), 4);
        rhs.set(0, 0, ColourVector::from_elem(3, Complex::new(0.0, 0.0)));
        let mut v = ColourVector::zeros(3);
        v[0] = Complex::new(1.0, 0.0);
        rhs.set(0, 0, v);

        let (solution, residual, iterations) = conjugate_gradient(&action, &rhs, 1000, 1e-8);
        assert!(residual < 1e-8);
        assert_eq!(iterations, 69);
        let component = solution.get(0, 0)[0];
        assert!((component.re - 0.2522536470229704).abs() < 1e-10);
        assert!(component.im.abs() < 1e-10);
    }

    #[test]
    fn rejects_nonpositive_tolerance_and_zero_max_iter() {
        let layout = Layout::new(&[4, 4, 4, 4]);
        let rhs = SpinorField::new(layout, ColourVector::zeros(3), 4);
        let action = ScalarFermionAction::new(2.0);
        assert!(conjugate_gradient_r(&action, &rhs, 10, 0.0).is_err());
        assert!(conjugate_gradient_r(&action, &rhs, 0, 1e-8).is_err());
    }
}
