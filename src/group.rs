//! SU(2) construction, SU(2)/SU(N) random sampling, and the SU(2)-subgroup
//! embedding/extraction used by the heatbath updater.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex;

use crate::error::{CoreError, CoreResult};
use crate::rng::RandomSource;
use crate::{ColourMatrix, Complex64};

/// A dense 2x2 complex matrix, used for SU(2) elements and intermediate subblocks.
pub type Mat2 = [[Complex64; 2]; 2];

pub(crate) fn mat2_mul(a: &Mat2, b: &Mat2) -> Mat2 {
    let mut out = [[Complex::new(0.0, 0.0); 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j];
        }
    }
    out
}

pub(crate) fn mat2_dagger(a: &Mat2) -> Mat2 {
    [
        [a[0][0].conj(), a[1][0].conj()],
        [a[0][1].conj(), a[1][1].conj()],
    ]
}

pub(crate) fn mat2_det(a: &Mat2) -> Complex64 {
    a[0][0] * a[1][1] - a[0][1] * a[1][0]
}

fn mat2_sub(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        [a[0][0] - b[0][0], a[0][1] - b[0][1]],
        [a[1][0] - b[1][0], a[1][1] - b[1][1]],
    ]
}

pub(crate) fn mat2_scale(a: &Mat2, s: Complex64) -> Mat2 {
    [[a[0][0] * s, a[0][1] * s], [a[1][0] * s, a[1][1] * s]]
}

fn mat2_identity() -> Mat2 {
    let zero = Complex::new(0.0, 0.0);
    let one = Complex::new(1.0, 0.0);
    [[one, zero], [zero, one]]
}

/// Construct the SU(2) element `a0*sigma0 + i*(a1*sigma1 + a2*sigma2 + a3*sigma3)`.
///
/// Lies in SU(2) exactly when `a0^2 + a1^2 + a2^2 + a3^2 = 1`.
pub fn construct_su2(a0: f64, a1: f64, a2: f64, a3: f64) -> Mat2 {
    let i = Complex::new(0.0, 1.0);
    [
        [Complex::new(a0, a3), i * a1 + Complex::new(a2, 0.0)],
        [i * a1 - Complex::new(a2, 0.0), Complex::new(a0, -a3)],
    ]
}

/// Sample the trailing three-vector `(a1,a2,a3)` uniformly on the sphere of radius
/// `sqrt(1 - a0^2)`, given `a0` already fixed.
fn sample_direction(rng: &mut RandomSource, a0: f64) -> (f64, f64, f64) {
    let r = (1.0 - a0 * a0).max(0.0).sqrt();
    let cos_theta = rng.generate_real(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = rng.generate_real(0.0, 2.0 * PI);
    (
        r * sin_theta * phi.cos(),
        r * sin_theta * phi.sin(),
        r * cos_theta,
    )
}

/// Sample an SU(2) matrix from the source's documented distribution.
///
/// `a0` is drawn uniformly on `[0,1]`, not `[-1,1]`: the distribution is biased toward
/// the identity and does not cover SU(2) with the Haar measure. This is the documented
/// behaviour of the reference this crate follows (see DESIGN.md); it is retained
/// deliberately rather than silently corrected to a uniform `a0 in [-1,1]`.
pub fn uniform_su2(rng: &mut RandomSource) -> Mat2 {
    let a0 = rng.generate_real(0.0, 1.0);
    let (a1, a2, a3) = sample_direction(rng, a0);
    construct_su2(a0, a1, a2, a3)
}

/// Sample an SU(2) matrix from the heatbath distribution at the given positive weight,
/// via the Kennedy-Pendleton acceptance loop.
pub fn heatbath_su2(rng: &mut RandomSource, weight: f64) -> Mat2 {
    let a0 = loop {
        let r0 = 1.0 - rng.generate_real(0.0, 1.0);
        let r1 = 1.0 - rng.generate_real(0.0, 1.0);
        let r2 = 1.0 - rng.generate_real(0.0, 1.0);
        let c = (2.0 * PI * r1).cos();
        let lambda2 = -(1.0 / (2.0 * weight)) * (r0.ln() + c * c * r2.ln());
        let u = rng.generate_real(0.0, 1.0);
        if u * u <= 1.0 - lambda2 {
            break 1.0 - 2.0 * lambda2;
        }
    };
    let (a1, a2, a3) = sample_direction(rng, a0);
    construct_su2(a0, a1, a2, a3)
}

/// The number of SU(2) subgroups of SU(Nc): `Nc*(Nc-1)/2`.
pub fn num_su2_subgroups(nc: usize) -> usize {
    nc * (nc - 1) / 2
}

/// The lexicographic index pair `(i,j)`, `i < j`, for SU(2) subgroup position `k`.
///
/// # Errors
/// Returns [`CoreError::Range`] if `k >= Nc*(Nc-1)/2`.
pub fn su2_subgroup_pos_r(nc: usize, k: usize) -> CoreResult<(usize, usize)> {
    let total = num_su2_subgroups(nc);
    if k >= total {
        return Err(CoreError::range(format!(
            "su2 subgroup position {} out of range for Nc={} (total {})",
            k, nc, total
        )));
    }
    let mut count = 0usize;
    for i in 0..nc {
        for j in (i + 1)..nc {
            if count == k {
                return Ok((i, j));
            }
            count += 1;
        }
    }
    unreachable!("k < total but no pair matched");
}

/// The lexicographic index pair `(i,j)`, `i < j`, for SU(2) subgroup position `k`.
///
/// # Panics
/// Panics if [`su2_subgroup_pos_r`] would return an error.
pub fn su2_subgroup_pos(nc: usize, k: usize) -> (usize, usize) {
    su2_subgroup_pos_r(nc, k).expect("invalid su2 subgroup position")
}

/// Extract the (unnormalised) SU(2) subblock `k` of colour matrix `w`.
///
/// Returns `R - R^dagger + I*conj(trace(R))`, where `R` is the 2x2 submatrix at the
/// subgroup's index pair. This is *not* unitary; normalise by `sqrt(det)` before use.
pub fn extract_su2(w: &ColourMatrix, nc: usize, k: usize) -> Mat2 {
    let (i, j) = su2_subgroup_pos(nc, k);
    let r: Mat2 = [
        [w[[i, i]], w[[i, j]]],
        [w[[j, i]], w[[j, j]]],
    ];
    let r_dagger = mat2_dagger(&r);
    let trace = r[0][0] + r[1][1];
    let diff = mat2_sub(&r, &r_dagger);
    let id = mat2_scale(&mat2_identity(), trace.conj());
    [
        [diff[0][0] + id[0][0], diff[0][1] + id[0][1]],
        [diff[1][0] + id[1][0], diff[1][1] + id[1][1]],
    ]
}

/// Build the `nc x nc` identity matrix.
pub fn identity_nc(nc: usize) -> ColourMatrix {
    Array2::from_shape_fn((nc, nc), |(i, j)| {
        if i == j {
            Complex::new(1.0, 0.0)
        } else {
            Complex::new(0.0, 0.0)
        }
    })
}

/// Embed SU(2) matrix `x` into SU(Nc) at subgroup position `k`: the `nc x nc` identity
/// with the `(i,i),(i,j),(j,i),(j,j)` block overwritten by `x`.
pub fn insert_su2(x: &Mat2, nc: usize, k: usize) -> ColourMatrix {
    let (i, j) = su2_subgroup_pos(nc, k);
    let mut out = identity_nc(nc);
    out[[i, i]] = x[0][0];
    out[[i, j]] = x[0][1];
    out[[j, i]] = x[1][0];
    out[[j, j]] = x[1][1];
    out
}

/// Sample a uniform-distribution SU(Nc) matrix as the product, over all SU(2)
/// subgroups, of `insert_su2(uniform_su2(), k)`.
pub fn uniform_sun(rng: &mut RandomSource, nc: usize) -> ColourMatrix {
    let mut acc = identity_nc(nc);
    for k in 0..num_su2_subgroups(nc) {
        let x = uniform_su2(rng);
        let n = insert_su2(&x, nc, k);
        acc = n.dot(&acc);
    }
    acc
}

/// Conjugate transpose of a colour matrix.
pub fn dagger(m: &ColourMatrix) -> ColourMatrix {
    m.t().map(|c| c.conj())
}

/// `max_{i,j} |m[i][j]|`, the infinity norm used by the unitarity tests.
pub fn inf_norm(m: &ColourMatrix) -> f64 {
    m.iter().fold(0.0f64, |acc, c| acc.max(c.norm()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unitary(m: &ColourMatrix, tol: f64) -> bool {
        let nc = m.shape()[0];
        let product = dagger(m).dot(m);
        let diff = &product - &identity_nc(nc);
        inf_norm(&diff) < tol
    }

    #[test]
    fn uniform_su2_is_unitary_with_unit_det() {
        let mut rng = RandomSource::new(1);
        for _ in 0..200 {
            let x = uniform_su2(&mut rng);
            let m = Array2::from_shape_vec((2, 2), vec![x[0][0], x[0][1], x[1][0], x[1][1]])
                .unwrap();
            assert!(is_unitary(&m, 1e-10));
            assert!((mat2_det(&x) - Complex::new(1.0, 0.0)).norm() < 1e-10);
        }
    }

    #[test]
    fn heatbath_su2_is_unitary_with_unit_det() {
        let mut rng = RandomSource::new(2);
        for _ in 0..200 {
            let x = heatbath_su2(&mut rng, 3.4);
            let m = Array2::from_shape_vec((2, 2), vec![x[0][0], x[0][1], x[1][0], x[1][1]])
                .unwrap();
            assert!(is_unitary(&m, 1e-10));
            assert!((mat2_det(&x) - Complex::new(1.0, 0.0)).norm() < 1e-10);
        }
    }

    #[test]
    fn uniform_sun_is_unitary_with_unit_det() {
        let mut rng = RandomSource::new(3);
        for nc in [2usize, 3, 4] {
            for _ in 0..20 {
                let m = uniform_sun(&mut rng, nc);
                assert!(is_unitary(&m, 1e-10));
                let det = crate::group::det_nxn(&m);
                assert!((det - Complex::new(1.0, 0.0)).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn subgroup_positions_are_lexicographic_for_nc3() {
        assert_eq!(su2_subgroup_pos(3, 0), (0, 1));
        assert_eq!(su2_subgroup_pos(3, 1), (0, 2));
        assert_eq!(su2_subgroup_pos(3, 2), (1, 2));
    }

    #[test]
    fn subgroup_position_out_of_range_is_rejected() {
        assert!(su2_subgroup_pos_r(3, 3).is_err());
        assert!(su2_subgroup_pos_r(2, 1).is_err());
    }

    #[test]
    fn insert_then_extract_round_trips_within_subgroup() {
        let mut rng = RandomSource::new(4);
        let nc = 3;
        for k in 0..num_su2_subgroups(nc) {
            let x = uniform_su2(&mut rng);
            let w = insert_su2(&x, nc, k);
            let r = extract_su2(&w, nc, k);
            let det = mat2_det(&r);
            let sqrt_det = det.sqrt();
            let normalised = mat2_scale(&r, Complex::new(1.0, 0.0) / sqrt_det);
            for a in 0..2 {
                for b in 0..2 {
                    assert!((normalised[a][b] - x[a][b]).norm() < 1e-8);
                }
            }
        }
    }
}

/// Determinant of a general small complex matrix via Gaussian elimination with partial
/// pivoting. Used only by tests, to check that `uniform_sun`'s product construction has
/// unit determinant; the heatbath updater itself only ever needs the closed-form 2x2
/// determinant (`mat2_det`).
#[cfg(test)]
pub(crate) fn det_nxn(m: &ColourMatrix) -> Complex64 {
    let n = m.shape()[0];
    let mut a = m.clone();
    let mut det = Complex::new(1.0, 0.0);
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_norm = a[[col, col]].norm();
        for row in (col + 1)..n {
            if a[[row, col]].norm() > pivot_norm {
                pivot_row = row;
                pivot_norm = a[[row, col]].norm();
            }
        }
        if pivot_norm == 0.0 {
            return Complex::new(0.0, 0.0);
        }
        if pivot_row != col {
            for c in 0..n {
                a.swap((col, c), (pivot_row, c));
            }
            det = -det;
        }
        det *= a[[col, col]];
        let pivot = a[[col, col]];
        for row in (col + 1)..n {
            let factor = a[[row, col]] / pivot;
            for c in col..n {
                let sub = a[[col, c]] * factor;
                a[[row, c]] -= sub;
            }
        }
    }
    det
}
