//! Pseudo-heatbath gauge field updater: sweeps every link through its SU(2) subgroups,
//! weighting each subgroup's sample by the action's local staple.

use num_complex::Complex;

use crate::action::GaugeAction;
use crate::group::{
    extract_su2, heatbath_su2, insert_su2, mat2_dagger, mat2_det, mat2_mul, mat2_scale,
    num_su2_subgroups, uniform_su2,
};
use crate::rng::RandomSource;
use crate::LinkField;

/// Update the single link at `link_index` in place, cycling through every SU(2)
/// subgroup of SU(Nc) as described in the design notes' heatbath algorithm.
pub fn heatbath_link_update<A: GaugeAction>(
    field: &mut LinkField,
    action: &A,
    link_index: usize,
    rng: &mut RandomSource,
) {
    let nd = field.site_size();
    let site = link_index / nd;
    let mu = link_index % nd;
    let nc = field.get(site, mu).shape()[0];
    let staples = action.compute_staples(field, link_index);
    let mut l = field.get(site, mu).clone();
    let beta_prime = action.beta() / nc as f64;
    let eps_threshold = 6.0 * f64::EPSILON;

    for k in 0..num_su2_subgroups(nc) {
        let w = l.dot(&staples);
        let r = extract_su2(&w, nc, k);
        let det = mat2_det(&r);
        let sqrt_det = det.sqrt();
        let a = sqrt_det.re;

        let x = if a < eps_threshold {
            uniform_su2(rng)
        } else {
            let a_tilde = mat2_scale(&r, Complex::new(1.0, 0.0) / sqrt_det);
            let sample = heatbath_su2(rng, a * beta_prime);
            mat2_mul(&sample, &mat2_dagger(&a_tilde))
        };

        let n = insert_su2(&x, nc, k);
        l = n.dot(&l);
    }

    field.set(site, mu, l);
}

/// Perform `n_sweeps` full sweeps over the field, updating every link exactly once per
/// sweep in site-major, direction-minor order.
pub fn heatbath_update<A: GaugeAction>(
    field: &mut LinkField,
    action: &A,
    n_sweeps: usize,
    rng: &mut RandomSource,
) {
    let nd = field.site_size();
    for _ in 0..n_sweeps {
        for site in 0..field.volume() {
            for mu in 0..nd {
                heatbath_link_update(field, action, site * nd + mu, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::WilsonGaugeAction;
    use crate::field::LatticeField;
    use crate::group::{dagger, identity_nc, inf_norm};
    use crate::Layout;

    fn identity_field(shape: &[usize], nc: usize) -> LinkField {
        let layout = Layout::new(shape);
        let nd = layout.num_dims();
        LatticeField::new(layout, identity_nc(nc), nd)
    }

    fn max_unitarity_violation(field: &LinkField, nc: usize) -> f64 {
        let mut worst = 0.0f64;
        for i in 0..field.size() {
            let m = field.get_flat(i);
            let product = dagger(m).dot(m);
            let diff = &product - &identity_nc(nc);
            worst = worst.max(inf_norm(&diff));
        }
        worst
    }

    #[test]
    fn sweeps_preserve_unitarity() {
        let mut field = identity_field(&[4, 4, 4, 4], 3);
        let action = WilsonGaugeAction::new(5.5);
        let mut rng = RandomSource::new(11);
        heatbath_update(&mut field, &action, 10, &mut rng);
        assert!(max_unitarity_violation(&field, 3) < 1e-10);
    }

    #[test]
    fn identical_seeds_reproduce_bit_identical_fields() {
        let action = WilsonGaugeAction::new(5.5);

        let mut field_a = identity_field(&[4, 4, 4, 4], 3);
        let mut rng_a = RandomSource::new(77);
        heatbath_update(&mut field_a, &action, 3, &mut rng_a);

        let mut field_b = identity_field(&[4, 4, 4, 4], 3);
        let mut rng_b = RandomSource::new(77);
        heatbath_update(&mut field_b, &action, 3, &mut rng_b);

        for i in 0..field_a.size() {
            let a = field_a.get_flat(i);
            let b = field_b.get_flat(i);
            for idx in a.iter().zip(b.iter()) {
                assert_eq!(idx.0, idx.1);
            }
        }
    }

    #[test]
    fn single_link_update_stays_in_sun() {
        let mut field = identity_field(&[4, 4, 4, 4], 3);
        let action = WilsonGaugeAction::new(5.5);
        let mut rng = RandomSource::new(5);
        heatbath_link_update(&mut field, &action, 0, &mut rng);
        assert!(max_unitarity_violation(&field, 3) < 1e-10);
    }
}
