use nalgebra::{Rotation3, Vector3};
use rand::Rng;

/// Rotates the transverse (x, y) components about +Z by `omega * dt` radians.
#[inline]
pub fn precess(m: &mut Vector3<f64>, omega: f64, dt: f64) {
    let (sin, cos) = (omega * dt).sin_cos();
    let (x, y) = (m.x, m.y);
    m.x = x * cos - y * sin;
    m.y = x * sin + y * cos;
}

#[inline]
pub fn relax_transverse(m: &mut Vector3<f64>, t2: f64, dt: f64) {
    let decay = (-dt / t2).exp();
    m.x *= decay;
    m.y *= decay;
}

/// Exponential approach of `m.z` toward `m0`. Never overshoots for `dt >= 0`.
#[inline]
pub fn recover_longitudinal(m: &mut Vector3<f64>, t1: f64, dt: f64, m0: f64) {
    let recovery = 1.0 - (-dt / t1).exp();
    m.z += (m0 - m.z) * recovery;
}

/// Rotates the whole vector about the RF axis (+X) by `angle` radians.
#[inline]
pub fn rf_rotate(m: &mut Vector3<f64>, angle: f64) {
    *m = Rotation3::from_axis_angle(&Vector3::x_axis(), angle) * *m;
}

/// One tick of field-loss randomization: each axis decays by `retention` and picks up
/// uniform noise in `[-noise_scale / 2, noise_scale / 2)`.
pub fn field_loss_step(
    m: &mut Vector3<f64>,
    retention: f64,
    noise_scale: f64,
    rng: &mut impl Rng,
) {
    for axis in m.iter_mut() {
        *axis = *axis * retention + rng.gen_range(-0.5..0.5) * noise_scale;
    }
}

#[inline]
pub fn transverse_magnitude(m: &Vector3<f64>) -> f64 {
    m.x.hypot(m.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOLERANCE: f64 = 1e-9;

    fn vec_approx_equal(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
        (a - b).norm() < TOLERANCE
    }

    #[test]
    fn equilibrium_is_a_fixed_point_of_relaxation_and_precession() {
        let mut m = Vector3::new(0.0, 0.0, 1.0);
        for _ in 0..100 {
            precess(&mut m, 6.28, 0.05);
            relax_transverse(&mut m, 2.0, 0.05);
            recover_longitudinal(&mut m, 4.0, 0.05, 1.0);
        }
        assert!(vec_approx_equal(&m, &Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_time_step_leaves_any_vector_unchanged() {
        let original = Vector3::new(0.3, -0.4, 0.2);
        let mut m = original;
        precess(&mut m, 6.28, 0.0);
        relax_transverse(&mut m, 0.4, 0.0);
        recover_longitudinal(&mut m, 1.5, 0.0, 1.0);
        assert_eq!(m, original);
    }

    #[test]
    fn precession_preserves_transverse_magnitude_and_z() {
        let mut m = Vector3::new(0.6, 0.0, 0.8);
        precess(&mut m, 2.0 * PI, 0.25);
        assert!((transverse_magnitude(&m) - 0.6).abs() < TOLERANCE);
        assert!((m.z - 0.8).abs() < TOLERANCE);
        assert!(vec_approx_equal(&m, &Vector3::new(0.0, 0.6, 0.8)));
    }

    #[test]
    fn longitudinal_recovery_is_monotone_without_overshoot() {
        let mut m = Vector3::new(0.0, 0.0, -1.0);
        let mut previous = m.z;
        for _ in 0..2000 {
            recover_longitudinal(&mut m, 1.5, 0.05, 1.0);
            assert!(m.z > previous || (m.z - 1.0).abs() < 1e-12);
            assert!(m.z <= 1.0);
            previous = m.z;
        }
        assert!((m.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn transverse_decay_is_monotone_and_approaches_zero() {
        let mut m = Vector3::new(0.0, -1.0, 0.0);
        let mut previous = transverse_magnitude(&m);
        for _ in 0..1000 {
            precess(&mut m, 6.28, 0.05);
            relax_transverse(&mut m, 0.4, 0.05);
            let current = transverse_magnitude(&m);
            assert!(current <= previous);
            previous = current;
        }
        assert!(previous < 1e-6);
    }

    #[test]
    fn ninety_degree_rotation_tips_equilibrium_into_minus_y() {
        let mut m = Vector3::new(0.0, 0.0, 1.0);
        rf_rotate(&mut m, FRAC_PI_2);
        assert!(vec_approx_equal(&m, &Vector3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn one_eighty_degree_rotation_in_small_steps_inverts_equilibrium() {
        let mut m = Vector3::new(0.0, 0.0, 1.0);
        let steps = 6;
        for _ in 0..steps {
            rf_rotate(&mut m, PI / steps as f64);
        }
        assert!(vec_approx_equal(&m, &Vector3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn rf_rotation_leaves_x_component_untouched() {
        let original: Vector3<f64> = Vector3::new(0.5, 0.1, 0.7);
        let mut m = original;
        rf_rotate(&mut m, 1.234);
        assert!((m.x - 0.5).abs() < TOLERANCE);
        assert!((m.norm() - original.norm()).abs() < TOLERANCE);
    }

    #[test]
    fn field_loss_stays_bounded_over_many_ticks() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = Vector3::new(0.0, 0.0, 1.0);
        for _ in 0..10_000 {
            field_loss_step(&mut m, 0.92, 0.06, &mut rng);
            assert!(m.norm() < 2.0);
        }
        // Steady-state amplitude is roughly 0.03 / (1 - 0.92) per axis at worst.
        assert!(m.amax() < 0.375);
    }

    #[test]
    fn field_loss_is_reproducible_for_a_fixed_seed() {
        let mut a = Vector3::new(0.2, 0.2, 0.9);
        let mut b = a;
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            field_loss_step(&mut a, 0.92, 0.06, &mut rng_a);
            field_loss_step(&mut b, 0.92, 0.06, &mut rng_b);
        }
        assert_eq!(a, b);
    }
}
