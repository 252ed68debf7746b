use nalgebra::{Point3, Rotation3, Unit, UnitQuaternion, Vector3};
use std::f64::consts::{PI, TAU};

/// Squared length below which a vector has no usable direction.
pub const DIRECTION_EPSILON_SQ: f64 = 1e-6;
/// Shortest arrow drawn for a spin; net vectors at or below this length are hidden.
pub const MIN_ARROW_LENGTH: f64 = 0.001;

/// Placement of a unit-length, +Y-aligned arrow mesh scaled along its own axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowTransform {
    /// Midpoint of the arrow shaft.
    pub center: Point3<f64>,
    /// Rotation taking +Y onto the arrow direction.
    pub rotation: UnitQuaternion<f64>,
    /// Scale applied along the arrow axis.
    pub length: f64,
}

impl ArrowTransform {
    pub fn direction(&self) -> Vector3<f64> {
        self.rotation * Vector3::y()
    }

    pub fn tip(&self) -> Point3<f64> {
        self.center + self.direction() * (self.length * 0.5)
    }
}

/// Unit direction of `v`, falling back to +Y for degenerate vectors.
pub fn display_direction(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    if v.norm_squared() < DIRECTION_EPSILON_SQ {
        Vector3::y_axis()
    } else {
        Unit::new_normalize(*v)
    }
}

/// Shortest rotation taking `from` onto `to`; a half turn about a perpendicular axis when
/// the two are antiparallel.
pub fn rotation_to_align(
    from: &Unit<Vector3<f64>>,
    to: &Unit<Vector3<f64>>,
) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between_axis(from, to).unwrap_or_else(|| {
        let helper = if from.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let axis = Unit::new_normalize(from.cross(&helper));
        UnitQuaternion::from_axis_angle(&axis, PI)
    })
}

/// Arrow for an individual spin anchored at `position`.
pub fn spin_arrow(position: &Point3<f64>, magnetization: &Vector3<f64>) -> ArrowTransform {
    let length = magnetization.norm().max(MIN_ARROW_LENGTH);
    let direction = display_direction(magnetization);
    ArrowTransform {
        center: position + direction.into_inner() * (length * 0.5),
        rotation: rotation_to_align(&Vector3::y_axis(), &direction),
        length,
    }
}

/// Arrow for a net magnetization vector drawn from the origin, or `None` when it is too
/// short to have a meaningful direction.
pub fn net_vector_arrow(vector: &Vector3<f64>) -> Option<ArrowTransform> {
    let length = vector.norm();
    if length <= MIN_ARROW_LENGTH {
        return None;
    }
    let direction = Unit::new_normalize(*vector);
    Some(ArrowTransform {
        center: Point3::origin() + direction.into_inner() * (length * 0.5),
        rotation: rotation_to_align(&Vector3::y_axis(), &direction),
        length,
    })
}

/// Expresses a lab-frame vector in a frame rotating about +Z at `freq` cycles per second,
/// `elapsed` seconds after the frames coincided.
pub fn to_rotating_frame(v: &Vector3<f64>, elapsed: f64, freq: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -TAU * freq * elapsed) * v
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn vec_approx_equal(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
        (a - b).norm() < TOLERANCE
    }

    #[test]
    fn degenerate_vector_points_along_plus_y() {
        let dir = display_direction(&Vector3::new(1e-4, 0.0, 0.0));
        assert_eq!(dir.into_inner(), Vector3::y());
    }

    #[test]
    fn regular_vector_is_normalized() {
        let dir = display_direction(&Vector3::new(0.0, 0.0, 2.0));
        assert!(vec_approx_equal(&dir.into_inner(), &Vector3::z()));
    }

    #[test]
    fn rotation_to_align_handles_antiparallel_vectors() {
        let from = Vector3::y_axis();
        let to = Unit::new_normalize(-Vector3::y());
        let rot = rotation_to_align(&from, &to);
        assert!(vec_approx_equal(&(rot * from.into_inner()), &to.into_inner()));
    }

    #[test]
    fn spin_arrow_is_centred_halfway_along_magnetization() {
        let position = Point3::new(0.35, 0.0, 0.0);
        let arrow = spin_arrow(&position, &Vector3::new(0.0, 0.0, 1.0));
        assert!((arrow.length - 1.0).abs() < TOLERANCE);
        assert!(vec_approx_equal(&arrow.direction(), &Vector3::z()));
        assert!((arrow.center - Point3::new(0.35, 0.0, 0.5)).norm() < TOLERANCE);
        assert!((arrow.tip() - Point3::new(0.35, 0.0, 1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn collapsed_spin_gets_minimum_length_along_plus_y() {
        let arrow = spin_arrow(&Point3::origin(), &Vector3::zeros());
        assert_eq!(arrow.length, MIN_ARROW_LENGTH);
        assert!(vec_approx_equal(&arrow.direction(), &Vector3::y()));
    }

    #[test]
    fn net_vector_arrow_is_hidden_when_too_short() {
        assert!(net_vector_arrow(&Vector3::new(0.0, 0.0005, 0.0)).is_none());
        let arrow = net_vector_arrow(&Vector3::new(0.0, -0.5, 0.0)).unwrap();
        assert!(vec_approx_equal(&arrow.direction(), &-Vector3::y()));
        assert!((arrow.length - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn rotating_frame_cancels_precession_at_frame_frequency() {
        let elapsed = 0.37;
        let freq = 0.965;
        let angle = TAU * freq * elapsed;
        let lab = Vector3::new(angle.cos(), angle.sin(), 0.2);
        let rotating = to_rotating_frame(&lab, elapsed, freq);
        assert!(vec_approx_equal(&rotating, &Vector3::new(1.0, 0.0, 0.2)));
    }
}
