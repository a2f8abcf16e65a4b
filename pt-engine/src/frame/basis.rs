use glam::{DMat4, DVec3, Vec3};

/// Perspective projection, OpenGL convention (right-handed, clip depth in [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view, in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    #[must_use]
    pub fn matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(
            f64::from(self.fov_y).to_radians(),
            f64::from(self.aspect),
            f64::from(self.near),
            f64::from(self.far),
        )
    }
}

/// World-space directions through the four corners of the viewport,
/// relative to the eye and not normalized.
///
/// `rayXY`: `X` is 0 on the left edge and 1 on the right, `Y` is 0 on the
/// bottom edge and 1 on the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayBasis {
    pub ray00: Vec3,
    pub ray10: Vec3,
    pub ray01: Vec3,
    pub ray11: Vec3,
}

impl RayBasis {
    /// Unprojects the corners of the view volume at clip depth 0.
    ///
    /// The math runs in double precision: the eye sits hundreds of units
    /// away from the origin while the unprojected points lie a few
    /// hundredths of a unit in front of it.
    #[must_use]
    pub fn new(view: DMat4, projection: &Projection, eye: Vec3) -> Self {
        let inverse = (projection.matrix() * view).inverse();
        let eye = eye.as_dvec3();
        let corner = |x: f64, y: f64| {
            (inverse.project_point3(DVec3::new(x, y, 0.0)) - eye).as_vec3()
        };

        Self {
            ray00: corner(-1.0, -1.0),
            ray10: corner(1.0, -1.0),
            ray01: corner(-1.0, 1.0),
            ray11: corner(1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::camera::{first_person::FirstPerson, Camera};

    /// Direction through a point of the viewport, the way the kernel
    /// interpolates it. `u` and `v` go from 0 to 1 left to right and bottom to top.
    fn direction(basis: &RayBasis, u: f32, v: f32) -> Vec3 {
        let bottom = basis.ray00.lerp(basis.ray10, u);
        let top = basis.ray01.lerp(basis.ray11, u);
        bottom.lerp(top, v)
    }

    fn projection() -> Projection {
        Projection {
            fov_y: 45.0,
            aspect: 1.0,
            near: 0.01,
            far: 1000.0,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn corners_project_back_to_ndc() {
        let mut camera = FirstPerson::with_position([3.0, -2.0, 7.0]);
        camera.set_sensitivity(1.0);
        camera.process_inputs(
            &[
                crate::control::Input::Yaw(30.0),
                crate::control::Input::Pitch(-20.0),
            ],
            0.0,
        );
        let projection = Projection {
            aspect: 16.0 / 9.0,
            ..projection()
        };

        let basis = RayBasis::new(camera.view_matrix(), &projection, camera.position());
        let view_projection = projection.matrix() * camera.view_matrix();
        let eye = camera.position().as_dvec3();

        for (ray, (x, y)) in [
            (basis.ray00, (-1.0, -1.0)),
            (basis.ray10, (1.0, -1.0)),
            (basis.ray01, (-1.0, 1.0)),
            (basis.ray11, (1.0, 1.0)),
        ] {
            let ndc = view_projection.project_point3(eye + ray.as_dvec3());
            assert_close(ndc.x, x);
            assert_close(ndc.y, y);
            assert_close(ndc.z, 0.0);
        }
    }

    #[test]
    fn rays_are_symmetric_around_the_view_center() {
        let camera = FirstPerson::with_position([50.0, 52.0, 295.6]);
        let basis = RayBasis::new(camera.view_matrix(), &projection(), camera.position());

        let tolerance = basis.ray00.length() * 1e-4;
        for (a, b) in [(basis.ray00, basis.ray11), (basis.ray10, basis.ray01)] {
            assert!((a.x + b.x).abs() < tolerance);
            assert!((a.y + b.y).abs() < tolerance);
            assert!((a.z - b.z).abs() < tolerance);
        }
        assert!(basis.ray00.x < 0.0 && basis.ray00.y < 0.0);
        assert!(basis.ray11.x > 0.0 && basis.ray11.y > 0.0);
    }

    #[test]
    fn center_ray_follows_camera_direction() {
        let camera = FirstPerson::with_position([50.0, 52.0, 295.6]);
        let basis = RayBasis::new(camera.view_matrix(), &projection(), camera.position());

        let center = direction(&basis, 0.5, 0.5).normalize();
        assert!(center.abs_diff_eq(camera.direction(), 1e-4));
    }

    #[test]
    fn corner_angle_matches_field_of_view() {
        let camera = FirstPerson::default();
        let basis = RayBasis::new(camera.view_matrix(), &projection(), camera.position());

        let bottom = direction(&basis, 0.5, 0.0);
        let top = direction(&basis, 0.5, 1.0);
        let angle = bottom.angle_between(top).to_degrees();
        assert!((angle - 45.0).abs() < 1e-2);
    }
}
