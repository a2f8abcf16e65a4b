use glam::Vec3;

use super::super::Input;

#[derive(Copy, Clone, Debug)]
/// Represents a first person camera.
///
/// Angles are stored in degrees. A yaw of -90° looks down the -Z axis.
pub struct FirstPerson {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    sensitivity: f32,
    zoom: f32,
}

impl FirstPerson {
    pub const DEFAULT_YAW: f32 = -90.0;
    pub const DEFAULT_PITCH: f32 = 0.0;
    pub const DEFAULT_SPEED: f32 = 30.0;
    pub const DEFAULT_SENSITIVITY: f32 = 0.05;
    pub const DEFAULT_ZOOM: f32 = 45.0;

    pub const MAX_PITCH: f32 = 89.0;
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 45.0;

    #[must_use]
    pub fn with_position(position: impl Into<Vec3>) -> Self {
        let mut camera = Self {
            position: position.into(),
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: Self::DEFAULT_YAW,
            pitch: Self::DEFAULT_PITCH,
            speed: Self::DEFAULT_SPEED,
            sensitivity: Self::DEFAULT_SENSITIVITY,
            zoom: Self::DEFAULT_ZOOM,
        };
        camera.update_vectors();
        camera
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    /// Sets the movement speed, in world units per second.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());

        self.direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.direction.cross(self.world_up).normalize();
        self.up = self.right.cross(self.direction).normalize();
    }
}

impl Default for FirstPerson {
    fn default() -> Self {
        Self::with_position(Vec3::ZERO)
    }
}

impl super::Camera for FirstPerson {
    fn direction(&self) -> Vec3 {
        self.direction
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn process_inputs(&mut self, inputs: &[Input], delta_seconds: f32) {
        let relative_speed = self.speed * delta_seconds;

        for input in inputs {
            match input {
                Input::Forward => self.position += self.direction * relative_speed,
                Input::Backward => self.position -= self.direction * relative_speed,
                Input::Left => self.position -= self.right * relative_speed,
                Input::Right => self.position += self.right * relative_speed,
                Input::Yaw(value) => {
                    self.yaw += value * self.sensitivity;
                }
                Input::Pitch(value) => {
                    // Past ±90° the view flips over
                    self.pitch = value
                        .mul_add(self.sensitivity, self.pitch)
                        .clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
                }
                Input::Zoom(value) => {
                    self.zoom = (self.zoom - value).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
                }
            }
        }

        self.update_vectors();
    }
}

#[cfg(test)]
mod tests {
    use super::super::Camera;
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn default_looks_down_negative_z() {
        let camera = FirstPerson::default();

        assert!(camera.direction().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right().abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));
    }

    #[test]
    fn forward_moves_along_direction() {
        let mut camera = FirstPerson::with_position([1.0, 2.0, 3.0]);
        camera.set_speed(2.0);
        camera.process_inputs(&[Input::Forward], 0.5);

        assert!(camera.position().abs_diff_eq(Vec3::new(1.0, 2.0, 2.0), EPSILON));
    }

    #[test]
    fn backward_cancels_forward() {
        let mut camera = FirstPerson::with_position([1.0, 2.0, 3.0]);
        camera.process_inputs(&[Input::Forward, Input::Backward], 0.1);

        assert!(camera.position().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), EPSILON));
    }

    #[test]
    fn diagonal_movement_is_not_normalized() {
        let delta = 0.25;

        let mut straight = FirstPerson::default();
        straight.process_inputs(&[Input::Forward], delta);
        let mut strafe = FirstPerson::default();
        strafe.process_inputs(&[Input::Right], delta);
        let mut diagonal = FirstPerson::default();
        diagonal.process_inputs(&[Input::Forward, Input::Right], delta);

        let expected = straight.position() + strafe.position();
        assert!(diagonal.position().abs_diff_eq(expected, EPSILON));
        assert!(
            (diagonal.position().length()
                - std::f32::consts::SQRT_2 * straight.position().length())
            .abs()
                < 1e-4
        );
    }

    #[test]
    fn no_input_no_movement() {
        let mut camera = FirstPerson::with_position([50.0, 52.0, 295.6]);
        camera.process_inputs(&[], 1.0);

        assert_eq!(camera.position(), Vec3::new(50.0, 52.0, 295.6));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = FirstPerson::default();
        for _ in 0..1000 {
            camera.process_inputs(&[Input::Pitch(100.0)], 0.016);
        }

        assert!((camera.pitch - FirstPerson::MAX_PITCH).abs() < EPSILON);
        assert!((camera.direction().y - 89f32.to_radians().sin()).abs() < EPSILON);
        assert!(camera.up().y > 0.0);

        for _ in 0..1000 {
            camera.process_inputs(&[Input::Pitch(-100.0)], 0.016);
        }

        assert!((camera.pitch + FirstPerson::MAX_PITCH).abs() < EPSILON);
        assert!(camera.up().y > 0.0);
    }

    #[test]
    fn yaw_turns_right() {
        let mut camera = FirstPerson::default();
        camera.set_sensitivity(1.0);
        camera.process_inputs(&[Input::Yaw(90.0)], 0.016);

        assert!(camera.direction().abs_diff_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = FirstPerson::default();
        camera.process_inputs(&[Input::Zoom(10.0)], 0.016);
        assert!((camera.zoom() - 35.0).abs() < EPSILON);

        camera.process_inputs(&[Input::Zoom(100.0)], 0.016);
        assert!((camera.zoom() - FirstPerson::MIN_ZOOM).abs() < EPSILON);

        camera.process_inputs(&[Input::Zoom(-100.0)], 0.016);
        assert!((camera.zoom() - FirstPerson::MAX_ZOOM).abs() < EPSILON);
    }
}
