pub mod first_person;

use glam::{DMat4, Vec3};

/// Represents a camera.
///
/// It is expected that all vectors (except for `position`) are normalized.
pub trait Camera {
    /// Returns the direction the camera is facing.
    fn direction(&self) -> Vec3;
    /// Returns the position of the camera.
    fn position(&self) -> Vec3;
    /// Returns the up vector of the camera.
    fn up(&self) -> Vec3;
    /// Returns the right vector of the camera.
    fn right(&self) -> Vec3;
    /// Returns the vertical field of view, in degrees.
    fn zoom(&self) -> f32;

    /// Returns the world-to-view transform, in double precision.
    fn view_matrix(&self) -> DMat4 {
        DMat4::look_to_rh(
            self.position().as_dvec3(),
            self.direction().as_dvec3(),
            self.up().as_dvec3(),
        )
    }

    /// Processes the inputs and updates the camera.
    fn process_inputs(&mut self, inputs: &[super::Input], delta_seconds: f32);
}
