//! Host side of a frame: timing, camera update and the parameters pushed
//! to the tracing kernel.

mod basis;
mod clock;
mod constants;

pub use basis::{Projection, RayBasis};
pub use clock::{FrameClock, FrameTime};
pub use constants::{TraceConstants, WorkGroupSize};

use crate::control::{camera::Camera, InputState};

/// Near and far distances of the view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self {
            near: 0.01,
            far: 1000.0,
        }
    }
}

/// Applies the inputs gathered since the previous frame to the camera,
/// then computes the constants of the tracing dispatch.
pub fn prepare(
    input: &mut InputState,
    camera: &mut dyn Camera,
    planes: ClipPlanes,
    aspect: f32,
    time: &FrameTime,
) -> TraceConstants {
    let inputs = input.fetch_inputs();
    camera.process_inputs(&inputs, time.delta);

    let projection = Projection {
        fov_y: camera.zoom(),
        aspect,
        near: planes.near,
        far: planes.far,
    };
    let eye = camera.position();
    let basis = RayBasis::new(camera.view_matrix(), &projection, eye);

    TraceConstants::new(&basis, eye, time.elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::camera::first_person::FirstPerson;
    use glam::Vec3;
    use winit::{event::ElementState, keyboard::KeyCode};

    const TIME: FrameTime = FrameTime {
        delta: 0.5,
        raw_delta: 0.5,
        elapsed: 3.0,
        frame_index: 7,
    };

    #[test]
    fn held_keys_move_the_eye_before_rays_are_built() {
        let mut input = InputState::default();
        input.keyboard.handle_key(KeyCode::KeyW, ElementState::Pressed);
        let mut camera = FirstPerson::with_position([50.0, 52.0, 295.6]);
        camera.set_speed(2.0);

        let constants = prepare(&mut input, &mut camera, ClipPlanes::default(), 1.0, &TIME);

        let eye = Vec3::from(constants.eye);
        assert!(eye.abs_diff_eq(Vec3::new(50.0, 52.0, 294.6), 1e-4));
        assert!((constants.time - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn idle_frame_keeps_the_camera_still() {
        let mut input = InputState::default();
        let mut camera = FirstPerson::with_position([50.0, 52.0, 295.6]);

        let first = prepare(&mut input, &mut camera, ClipPlanes::default(), 1.0, &TIME);
        let second = prepare(&mut input, &mut camera, ClipPlanes::default(), 1.0, &TIME);

        assert_eq!(first.eye, second.eye);
        assert_eq!(*first.ray00, *second.ray00);
        assert_eq!(*first.ray11, *second.ray11);
    }

    #[test]
    fn scrolling_narrows_the_ray_fan() {
        let mut input = InputState::default();
        let mut camera = FirstPerson::default();
        let wide = prepare(&mut input, &mut camera, ClipPlanes::default(), 1.0, &TIME);

        input.mouse.scrolled(20.0);
        let narrow = prepare(&mut input, &mut camera, ClipPlanes::default(), 1.0, &TIME);

        let spread = |c: &TraceConstants| {
            Vec3::from(*c.ray00).angle_between(Vec3::from(*c.ray11))
        };
        assert!(spread(&narrow) < spread(&wide));
    }
}
