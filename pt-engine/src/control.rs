pub mod camera;
pub mod controller;

use controller::{keyboard::Keyboard, mouse::Mouse, Controller};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Forward,
    Backward,
    Left,
    Right,
    Yaw(f32),
    Pitch(f32),
    Zoom(f32),
}

/// Input state of the window, fed by window events and drained once per frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputState {
    pub keyboard: Keyboard,
    pub mouse: Mouse,
}

impl InputState {
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) {
        self.keyboard.handle_event(event);
        self.mouse.handle_event(event);
    }

    pub fn handle_device_event(&mut self, event: &winit::event::DeviceEvent) {
        self.keyboard.handle_device_event(event);
        self.mouse.handle_device_event(event);
    }

    /// Fetches the inputs accumulated since the previous call.
    ///
    /// Held movement keys produce one input per call, look and zoom deltas
    /// are consumed.
    pub fn fetch_inputs(&mut self) -> Vec<Input> {
        let mut inputs = self.keyboard.fetch_input();
        inputs.extend(self.mouse.fetch_input());
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::camera::{first_person::FirstPerson, Camera};
    use winit::{
        dpi::PhysicalPosition,
        event::{DeviceEvent, DeviceId, ElementState, WindowEvent},
        keyboard::KeyCode,
    };

    #[test]
    fn movement_keys_are_repeated_every_frame_while_held() {
        let mut input = InputState::default();
        input.keyboard.handle_key(KeyCode::KeyW, ElementState::Pressed);

        assert_eq!(input.fetch_inputs(), vec![Input::Forward]);
        assert_eq!(input.fetch_inputs(), vec![Input::Forward]);
    }

    #[test]
    fn look_deltas_are_consumed_once() {
        let mut input = InputState::default();
        input.mouse.cursor_moved(100.0, 100.0);
        input.mouse.cursor_moved(110.0, 95.0);

        assert_eq!(
            input.fetch_inputs(),
            vec![Input::Yaw(10.0), Input::Pitch(5.0)]
        );
        assert!(input.fetch_inputs().is_empty());
    }

    #[test]
    fn camera_keeps_turning_while_the_cursor_is_held_at_the_border() {
        let mut input = InputState::default();
        let mut camera = FirstPerson::default();
        let border = WindowEvent::CursorMoved {
            // SAFETY: the id is only compared, never handed back to the platform.
            device_id: unsafe { DeviceId::dummy() },
            position: PhysicalPosition::new(511.0, 256.0),
        };
        let yaw = |camera: &FirstPerson| {
            let direction = camera.direction();
            direction.z.atan2(direction.x).to_degrees()
        };

        let mut last_yaw = yaw(&camera);
        for _ in 0..8 {
            for _ in 0..10 {
                input.handle_event(&border);
                input.handle_device_event(&DeviceEvent::MouseMotion { delta: (18.0, 0.0) });
            }
            camera.process_inputs(&input.fetch_inputs(), 0.016);

            let current = yaw(&camera);
            assert!(current > last_yaw + 8.9, "{current} after {last_yaw}");
            last_yaw = current;
        }

        // 8 frames of 9° from -90°
        assert!((last_yaw + 18.0).abs() < 1e-3);
    }
}
