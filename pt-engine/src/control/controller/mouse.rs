use winit::event::{DeviceEvent, MouseScrollDelta, WindowEvent};

use super::super::Input;

/// Height of a scroll "line" in pixels, used to normalize touchpad scrolling.
const PIXELS_PER_LINE: f32 = 120.0;

#[derive(Copy, Clone, Debug, Default)]
/// Represents the state of the mouse.
///
/// Look deltas come from raw device motion, which keeps flowing when the
/// grabbed cursor is stuck against the window border. Cursor positions are
/// only used on platforms that never report raw motion.
///
/// Movements and wheel scrolling are stacked and can be fetched
/// once per frame.
pub struct Mouse {
    /// Last known cursor position, `None` until the first sample.
    last_position: Option<[f32; 2]>,
    /// Raw motion has been reported at least once.
    raw_motion: bool,
    unfocused: bool,
    look_delta: [f32; 2],
    scroll_delta: f32,
}

impl Mouse {
    /// Registers a raw mouse motion, in device units.
    pub fn moved(&mut self, dx: f32, dy: f32) {
        self.raw_motion = true;
        if self.unfocused {
            return;
        }

        self.look_delta[0] += dx;
        // Reversed since device motion goes from top to bottom
        self.look_delta[1] -= dy;
    }

    /// Registers a new cursor position, in window coordinates.
    ///
    /// The first sample only sets the baseline and yields no movement.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let Some([last_x, last_y]) = self.last_position.replace([x, y]) else {
            return;
        };
        if self.raw_motion {
            return;
        }

        self.look_delta[0] += x - last_x;
        // Reversed since window coordinates go from top to bottom
        self.look_delta[1] += last_y - y;
    }

    /// Registers a vertical wheel movement, in lines.
    pub fn scrolled(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Forgets the last cursor position, so that the next sample is a new baseline.
    pub fn reset_baseline(&mut self) {
        self.last_position = None;
    }
}

impl super::Controller for Mouse {
    fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            #[allow(clippy::cast_possible_truncation)]
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.scrolled(*y),
                #[allow(clippy::cast_possible_truncation)]
                MouseScrollDelta::PixelDelta(position) => {
                    self.scrolled(position.y as f32 / PIXELS_PER_LINE);
                }
            },
            WindowEvent::Focused(focused) => {
                self.unfocused = !focused;
                self.reset_baseline();
            }
            WindowEvent::CursorLeft { .. } => self.reset_baseline(),
            _ => {}
        }
    }

    fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion {
            delta: (delta_x, delta_y),
        } = event
        {
            #[allow(clippy::cast_possible_truncation)]
            self.moved(*delta_x as f32, *delta_y as f32);
        }
    }

    #[must_use]
    fn fetch_input(&mut self) -> Vec<Input> {
        let [yaw, pitch] = core::mem::take(&mut self.look_delta);
        let zoom = core::mem::take(&mut self.scroll_delta);

        let mut inputs = Vec::with_capacity(3);
        if yaw != 0.0 {
            inputs.push(Input::Yaw(yaw));
        }
        if pitch != 0.0 {
            inputs.push(Input::Pitch(pitch));
        }
        if zoom != 0.0 {
            inputs.push(Input::Zoom(zoom));
        }

        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::super::Controller;
    use super::*;
    use winit::{
        dpi::PhysicalPosition,
        event::{DeviceId, TouchPhase},
    };

    fn device_id() -> DeviceId {
        // SAFETY: the id is only compared, never handed back to the platform.
        unsafe { DeviceId::dummy() }
    }

    fn cursor_at(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device_id(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn motion(dx: f64, dy: f64) -> DeviceEvent {
        DeviceEvent::MouseMotion { delta: (dx, dy) }
    }

    #[test]
    fn first_sample_sets_baseline() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(400.0, 300.0);

        assert!(mouse.fetch_input().is_empty());
    }

    #[test]
    fn deltas_accumulate_between_fetches() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(0.0, 0.0);
        mouse.cursor_moved(3.0, -2.0);
        mouse.cursor_moved(5.0, -4.0);

        assert_eq!(mouse.fetch_input(), vec![Input::Yaw(5.0), Input::Pitch(4.0)]);
    }

    #[test]
    fn baseline_reset_prevents_jump() {
        let mut mouse = Mouse::default();
        mouse.cursor_moved(10.0, 10.0);
        mouse.reset_baseline();
        mouse.cursor_moved(500.0, 500.0);

        assert!(mouse.fetch_input().is_empty());
    }

    #[test]
    fn scroll_is_consumed() {
        let mut mouse = Mouse::default();
        mouse.scrolled(1.0);
        mouse.scrolled(0.5);

        assert_eq!(mouse.fetch_input(), vec![Input::Zoom(1.5)]);
        assert!(mouse.fetch_input().is_empty());
    }

    #[test]
    fn raw_motion_is_not_bounded_by_the_cursor() {
        let mut mouse = Mouse::default();
        mouse.handle_event(&cursor_at(511.0, 256.0));

        for _ in 0..100 {
            // The confined cursor stays on the border
            mouse.handle_event(&cursor_at(511.0, 256.0));
            mouse.handle_device_event(&motion(10.0, -2.0));
        }

        assert_eq!(
            mouse.fetch_input(),
            vec![Input::Yaw(1000.0), Input::Pitch(200.0)]
        );
    }

    #[test]
    fn cursor_positions_are_ignored_once_raw_motion_is_reported() {
        let mut mouse = Mouse::default();
        mouse.handle_device_event(&motion(4.0, 0.0));
        mouse.handle_event(&cursor_at(100.0, 100.0));
        mouse.handle_event(&cursor_at(104.0, 100.0));

        assert_eq!(mouse.fetch_input(), vec![Input::Yaw(4.0)]);
    }

    #[test]
    fn raw_motion_is_ignored_while_unfocused() {
        let mut mouse = Mouse::default();
        mouse.handle_event(&WindowEvent::Focused(false));
        mouse.handle_device_event(&motion(30.0, 30.0));
        assert!(mouse.fetch_input().is_empty());

        mouse.handle_event(&WindowEvent::Focused(true));
        mouse.handle_device_event(&motion(3.0, 0.0));
        assert_eq!(mouse.fetch_input(), vec![Input::Yaw(3.0)]);
    }

    #[test]
    fn pixel_scroll_is_converted_to_lines() {
        let mut mouse = Mouse::default();
        mouse.handle_event(&WindowEvent::MouseWheel {
            device_id: device_id(),
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 240.0)),
            phase: TouchPhase::Moved,
        });
        mouse.handle_event(&WindowEvent::MouseWheel {
            device_id: device_id(),
            delta: MouseScrollDelta::LineDelta(0.0, -0.5),
            phase: TouchPhase::Moved,
        });

        assert_eq!(mouse.fetch_input(), vec![Input::Zoom(1.5)]);
    }

    #[test]
    fn leaving_the_window_resets_the_baseline() {
        let mut mouse = Mouse::default();
        mouse.handle_event(&cursor_at(10.0, 10.0));
        mouse.handle_event(&WindowEvent::CursorLeft {
            device_id: device_id(),
        });
        mouse.handle_event(&cursor_at(300.0, 400.0));

        assert!(mouse.fetch_input().is_empty());
    }

    #[test]
    fn focus_loss_resets_the_baseline() {
        let mut mouse = Mouse::default();
        mouse.handle_event(&cursor_at(10.0, 10.0));
        mouse.handle_event(&WindowEvent::Focused(false));
        mouse.handle_event(&WindowEvent::Focused(true));
        mouse.handle_event(&cursor_at(300.0, 400.0));

        assert!(mouse.fetch_input().is_empty());
    }
}
