use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::super::Input;

#[derive(Copy, Clone, Debug, Default)]
/// Represents the held movement keys of a keyboard.
pub struct Keyboard(u8);

impl Keyboard {
    const FORWARD: u8 = 1 << 0;
    const LEFT: u8 = 1 << 1;
    const RIGHT: u8 = 1 << 2;
    const BACKWARD: u8 = 1 << 3;

    /// Updates the state of a key.
    ///
    /// Keys are matched by physical position, so the bindings stay on WASD
    /// whatever the keyboard layout.
    pub fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        let mask = match code {
            KeyCode::KeyW => Self::FORWARD,
            KeyCode::KeyA => Self::LEFT,
            KeyCode::KeyS => Self::BACKWARD,
            KeyCode::KeyD => Self::RIGHT,
            _ => return,
        };

        match state {
            ElementState::Pressed => self.0 |= mask,
            ElementState::Released => self.0 &= !mask,
        }
    }

    /// Releases every key.
    pub fn release_all(&mut self) {
        self.0 = 0;
    }

    #[must_use]
    pub const fn forward_pressed(self) -> bool {
        self.0 & Self::FORWARD == Self::FORWARD
    }

    #[must_use]
    pub const fn left_pressed(self) -> bool {
        self.0 & Self::LEFT == Self::LEFT
    }

    #[must_use]
    pub const fn right_pressed(self) -> bool {
        self.0 & Self::RIGHT == Self::RIGHT
    }

    #[must_use]
    pub const fn backward_pressed(self) -> bool {
        self.0 & Self::BACKWARD == Self::BACKWARD
    }
}

impl super::Controller for Keyboard {
    fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*code, *state),
            // Release events are lost while unfocused.
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    #[must_use]
    fn fetch_input(&mut self) -> Vec<Input> {
        [
            (self.forward_pressed(), Input::Forward),
            (self.backward_pressed(), Input::Backward),
            (self.left_pressed(), Input::Left),
            (self.right_pressed(), Input::Right),
        ]
        .into_iter()
        .filter_map(|(pressed, input)| pressed.then_some(input))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Controller;
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keyboard = Keyboard::default();
        keyboard.handle_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(keyboard.forward_pressed());

        keyboard.handle_key(KeyCode::KeyW, ElementState::Released);
        assert!(!keyboard.forward_pressed());
        assert!(keyboard.fetch_input().is_empty());
    }

    #[test]
    fn repeated_press_is_idempotent() {
        let mut keyboard = Keyboard::default();
        keyboard.handle_key(KeyCode::KeyD, ElementState::Pressed);
        keyboard.handle_key(KeyCode::KeyD, ElementState::Pressed);
        keyboard.handle_key(KeyCode::KeyD, ElementState::Released);

        assert!(!keyboard.right_pressed());
    }

    #[test]
    fn keys_combine() {
        let mut keyboard = Keyboard::default();
        keyboard.handle_key(KeyCode::KeyW, ElementState::Pressed);
        keyboard.handle_key(KeyCode::KeyA, ElementState::Pressed);

        assert_eq!(keyboard.fetch_input(), vec![Input::Forward, Input::Left]);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut keyboard = Keyboard::default();
        keyboard.handle_key(KeyCode::KeyQ, ElementState::Pressed);
        keyboard.handle_key(KeyCode::Space, ElementState::Pressed);

        assert!(keyboard.fetch_input().is_empty());
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut keyboard = Keyboard::default();
        keyboard.handle_key(KeyCode::KeyS, ElementState::Pressed);
        keyboard.handle_event(&WindowEvent::Focused(false));

        assert!(keyboard.fetch_input().is_empty());
    }
}
