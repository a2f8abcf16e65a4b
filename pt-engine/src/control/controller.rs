//! This module contains the trait used to handle the different input sources.
//!
//! To implement a controller, create a struct with internal state and
//! implement the `Controller` trait for it, then register it in
//! [`InputState`](super::InputState) so that the event loop feeds it.

pub mod keyboard;
pub mod mouse;

/// Represents a controller.
///
/// A controller is responsible for handling window events and
/// is drained once per frame into camera inputs.
pub trait Controller {
    /// Handle an event, usually by filtering by event type and
    /// updating the controller's state accordingly.
    fn handle_event(&mut self, event: &winit::event::WindowEvent);

    /// Handle a raw device event. Most controllers only care about window events.
    fn handle_device_event(&mut self, _event: &winit::event::DeviceEvent) {}

    /// Fetch the inputs from the controller's state.
    fn fetch_input(&mut self) -> Vec<super::Input>;
}
