use glam::Vec3;
use vulkano::{buffer::BufferContents, padded::Padded};

use super::basis::RayBasis;

/// Per-frame parameters of the tracing kernel.
///
/// Mirrors the std430 push-constant block of the compute shader:
///
/// ```glsl
/// layout(push_constant) uniform Trace {
///     vec3 ray00;
///     vec3 ray01;
///     vec3 ray10;
///     vec3 ray11;
///     vec3 eye;
///     float time;
/// } trace;
/// ```
#[derive(BufferContents, Clone, Copy, Debug)]
#[repr(C)]
pub struct TraceConstants {
    pub ray00: Padded<[f32; 3], 4>,
    pub ray01: Padded<[f32; 3], 4>,
    pub ray10: Padded<[f32; 3], 4>,
    pub ray11: Padded<[f32; 3], 4>,
    pub eye: [f32; 3],
    /// Seconds since startup.
    pub time: f32,
}

impl TraceConstants {
    #[must_use]
    pub fn new(basis: &RayBasis, eye: Vec3, time: f32) -> Self {
        Self {
            ray00: basis.ray00.to_array().into(),
            ray01: basis.ray01.to_array().into(),
            ray10: basis.ray10.to_array().into(),
            ray11: basis.ray11.to_array().into(),
            eye: eye.to_array(),
            time,
        }
    }
}

/// Local size of the tracing kernel.
///
/// The runtime compiler injects it into the compute source as the
/// `LOCAL_SIZE_X` and `LOCAL_SIZE_Y` macros, and the dispatch is derived
/// from it, so the two always agree. Both dimensions are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGroupSize {
    x: u32,
    y: u32,
}

impl WorkGroupSize {
    pub const DEFAULT: Self = Self { x: 16, y: 16 };

    /// Returns `None` if a dimension is zero.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Option<Self> {
        if x == 0 || y == 0 {
            None
        } else {
            Some(Self { x, y })
        }
    }

    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Number of work groups covering an image, rounding up.
    #[must_use]
    pub const fn count(&self, [width, height]: [u32; 2]) -> [u32; 3] {
        [width.div_ceil(self.x), height.div_ceil(self.y), 1]
    }
}

impl Default for WorkGroupSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_matches_std430_block() {
        assert_eq!(offset_of!(TraceConstants, ray00), 0);
        assert_eq!(offset_of!(TraceConstants, ray01), 16);
        assert_eq!(offset_of!(TraceConstants, ray10), 32);
        assert_eq!(offset_of!(TraceConstants, ray11), 48);
        assert_eq!(offset_of!(TraceConstants, eye), 64);
        assert_eq!(offset_of!(TraceConstants, time), 76);
        assert_eq!(size_of::<TraceConstants>(), 80);
    }

    #[test]
    fn constants_carry_rays_eye_and_time() {
        let basis = RayBasis {
            ray00: Vec3::new(-1.0, -1.0, -2.0),
            ray10: Vec3::new(1.0, -1.0, -2.0),
            ray01: Vec3::new(-1.0, 1.0, -2.0),
            ray11: Vec3::new(1.0, 1.0, -2.0),
        };
        let constants = TraceConstants::new(&basis, Vec3::new(50.0, 52.0, 295.6), 1.5);

        assert_eq!(*constants.ray10, [1.0, -1.0, -2.0]);
        assert_eq!(*constants.ray01, [-1.0, 1.0, -2.0]);
        assert_eq!(constants.eye, [50.0, 52.0, 295.6]);
        assert!((constants.time - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn one_invocation_per_group_dispatches_every_pixel() {
        let size = WorkGroupSize::new(1, 1).unwrap();
        assert_eq!(size.count([512, 512]), [512, 512, 1]);
    }

    #[test]
    fn partial_groups_are_rounded_up() {
        let size = WorkGroupSize::default();
        assert_eq!(size.count([512, 512]), [32, 32, 1]);
        assert_eq!(size.count([1024, 720]), [64, 45, 1]);
        assert_eq!(size.count([500, 17]), [32, 2, 1]);
    }

    #[test]
    fn zero_sized_groups_are_rejected() {
        assert_eq!(WorkGroupSize::new(0, 16), None);
        assert_eq!(WorkGroupSize::new(16, 0), None);
        assert_eq!(WorkGroupSize::new(16, 16), Some(WorkGroupSize::default()));
    }
}
