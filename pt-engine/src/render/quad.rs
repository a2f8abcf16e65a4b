use std::sync::Arc;

use vulkano::{
    buffer::{BufferContents, BufferUsage, Subbuffer},
    command_buffer::{
        allocator::CommandBufferAllocator, AutoCommandBufferBuilder, PrimaryAutoCommandBuffer,
    },
    device::Queue,
    memory::allocator::MemoryAllocator,
    pipeline::graphics::{
        input_assembly::PrimitiveTopology,
        vertex_input::{Vertex, VertexBufferDescription},
    },
};

#[derive(BufferContents, Vertex, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct QuadVertex {
    #[format(R32G32B32_SFLOAT)]
    pub position: [f32; 3],
    #[format(R32G32_SFLOAT)]
    pub tex_coords: [f32; 2],
}

/// Full-screen quad as a triangle strip, texture origin at the bottom left.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coords: [0.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coords: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        tex_coords: [1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        tex_coords: [1.0, 0.0],
    },
];

/// Device-local vertex buffer of the quad the traced image is drawn on.
pub struct ScreenQuad {
    vertices: Subbuffer<[QuadVertex]>,
}

impl ScreenQuad {
    pub const TOPOLOGY: PrimitiveTopology = PrimitiveTopology::TriangleStrip;

    /// Uploads the quad and waits for the transfer to complete.
    pub fn new(
        memory_allocator: &Arc<dyn MemoryAllocator>,
        command_buffer_allocator: &Arc<dyn CommandBufferAllocator>,
        queue: &Arc<Queue>,
    ) -> crate::Result<Self> {
        let (vertices, future) = crate::buffer::send_to_device(
            memory_allocator,
            command_buffer_allocator,
            queue,
            BufferUsage::VERTEX_BUFFER,
            QUAD_VERTICES,
        )?;
        future.wait(None)?;

        tracing::trace!("Screen quad uploaded");

        Ok(Self { vertices })
    }

    #[must_use]
    pub fn description() -> VertexBufferDescription {
        QuadVertex::per_vertex()
    }

    pub fn draw(
        &self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    ) -> crate::Result<()> {
        #[allow(clippy::cast_possible_truncation)]
        let vertex_count = self.vertices.len() as u32;

        builder.bind_vertex_buffers(0, self.vertices.clone())?;
        // SAFETY: the vertex shader only reads the bound vertices.
        unsafe { builder.draw(vertex_count, 1, 0, 0) }?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_clip_space() {
        for vertex in QUAD_VERTICES {
            let [x, y, z] = vertex.position;
            assert_eq!(x.abs(), 1.0);
            assert_eq!(y.abs(), 1.0);
            assert_eq!(z, 0.0);
        }

        let corners: Vec<_> = QUAD_VERTICES
            .iter()
            .map(|vertex| [vertex.position[0], vertex.position[1]])
            .collect();
        for corner in [[-1.0, -1.0], [-1.0, 1.0], [1.0, -1.0], [1.0, 1.0]] {
            assert!(corners.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn texture_coordinates_follow_positions() {
        for QuadVertex {
            position: [x, y, _],
            tex_coords: [u, v],
        } in QUAD_VERTICES
        {
            assert_eq!(u, (x + 1.0) / 2.0);
            assert_eq!(v, (y + 1.0) / 2.0);
        }
    }

    #[test]
    fn strip_triangles_share_the_diagonal() {
        // Consecutive triangles (0, 1, 2) and (1, 2, 3) of the strip
        let [a, b, c, d] = QUAD_VERTICES.map(|vertex| vertex.position);
        assert_eq!([b, c], [[-1.0, -1.0, 0.0], [1.0, 1.0, 0.0]]);
        assert_ne!(a, d);
    }
}
