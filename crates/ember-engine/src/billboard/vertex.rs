use bytemuck::{Pod, Zeroable};

/// Two triangles per billboard, no index buffer.
pub const VERTICES_PER_BILLBOARD: usize = 6;

/// Texture coordinates for the six vertices of one quad.
///
/// Triangle 1: top-left, bottom-left, top-right.
/// Triangle 2: top-right, bottom-left, bottom-right.
/// `v` grows upward; the shader flips it for wgpu's top-left texture origin.
pub const QUAD_UVS: [[f32; 2]; VERTICES_PER_BILLBOARD] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
];

/// Vertex layout (48 bytes):
///
///  offset  0  position  [f32; 3]   loc 0
///  offset 12  normal    [f32; 3]   loc 1
///  offset 24  color     [f32; 4]   loc 2
///  offset 40  uv        [f32; 2]   loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BillboardVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl BillboardVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x4, // color
        3 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Default vertex for slot `index` of a freshly allocated batch buffer:
    /// opaque white, `+Z` normal, the quad UV for its corner.
    #[inline]
    pub(super) fn blank(index: usize) -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            color: [1.0; 4],
            uv: QUAD_UVS[index % VERTICES_PER_BILLBOARD],
        }
    }
}
