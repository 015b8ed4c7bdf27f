#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
    /// Added to `tex_coords` in the shader. Non-zero only for sliding textures.
    pub uv_offset: [f32; 2],
}

impl SpriteVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
        // position
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(SpriteVertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        },
        // tex_coords
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(SpriteVertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
        // color
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(SpriteVertex, color) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x4,
        },
        // uv_offset
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!(SpriteVertex, uv_offset) as wgpu::BufferAddress,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x2,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
