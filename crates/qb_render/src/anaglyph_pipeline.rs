use crate::sprite_pipeline::{camera_bind_group_layout, create_pipeline, texture_bind_group_layout};
use crate::texture::Texture;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AnaglyphUniform {
    pub formula: u32,
    pub _pad: [u32; 3],
}

impl AnaglyphUniform {
    pub fn new(formula: u32) -> Self {
        Self {
            formula,
            _pad: [0; 3],
        }
    }
}

/// Combines a left and a right eye image into one red/cyan frame.
pub struct AnaglyphPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub pair_bind_group_layout: wgpu::BindGroupLayout,
    pub formula_bind_group_layout: wgpu::BindGroupLayout,
}

impl AnaglyphPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Anaglyph Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/anaglyph.wgsl").into()),
        });

        let camera_layout = camera_bind_group_layout(device);
        let pair_bind_group_layout = texture_bind_group_layout(device, "Anaglyph Pair Layout", 2);
        let formula_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Anaglyph Formula Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Anaglyph Pipeline Layout"),
            bind_group_layouts: &[
                &camera_layout,
                &pair_bind_group_layout,
                &formula_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let render_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::TriangleList,
            "Anaglyph Pipeline",
        );

        Self {
            render_pipeline,
            pair_bind_group_layout,
            formula_bind_group_layout,
        }
    }

    pub fn create_pair_bind_group(
        &self,
        device: &wgpu::Device,
        left: &Texture,
        right: &Texture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Anaglyph Pair Bind Group"),
            layout: &self.pair_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&left.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&left.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&right.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&right.sampler),
                },
            ],
        })
    }

    pub fn create_formula_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Anaglyph Formula Bind Group"),
            layout: &self.formula_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}
