//! GPU side of the sprite batch: texture registry, growable buffers and the
//! render pass draw loop.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::anaglyph_pipeline::{AnaglyphPipeline, AnaglyphUniform};
use crate::batch::{count_texture_binds, Material, SpriteBatch};
use crate::camera::Camera2D;
use crate::gpu_context::GpuContext;
use crate::sprite_pipeline::SpritePipeline;
use crate::texture::{Texture, TextureOptions};
use crate::vertex::SpriteVertex;

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub quad_count: u32,
}

pub struct SpriteRenderer {
    sprite_pipeline: SpritePipeline,
    anaglyph_pipeline: AnaglyphPipeline,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,
    anaglyph_pairs: HashMap<(Arc<str>, Arc<str>), wgpu::BindGroup>,

    // The batch is rebuilt on the CPU each frame, then streamed into these
    // buffers. Buffers grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    formula_buffer: wgpu::Buffer,
    formula_bind_group: wgpu::BindGroup,
    stats: RenderStats,
}

impl SpriteRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let anaglyph_pipeline = AnaglyphPipeline::new(&gpu.device, gpu.surface_format);

        let camera_uniform = Camera2D::ndc().build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let formula_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Anaglyph Formula Buffer"),
                contents: bytemuck::cast_slice(&[AnaglyphUniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let formula_bind_group =
            anaglyph_pipeline.create_formula_bind_group(&gpu.device, &formula_buffer);

        Self {
            sprite_pipeline,
            anaglyph_pipeline,
            textures: HashMap::new(),
            anaglyph_pairs: HashMap::new(),
            vertex_buffer: create_vertex_buffer(&gpu.device, 1),
            index_buffer: create_index_buffer(&gpu.device, 1),
            vertex_capacity: 1,
            index_capacity: 1,
            camera_buffer,
            camera_bind_group,
            formula_buffer,
            formula_bind_group,
            stats: RenderStats::default(),
        }
    }

    /// Read and decode an image file into the texture registry under `key`.
    pub fn load_texture(
        &mut self,
        gpu: &GpuContext,
        key: &str,
        path: &Path,
        options: TextureOptions,
    ) -> Result<(), String> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read texture '{}': {e}", path.display()))?;
        let texture = Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, key, options)?;
        log::info!(
            "Loaded texture '{}' ({}x{}) from {}",
            key,
            texture.size.0,
            texture.size.1,
            path.display()
        );
        self.insert_texture(gpu, key, texture);
        Ok(())
    }

    pub fn insert_rgba8(
        &mut self,
        gpu: &GpuContext,
        key: &str,
        rgba: &[u8],
        size: (u32, u32),
        options: TextureOptions,
    ) {
        let texture = Texture::from_rgba8(&gpu.device, &gpu.queue, rgba, size.0, size.1, key, options);
        self.insert_texture(gpu, key, texture);
    }

    fn insert_texture(&mut self, gpu: &GpuContext, key: &str, texture: Texture) {
        let bind_group = self
            .sprite_pipeline
            .create_texture_bind_group(&gpu.device, &texture);
        // Pair bind groups hold views of the old texture.
        self.anaglyph_pairs
            .retain(|(l, r), _| &**l != key && &**r != key);
        self.textures.insert(
            Arc::from(key),
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
    }

    pub fn has_texture(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn estimate_memory_mb(&self) -> f32 {
        let mut bytes: usize = self.textures.values().map(|t| t.texture.byte_size()).sum();
        bytes += self.vertex_capacity * std::mem::size_of::<SpriteVertex>();
        bytes += self.index_capacity * std::mem::size_of::<u32>();
        bytes as f32 / (1024.0 * 1024.0)
    }

    /// Upload this frame's batch, camera and anaglyph formula.
    pub fn prepare(&mut self, gpu: &GpuContext, batch: &SpriteBatch, camera: &Camera2D) {
        self.ensure_capacity(gpu, batch.vertices.len(), batch.indices.len());
        if !batch.vertices.is_empty() {
            gpu.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&batch.vertices));
        }
        if !batch.indices.is_empty() {
            gpu.queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&batch.indices));
        }
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.build_uniform()]),
        );
        gpu.queue.write_buffer(
            &self.formula_buffer,
            0,
            bytemuck::cast_slice(&[AnaglyphUniform::new(batch.anaglyph_formula)]),
        );

        for call in &batch.draw_calls {
            if let Material::Anaglyph { left, right } = &call.material {
                self.ensure_anaglyph_pair(gpu, left, right);
            }
        }

        self.stats = RenderStats {
            draw_calls: batch.draw_calls.len() as u32,
            texture_binds: count_texture_binds(&batch.draw_calls) as u32,
            quad_count: batch.quad_count() as u32,
        };
    }

    fn ensure_anaglyph_pair(&mut self, gpu: &GpuContext, left: &Arc<str>, right: &Arc<str>) {
        let pair = (left.clone(), right.clone());
        if self.anaglyph_pairs.contains_key(&pair) {
            return;
        }
        let (Some(l), Some(r)) = (self.textures.get(left), self.textures.get(right)) else {
            log::warn!("Anaglyph pair '{left}'/'{right}' is missing a texture");
            return;
        };
        let bind_group =
            self.anaglyph_pipeline
                .create_pair_bind_group(&gpu.device, &l.texture, &r.texture);
        self.anaglyph_pairs.insert(pair, bind_group);
    }

    fn ensure_capacity(&mut self, gpu: &GpuContext, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.vertex_capacity {
            self.vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&gpu.device, self.vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.index_capacity {
            self.index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&gpu.device, self.index_capacity);
        }
    }

    /// Issue the batch's draw calls. Pipelines and bind groups are only
    /// switched when the material changes.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, batch: &SpriteBatch) {
        if batch.draw_calls.is_empty() {
            return;
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        let mut last_material: Option<&Material> = None;
        for draw in &batch.draw_calls {
            if last_material != Some(&draw.material) {
                let bound = match &draw.material {
                    Material::Sprite(key) | Material::Lines(key) => {
                        match self.textures.get(key) {
                            Some(texture) => {
                                let pipeline = if matches!(draw.material, Material::Lines(_)) {
                                    &self.sprite_pipeline.line_pipeline
                                } else {
                                    &self.sprite_pipeline.render_pipeline
                                };
                                render_pass.set_pipeline(pipeline);
                                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                                true
                            }
                            None => false,
                        }
                    }
                    Material::Anaglyph { left, right } => {
                        match self.anaglyph_pairs.get(&(left.clone(), right.clone())) {
                            Some(pair) => {
                                render_pass.set_pipeline(&self.anaglyph_pipeline.render_pipeline);
                                render_pass.set_bind_group(1, pair, &[]);
                                render_pass.set_bind_group(2, &self.formula_bind_group, &[]);
                                true
                            }
                            None => false,
                        }
                    }
                };
                if !bound {
                    last_material = None;
                    continue;
                }
                last_material = Some(&draw.material);
            }
            render_pass.draw_indexed(
                draw.index_start..(draw.index_start + draw.index_count),
                0,
                0..1,
            );
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Batch Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Batch Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
