pub mod anaglyph_pipeline;
pub mod batch;
pub mod camera;
pub mod gpu_context;
pub mod mesh;
pub mod renderer;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use anaglyph_pipeline::{AnaglyphPipeline, AnaglyphUniform};
pub use batch::{count_texture_binds, DrawCall, Material, SpriteBatch, SpriteDraw};
pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::GpuContext;
pub use mesh::{MeshVertex, QuadMesh};
pub use renderer::{RenderStats, SpriteRenderer};
pub use sprite_pipeline::SpritePipeline;
pub use texture::{flip_rows, Texture, TextureFilter, TextureOptions, TextureWrap};
pub use vertex::SpriteVertex;
