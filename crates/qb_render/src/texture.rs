#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    /// Store the bottom image row first so that `v = 0` samples the bottom.
    pub flip_vertically: bool,
}

impl TextureOptions {
    /// Crisp pixel art that tiles: the default for sprites and tilesets.
    pub const PIXEL_ART: Self = Self {
        filter: TextureFilter::Nearest,
        wrap: TextureWrap::Repeat,
        flip_vertically: true,
    };

    /// Smooth photographs shown once, image rows kept top-first.
    pub const PHOTO: Self = Self {
        filter: TextureFilter::Linear,
        wrap: TextureWrap::Clamp,
        flip_vertically: false,
    };

    fn filter_mode(&self) -> wgpu::FilterMode {
        match self.filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }

    fn address_mode(&self) -> wgpu::AddressMode {
        match self.wrap {
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
        }
    }
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self::PIXEL_ART
    }
}

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl Texture {
    /// Decode an encoded image (PNG) and upload it.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        options: TextureOptions,
    ) -> Result<Self, String> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| format!("Failed to decode texture '{label}': {e}"))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_rgba8(
            device,
            queue,
            rgba.as_raw(),
            width,
            height,
            label,
            options,
        ))
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
        options: TextureOptions,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let flipped;
        let pixels = if options.flip_vertically {
            flipped = flip_rows(rgba, width, height);
            flipped.as_slice()
        } else {
            rgba
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: options.address_mode(),
            address_mode_v: options.address_mode(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: options.filter_mode(),
            min_filter: options.filter_mode(),
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
        }
    }

    pub fn byte_size(&self) -> usize {
        self.size.0 as usize * self.size.1 as usize * 4
    }
}

/// Reverse the row order of a tightly packed RGBA8 image.
pub fn flip_rows(rgba: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row = width as usize * 4;
    if row == 0 {
        return rgba.to_vec();
    }
    let mut out = Vec::with_capacity(rgba.len());
    for chunk in rgba.chunks_exact(row).take(height as usize).rev() {
        out.extend_from_slice(chunk);
    }
    out
}
