//! Decoded textures uploaded to the GPU, keyed by source path.
//!
//! Materials that name a texture draw with a 1x1 white stand-in until the
//! decoded image is installed. Pipelines watch [`TextureCache::generation`]
//! to know when to rebuild bind groups.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TextureError {
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height} RGBA8")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

struct GpuTexture {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct TextureCache {
    textures: FxHashMap<PathBuf, GpuTexture>,
    white: GpuTexture,
    sampler: wgpu::Sampler,
    generation: u64,
}

impl TextureCache {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = upload(device, queue, "cosmos-white-texture", &[255; 4], 1, 1);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cosmos-texture-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });
        Self {
            textures: FxHashMap::default(),
            white,
            sampler,
            generation: 0,
        }
    }

    /// Upload a decoded RGBA8 image for `path`, replacing any earlier one.
    pub fn install(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        validate_rgba(rgba, width, height)?;
        let label = path.display().to_string();
        let texture = upload(device, queue, &label, rgba, width, height);
        self.textures.insert(path.to_path_buf(), texture);
        self.generation += 1;
        log::info!("Installed texture '{label}' ({width}x{height})");
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.textures.contains_key(path)
    }

    /// View for `path`, or the white stand-in when absent or not yet loaded.
    /// The flag reports whether the real texture was found.
    pub fn view_or_white(&self, path: Option<&Path>) -> (&wgpu::TextureView, bool) {
        match path.and_then(|p| self.textures.get(p)) {
            Some(texture) => (&texture.view, true),
            None => (&self.white.view, false),
        }
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Bumped on every install.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.generation += 1;
    }
}

fn validate_rgba(rgba: &[u8], width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: rgba.len(),
            expected,
            width,
            height,
        });
    }
    Ok(())
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> GpuTexture {
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
        format: TextureCache::FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: None,
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::tests::create_test_device;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            validate_rgba(&[], 0, 4),
            Err(TextureError::ZeroDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn test_rejects_short_data() {
        assert_eq!(
            validate_rgba(&[0; 12], 2, 2),
            Err(TextureError::DataSizeMismatch {
                actual: 12,
                expected: 16,
                width: 2,
                height: 2
            })
        );
        assert!(validate_rgba(&[0; 16], 2, 2).is_ok());
    }

    #[test]
    fn test_white_until_installed() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut cache = TextureCache::new(&device, &queue);
        let path = Path::new("textures/star.png");
        assert!(!cache.view_or_white(Some(path)).1);
        assert!(!cache.view_or_white(None).1);

        cache
            .install(&device, &queue, path, &[255; 16], 2, 2)
            .unwrap();
        assert!(cache.view_or_white(Some(path)).1);
        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_install_leaves_cache_untouched() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut cache = TextureCache::new(&device, &queue);
        let path = Path::new("broken.png");
        assert!(cache.install(&device, &queue, path, &[0; 3], 1, 1).is_err());
        assert!(!cache.contains(path));
        assert_eq!(cache.generation(), 0);
    }
}
