//! Per-frame camera uniform shared by the point and mesh pipelines.

use bytemuck::{Pod, Zeroable};
use cosmos_scene::Camera;
use static_assertions::const_assert_eq;

/// Camera data in group 0, binding 0 of every pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// `[width, height, is_perspective, 0]`.
    pub viewport: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<CameraUniform>(), 144);

impl CameraUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            viewport: [
                width.max(1) as f32,
                height.max(1) as f32,
                if camera.is_perspective() { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// Layout of the camera bind group, visible to both shader stages.
pub(crate) fn camera_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(CameraUniform::SIZE),
            },
            count: None,
        }],
    })
}

/// Texture at binding `texture_binding` and its sampler at the next binding.
pub(crate) fn texture_layout_entries(texture_binding: u32) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: texture_binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: texture_binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}
