//! Point-cloud rendering as instanced screen-facing quads.
//!
//! Every point of a cloud is one instance of a unit quad, so a whole cloud is
//! a single draw call. Point size follows the usual points-material rules:
//! with size attenuation under a perspective camera the size is in world
//! units scaled by `(viewport_height / 2) / depth`, otherwise it is in
//! pixels. Points never shrink below one pixel.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use cosmos_bodies::{GeneratedObject, MaterialParams};
use static_assertions::const_assert_eq;
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;
use crate::textures::TextureCache;
use crate::uniform::texture_layout_entries;

const POINT_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    // width, height, is_perspective, unused
    viewport: vec4<f32>,
};

struct Material {
    // rgb, opacity
    color: vec4<f32>,
    // size, size_attenuation, vertex_colors, has_texture
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> material: Material;
@group(1) @binding(1) var point_texture: texture_2d<f32>;
@group(1) @binding(2) var point_sampler: sampler;

struct VertexInput {
    @location(0) corner: vec2<f32>,
    @location(1) position: vec3<f32>,
    @location(2) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_point(in: VertexInput) -> VertexOutput {
    let world = vec4<f32>(in.position, 1.0);
    let view_pos = camera.view * world;
    let clip = camera.view_proj * world;

    var size_px = material.params.x;
    if material.params.y > 0.5 && camera.viewport.z > 0.5 {
        size_px = material.params.x * camera.viewport.y * 0.5 / max(-view_pos.z, 1e-4);
    }
    size_px = max(size_px, 1.0);

    let offset = in.corner * size_px / camera.viewport.xy * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.uv = vec2<f32>(in.corner.x * 0.5 + 0.5, 0.5 - in.corner.y * 0.5);
    out.color = mix(vec3<f32>(1.0), in.color, material.params.z);
    return out;
}

@fragment
fn fs_point(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(point_texture, point_sampler, in.uv);
    let tex = mix(vec4<f32>(1.0), texel, material.params.w);
    let alpha = material.color.a * tex.a;
    if alpha <= 0.0 {
        discard;
    }
    return vec4<f32>(material.color.rgb * in.color * tex.rgb, alpha);
}
"#;

/// Per-point instance data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const_assert_eq!(std::mem::size_of::<PointInstance>(), 24);

impl PointInstance {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 2,
            },
        ],
    };

    /// One instance per vertex; white where the object has no colours.
    pub fn from_object(object: &GeneratedObject) -> Vec<Self> {
        let colors = object.colors();
        object
            .positions()
            .iter()
            .enumerate()
            .map(|(i, &position)| Self {
                position,
                color: colors.map_or([1.0; 3], |c| c[i]),
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct QuadCorner {
    corner: [f32; 2],
}

impl QuadCorner {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadCorner>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        }],
    };
}

const QUAD: [QuadCorner; 4] = [
    QuadCorner { corner: [-1.0, -1.0] },
    QuadCorner { corner: [1.0, -1.0] },
    QuadCorner { corner: [1.0, 1.0] },
    QuadCorner { corner: [-1.0, 1.0] },
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Material uniform in group 1, binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointMaterialUniform {
    pub color: [f32; 4],
    pub params: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<PointMaterialUniform>(), 32);

impl PointMaterialUniform {
    pub fn new(material: &MaterialParams, texture_loaded: bool) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            color: material.color.with_alpha(material.opacity),
            params: [
                material.size,
                flag(material.size_attenuation),
                flag(material.vertex_colors),
                flag(texture_loaded),
            ],
        }
    }
}

pub struct PointPipeline {
    pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    quad_vertices: wgpu::Buffer,
    quad_indices: wgpu::Buffer,
}

impl PointPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cosmos-point-shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });

        let [texture_entry, sampler_entry] = texture_layout_entries(1);
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cosmos-point-material-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<PointMaterialUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry,
                sampler_entry,
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cosmos-point-pipeline-layout"),
            bind_group_layouts: &[camera_layout, &material_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cosmos-point-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_point"),
                buffers: &[QuadCorner::LAYOUT, PointInstance::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Points test against meshes but never occlude each other.
            depth_stencil: Some(DepthBuffer::stencil_state(false)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_point"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let quad_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-point-quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-point-quad-indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!("Point pipeline initialized ({color_format:?})");

        Self {
            pipeline,
            material_layout,
            quad_vertices,
            quad_indices,
        }
    }

    fn material_bind_group(
        &self,
        device: &wgpu::Device,
        material: &wgpu::Buffer,
        textures: &TextureCache,
        texture: Option<&Path>,
    ) -> (wgpu::BindGroup, bool) {
        let (view, loaded) = textures.view_or_white(texture);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cosmos-point-material-bg"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(textures.sampler()),
                },
            ],
        });
        (bind_group, loaded)
    }
}

/// GPU state of one point-cloud node.
pub struct PointBatch {
    instances: Option<wgpu::Buffer>,
    count: u32,
    params: MaterialParams,
    material: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_loaded: bool,
    texture_generation: u64,
}

impl PointBatch {
    pub fn new(
        pipeline: &PointPipeline,
        device: &wgpu::Device,
        object: &GeneratedObject,
        textures: &TextureCache,
    ) -> Self {
        let data = PointInstance::from_object(object);
        // Empty clouds are valid nodes that simply draw nothing.
        let instances = (!data.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cosmos-point-instances"),
                contents: bytemuck::cast_slice(&data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let params = object.material().clone();
        let texture_loaded = textures.view_or_white(params.texture.as_deref()).1;
        let material = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-point-material"),
            contents: bytemuck::bytes_of(&PointMaterialUniform::new(&params, texture_loaded)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let (bind_group, _) =
            pipeline.material_bind_group(device, &material, textures, params.texture.as_deref());

        Self {
            instances,
            count: data.len() as u32,
            params,
            material,
            bind_group,
            texture_loaded,
            texture_generation: textures.generation(),
        }
    }

    /// Rebind when the texture cache changed since this batch was built.
    pub fn refresh_texture(
        &mut self,
        pipeline: &PointPipeline,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &TextureCache,
    ) {
        if self.params.texture.is_none() || self.texture_generation == textures.generation() {
            return;
        }
        self.texture_generation = textures.generation();
        let (bind_group, loaded) = pipeline.material_bind_group(
            device,
            &self.material,
            textures,
            self.params.texture.as_deref(),
        );
        self.bind_group = bind_group;
        if loaded != self.texture_loaded {
            self.texture_loaded = loaded;
            queue.write_buffer(
                &self.material,
                0,
                bytemuck::bytes_of(&PointMaterialUniform::new(&self.params, loaded)),
            );
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn draw<'a>(
        &'a self,
        pipeline: &'a PointPipeline,
        pass: &mut wgpu::RenderPass<'a>,
    ) {
        let Some(instances) = &self.instances else {
            return;
        };
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, pipeline.quad_vertices.slice(..));
        pass.set_vertex_buffer(1, instances.slice(..));
        pass.set_index_buffer(pipeline.quad_indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..self.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_bodies::{ObjectSpec, Palette, generate_seeded};

    fn stars(count: usize) -> GeneratedObject {
        let spec = ObjectSpec {
            count,
            ..ObjectSpec::star()
        };
        generate_seeded(&spec, 3).unwrap()
    }

    #[test]
    fn test_instance_layout_matches_struct() {
        assert_eq!(PointInstance::LAYOUT.array_stride, 24);
        assert_eq!(PointInstance::LAYOUT.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(QuadCorner::LAYOUT.step_mode, wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn test_uncoloured_points_are_white() {
        let object = stars(16);
        let instances = PointInstance::from_object(&object);
        assert_eq!(instances.len(), 16);
        assert!(instances.iter().all(|i| i.color == [1.0; 3]));
        assert_eq!(instances[5].position, object.positions()[5]);
    }

    #[test]
    fn test_vertex_colours_carried_per_instance() {
        let spec = ObjectSpec {
            count: 32,
            vertex_palette: Some(Palette::Uniform),
            ..ObjectSpec::galaxy()
        };
        let object = generate_seeded(&spec, 9).unwrap();
        let colors = object.colors().unwrap();
        let instances = PointInstance::from_object(&object);
        for (instance, color) in instances.iter().zip(colors) {
            assert_eq!(&instance.color, color);
        }
    }

    #[test]
    fn test_empty_cloud_has_no_instances() {
        assert!(PointInstance::from_object(&stars(0)).is_empty());
    }

    #[test]
    fn test_material_uniform_flags() {
        let object = stars(1);
        let uniform = PointMaterialUniform::new(object.material(), false);
        let material = object.material();
        assert_eq!(uniform.color[3], material.opacity);
        assert_eq!(uniform.params[0], material.size);
        assert_eq!(uniform.params[1], 1.0);
        assert_eq!(uniform.params[2], 0.0);
        assert_eq!(uniform.params[3], 0.0);
        assert_eq!(PointMaterialUniform::new(material, true).params[3], 1.0);
    }

    #[test]
    fn test_quad_covers_unit_square() {
        for index in QUAD_INDICES {
            let corner = QUAD[index as usize].corner;
            assert_eq!(corner[0].abs(), 1.0);
            assert_eq!(corner[1].abs(), 1.0);
        }
    }
}
