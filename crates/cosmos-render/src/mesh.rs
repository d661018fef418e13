//! Unlit triangle meshes (planets), one uniform block per scene node.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use cosmos_bodies::{Color, GeneratedObject, MaterialParams};
use glam::{Mat4, Vec3};
use static_assertions::const_assert_eq;
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;
use crate::textures::TextureCache;
use crate::uniform::texture_layout_entries;

const MESH_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct Node {
    model: mat4x4<f32>,
    // rgb, opacity
    color: vec4<f32>,
    // has_texture, unused x3
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> node: Node;
@group(1) @binding(1) var mesh_texture: texture_2d<f32>;
@group(1) @binding(2) var mesh_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_mesh(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * node.model * vec4<f32>(in.position, 1.0);
    out.uv = vec2<f32>(in.uv.x, 1.0 - in.uv.y);
    return out;
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(mesh_texture, mesh_sampler, in.uv);
    let tex = mix(vec4<f32>(1.0), texel, node.params.x);
    return vec4<f32>(node.color.rgb * tex.rgb, node.color.a * tex.a);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<MeshVertex>(), 32);

impl MeshVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
        ],
    };

    /// Interleave the mesh attributes of `object`. Point objects yield
    /// nothing.
    pub fn from_object(object: &GeneratedObject) -> Vec<Self> {
        let Some(triangles) = object.triangles() else {
            return Vec::new();
        };
        object
            .positions()
            .iter()
            .zip(&triangles.normals)
            .zip(&triangles.uvs)
            .map(|((&position, &normal), &uv)| Self {
                position,
                normal,
                uv,
            })
            .collect()
    }
}

/// Per-node uniform in group 1, binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub params: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<MeshUniform>(), 96);

impl MeshUniform {
    /// The node tint multiplies the material colour.
    pub fn new(material: &MaterialParams, position: Vec3, tint: Color, texture_loaded: bool) -> Self {
        let color = Color::new(
            material.color.r * tint.r,
            material.color.g * tint.g,
            material.color.b * tint.b,
        );
        Self {
            model: Mat4::from_translation(position).to_cols_array_2d(),
            color: color.with_alpha(material.opacity),
            params: [if texture_loaded { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// Vertex and index buffers of one generated mesh, shared by every node
/// placing it.
pub struct MeshGeometry {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshGeometry {
    /// `None` for point objects and meshes without triangles.
    pub fn new(device: &wgpu::Device, object: &GeneratedObject) -> Option<Self> {
        let triangles = object.triangles()?;
        if triangles.indices.is_empty() {
            return None;
        }
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-mesh-vertices"),
            contents: bytemuck::cast_slice(&MeshVertex::from_object(object)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-mesh-indices"),
            contents: bytemuck::cast_slice(&triangles.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            vertices,
            indices,
            index_count: triangles.indices.len() as u32,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

pub struct MeshPipeline {
    pipeline: wgpu::RenderPipeline,
    node_layout: wgpu::BindGroupLayout,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cosmos-mesh-shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
        });

        let [texture_entry, sampler_entry] = texture_layout_entries(1);
        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cosmos-mesh-node-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<MeshUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry,
                sampler_entry,
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cosmos-mesh-pipeline-layout"),
            bind_group_layouts: &[camera_layout, &node_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cosmos-mesh-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                buffers: &[MeshVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::stencil_state(true)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
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

        log::info!("Mesh pipeline initialized ({color_format:?})");

        Self {
            pipeline,
            node_layout,
        }
    }

    fn node_bind_group(
        &self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        textures: &TextureCache,
        texture: Option<&Path>,
    ) -> (wgpu::BindGroup, bool) {
        let (view, loaded) = textures.view_or_white(texture);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cosmos-mesh-node-bg"),
            layout: &self.node_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
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

/// GPU state of one mesh node: its placement uniform and bind group.
pub struct MeshNode {
    params: MaterialParams,
    position: Vec3,
    tint: Color,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_loaded: bool,
    texture_generation: u64,
}

impl MeshNode {
    pub fn new(
        pipeline: &MeshPipeline,
        device: &wgpu::Device,
        object: &GeneratedObject,
        position: Vec3,
        tint: Color,
        textures: &TextureCache,
    ) -> Self {
        let params = object.material().clone();
        let texture_loaded = textures.view_or_white(params.texture.as_deref()).1;
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-mesh-node"),
            contents: bytemuck::bytes_of(&MeshUniform::new(&params, position, tint, texture_loaded)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let (bind_group, _) =
            pipeline.node_bind_group(device, &uniform, textures, params.texture.as_deref());
        Self {
            params,
            position,
            tint,
            uniform,
            bind_group,
            texture_loaded,
            texture_generation: textures.generation(),
        }
    }

    /// Rewrite the uniform when the node moved or was recoloured, and rebind
    /// when the texture cache changed.
    pub fn sync(
        &mut self,
        pipeline: &MeshPipeline,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        position: Vec3,
        tint: Color,
        textures: &TextureCache,
    ) {
        let mut dirty = position != self.position || tint != self.tint;
        self.position = position;
        self.tint = tint;

        if self.params.texture.is_some() && self.texture_generation != textures.generation() {
            self.texture_generation = textures.generation();
            let (bind_group, loaded) = pipeline.node_bind_group(
                device,
                &self.uniform,
                textures,
                self.params.texture.as_deref(),
            );
            self.bind_group = bind_group;
            dirty |= loaded != self.texture_loaded;
            self.texture_loaded = loaded;
        }

        if dirty {
            let uniform = MeshUniform::new(&self.params, position, tint, self.texture_loaded);
            queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));
        }
    }

    pub fn draw<'a>(
        &'a self,
        pipeline: &'a MeshPipeline,
        geometry: &'a MeshGeometry,
        pass: &mut wgpu::RenderPass<'a>,
    ) {
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, geometry.vertices.slice(..));
        pass.set_index_buffer(geometry.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..geometry.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_bodies::{ObjectSpec, generate_seeded};

    fn planet(segments: u32) -> GeneratedObject {
        let spec = ObjectSpec {
            segments: Some(segments),
            ..ObjectSpec::planet()
        };
        generate_seeded(&spec, 1).unwrap()
    }

    #[test]
    fn test_vertex_layout_offsets() {
        let offsets: Vec<_> = MeshVertex::LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, [0, 12, 24]);
        assert_eq!(MeshVertex::LAYOUT.array_stride, 32);
    }

    #[test]
    fn test_vertices_interleave_every_attribute() {
        let object = planet(8);
        let vertices = MeshVertex::from_object(&object);
        let triangles = object.triangles().unwrap();
        assert_eq!(vertices.len(), object.len());
        assert_eq!(vertices[4].position, object.positions()[4]);
        assert_eq!(vertices[4].normal, triangles.normals[4]);
        assert_eq!(vertices[4].uv, triangles.uvs[4]);
    }

    #[test]
    fn test_point_objects_have_no_mesh_vertices() {
        let object = generate_seeded(&ObjectSpec::star(), 1).unwrap();
        assert!(MeshVertex::from_object(&object).is_empty());
    }

    #[test]
    fn test_uniform_tints_material_and_translates() {
        let object = planet(8);
        let uniform = MeshUniform::new(
            object.material(),
            Vec3::new(1.0, 2.0, 3.0),
            Color::new(0.5, 0.5, 0.5),
            false,
        );
        let material = object.material();
        assert_eq!(uniform.color[1], material.color.g * 0.5);
        assert_eq!(uniform.color[3], material.opacity);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.params[0], 0.0);
    }
}
