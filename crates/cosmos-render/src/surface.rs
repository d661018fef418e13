//! [`GpuSurface`]: the wgpu implementation of [`RenderSurface`].
//!
//! GPU resources for scene nodes are built lazily on the first frame a node
//! is seen and dropped on the first frame it is gone. Mesh geometry is
//! shared between all nodes placing the same generated object.

use std::path::Path;
use std::sync::Arc;

use cosmos_bodies::GeneratedObject;
use cosmos_scene::{Camera, FrameError, Node, NodeId, RenderSurface, SceneGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, RenderContextError, init_render_context_blocking};
use crate::mesh::{MeshGeometry, MeshNode, MeshPipeline};
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::points::{PointBatch, PointPipeline};
use crate::textures::{TextureCache, TextureError};
use crate::uniform::{CameraUniform, camera_bind_group_layout};

/// Identity of a shared generated object. Valid while an `Arc` clone is held.
type ObjectKey = usize;

fn object_key(object: &Arc<GeneratedObject>) -> ObjectKey {
    Arc::as_ptr(object) as ObjectKey
}

struct CachedPoints {
    object: Arc<GeneratedObject>,
    batch: PointBatch,
}

struct Gpu {
    context: RenderContext,
    depth: DepthBuffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    points: PointPipeline,
    meshes: MeshPipeline,
    textures: TextureCache,
    point_batches: FxHashMap<NodeId, CachedPoints>,
    mesh_nodes: FxHashMap<NodeId, (ObjectKey, MeshNode)>,
    geometries: FxHashMap<ObjectKey, (Arc<GeneratedObject>, Option<MeshGeometry>)>,
}

impl Gpu {
    fn new(context: RenderContext) -> Self {
        let device = &context.device;
        let (width, height) = context.size();
        let format = context.surface_format();

        let camera_layout = camera_bind_group_layout(device, "cosmos-camera-bgl");
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cosmos-camera"),
            contents: bytemuck::bytes_of(&CameraUniform::new(&Camera::default(), width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cosmos-camera-bg"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        Self {
            depth: DepthBuffer::new(device, width, height),
            points: PointPipeline::new(device, format, &camera_layout),
            meshes: MeshPipeline::new(device, format, &camera_layout),
            textures: TextureCache::new(device, &context.queue),
            camera_buffer,
            camera_bind_group,
            point_batches: FxHashMap::default(),
            mesh_nodes: FxHashMap::default(),
            geometries: FxHashMap::default(),
            context,
        }
    }

    /// Bring per-node resources in line with `root`.
    fn sync_nodes(&mut self, root: &SceneGraph) {
        let device = &self.context.device;
        let queue = &self.context.queue;

        retain_live(&mut self.point_batches, root);
        retain_live(&mut self.mesh_nodes, root);

        let mut live_geometry = FxHashSet::default();
        for (id, node) in root.iter() {
            match node {
                Node::PointCloud { object } => {
                    let stale = self
                        .point_batches
                        .get(&id)
                        .is_none_or(|cached| !Arc::ptr_eq(&cached.object, object));
                    if stale {
                        let batch = PointBatch::new(&self.points, device, object, &self.textures);
                        log::debug!("Built point batch for node {} ({} points)", id.raw(), batch.count());
                        self.point_batches.insert(
                            id,
                            CachedPoints {
                                object: Arc::clone(object),
                                batch,
                            },
                        );
                    } else if let Some(cached) = self.point_batches.get_mut(&id) {
                        cached
                            .batch
                            .refresh_texture(&self.points, device, queue, &self.textures);
                    }
                }
                Node::Mesh {
                    object,
                    position,
                    color,
                } => {
                    let key = object_key(object);
                    live_geometry.insert(key);
                    self.geometries
                        .entry(key)
                        .or_insert_with(|| (Arc::clone(object), MeshGeometry::new(device, object)));

                    let reusable =
                        matches!(self.mesh_nodes.get(&id), Some((cached, _)) if *cached == key);
                    if !reusable {
                        let mesh = MeshNode::new(
                            &self.meshes,
                            device,
                            object,
                            *position,
                            *color,
                            &self.textures,
                        );
                        self.mesh_nodes.insert(id, (key, mesh));
                    } else if let Some((_, mesh)) = self.mesh_nodes.get_mut(&id) {
                        mesh.sync(&self.meshes, device, queue, *position, *color, &self.textures);
                    }
                }
            }
        }
        self.geometries.retain(|key, _| live_geometry.contains(key));
    }

    fn draw(&mut self, root: &SceneGraph, camera: &Camera) -> Result<(), FrameError> {
        self.sync_nodes(root);

        let (width, height) = self.context.size();
        self.context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::new(camera, width, height)),
        );

        let frame = self.context.acquire_frame()?;
        let mut encoder = FrameEncoder::new(&self.context.device, self.context.queue.clone(), frame);
        let builder = RenderPassBuilder::new()
            .depth(self.depth.view().clone(), DepthBuffer::CLEAR_VALUE)
            .label("cosmos-scene-pass");
        {
            let mut pass = encoder.begin_render_pass(&builder);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            // Opaque meshes first so points depth-test against them.
            for (id, _) in root.iter() {
                if let Some((key, mesh)) = self.mesh_nodes.get(&id)
                    && let Some((_, Some(geometry))) = self.geometries.get(key)
                {
                    mesh.draw(&self.meshes, geometry, &mut pass);
                }
            }
            for (id, _) in root.iter() {
                if let Some(cached) = self.point_batches.get(&id) {
                    cached.batch.draw(&self.points, &mut pass);
                }
            }
        }
        encoder.submit();
        Ok(())
    }
}

/// Drop cache entries whose node is no longer in `root`.
fn retain_live<V>(cache: &mut FxHashMap<NodeId, V>, root: &SceneGraph) {
    cache.retain(|id, _| root.get(*id).is_some());
}

/// A window-backed render surface for one mounted view.
///
/// After [`detach`](RenderSurface::detach) or
/// [`release`](RenderSurface::release) every render fails with
/// [`FrameError::SurfaceLost`].
pub struct GpuSurface {
    gpu: Option<Gpu>,
    size: (u32, u32),
}

impl GpuSurface {
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderContextError> {
        Ok(Self::from_context(init_render_context_blocking(window, vsync)?))
    }

    pub fn from_context(context: RenderContext) -> Self {
        let size = context.size();
        Self {
            gpu: Some(Gpu::new(context)),
            size,
        }
    }

    pub fn is_released(&self) -> bool {
        self.gpu.is_none()
    }

    /// Upload a decoded texture. Materials naming `path` pick it up on the
    /// next frame.
    pub fn install_texture(
        &mut self,
        path: &Path,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let Some(gpu) = self.gpu.as_mut() else {
            log::debug!("Ignoring texture {} for a released surface", path.display());
            return Ok(());
        };
        gpu.textures
            .install(&gpu.context.device, &gpu.context.queue, path, rgba, width, height)
    }
}

impl RenderSurface for GpuSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.context.resize(width, height);
            gpu.depth.resize(&gpu.context.device, width, height);
            log::debug!("Surface resized to {}x{}", self.size.0, self.size.1);
        }
    }

    fn render(&mut self, root: &SceneGraph, camera: &Camera) -> Result<(), FrameError> {
        self.gpu
            .as_mut()
            .ok_or(FrameError::SurfaceLost)?
            .draw(root, camera)
    }

    fn detach(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.context.detach_surface();
        }
    }

    fn release(&mut self) {
        let Some(mut gpu) = self.gpu.take() else {
            return;
        };
        gpu.point_batches.clear();
        gpu.mesh_nodes.clear();
        gpu.geometries.clear();
        gpu.textures.clear();
        gpu.context.device.destroy();
        log::info!("GPU resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_bodies::{ObjectSpec, generate_seeded};

    #[test]
    fn test_retain_live_drops_removed_nodes() {
        let object = Arc::new(generate_seeded(&ObjectSpec::star(), 1).unwrap());
        let mut root = SceneGraph::new();
        let kept = root.insert(Node::PointCloud {
            object: Arc::clone(&object),
        });
        let removed = root.insert(Node::PointCloud {
            object: Arc::clone(&object),
        });

        let mut cache = FxHashMap::default();
        cache.insert(kept, "kept");
        cache.insert(removed, "removed");
        root.remove(removed);

        retain_live(&mut cache, &root);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&kept), Some(&"kept"));
    }

    #[test]
    fn test_object_key_follows_arc_identity() {
        let object = Arc::new(generate_seeded(&ObjectSpec::planet(), 1).unwrap());
        let shared = Arc::clone(&object);
        let copy = Arc::new((*object).clone());
        assert_eq!(object_key(&object), object_key(&shared));
        assert_ne!(object_key(&object), object_key(&copy));
    }
}
