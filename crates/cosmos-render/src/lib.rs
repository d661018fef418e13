//! wgpu rendering for cosmos scenes: device and surface setup, the point-cloud
//! and mesh pipelines, and [`GpuSurface`], the [`cosmos_scene::RenderSurface`]
//! that draws a scene graph into a window.

pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod pass;
pub mod points;
pub mod surface;
pub mod textures;
pub mod uniform;

pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, init_render_context_blocking};
pub use mesh::{MeshGeometry, MeshNode, MeshPipeline, MeshUniform, MeshVertex};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use points::{PointBatch, PointInstance, PointMaterialUniform, PointPipeline};
pub use surface::GpuSurface;
pub use textures::{TextureCache, TextureError};
pub use uniform::CameraUniform;
