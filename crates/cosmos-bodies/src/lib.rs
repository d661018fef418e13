//! Procedural celestial bodies: star fields, galaxy point clouds, and planet
//! spheres generated from a small immutable [`ObjectSpec`].

pub mod color;
pub mod generate;
pub mod object;
pub mod palette;
pub mod spec;
pub mod sphere;

pub use color::Color;
pub use generate::{generate, generate_galaxy, generate_planet, generate_seeded, generate_stars};
pub use object::{GeneratedObject, MaterialParams, Triangles};
pub use palette::{Palette, emphasized_color};
pub use spec::{BodyError, BodyKind, ObjectSpec, SizeBand};
pub use sphere::{SphereMesh, uv_sphere};
