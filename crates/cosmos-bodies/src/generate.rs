//! Procedural generators for stars, galaxies and planets.
//!
//! All generators take an explicit RNG so batches are reproducible from a
//! seed. Each one validates the spec before drawing anything.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::object::{GeneratedObject, MaterialParams, Triangles};
use crate::spec::{BodyError, BodyKind, ObjectSpec};
use crate::sphere::uv_sphere;

/// Generate the object described by `spec`, dispatching on its kind.
pub fn generate(spec: &ObjectSpec, rng: &mut impl Rng) -> Result<GeneratedObject, BodyError> {
    spec.validate()?;
    let object = match spec.kind {
        BodyKind::Star => generate_stars(spec, rng)?,
        BodyKind::Galaxy => generate_galaxy(spec, rng)?,
        BodyKind::Planet => generate_planet(spec, rng)?,
    };
    tracing::debug!(
        kind = ?spec.kind,
        vertices = object.len(),
        "Generated body"
    );
    Ok(object)
}

/// [`generate`] with a fresh ChaCha8 stream seeded from `seed`.
pub fn generate_seeded(spec: &ObjectSpec, seed: u64) -> Result<GeneratedObject, BodyError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate(spec, &mut rng)
}

/// `count` positions uniform in the axis-aligned cube of side `spread`.
fn scatter(count: usize, spread: f32, rng: &mut impl Rng) -> Vec<[f32; 3]> {
    let half = spread * 0.5;
    (0..count)
        .map(|_| {
            [
                rng.random_range(-half..=half),
                rng.random_range(-half..=half),
                rng.random_range(-half..=half),
            ]
        })
        .collect()
}

fn pick_texture(spec: &ObjectSpec, rng: &mut impl Rng) -> Option<std::path::PathBuf> {
    spec.texture_paths.choose(rng).cloned()
}

fn point_material(spec: &ObjectSpec, size: f32, texture: Option<std::path::PathBuf>) -> MaterialParams {
    MaterialParams {
        color: spec.color,
        size,
        size_attenuation: spec.size_attenuation,
        opacity: spec.opacity,
        transparent: spec.opacity < 1.0 || texture.is_some(),
        vertex_colors: spec.vertex_palette.is_some(),
        texture,
    }
}

/// Uniformly coloured point cloud.
///
/// A `vertex_palette` or `size_band` on the spec is honoured, so a star spec
/// can be given galaxy-style variation without changing its kind.
pub fn generate_stars(spec: &ObjectSpec, rng: &mut impl Rng) -> Result<GeneratedObject, BodyError> {
    point_cloud(BodyKind::Star, spec, rng)
}

/// Point cloud with a random colour per vertex and a point size drawn once
/// from the spec's size band. Defaults to a uniform palette and the
/// `[0.5, 2.0]` band when the spec leaves them unset.
pub fn generate_galaxy(spec: &ObjectSpec, rng: &mut impl Rng) -> Result<GeneratedObject, BodyError> {
    let spec = ObjectSpec {
        size_band: Some(spec.size_band.unwrap_or_default()),
        vertex_palette: Some(spec.vertex_palette.unwrap_or(crate::palette::Palette::Uniform)),
        ..spec.clone()
    };
    point_cloud(BodyKind::Galaxy, &spec, rng)
}

fn point_cloud(
    kind: BodyKind,
    spec: &ObjectSpec,
    rng: &mut impl Rng,
) -> Result<GeneratedObject, BodyError> {
    spec.validate()?;

    let positions = scatter(spec.count, spec.spread, rng);
    let colors = spec.vertex_palette.map(|palette| {
        (0..positions.len())
            .map(|_| palette.sample(rng).to_array())
            .collect::<Vec<_>>()
    });
    let size = match spec.size_band {
        Some(band) => spec.size * rng.random_range(band.min_factor..=band.max_factor),
        None => spec.size,
    };
    let texture = pick_texture(spec, rng);

    GeneratedObject::new(
        kind,
        positions,
        colors,
        None,
        point_material(spec, size, texture),
    )
}

/// Sphere mesh centred on the origin. `count` and `spread` are ignored; one
/// planet is produced per call.
pub fn generate_planet(spec: &ObjectSpec, rng: &mut impl Rng) -> Result<GeneratedObject, BodyError> {
    spec.validate()?;

    let radius = spec.radius.unwrap_or(ObjectSpec::DEFAULT_PLANET_RADIUS);
    let segments = spec.segments.unwrap_or(ObjectSpec::DEFAULT_PLANET_SEGMENTS);
    let mesh = uv_sphere(radius, segments, segments);
    let texture = pick_texture(spec, rng);

    let material = MaterialParams {
        color: spec.color,
        size: spec.size,
        size_attenuation: false,
        opacity: spec.opacity,
        transparent: spec.opacity < 1.0,
        vertex_colors: false,
        texture,
    };

    GeneratedObject::new(
        BodyKind::Planet,
        mesh.positions,
        None,
        Some(Triangles {
            normals: mesh.normals,
            uvs: mesh.uvs,
            indices: mesh.indices,
        }),
        material,
    )
}
