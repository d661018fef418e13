//! Immutable description of a celestial body batch.

use std::path::PathBuf;

use crate::color::Color;
use crate::palette::Palette;

/// Errors raised while validating a spec or deriving objects from one.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BodyError {
    /// A spec field is outside its allowed range.
    #[error("invalid {kind:?} spec: {field} {reason}")]
    InvalidSpec {
        kind: BodyKind,
        field: &'static str,
        reason: String,
    },

    /// An attribute array does not have one entry per position.
    #[error("attribute has {actual} entries but there are {expected} positions")]
    AttributeMismatch { expected: usize, actual: usize },
}

/// Which generator a spec selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Uniformly coloured point cloud.
    Star,
    /// Point cloud with random per-vertex colours and a randomised point size.
    Galaxy,
    /// Sphere mesh.
    Planet,
}

impl BodyKind {
    /// Whether bodies of this kind render as a single point-cloud batch.
    pub fn is_point_cloud(self) -> bool {
        matches!(self, BodyKind::Star | BodyKind::Galaxy)
    }
}

/// Band a generated point size is drawn from, relative to the base size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeBand {
    pub min_factor: f32,
    pub max_factor: f32,
}

impl Default for SizeBand {
    fn default() -> Self {
        Self {
            min_factor: 0.5,
            max_factor: 2.0,
        }
    }
}

/// Common description of every body kind.
///
/// Fields that do not apply to a kind are ignored by its generator: planets
/// ignore `count`, `spread`, `size` and `vertex_palette`; point clouds ignore
/// `radius` and `segments`.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSpec {
    pub kind: BodyKind,
    pub count: usize,
    pub size: f32,
    pub spread: f32,
    pub color: Color,
    pub opacity: f32,
    pub texture_paths: Vec<PathBuf>,
    pub radius: Option<f32>,
    pub segments: Option<u32>,
    pub size_attenuation: bool,
    /// When set, the material size is drawn once from this band.
    pub size_band: Option<SizeBand>,
    /// When set, every vertex gets its own colour from this palette.
    pub vertex_palette: Option<Palette>,
}

impl ObjectSpec {
    pub const DEFAULT_PLANET_RADIUS: f32 = 100.0;
    pub const DEFAULT_PLANET_SEGMENTS: u32 = 32;

    /// White stars: 10,000 points of size 0.1 in a 2000-unit cube.
    pub fn star() -> Self {
        Self {
            kind: BodyKind::Star,
            count: 10_000,
            size: 0.1,
            spread: 2000.0,
            color: Color::WHITE,
            opacity: 0.8,
            texture_paths: Vec::new(),
            radius: None,
            segments: None,
            size_attenuation: true,
            size_band: None,
            vertex_palette: None,
        }
    }

    /// Multi-coloured galaxy: like [`star`](Self::star) but with random
    /// vertex colours and a point size drawn from `[0.05, 0.2]`.
    pub fn galaxy() -> Self {
        Self {
            kind: BodyKind::Galaxy,
            size_band: Some(SizeBand::default()),
            vertex_palette: Some(Palette::Uniform),
            ..Self::star()
        }
    }

    /// Green sphere of radius 100 with 32 segments.
    pub fn planet() -> Self {
        Self {
            kind: BodyKind::Planet,
            count: 1,
            size: 1.0,
            spread: 0.0,
            color: Color::GREEN,
            opacity: 1.0,
            texture_paths: Vec::new(),
            radius: Some(Self::DEFAULT_PLANET_RADIUS),
            segments: Some(Self::DEFAULT_PLANET_SEGMENTS),
            size_attenuation: false,
            size_band: None,
            vertex_palette: None,
        }
    }

    /// Check ranges; the generators call this before drawing anything.
    pub fn validate(&self) -> Result<(), BodyError> {
        let invalid = |field: &'static str, reason: String| BodyError::InvalidSpec {
            kind: self.kind,
            field,
            reason,
        };

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(
                "opacity",
                format!("must lie in [0, 1], got {}", self.opacity),
            ));
        }

        match self.kind {
            BodyKind::Star | BodyKind::Galaxy => {
                if !(self.size.is_finite() && self.size > 0.0) {
                    return Err(invalid("size", format!("must be > 0, got {}", self.size)));
                }
                if !(self.spread.is_finite() && self.spread >= 0.0) {
                    return Err(invalid(
                        "spread",
                        format!("must be >= 0, got {}", self.spread),
                    ));
                }
                if let Some(band) = self.size_band
                    && !(band.min_factor > 0.0
                        && band.max_factor.is_finite()
                        && band.min_factor <= band.max_factor)
                {
                    return Err(invalid(
                        "size_band",
                        format!("needs finite 0 < min <= max, got {band:?}"),
                    ));
                }
            }
            BodyKind::Planet => {
                let radius = self.radius.unwrap_or(Self::DEFAULT_PLANET_RADIUS);
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(invalid("radius", format!("must be > 0, got {radius}")));
                }
                let segments = self.segments.unwrap_or(Self::DEFAULT_PLANET_SEGMENTS);
                if segments < 3 {
                    return Err(invalid(
                        "segments",
                        format!("must be >= 3, got {segments}"),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ObjectSpec::star().validate().is_ok());
        assert!(ObjectSpec::galaxy().validate().is_ok());
        assert!(ObjectSpec::planet().validate().is_ok());
    }

    #[test]
    fn test_galaxy_preset_randomizes() {
        let galaxy = ObjectSpec::galaxy();
        assert_eq!(galaxy.kind, BodyKind::Galaxy);
        assert_eq!(galaxy.size_band, Some(SizeBand::default()));
        assert_eq!(galaxy.vertex_palette, Some(Palette::Uniform));
        assert_eq!(galaxy.count, 10_000);
    }

    #[test]
    fn test_negative_spread_rejected() {
        let spec = ObjectSpec {
            spread: -1.0,
            ..ObjectSpec::star()
        };
        assert!(matches!(
            spec.validate(),
            Err(BodyError::InvalidSpec {
                field: "spread",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_size_rejected() {
        let spec = ObjectSpec {
            size: f32::NAN,
            ..ObjectSpec::galaxy()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_non_finite_size_band_rejected() {
        for band in [
            SizeBand {
                min_factor: 0.5,
                max_factor: f32::INFINITY,
            },
            SizeBand {
                min_factor: f32::NAN,
                max_factor: 2.0,
            },
        ] {
            let spec = ObjectSpec {
                size_band: Some(band),
                ..ObjectSpec::galaxy()
            };
            assert!(matches!(
                spec.validate(),
                Err(BodyError::InvalidSpec {
                    field: "size_band",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_planet_segments_lower_bound() {
        let spec = ObjectSpec {
            segments: Some(2),
            ..ObjectSpec::planet()
        };
        assert!(matches!(
            spec.validate(),
            Err(BodyError::InvalidSpec {
                kind: BodyKind::Planet,
                field: "segments",
                ..
            })
        ));
    }

    #[test]
    fn test_planet_ignores_point_fields() {
        let spec = ObjectSpec {
            spread: -5.0,
            size: 0.0,
            ..ObjectSpec::planet()
        };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_point_cloud_kinds() {
        assert!(BodyKind::Star.is_point_cloud());
        assert!(BodyKind::Galaxy.is_point_cloud());
        assert!(!BodyKind::Planet.is_point_cloud());
    }
}
