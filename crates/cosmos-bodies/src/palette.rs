//! Colour palettes for giving each instance or vertex in a batch its own tint.

use rand::Rng;

use crate::color::Color;

/// How per-vertex or per-instance colours are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    /// Every channel uniform in `[0, 1]`.
    Uniform,
    /// See [`emphasized_color`].
    Emphasized,
}

impl Palette {
    pub fn sample(self, rng: &mut impl Rng) -> Color {
        match self {
            Palette::Uniform => Color::random(rng),
            Palette::Emphasized => emphasized_color(rng),
        }
    }
}

/// A random colour with one channel pushed up and overall brightness in `[0.7, 1.0]`.
///
/// One of the three channels (chosen uniformly) is replaced by the larger of
/// itself and a fresh draw, which skews the batch toward saturated reds,
/// greens and blues instead of muddy greys.
pub fn emphasized_color(rng: &mut impl Rng) -> Color {
    let mut color = Color::random(rng);

    let emphasis: f32 = rng.random();
    let boost: f32 = rng.random();
    if emphasis < 0.33 {
        color.r = color.r.max(boost);
    } else if emphasis < 0.66 {
        color.g = color.g.max(boost);
    } else {
        color.b = color.b.max(boost);
    }

    let brightness = 0.7 + rng.random::<f32>() * 0.3;
    color.scaled(brightness)
}
