// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns an escape result into a color.  Interior points are flat
//! white; everything else walks around the hue wheel at a rate set by
//! both the iteration count and how far past the escape radius the
//! orbit had flung itself, which breaks up the usual banding.

use image::Rgba;

use crate::mandelbrot::Escape;

/// Default divisor for the hue ramp.
pub const DEFAULT_HUE_SCALE: f64 = 800.0;

/// The color given to points that never escaped.
pub const INTERIOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// The color policy handed to the Mandelbrot evaluator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Palette {
    /// Hue advances one full turn every `hue_scale` units of
    /// iterations × |z|².
    pub hue_scale: f64,
    /// Color for points inside the set.
    pub interior: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            hue_scale: DEFAULT_HUE_SCALE,
            interior: INTERIOR,
        }
    }
}

impl Palette {
    /// A palette with a custom hue divisor.
    pub fn with_hue_scale(hue_scale: f64) -> Self {
        Palette {
            hue_scale,
            ..Palette::default()
        }
    }

    /// Color for one escape result.
    pub fn paint(&self, escape: &Escape) -> Rgba<u8> {
        if !escape.escaped() {
            return self.interior;
        }
        let hue = escape.iterations as f64 / self.hue_scale * escape.norm_sqr;
        hsl_to_rgb(hue, 1.0, 0.5)
    }
}

/// Standard HSL to RGB.  The hue is measured in turns and wraps, so any
/// finite value is accepted; saturation and lightness are clamped to
/// [0, 1].
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgba<u8> {
    let h = hue - hue.floor();
    let s = saturation.max(0.0).min(1.0);
    let l = lightness.max(0.0).min(1.0);

    if s == 0.0 {
        let v = to_byte(l);
        return Rgba([v, v, v, 255]);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Rgba([
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
        255,
    ])
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t - t.floor();
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().max(0.0).min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgba([255, 0, 0, 255]));
        assert_eq!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Rgba([0, 255, 0, 255]));
        assert_eq!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn hue_wraps_in_turns() {
        assert_eq!(hsl_to_rgb(3.0, 1.0, 0.5), hsl_to_rgb(0.0, 1.0, 0.5));
        assert_eq!(hsl_to_rgb(-0.5, 1.0, 0.5), hsl_to_rgb(0.5, 1.0, 0.5));
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.5), Rgba([128, 128, 128, 255]));
        assert_eq!(hsl_to_rgb(0.3, 0.0, 1.0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn interior_is_white() {
        let escape = Escape {
            norm_sqr: 0.25,
            iterations: 1000,
            limit: 1000,
        };
        assert_eq!(Palette::default().paint(&escape), INTERIOR);
    }

    #[test]
    fn exterior_follows_the_hue_ramp() {
        let escape = Escape {
            norm_sqr: 5.0,
            iterations: 160,
            limit: 1000,
        };
        // 160 / 800 * 5 = 1 turn, which is red again.
        assert_eq!(Palette::default().paint(&escape), Rgba([255, 0, 0, 255]));
        let palette = Palette::with_hue_scale(2400.0);
        assert_eq!(palette.paint(&escape), Rgba([0, 255, 0, 255]));
    }
}
