// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The capability the rasterizer consumes: something that colors a
//! continuous pixel-space coordinate.  The rasterizer knows nothing
//! about fractals; it only asks for colors.

use image::Rgba;

/// Maps a continuous image-space coordinate to a gamma-encoded color.
///
/// Coordinates are pixel units with (0, 0) at the top-left corner of
/// the image.  Jittered samples regularly fall outside the image, so
/// implementations must accept any finite input.  Evaluators are shared
/// by every worker, hence `Sync`.
pub trait Evaluator: Sync {
    /// Colors one sample.  Any error aborts the whole render.
    fn evaluate(&self, x: f64, y: f64) -> Result<Rgba<u8>, failure::Error>;
}

impl<F> Evaluator for F
where
    F: Fn(f64, f64) -> Rgba<u8> + Sync,
{
    #[inline]
    fn evaluate(&self, x: f64, y: f64) -> Result<Rgba<u8>, failure::Error> {
        Ok(self(x, y))
    }
}

/// Adapts a closure that can fail.
pub struct Fallible<F>(pub F);

impl<F> Evaluator for Fallible<F>
where
    F: Fn(f64, f64) -> Result<Rgba<u8>, failure::Error> + Sync,
{
    #[inline]
    fn evaluate(&self, x: f64, y: f64) -> Result<Rgba<u8>, failure::Error> {
        (self.0)(x, y)
    }
}
