// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes the relationship
//! between continuous pixel coordinates (origin at the top-left corner
//! of the image, y growing downward) and a window on the complex
//! plane.  The rasterizer hands out jittered sample positions that may
//! land outside the image, so the mapping is defined for any finite
//! input, not just for integral pixels.
use num::Complex;

use crate::errors::RenderError;

/// An affine map from pixel space to the complex plane: a point at
/// pixel coordinate `(x, y)` lands on `origin + (x, y) * scale`.
/// Pixels are square, so one scale serves both axes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// The complex coordinate of the top-left corner of pixel (0, 0).
    pub origin: Complex<f64>,
    /// The width (and height) of one pixel on the complex plane.
    pub scale: f64,
}

impl Viewport {
    /// A viewport with an explicit origin and per-pixel scale.
    pub fn new(origin: Complex<f64>, scale: f64) -> Result<Viewport, RenderError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::InvalidViewport(format!(
                "scale must be finite and positive, got {}",
                scale
            )));
        }
        if !(origin.re.is_finite() && origin.im.is_finite()) {
            return Err(RenderError::InvalidViewport(
                "origin must be a finite point".to_string(),
            ));
        }
        Ok(Viewport { origin, scale })
    }

    /// Constructor.  Takes the width of the image in pixels and the two
    /// corners of the complex window.  The scale is taken from the
    /// horizontal extent; the vertical extent of the image follows from
    /// the pixel height, and `rightupper.im` only has to lie above
    /// `leftlower.im`.
    pub fn from_corners(
        width: u32,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<Viewport, RenderError> {
        if width == 0 {
            return Err(RenderError::InvalidViewport(
                "the image must be at least one pixel wide".to_string(),
            ));
        }
        if rightupper.re <= leftlower.re {
            return Err(RenderError::InvalidViewport(
                "the left lower corner is not to the left of the right upper corner".to_string(),
            ));
        }
        if rightupper.im <= leftlower.im {
            return Err(RenderError::InvalidViewport(
                "the left lower corner is not lower than the right upper corner".to_string(),
            ));
        }
        Viewport::new(leftlower, (rightupper.re - leftlower.re) / f64::from(width))
    }

    /// A viewport of the given complex-plane `span` (horizontal extent)
    /// centered on `center` for an image of `width` by `height` pixels.
    pub fn centered(
        center: Complex<f64>,
        span: f64,
        width: u32,
        height: u32,
    ) -> Result<Viewport, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport(
                "the image must have at least one pixel".to_string(),
            ));
        }
        let scale = span / f64::from(width);
        let half = Complex::new(f64::from(width), f64::from(height)) * (scale / 2.0);
        Viewport::new(center - half, scale)
    }

    /// Maps a continuous pixel coordinate onto the complex plane.
    #[inline]
    pub fn pixel_to_point(&self, x: f64, y: f64) -> Complex<f64> {
        Complex::new(
            self.origin.re + x * self.scale,
            self.origin.im + y * self.scale,
        )
    }

    /// The inverse map.  Used mostly to locate a known complex point in
    /// the image.
    #[inline]
    pub fn point_to_pixel(&self, point: Complex<f64>) -> (f64, f64) {
        (
            (point.re - self.origin.re) / self.scale,
            (point.im - self.origin.im) / self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_fails_on_bad_shape() {
        let vp = Viewport::from_corners(4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert!(vp.is_err());
        let vp = Viewport::from_corners(4, Complex::new(1.0, -1.0), Complex::new(-1.0, 1.0));
        assert!(vp.is_err());
    }

    #[test]
    fn viewport_fails_on_degenerate_scale() {
        assert!(Viewport::new(Complex::new(0.0, 0.0), 0.0).is_err());
        assert!(Viewport::new(Complex::new(0.0, 0.0), -1.0).is_err());
        assert!(Viewport::new(Complex::new(0.0, 0.0), std::f64::NAN).is_err());
        assert!(Viewport::new(Complex::new(std::f64::INFINITY, 0.0), 1.0).is_err());
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        let vp = Viewport::from_corners(4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(vp.is_ok());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let vp = Viewport::from_corners(5, Complex::new(0.0, 0.0), Complex::new(5.0, 5.0)).unwrap();
        assert_eq!(vp.pixel_to_point(0.0, 0.0), Complex::new(0.0, 0.0));
        assert_eq!(vp.pixel_to_point(2.0, 2.0), Complex::new(2.0, 2.0));
        assert_eq!(vp.pixel_to_point(4.5, 4.5), Complex::new(4.5, 4.5));
    }

    #[test]
    fn pixel_to_point_on_mixed_planes() {
        let vp =
            Viewport::from_corners(4, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        assert_eq!(vp.pixel_to_point(2.0, 2.0), Complex::new(0.0, 0.0));
        assert_eq!(vp.pixel_to_point(0.0, 0.0), Complex::new(-2.0, -2.0));
        assert_eq!(vp.pixel_to_point(4.0, 4.0), Complex::new(2.0, 2.0));
    }

    #[test]
    fn pixel_to_point_tolerates_samples_outside_the_image() {
        let vp =
            Viewport::from_corners(4, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        assert_eq!(vp.pixel_to_point(-1.0, 5.0), Complex::new(-3.0, 3.0));
    }

    #[test]
    fn centered_viewport_puts_center_in_the_middle() {
        let vp = Viewport::centered(Complex::new(-0.5, 0.0), 3.0, 300, 300).unwrap();
        assert!((vp.origin.re + 2.0).abs() < 1e-12);
        assert!((vp.origin.im + 1.5).abs() < 1e-12);
        let (x, y) = vp.point_to_pixel(Complex::new(-0.5, 0.0));
        assert!((x - 150.0).abs() < 1e-9);
        assert!((y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn point_to_pixel_inverts_pixel_to_point() {
        let vp = Viewport::new(Complex::new(-0.5557506, -0.5556), 1e-9 / 1024.0).unwrap();
        let point = vp.pixel_to_point(512.25, 100.75);
        let (x, y) = vp.point_to_pixel(point);
        assert!((x - 512.25).abs() < 1e-3);
        assert!((y - 100.75).abs() < 1e-3);
    }
}
