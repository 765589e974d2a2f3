// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel, and the evaluator that wraps it for the
//! rasterizer.

use image::Rgba;
use num::Complex;

use crate::evaluator::Evaluator;
use crate::palette::Palette;
use crate::planes::Viewport;

/// Once |z|² passes this, the orbit is gone for good.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// Where an orbit stopped: the squared magnitude of `z` at the moment
/// we stopped looking, and how many iterations it took.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Escape {
    /// |z|² at the stopping point.
    pub norm_sqr: f64,
    /// Iterations completed before escape, or the budget if none.
    pub iterations: usize,
    /// The budget the orbit was run against.
    pub limit: usize,
}

impl Escape {
    /// True if the orbit left the escape radius within the budget.
    pub fn escaped(&self) -> bool {
        self.iterations < self.limit
    }
}

/// This is our classic iterator function.  The magnitude test happens
/// before each step, so a point that starts outside the radius after
/// its first step reports one iteration.
pub fn escape(c: Complex<f64>, limit: usize) -> Escape {
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    for i in 0..limit {
        let norm_sqr = z.norm_sqr();
        if norm_sqr > ESCAPE_RADIUS_SQR {
            return Escape {
                norm_sqr,
                iterations: i,
                limit,
            };
        }
        z = z * z + c;
    }
    Escape {
        norm_sqr: z.norm_sqr(),
        iterations: limit,
        limit,
    }
}

/// The Mandelbrot set as a sample evaluator: maps a pixel coordinate
/// through the viewport, runs the kernel, and colors the result.
#[derive(Copy, Clone, Debug)]
pub struct MandelbrotEvaluator {
    /// The window onto the complex plane.
    pub viewport: Viewport,
    /// Iteration budget per sample.
    pub max_iterations: usize,
    /// Color policy.
    pub palette: Palette,
}

impl MandelbrotEvaluator {
    /// An evaluator using the default palette.
    pub fn new(viewport: Viewport, max_iterations: usize) -> Self {
        MandelbrotEvaluator {
            viewport,
            max_iterations,
            palette: Palette::default(),
        }
    }

    /// Replace the color policy.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Runs the kernel for one pixel-space sample.
    pub fn escape_at(&self, x: f64, y: f64) -> Escape {
        escape(self.viewport.pixel_to_point(x, y), self.max_iterations)
    }

    /// The color for one pixel-space sample.
    pub fn color_at(&self, x: f64, y: f64) -> Rgba<u8> {
        self.palette.paint(&self.escape_at(x, y))
    }
}

impl Evaluator for MandelbrotEvaluator {
    fn evaluate(&self, x: f64, y: f64) -> Result<Rgba<u8>, failure::Error> {
        Ok(self.color_at(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic_view() -> Viewport {
        Viewport::centered(Complex::new(-0.5, 0.0), 3.0, 300, 300).unwrap()
    }

    #[test]
    fn origin_is_interior() {
        let evaluator = MandelbrotEvaluator::new(classic_view(), 100);
        let (x, y) = evaluator.viewport.point_to_pixel(Complex::new(0.0, 0.0));
        let result = evaluator.escape_at(x, y);
        assert!(!result.escaped());
        assert_eq!(result.iterations, 100);
    }

    #[test]
    fn far_corner_escapes_within_one_iteration() {
        let evaluator = MandelbrotEvaluator::new(classic_view(), 100);
        let (x, y) = evaluator.viewport.point_to_pixel(Complex::new(2.0, 2.0));
        let result = evaluator.escape_at(x, y);
        assert!(result.escaped());
        assert!(result.iterations <= 1);
        assert!(result.norm_sqr > ESCAPE_RADIUS_SQR);
    }

    #[test]
    fn escape_reports_magnitude_at_stop() {
        let result = escape(Complex::new(2.0, 2.0), 1000);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.norm_sqr, 8.0);
    }

    #[test]
    fn boundary_of_radius_is_not_an_escape() {
        // z lands exactly on |z|² = 4 and sits there.
        let result = escape(Complex::new(-2.0, 0.0), 50);
        assert!(!result.escaped());
        assert_eq!(result.norm_sqr, 4.0);
    }

    #[test]
    fn zero_budget_is_interior() {
        let result = escape(Complex::new(5.0, 5.0), 0);
        assert!(!result.escaped());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn interior_points_paint_white() {
        let evaluator = MandelbrotEvaluator::new(classic_view(), 200);
        let (x, y) = evaluator.viewport.point_to_pixel(Complex::new(-0.1, 0.1));
        assert_eq!(evaluator.color_at(x, y), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn exterior_points_are_not_white() {
        let evaluator = MandelbrotEvaluator::new(classic_view(), 200);
        let (x, y) = evaluator.viewport.point_to_pixel(Complex::new(0.5, 0.5));
        assert_ne!(evaluator.color_at(x, y), Rgba([255, 255, 255, 255]));
    }
}
