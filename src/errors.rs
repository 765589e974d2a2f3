// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can make a render fail.  There is no partial
//! success: either every row of the image is populated, or the caller
//! gets one of these.

use failure::Fail;

/// Failures raised by the rasterizer and the viewport constructors.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// Width or height was zero.
    #[fail(display = "image dimensions must be positive, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The per-axis sample count was zero.
    #[fail(display = "samples per axis must be at least 1")]
    InvalidSamples,

    /// The worker pool was configured with no workers.
    #[fail(display = "worker count must be at least 1")]
    InvalidWorkers,

    /// The jitter deviation was negative, infinite or NaN.
    #[fail(display = "jitter deviation must be finite and non-negative, got {}", _0)]
    InvalidJitter(f64),

    /// The pixel buffer size does not fit in memory addressing.
    #[fail(display = "an image of {}x{} pixels is too large to address", width, height)]
    TooLarge {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The allocator refused the pixel buffer.
    #[fail(display = "could not allocate {} bytes for the image buffer", bytes)]
    Allocation {
        /// Size of the refused allocation.
        bytes: usize,
    },

    /// An evaluator failed; the whole render is abandoned.
    #[fail(display = "sample evaluation failed at ({}, {}): {}", x, y, cause)]
    Evaluator {
        /// Image-space x coordinate of the failed sample.
        x: f64,
        /// Image-space y coordinate of the failed sample.
        y: f64,
        /// Whatever the evaluator reported.
        cause: failure::Error,
    },

    /// A worker thread panicked before finishing its rows.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,

    /// The complex-plane window could not be built.
    #[fail(display = "invalid viewport: {}", _0)]
    InvalidViewport(String),
}
