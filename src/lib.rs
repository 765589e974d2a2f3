#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Supersampled Mandelbrot renderer
//!
//! A plain escape-time render samples each pixel once, at its corner
//! or center, and the boundary of the set turns into a field of
//! disconnected specks.  This crate samples each pixel many times at
//! randomly jittered positions and averages the results.
//!
//! The averaging is the subtle part.  Image bytes are gamma-encoded:
//! the byte 128 is nowhere near half as bright as 255.  Averaging
//! bytes directly makes every thin bright filament against a dark
//! background come out too dark, so each sample is pushed through a
//! lookup table into 16-bit linear light, summed there, and the mean
//! is encoded back.
//!
//! The rasterizer is generic over an [`Evaluator`], so it knows
//! nothing about fractals.  [`MandelbrotEvaluator`] is the one this
//! crate ships.

pub mod errors;
pub mod evaluator;
pub mod gamma;
pub mod mandelbrot;
pub mod palette;
pub mod planes;
pub mod progress;
pub mod raster;

pub use errors::RenderError;
pub use evaluator::{Evaluator, Fallible};
pub use gamma::{GammaTables, TABLES};
pub use mandelbrot::{escape, Escape, MandelbrotEvaluator};
pub use palette::{hsl_to_rgb, Palette};
pub use planes::Viewport;
pub use progress::{ConsoleProgress, LogProgress, ProgressObserver};
pub use raster::{default_workers, rasterize, Rasterizer, DEFAULT_JITTER};
