// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parallel rasterizer.
//!
//! The image is cut into scanlines.  A fixed pool of scoped worker
//! threads pulls rows off a shared queue; each claim hands the worker
//! the row index together with the only mutable borrow of that row's
//! bytes, so no two workers can ever touch the same pixel and the
//! buffer itself needs no lock.  Every pixel is sampled `s * s` times
//! at Gaussian-jittered positions around its center, the samples are
//! averaged in linear light through the gamma tables, and the mean is
//! re-encoded.

use std::iter::Enumerate;
use std::slice::ChunksMut;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crossbeam::channel::{self, Sender};
use crossbeam::thread::ScopedJoinHandle;
use image::{ImageBuffer, RgbaImage};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::errors::RenderError;
use crate::evaluator::Evaluator;
use crate::gamma::{GammaTables, TABLES};
use crate::progress::ProgressObserver;

/// Standard deviation of the sample jitter, in pixels.  Three sigma is
/// a little over one pixel: soft, but not blurry.
pub const DEFAULT_JITTER: f64 = 0.44;

/// One worker per CPU, plus one to keep the cores busy while another
/// waits on the row queue.
pub fn default_workers() -> usize {
    num_cpus::get() + 1
}

/// Renders `width` by `height` pixels with `samples_per_axis²` samples
/// per pixel, on the default worker pool and without progress output.
///
/// `evaluator` is called `width * height * samples_per_axis²` times,
/// from several threads at once, with coordinates that may fall
/// outside the image.
pub fn rasterize<E: Evaluator>(
    width: u32,
    height: u32,
    samples_per_axis: u32,
    evaluator: &E,
) -> Result<RgbaImage, RenderError> {
    Rasterizer::new(width, height, samples_per_axis).render(evaluator)
}

/// A configured render.  Once built, a rasterizer can be run any
/// number of times against different evaluators.
#[derive(Clone, Debug)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    samples: u32,
    workers: usize,
    jitter: f64,
    seed: Option<u64>,
}

impl Rasterizer {
    /// A rasterizer for an image of the given size and per-axis sample
    /// count, with default jitter and worker pool.  Nothing is checked
    /// until the render starts.
    pub fn new(width: u32, height: u32, samples_per_axis: u32) -> Self {
        Rasterizer {
            width,
            height,
            samples: samples_per_axis,
            workers: default_workers(),
            jitter: DEFAULT_JITTER,
            seed: None,
        }
    }

    /// Size of the worker pool.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Standard deviation of the jitter, in pixels.  Zero samples every
    /// pixel at its exact center.
    pub fn jitter(mut self, sigma: f64) -> Self {
        self.jitter = sigma;
        self
    }

    /// Seed for the per-worker generators.  With a single worker this
    /// makes the render reproducible; with more, the assignment of rows
    /// to workers still varies from run to run.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Renders silently.
    pub fn render<E: Evaluator>(&self, evaluator: &E) -> Result<RgbaImage, RenderError> {
        self.run(evaluator, None)
    }

    /// Renders, feeding one event per finished row to `observer`.
    pub fn render_with_progress<E: Evaluator>(
        &self,
        evaluator: &E,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RgbaImage, RenderError> {
        self.run(evaluator, Some(observer))
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples == 0 {
            return Err(RenderError::InvalidSamples);
        }
        if self.workers == 0 {
            return Err(RenderError::InvalidWorkers);
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(RenderError::InvalidJitter(self.jitter));
        }
        Ok(())
    }

    fn allocate(&self) -> Result<Vec<u8>, RenderError> {
        let too_large = || RenderError::TooLarge {
            width: self.width,
            height: self.height,
        };
        let bytes = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(too_large)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(bytes)
            .map_err(|_| RenderError::Allocation { bytes })?;
        pixels.resize(bytes, 0);
        Ok(pixels)
    }

    fn run<E: Evaluator>(
        &self,
        evaluator: &E,
        observer: Option<&mut dyn ProgressObserver>,
    ) -> Result<RgbaImage, RenderError> {
        self.validate()?;
        let mut pixels = self.allocate()?;

        let jitter = if self.jitter > 0.0 {
            Some(
                Normal::new(0.0, self.jitter)
                    .map_err(|_| RenderError::InvalidJitter(self.jitter))?,
            )
        } else {
            None
        };
        let base_seed = self.seed.unwrap_or_else(rand::random);
        let tables: &GammaTables = &TABLES;
        let total = self.height as usize;
        let stride = self.width as usize * 4;
        let samples = u64::from(self.samples) * u64::from(self.samples);

        info!(
            "rendering {}x{} at {} samples per pixel on {} workers",
            self.width, self.height, samples, self.workers
        );
        let start = Instant::now();

        {
            let queue = RowQueue::new(&mut pixels, stride);
            let queue = &queue;

            let outcome = crossbeam::scope(|spawner| {
                let (sender, reporter) = match observer {
                    Some(observer) => {
                        let (tx, rx) = channel::unbounded::<usize>();
                        let reporter = spawner.spawn(move |_| {
                            let mut done = 0;
                            for row in rx.iter() {
                                done += 1;
                                observer.row_finished(row, done, total);
                            }
                            observer.finished(total);
                        });
                        (Some(tx), Some(reporter))
                    }
                    None => (None, None),
                };

                let handles: Vec<ScopedJoinHandle<Result<(), RenderError>>> = (0..self.workers)
                    .map(|index| {
                        let worker = Worker {
                            evaluator,
                            tables,
                            jitter,
                            samples,
                            rng: StdRng::seed_from_u64(base_seed.wrapping_add(index as u64)),
                            progress: sender.clone(),
                        };
                        spawner.spawn(move |_| {
                            let _guard = AbandonOnPanic(queue);
                            let result = worker.run(queue);
                            if result.is_err() {
                                queue.abandon();
                            }
                            result
                        })
                    })
                    .collect();

                // The reporter's loop ends once the last worker's sender
                // is gone, so ours must go first.
                drop(sender);

                let mut outcome = Ok(());
                for handle in handles {
                    let result = handle.join().unwrap_or(Err(RenderError::WorkerPanicked));
                    if let Err(e) = result {
                        if outcome.is_ok() {
                            outcome = Err(e);
                        }
                    }
                }
                if let Some(reporter) = reporter {
                    if reporter.join().is_err() && outcome.is_ok() {
                        outcome = Err(RenderError::WorkerPanicked);
                    }
                }
                outcome
            });

            match outcome {
                Ok(result) => result?,
                Err(_) => return Err(RenderError::WorkerPanicked),
            }
        }

        debug!("rendered {} rows in {:?}", total, start.elapsed());

        ImageBuffer::from_raw(self.width, self.height, pixels).ok_or(RenderError::TooLarge {
            width: self.width,
            height: self.height,
        })
    }
}

/// Hands out each row of the buffer exactly once.  After a failure it
/// stops handing out anything, so the remaining workers drain quickly.
struct RowQueue<'a> {
    rows: Mutex<Enumerate<ChunksMut<'a, u8>>>,
    failed: AtomicBool,
}

impl<'a> RowQueue<'a> {
    fn new(pixels: &'a mut [u8], stride: usize) -> Self {
        RowQueue {
            rows: Mutex::new(pixels.chunks_mut(stride).enumerate()),
            failed: AtomicBool::new(false),
        }
    }

    fn claim(&self) -> Option<(usize, &'a mut [u8])> {
        if self.failed.load(Ordering::Acquire) {
            return None;
        }
        // A poisoned lock only means another worker panicked while
        // holding it; the iterator inside is still consistent.
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.next()
    }

    fn abandon(&self) {
        self.failed.store(true, Ordering::Release);
    }
}

struct AbandonOnPanic<'q, 'a>(&'q RowQueue<'a>);

impl<'q, 'a> Drop for AbandonOnPanic<'q, 'a> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abandon();
        }
    }
}

/// Everything one worker thread owns or borrows.
struct Worker<'r, E> {
    evaluator: &'r E,
    tables: &'r GammaTables,
    jitter: Option<Normal<f64>>,
    samples: u64,
    rng: StdRng,
    progress: Option<Sender<usize>>,
}

impl<'r, E: Evaluator> Worker<'r, E> {
    fn run(mut self, queue: &RowQueue) -> Result<(), RenderError> {
        while let Some((y, row)) = queue.claim() {
            self.scanline(y, row)?;
            if let Some(progress) = &self.progress {
                // Unbounded, so this never blocks; a vanished reporter
                // costs us nothing but the report.
                let _ = progress.send(y);
            }
        }
        Ok(())
    }

    fn scanline(&mut self, y: usize, row: &mut [u8]) -> Result<(), RenderError> {
        let fy = y as f64 + 0.5;
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let fx = x as f64 + 0.5;
            let (mut r, mut g, mut b) = (0_u64, 0_u64, 0_u64);

            for _ in 0..self.samples {
                let (sx, sy) = match self.jitter {
                    Some(normal) => (
                        fx + normal.sample(&mut self.rng),
                        fy + normal.sample(&mut self.rng),
                    ),
                    None => (fx, fy),
                };
                let color = self
                    .evaluator
                    .evaluate(sx, sy)
                    .map_err(|cause| RenderError::Evaluator { x: sx, y: sy, cause })?;

                r += u64::from(self.tables.to_linear(color[0]));
                g += u64::from(self.tables.to_linear(color[1]));
                b += u64::from(self.tables.to_linear(color[2]));
            }

            pixel[0] = self.tables.to_gamma((r / self.samples) as u16);
            pixel[1] = self.tables.to_gamma((g / self.samples) as u16);
            pixel[2] = self.tables.to_gamma((b / self.samples) as u16);
            pixel[3] = 255;
        }
        Ok(())
    }
}
