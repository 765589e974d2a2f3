// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error, ResultExt};
use log::{error, info, log_enabled, Level};
use num::Complex;

use smoothbrot::{
    default_workers, ConsoleProgress, LogProgress, MandelbrotEvaluator, Palette, Rasterizer,
    Viewport,
};

/// Splits `left<separator>right` and parses both halves.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let (left, right) = s.split_once(separator)?;
    Some((left.trim().parse().ok()?, right.trim().parse().ok()?))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

// clap 2 validators are `Fn(String) -> Result<(), String>`; these build
// them so each argument states only what it accepts.

fn pair_of<T: FromStr + 'static>(
    separator: char,
    what: &'static str,
) -> impl Fn(String) -> Result<(), String> {
    move |s| {
        parse_pair::<T>(&s, separator)
            .map(|_| ())
            .ok_or_else(|| format!("Could not parse {} from {:?}", what, s))
    }
}

fn between<T>(low: T, high: T, what: &'static str) -> impl Fn(String) -> Result<(), String>
where
    T: FromStr + PartialOrd + Display + 'static,
{
    move |s| match s.parse::<T>() {
        Ok(v) if v >= low && v <= high => Ok(()),
        Ok(_) => Err(format!("{} must be between {} and {}", what, low, high)),
        Err(_) => Err(format!("Could not parse {} from {:?}", what, s)),
    }
}

fn real(
    what: &'static str,
    rule: &'static str,
    accept: fn(f64) -> bool,
) -> impl Fn(String) -> Result<(), String> {
    move |s| match s.parse::<f64>() {
        Ok(v) if v.is_finite() && accept(v) => Ok(()),
        Ok(_) => Err(format!("{} must be {}", what, rule)),
        Err(_) => Err(format!("Could not parse {} from {:?}", what, s)),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ORIGIN: &str = "origin";
const CENTER: &str = "center";
const SPAN: &str = "span";
const ITERATIONS: &str = "iterations";
const SAMPLES: &str = "samples";
const THREADS: &str = "threads";
const JITTER: &str = "jitter";
const HUE_SCALE: &str = "hue-scale";
const SEED: &str = "seed";
const QUIET: &str = "quiet";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = 4 * default_workers();

    App::new("smoothbrot")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Supersampled, gamma-correct Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension (png, pnm)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x1024")
                .validator(pair_of::<u32>('x', "output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(ORIGIN)
                .required(false)
                .long(ORIGIN)
                .short("p")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5557506,-0.55560")
                .validator(pair_of::<f64>(',', "origin"))
                .help("Complex coordinate of the top left corner of the image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(pair_of::<f64>(',', "center"))
                .help("Center the image on this complex coordinate instead of using --origin"),
        )
        .arg(
            Arg::with_name(SPAN)
                .required(false)
                .long(SPAN)
                .short("z")
                .takes_value(true)
                .default_value("0.000000001")
                .validator(real("Span", "positive", |v| v > 0.0))
                .help("Width of the image on the complex plane"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(between(1_usize, 10_000_000, "Iteration count"))
                .help("Iteration budget per sample"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .required(false)
                .long(SAMPLES)
                .short("a")
                .takes_value(true)
                .default_value("50")
                .validator(between(1_u32, 1024, "Sample count"))
                .help("Samples per pixel along each axis"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(between(1, max_threads, "Thread count"))
                .help("Number of worker threads (default: CPUs + 1)"),
        )
        .arg(
            Arg::with_name(JITTER)
                .required(false)
                .long(JITTER)
                .short("j")
                .takes_value(true)
                .default_value("0.44")
                .validator(real("Jitter", "non-negative", |v| v >= 0.0))
                .help("Standard deviation of the sample jitter, in pixels"),
        )
        .arg(
            Arg::with_name(HUE_SCALE)
                .required(false)
                .long(HUE_SCALE)
                .takes_value(true)
                .default_value("800")
                .validator(real("Hue scale", "positive", |v| v > 0.0))
                .help("Divisor of the hue ramp"),
        )
        .arg(
            Arg::with_name(SEED)
                .required(false)
                .long(SEED)
                .takes_value(true)
                .validator(between(0, std::u64::MAX, "Seed"))
                .help("Seed for the jitter generators"),
        )
        .arg(
            Arg::with_name(QUIET)
                .long(QUIET)
                .short("q")
                .help("Replace the progress counter with a log line every 10%"),
        )
        .get_matches()
}

/// Pulls a validated option back out of the matches.  clap has already
/// run the validators, so a failure here means a missing default.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| format_err!("missing value for --{}", name))?;
    T::from_str(raw).map_err(|_| format_err!("could not parse --{} value {:?}", name, raw))
}

fn viewport(matches: &ArgMatches, width: u32, height: u32) -> Result<Viewport, Error> {
    let span: f64 = value(matches, SPAN)?;
    let viewport = match matches.value_of(CENTER) {
        Some(center) => {
            let center =
                parse_complex(center).ok_or_else(|| format_err!("could not parse center"))?;
            Viewport::centered(center, span, width, height)?
        }
        None => {
            let origin = matches.value_of(ORIGIN).and_then(parse_complex);
            let origin = origin.ok_or_else(|| format_err!("could not parse origin"))?;
            Viewport::new(origin, span / f64::from(width))?
        }
    };
    Ok(viewport)
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<u32>(s, 'x'))
        .ok_or_else(|| format_err!("could not parse image size"))?;
    let viewport = viewport(matches, width, height)?;
    let iterations: usize = value(matches, ITERATIONS)?;
    let samples: u32 = value(matches, SAMPLES)?;
    let jitter: f64 = value(matches, JITTER)?;
    let hue_scale: f64 = value(matches, HUE_SCALE)?;

    let mut rasterizer = Rasterizer::new(width, height, samples).jitter(jitter);
    if matches.is_present(THREADS) {
        rasterizer = rasterizer.workers(value(matches, THREADS)?);
    }
    if matches.is_present(SEED) {
        rasterizer = rasterizer.seed(value(matches, SEED)?);
    }

    let evaluator =
        MandelbrotEvaluator::new(viewport, iterations).with_palette(Palette::with_hue_scale(hue_scale));

    info!("Rendering...");
    let start = Instant::now();
    let image = if !matches.is_present(QUIET) {
        rasterizer.render_with_progress(&evaluator, &mut ConsoleProgress::new())?
    } else if log_enabled!(Level::Info) {
        rasterizer.render_with_progress(&evaluator, &mut LogProgress::new())?
    } else {
        rasterizer.render(&evaluator)?
    };
    info!("Done rendering in {:?}", start.elapsed());

    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("no output file given"))?;
    info!("Encoding image to {}...", output);
    image
        .save(Path::new(output))
        .with_context(|_| format!("could not write {}", output))?;
    info!("Done!");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = args();
    if let Err(e) = run(&matches) {
        error!("Render failure: {}", e);
        for cause in e.iter_causes() {
            error!("  caused by: {}", cause);
        }
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
