// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lookup tables for moving channel values between gamma-encoded
//! bytes and linear-light 16-bit intensities.
//!
//! Averaging gamma-encoded values directly darkens every edge the
//! supersampler touches, so each sample is linearized before it is
//! accumulated and the mean is re-encoded afterwards.  Doing the
//! `powf` per sample would dominate the render, hence the tables.

use once_cell::sync::Lazy;

/// The display gamma both tables are built against.
pub const GAMMA: f64 = 2.2;

/// Number of entries in the linear-to-gamma table.
pub const LINEAR_LEVELS: usize = 65536;

/// Process-wide tables, built on first use and never mutated.
pub static TABLES: Lazy<GammaTables> = Lazy::new(GammaTables::new);

/// Builds the gamma-encoded byte to linear intensity table.
pub fn gamma_to_linear_table() -> [u16; 256] {
    let mut out = [0_u16; 256];
    for (i, entry) in out.iter_mut().enumerate() {
        *entry = (65535.0 * (i as f64 / 255.0).powf(GAMMA)).round() as u16;
    }

    // Without this both 0 and 1 land on 0 and the darkest non-black
    // value is lost on the way through.
    out[1] = 1;
    out
}

/// Builds the linear intensity to gamma-encoded byte table.
pub fn linear_to_gamma_table() -> Box<[u8; LINEAR_LEVELS]> {
    let mut out = Box::new([0_u8; LINEAR_LEVELS]);
    for (i, entry) in out.iter_mut().enumerate() {
        *entry = (255.0 * (i as f64 / 65535.0).powf(1.0 / GAMMA)).round() as u8;
    }

    // The mirror of the fix-up above; the formula sends 1 to 2.
    out[1] = 1;
    out
}

/// Both conversion tables, bundled so workers can share one borrow.
pub struct GammaTables {
    to_linear: [u16; 256],
    to_gamma: Box<[u8; LINEAR_LEVELS]>,
}

impl GammaTables {
    /// Builds both tables.  Prefer the shared [`TABLES`] instance.
    pub fn new() -> Self {
        GammaTables {
            to_linear: gamma_to_linear_table(),
            to_gamma: linear_to_gamma_table(),
        }
    }

    /// Linearizes one gamma-encoded channel.
    #[inline]
    pub fn to_linear(&self, value: u8) -> u16 {
        self.to_linear[value as usize]
    }

    /// Gamma-encodes one linear channel.
    #[inline]
    pub fn to_gamma(&self, value: u16) -> u8 {
        self.to_gamma[value as usize]
    }
}

impl Default for GammaTables {
    fn default() -> Self {
        GammaTables::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darkest_values_survive_round_trip() {
        let tables = GammaTables::new();
        assert_eq!(tables.to_gamma(tables.to_linear(0)), 0);
        assert_eq!(tables.to_gamma(tables.to_linear(1)), 1);
    }

    #[test]
    fn every_byte_survives_round_trip() {
        let tables = GammaTables::new();
        for v in 0..=255_u8 {
            assert_eq!(tables.to_gamma(tables.to_linear(v)), v, "value {}", v);
        }
    }

    #[test]
    fn fix_up_touches_only_entry_one() {
        let g2l = gamma_to_linear_table();
        let l2g = linear_to_gamma_table();
        assert_eq!(g2l[1], 1);
        assert_eq!(l2g[1], 1);
        assert_eq!(g2l[0], 0);
        assert_eq!(g2l[2], 2);
        assert_eq!(l2g[0], 0);
        assert_eq!(l2g[2], 2);
    }

    #[test]
    fn endpoints_are_full_scale() {
        let g2l = gamma_to_linear_table();
        let l2g = linear_to_gamma_table();
        assert_eq!(g2l[255], 65535);
        assert_eq!(l2g[LINEAR_LEVELS - 1], 255);
    }

    #[test]
    fn gamma_to_linear_is_monotonic() {
        let g2l = gamma_to_linear_table();
        for pair in g2l.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn linear_to_gamma_is_monotonic() {
        let l2g = linear_to_gamma_table();
        for pair in l2g.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn shared_tables_match_fresh_ones() {
        let fresh = GammaTables::new();
        for v in 0..=255_u8 {
            assert_eq!(TABLES.to_linear(v), fresh.to_linear(v));
        }
    }
}
