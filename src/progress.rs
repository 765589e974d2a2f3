// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progress observers.  Workers never call these directly; they drop
//! row indices into an unbounded channel, and a single consumer thread
//! owned by the rasterizer feeds them here.  A slow observer therefore
//! only delays its own output, never the render.

use std::io::Write;

use log::info;

/// Receives one notification per finished scanline.
pub trait ProgressObserver: Send {
    /// `row` has been fully written; `done` rows out of `total` are
    /// finished so far.  Rows arrive in completion order, not index
    /// order.
    fn row_finished(&mut self, row: usize, done: usize, total: usize);

    /// Every row is done and the channel is closed.
    fn finished(&mut self, _total: usize) {}
}

/// Collects the indices of finished rows.
impl ProgressObserver for Vec<usize> {
    fn row_finished(&mut self, row: usize, _done: usize, _total: usize) {
        self.push(row);
    }
}

/// The `n/total (p%)` counter, redrawn in place on stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    drawn: bool,
}

impl ConsoleProgress {
    /// A fresh counter.
    pub fn new() -> Self {
        ConsoleProgress::default()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn row_finished(&mut self, _row: usize, done: usize, total: usize) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // A closed stderr is not worth failing a render over.
        let _ = write!(handle, "\r{}/{} ({}%)", done, total, 100 * done / total.max(1));
        let _ = handle.flush();
        self.drawn = true;
    }

    fn finished(&mut self, _total: usize) {
        if self.drawn {
            eprintln!();
        }
    }
}

/// Logs at `info` each time another tenth of the rows is done.
#[derive(Default)]
pub struct LogProgress {
    last_decile: usize,
}

impl LogProgress {
    /// A fresh logger.
    pub fn new() -> Self {
        LogProgress::default()
    }
}

impl ProgressObserver for LogProgress {
    fn row_finished(&mut self, _row: usize, done: usize, total: usize) {
        let decile = 10 * done / total.max(1);
        if decile > self.last_decile {
            self.last_decile = decile;
            info!("rendered {}/{} rows ({}%)", done, total, 100 * done / total.max(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_collects_rows() {
        let mut rows: Vec<usize> = Vec::new();
        rows.row_finished(3, 1, 4);
        rows.row_finished(0, 2, 4);
        rows.finished(4);
        assert_eq!(rows, vec![3, 0]);
    }

    #[test]
    fn log_progress_advances_by_deciles() {
        let mut progress = LogProgress::new();
        progress.row_finished(0, 5, 100);
        assert_eq!(progress.last_decile, 0);
        progress.row_finished(1, 10, 100);
        assert_eq!(progress.last_decile, 1);
        progress.row_finished(2, 11, 100);
        assert_eq!(progress.last_decile, 1);
        progress.row_finished(3, 100, 100);
        assert_eq!(progress.last_decile, 10);
    }
}
