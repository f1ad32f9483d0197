//! Named wall-clock timing buckets.
//!
//! An [`Elapsed`] accumulates the total time and the number of runs per
//! name. Timings nest: `begin`/`end` work on a stack, and [`Elapsed::time`]
//! returns a guard that ends its timing when dropped, including during
//! unwinding.
//!
//! ```
//! use elapsed_timer::Elapsed;
//!
//! let mut e = Elapsed::new();
//! for _ in 0..3 {
//!     let mut outer = e.time("outer");
//!     for _ in 0..2 {
//!         let _inner = outer.time("inner");
//!     }
//! }
//! assert_eq!(e.result("outer").unwrap().count, 3);
//! assert_eq!(e.result("inner").unwrap().count, 6);
//! ```
//!
//! The accumulator is single-threaded; share it across threads only behind
//! your own lock.

mod report;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

pub use report::Report;

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    count: usize,
    sum: Duration,
}

#[derive(Debug, Default)]
pub struct Elapsed {
    buckets: BTreeMap<String, Bucket>,
    stack: Vec<(String, Instant)>,
    report_on_drop: bool,
}

impl Elapsed {
    pub fn new() -> Self {
        Self::default()
    }

    /// An accumulator that prints the report for every bucket to stdout
    /// when it is dropped.
    pub fn report_on_drop() -> Self {
        Self {
            buckets: BTreeMap::new(),
            stack: Vec::new(),
            report_on_drop: true,
        }
    }

    /// Starts timing `name`. Nested calls are allowed.
    pub fn begin(&mut self, name: impl Into<String>) {
        let name = name.into();
        trace!(name = %name, depth = self.stack.len(), "begin");
        self.stack.push((name, Instant::now()));
    }

    /// Ends the most recent open timing and returns its duration.
    ///
    /// # Panics
    ///
    /// Panics when no timing is open.
    pub fn end(&mut self) -> Duration {
        match self.try_end() {
            Some(elapsed) => elapsed,
            None => panic!("Elapsed::end called without a matching begin"),
        }
    }

    /// Ends the most recent open timing, or returns `None` when none is open.
    pub fn try_end(&mut self) -> Option<Duration> {
        let (name, started) = self.stack.pop()?;
        let elapsed = started.elapsed();
        trace!(name = %name, ?elapsed, "end");
        let bucket = self.buckets.entry(name).or_default();
        bucket.count += 1;
        bucket.sum += elapsed;
        Some(elapsed)
    }

    /// Times the scope of the returned guard under `name`.
    ///
    /// The guard dereferences to the accumulator, so scopes nest through it.
    pub fn time(&mut self, name: impl Into<String>) -> Timer<'_> {
        self.begin(name);
        Timer { elapsed: self }
    }

    /// Runs `f` inside a timing named `name`.
    pub fn measure<R, F>(&mut self, name: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut Elapsed) -> R,
    {
        let mut timer = self.time(name);
        f(&mut *timer)
    }

    /// Number of timings currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn result(&self, name: &str) -> Option<Report<'_>> {
        self.buckets
            .get_key_value(name)
            .map(|(name, b)| Report::new(name, b.count, b.sum))
    }

    /// Reports for every bucket, sorted by name.
    pub fn results(&self) -> Vec<Report<'_>> {
        self.buckets
            .iter()
            .map(|(name, b)| Report::new(name, b.count, b.sum))
            .collect()
    }

    /// Writes one report line per name to stdout. See [`Elapsed::write_report`].
    ///
    /// Output is best-effort: a failed write is logged, not returned. Use
    /// `write_report` when the caller needs the error.
    pub fn print(&self, names: &[&str]) {
        let stdout = io::stdout();
        if let Err(err) = self.write_report(&mut stdout.lock(), names) {
            warn!(%err, "failed to print timing report");
        }
    }

    /// Writes one line per name: the bucket's report, or a not-executed
    /// notice for names that never ran. An empty `names` covers every bucket.
    pub fn write_report<W: Write>(&self, out: &mut W, names: &[&str]) -> io::Result<()> {
        if names.is_empty() {
            for report in self.results() {
                writeln!(out, "{report}")?;
            }
            return Ok(());
        }
        for name in names {
            match self.result(name) {
                Some(report) => writeln!(out, "{report}")?,
                None => writeln!(out, "`{name}` is not executed.")?,
            }
        }
        Ok(())
    }
}

impl Drop for Elapsed {
    fn drop(&mut self) {
        if self.report_on_drop {
            self.print(&[]);
        }
    }
}

/// Guard returned by [`Elapsed::time`]; ends its timing on drop.
pub struct Timer<'a> {
    elapsed: &'a mut Elapsed,
}

impl Deref for Timer<'_> {
    type Target = Elapsed;

    fn deref(&self) -> &Elapsed {
        self.elapsed
    }
}

impl DerefMut for Timer<'_> {
    fn deref_mut(&mut self) -> &mut Elapsed {
        self.elapsed
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.elapsed.try_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_end_accumulates() {
        let mut e = Elapsed::new();
        e.begin("a");
        let first = e.end();
        e.begin("a");
        let second = e.end();
        let report = e.result("a").unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.sum, first + second);
        assert_eq!(e.depth(), 0);
    }

    #[test]
    fn unknown_name_has_no_result() {
        assert!(Elapsed::new().result("missing").is_none());
    }

    #[test]
    fn try_end_on_empty_stack() {
        assert_eq!(Elapsed::new().try_end(), None);
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_report_surfaces_writer_errors() {
        let mut e = Elapsed::new();
        e.measure("m", |_| ());
        let err = e.write_report(&mut Closed, &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn measure_returns_closure_value() {
        let mut e = Elapsed::new();
        let depth = e.measure("m", |e| e.depth());
        assert_eq!(depth, 1);
        assert_eq!(e.result("m").unwrap().count, 1);
    }
}
