//! The progress emitter: a side channel for percentage updates, ticked at a
//! fixed record cadence during the streaming pass.

use std::io::Write;

/// Receives percentage updates (`0..=99`) while an analysis is running. The
/// terminal 100% is never emitted here — the caller produces it once the
/// final report is in hand.
pub trait ProgressSink {
    fn on_progress(&mut self, percent: u8);
}

/// Writes `PROGRESS:<n>\n` lines to an arbitrary writer, matching the
/// external protocol named in the analyzer's entry-point contract.
pub struct StreamProgressSink<W> {
    writer: W,
}

impl<W: Write> StreamProgressSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ProgressSink for StreamProgressSink<W> {
    fn on_progress(&mut self, percent: u8) {
        let _ = writeln!(self.writer, "PROGRESS:{percent}");
        let _ = self.writer.flush();
    }
}

/// Discards progress updates; useful for library callers and tests that
/// only care about the final report.
#[derive(Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_progress(&mut self, _percent: u8) {}
}
