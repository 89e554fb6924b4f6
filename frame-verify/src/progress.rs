//! Console progress stream
//!
//! A dot per confirmed record, an explicit line for anything that needed
//! attention. Writes are best-effort: a closed stdout must not stop the batch.

use crate::services::record_extractor::CandidateRecord;
use std::io::Write;

pub struct ConsoleProgress {
    out: Box<dyn Write + Send>,
    /// A dot run is open on the current line
    mid_line: bool,
}

impl ConsoleProgress {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            mid_line: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Discard all progress output
    pub fn silent() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    pub fn matched(&mut self) {
        let _ = write!(self.out, ".");
        let _ = self.out.flush();
        self.mid_line = true;
    }

    pub fn mismatch(&mut self, record: &CandidateRecord, fetched_title: &str) {
        self.line(format!(
            "✗ Mismatch {}: expected \"{}\", found \"{}\"",
            record.current_id, record.clean_title, fetched_title
        ));
    }

    pub fn lookup_failed(&mut self, record: &CandidateRecord, error: &str) {
        self.line(format!(
            "✗ Lookup failed {} (\"{}\"): {}",
            record.current_id, record.clean_title, error
        ));
    }

    pub fn replaced(&mut self, record: &CandidateRecord, new_id: &str, found_title: &str) {
        self.line(format!(
            "  → {} replaced by {} (\"{}\")",
            record.current_id, new_id, found_title
        ));
    }

    pub fn flagged(&mut self, record: &CandidateRecord) {
        self.line(format!(
            "  ⚠ No candidate for \"{}\"; keeping {}",
            record.clean_title, record.current_id
        ));
    }

    /// Mirror a block of text (e.g. the corrected listing)
    pub fn block(&mut self, text: &str) {
        self.end_dot_run();
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    /// Close any open dot run
    pub fn finish(&mut self) {
        self.end_dot_run();
        let _ = self.out.flush();
    }

    fn line(&mut self, text: String) {
        self.end_dot_run();
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    fn end_dot_run(&mut self) {
        if self.mid_line {
            let _ = writeln!(self.out);
            self.mid_line = false;
        }
    }
}
