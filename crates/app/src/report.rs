//! Round-trip report for the harness.
//!
//! Counts what was written and read back in each phase of a run:
//! - Primitive samples by kind, with bits and bytes produced
//! - String table frames by shape, and bits saved by references
//! - Mismatches and decode failures
//!
//! # Thread Safety
//!
//! The `Report` struct is NOT thread-safe. The harness is single-threaded and
//! updates it explicitly after each step.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use blobio_core::FrameShape;

/// Counters collected across a harness run.
#[derive(Debug, Clone)]
pub struct Report {
    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Primitive round trip ===
    /// Samples written, by kind
    pub samples_written: BTreeMap<&'static str, u64>,

    /// Samples read back and matched
    pub samples_verified: u64,

    /// Bits written by the primitive phase
    pub sample_bits: u64,

    /// Bytes released by the primitive phase
    pub sample_bytes: u64,

    // === String table session ===
    /// Reference frames written
    pub frames_reference: u64,

    /// Definition frames written
    pub frames_definition: u64,

    /// Literal frames written
    pub frames_literal: u64,

    /// Bits written by the string table session
    pub frame_bits: u64,

    /// Bits the same strings would take as plain length-prefixed strings
    pub plain_string_bits: u64,

    // === Failures ===
    /// Values that read back different from what was written
    pub mismatches: u64,

    /// Reads that failed outright
    pub read_failures: u64,
}

impl Report {
    /// Create a new report with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            samples_written: BTreeMap::new(),
            samples_verified: 0,
            sample_bits: 0,
            sample_bytes: 0,
            frames_reference: 0,
            frames_definition: 0,
            frames_literal: 0,
            frame_bits: 0,
            plain_string_bits: 0,
            mismatches: 0,
            read_failures: 0,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Record one written sample of `kind`.
    pub fn record_sample(&mut self, kind: &'static str) {
        *self.samples_written.entry(kind).or_insert(0) += 1;
    }

    /// Record one written string table frame.
    pub fn record_frame(&mut self, shape: FrameShape) {
        match shape {
            FrameShape::Reference => self.frames_reference += 1,
            FrameShape::Definition => self.frames_definition += 1,
            FrameShape::Literal => self.frames_literal += 1,
        }
    }

    /// Total samples written across all kinds.
    pub fn total_samples(&self) -> u64 {
        self.samples_written.values().sum()
    }

    /// Total string table frames written.
    pub fn total_frames(&self) -> u64 {
        self.frames_reference + self.frames_definition + self.frames_literal
    }

    /// Compute frame size relative to plain strings (frame / plain).
    ///
    /// Returns 0.0 if no strings were sent.
    pub fn interning_ratio(&self) -> f64 {
        if self.plain_string_bits == 0 {
            0.0
        } else {
            self.frame_bits as f64 / self.plain_string_bits as f64
        }
    }

    /// True when every value came back intact.
    pub fn passed(&self) -> bool {
        self.mismatches == 0 && self.read_failures == 0
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Round-Trip Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("=== Primitives ===");
        for (kind, count) in &self.samples_written {
            println!("{kind:>8}: {count}");
        }
        println!("Written: {}", self.total_samples());
        println!("Verified: {}", self.samples_verified);
        println!("Size: {} bits ({} bytes)", self.sample_bits, self.sample_bytes);
        println!();

        println!("=== String Table ===");
        println!("Frames: {}", self.total_frames());
        println!("  definitions: {}", self.frames_definition);
        println!("  references:  {}", self.frames_reference);
        println!("  literals:    {}", self.frames_literal);
        println!("Frame bits: {} (plain strings: {})", self.frame_bits, self.plain_string_bits);
        println!("Ratio: {:.1}%", self.interning_ratio() * 100.0);
        println!();

        println!("=== Failures ===");
        println!("Mismatches: {}", self.mismatches);
        println!("Read failures: {}", self.read_failures);
        println!();
    }

    /// Print just the final result (pass/fail).
    pub fn print_result(&self) {
        if self.passed() {
            println!("✓ Round trip completed successfully");
            println!(
                "  {} samples and {} frames verified in {} ms",
                self.samples_verified,
                self.total_frames(),
                self.duration().as_millis()
            );
        } else if self.read_failures > 0 {
            println!("✗ Round trip failed: {} reads failed", self.read_failures);
        } else {
            println!("✗ Round trip failed: {} values mismatched", self.mismatches);
        }
    }

    /// Export counters as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             samples_written={}\n\
             samples_verified={}\n\
             sample_bits={}\n\
             frames_definition={}\n\
             frames_reference={}\n\
             frames_literal={}\n\
             interning_ratio={:.4}\n\
             mismatches={}\n\
             read_failures={}\n",
            self.duration().as_millis(),
            self.total_samples(),
            self.samples_verified,
            self.sample_bits,
            self.frames_definition,
            self.frames_reference,
            self.frames_literal,
            self.interning_ratio(),
            self.mismatches,
            self.read_failures,
        )
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = Report::new();
        assert!(report.end_time.is_none());
        assert!(report.passed());
        assert_eq!(report.total_samples(), 0);
    }

    #[test]
    fn test_record_sample_and_frame() {
        let mut report = Report::new();
        report.record_sample("int");
        report.record_sample("int");
        report.record_sample("bit");
        report.record_frame(FrameShape::Definition);
        report.record_frame(FrameShape::Reference);
        report.record_frame(FrameShape::Reference);

        assert_eq!(report.samples_written["int"], 2);
        assert_eq!(report.total_samples(), 3);
        assert_eq!(report.frames_reference, 2);
        assert_eq!(report.total_frames(), 3);
    }

    #[test]
    fn test_interning_ratio() {
        let mut report = Report::new();
        assert_eq!(report.interning_ratio(), 0.0);

        report.frame_bits = 250;
        report.plain_string_bits = 1000;
        assert_eq!(report.interning_ratio(), 0.25);
    }

    #[test]
    fn test_failures_flip_result() {
        let mut report = Report::new();
        report.mismatches = 1;
        assert!(!report.passed());
    }

    #[test]
    fn test_export_text() {
        let mut report = Report::new();
        report.record_sample("byte");
        report.samples_verified = 1;
        report.complete();

        let text = report.export_text();
        assert!(text.contains("samples_written=1"));
        assert!(text.contains("samples_verified=1"));
        assert!(text.contains("mismatches=0"));
    }
}
