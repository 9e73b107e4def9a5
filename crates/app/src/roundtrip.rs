//! Round-trip drivers for the harness.
//!
//! Two phases, each writing through `blobio_core` and reading everything back:
//! - **Primitives**: a stream of samples of every kind in one buffer
//! - **String table**: a host interning a message stream for a client, then
//!   the client answering with the same strings

use blobio_core::bitio::STRING_LENGTH_BITS;
use blobio_core::{BitBuffer, Error, FrameShape, Role, SeekMode, StringTable};

use crate::report::Report;
use crate::sample_gen::Sample;

/// The first value that did not survive the round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Index of the offending value in the input sequence
    pub index: usize,
    /// Bit position the read started at
    pub position: usize,
    /// What was written
    pub expected: String,
    /// What came back, or the read error
    pub actual: String,
}

/// Write every sample into `buffer`, in order.
pub fn write_samples(buffer: &mut BitBuffer, samples: &[Sample], report: &mut Report) {
    for sample in samples {
        match sample {
            Sample::Bit(v) => buffer.write_bit(*v),
            Sample::Byte(v) => buffer.write_byte(*v),
            Sample::Short(v) => buffer.write_short(*v),
            Sample::UShort(v) => buffer.write_ushort(*v),
            Sample::Int(v) => buffer.write_int(*v),
            Sample::Long(v) => buffer.write_long(*v),
            Sample::Float(v) => buffer.write_float(*v),
            Sample::Str(v) => buffer.write_string(v),
            Sample::Partial { value, width } => buffer.write_partial_number(*value, *width),
        };
        tracing::trace!(kind = sample.kind(), bits = sample.bit_width(), "wrote sample");
        report.record_sample(sample.kind());
    }
    report.sample_bits += buffer.high_water_mark() as u64;
}

/// Read `samples` back from the start of `buffer` and compare.
///
/// Stops at the first mismatch or failed read and returns it.
pub fn verify_samples(
    buffer: &mut BitBuffer,
    samples: &[Sample],
    report: &mut Report,
) -> Option<Mismatch> {
    if !samples.is_empty() && !buffer.seek_bits(0, SeekMode::Begin) {
        report.read_failures += 1;
        return Some(Mismatch {
            index: 0,
            position: buffer.position(),
            expected: format!("{:?}", samples[0]),
            actual: "buffer is empty".to_string(),
        });
    }

    for (index, sample) in samples.iter().enumerate() {
        let position = buffer.position();
        let outcome = read_sample(buffer, sample);
        tracing::trace!(index, position, kind = sample.kind(), "verified sample");

        let actual = match outcome {
            Ok(read) if same_sample(&read, sample) => {
                report.samples_verified += 1;
                continue;
            }
            Ok(read) => {
                report.mismatches += 1;
                format!("{read:?}")
            }
            Err(err) => {
                report.read_failures += 1;
                err.to_string()
            }
        };

        return Some(Mismatch {
            index,
            position,
            expected: format!("{sample:?}"),
            actual,
        });
    }
    None
}

fn read_sample(buffer: &mut BitBuffer, like: &Sample) -> Result<Sample, Error> {
    Ok(match like {
        Sample::Bit(_) => Sample::Bit(buffer.try_read_bit()?),
        Sample::Byte(_) => Sample::Byte(buffer.try_read_byte()?),
        Sample::Short(_) => Sample::Short(buffer.try_read_short()?),
        Sample::UShort(_) => Sample::UShort(buffer.try_read_ushort()?),
        Sample::Int(_) => Sample::Int(buffer.try_read_int()?),
        Sample::Long(_) => Sample::Long(buffer.try_read_long()?),
        Sample::Float(_) => Sample::Float(buffer.try_read_float()?),
        Sample::Str(_) => Sample::Str(buffer.try_read_string()?),
        Sample::Partial { width, .. } => Sample::Partial {
            value: buffer.try_read_partial_number(*width)?,
            width: *width,
        },
    })
}

/// Floats compare by bit pattern, everything else by value.
fn same_sample(read: &Sample, written: &Sample) -> bool {
    match (read, written) {
        (Sample::Float(a), Sample::Float(b)) => a.to_bits() == b.to_bits(),
        _ => read == written,
    }
}

/// Run the full primitive phase: write, release, rewrap, verify.
pub fn run_primitive_round_trip(samples: &[Sample], report: &mut Report) -> Option<Mismatch> {
    let mut outbound = BitBuffer::new();
    write_samples(&mut outbound, samples, report);

    let bytes = outbound.release_array();
    report.sample_bytes += bytes.len() as u64;
    tracing::info!(
        samples = samples.len(),
        bytes = bytes.len(),
        "primitive stream encoded"
    );

    let mut inbound = BitBuffer::from_vec(bytes);
    verify_samples(&mut inbound, samples, report)
}

/// Send `messages` from a host table to a client table, then send them back.
///
/// The client reply is a mix of references (strings it learned) and literals
/// (a marker string the host never defined).
pub fn run_string_session(messages: &[String], report: &mut Report) -> Option<Mismatch> {
    let mut host = StringTable::new(Role::Host);
    let mut client = StringTable::new(Role::Client);

    let mut downstream = BitBuffer::new();
    for message in messages {
        report.record_frame(host.write_string(message, &mut downstream));
        report.plain_string_bits += (STRING_LENGTH_BITS + message.len() * 8) as u64;
    }
    report.frame_bits += downstream.high_water_mark() as u64;
    tracing::info!(
        frames = messages.len(),
        interned = host.len(),
        bits = downstream.high_water_mark(),
        "host stream encoded"
    );

    let mut inbound = BitBuffer::from_vec(downstream.release_array());
    if let Some(mismatch) = read_frames(&mut client, &mut inbound, messages, report) {
        return Some(mismatch);
    }

    let mut reply: Vec<String> = messages.to_vec();
    reply.push(format!("client-only-{}", messages.len()));

    let mut upstream = BitBuffer::new();
    for message in &reply {
        let shape = client.write_string(message, &mut upstream);
        if shape == FrameShape::Definition {
            tracing::warn!(message = %message, "client emitted a definition frame");
            report.mismatches += 1;
        }
        report.record_frame(shape);
    }
    report.frame_bits += upstream.high_water_mark() as u64;

    let minted = host.len();
    let mut inbound = BitBuffer::from_buffer(&upstream);
    let mismatch = read_frames(&mut host, &mut inbound, &reply, report);
    if host.len() != minted {
        report.mismatches += 1;
    }
    mismatch
}

fn read_frames(
    table: &mut StringTable,
    buffer: &mut BitBuffer,
    expected: &[String],
    report: &mut Report,
) -> Option<Mismatch> {
    for (index, message) in expected.iter().enumerate() {
        let position = buffer.position();
        let actual = match table.read_string(buffer) {
            Ok(read) if read == *message => continue,
            Ok(read) => {
                report.mismatches += 1;
                read
            }
            Err(err) => {
                report.read_failures += 1;
                err.to_string()
            }
        };

        return Some(Mismatch {
            index,
            position,
            expected: message.clone(),
            actual,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_gen::{generate_messages, generate_samples, generate_vocabulary};

    #[test]
    fn test_primitive_round_trip_passes() {
        let samples = generate_samples(42, 50);
        let mut report = Report::new();

        assert_eq!(run_primitive_round_trip(&samples, &mut report), None);
        assert_eq!(report.samples_verified, samples.len() as u64);
        let bits: usize = samples.iter().map(Sample::bit_width).sum();
        assert_eq!(report.sample_bits, bits as u64);
        assert_eq!(report.sample_bytes, bits.div_ceil(8) as u64);
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let mut buffer = BitBuffer::new();
        buffer.write_byte(1).write_byte(2);
        let expected = [Sample::Byte(1), Sample::Byte(3), Sample::Byte(4)];
        let mut report = Report::new();

        let mismatch = verify_samples(&mut buffer, &expected, &mut report).unwrap();
        assert_eq!(mismatch.index, 1);
        assert_eq!(mismatch.position, 8);
        assert_eq!(mismatch.actual, "Byte(2)");
        assert_eq!(report.mismatches, 1);
        assert_eq!(report.samples_verified, 1);
    }

    #[test]
    fn test_verify_reports_short_buffer() {
        let mut buffer = BitBuffer::new();
        buffer.write_bit(true);
        let mut report = Report::new();

        let mismatch = verify_samples(&mut buffer, &[Sample::Int(0)], &mut report).unwrap();
        assert_eq!(mismatch.index, 0);
        assert_eq!(report.read_failures, 1);
    }

    #[test]
    fn test_string_session_passes() {
        let vocabulary = generate_vocabulary(5, 6);
        let messages = generate_messages(6, &vocabulary, 80);
        let mut report = Report::new();

        assert_eq!(run_string_session(&messages, &mut report), None);
        assert!(report.passed());

        let distinct = {
            let mut seen: Vec<String> = messages.iter().map(|m| m.to_lowercase()).collect();
            seen.sort();
            seen.dedup();
            seen.len() as u64
        };
        assert_eq!(report.frames_definition, distinct);
        assert_eq!(report.frames_literal, 1);
        assert_eq!(
            report.frames_reference,
            (messages.len() as u64 - distinct) + messages.len() as u64
        );
        assert!(report.interning_ratio() < 1.0);
    }

    #[test]
    fn test_empty_session() {
        let mut report = Report::new();
        assert_eq!(run_string_session(&[], &mut report), None);
        assert_eq!(report.frames_literal, 1);
    }
}
