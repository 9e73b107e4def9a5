//! Seeded sample generation for the round-trip harness.
//!
//! Samples cover every primitive the bit buffer can encode, interleaved so
//! that most multi-byte values land on unaligned cursors. Strings mix ASCII
//! with multi-byte UTF-8 so the length prefix counts bytes, not characters.
//!
//! All randomness comes from a seeded ChaCha8 RNG; the same seed always
//! yields the same samples.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Characters strings are built from, including multi-byte code points.
const ALPHABET: &[char] = &['a', 'b', 'c', 'x', 'y', 'z', ' ', '"', 'é', 'ß', 'λ', '→', '音'];

/// One value written to and read back from a bit buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Bit(bool),
    Byte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Str(String),
    Partial { value: u32, width: u32 },
}

impl Sample {
    /// Short kind name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Sample::Bit(_) => "bit",
            Sample::Byte(_) => "byte",
            Sample::Short(_) => "short",
            Sample::UShort(_) => "ushort",
            Sample::Int(_) => "int",
            Sample::Long(_) => "long",
            Sample::Float(_) => "float",
            Sample::Str(_) => "string",
            Sample::Partial { .. } => "partial",
        }
    }

    /// Exact number of bits this sample occupies once written.
    pub fn bit_width(&self) -> usize {
        match self {
            Sample::Bit(_) => 1,
            Sample::Byte(_) => 8,
            Sample::Short(_) | Sample::UShort(_) => 16,
            Sample::Int(_) | Sample::Float(_) => 32,
            Sample::Long(_) => 64,
            Sample::Str(value) => 16 + value.len() * 8,
            Sample::Partial { width, .. } => *width as usize,
        }
    }
}

/// Generate `groups` groups of samples, one of every kind per group.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `groups`: number of groups to generate
pub fn generate_samples(seed: u64, groups: usize) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(groups * 9);

    for _ in 0..groups {
        samples.push(Sample::Bit(rng.gen()));
        samples.push(Sample::Byte(rng.gen()));
        samples.push(Sample::Short(rng.gen()));
        samples.push(Sample::UShort(rng.gen()));
        samples.push(Sample::Int(rng.gen()));
        samples.push(Sample::Long(rng.gen()));
        samples.push(Sample::Float(random_float(&mut rng)));
        samples.push(Sample::Str(random_string(&mut rng, 0..=24)));

        let width = rng.gen_range(1..32);
        let value = rng.gen_range(0..(1u32 << width));
        samples.push(Sample::Partial { value, width });
    }

    samples
}

/// Generate `size` distinct strings for a string table session.
pub fn generate_vocabulary(seed: u64, size: usize) -> Vec<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut vocabulary: Vec<String> = Vec::with_capacity(size);

    while vocabulary.len() < size {
        let candidate = format!("{}-{}", random_string(&mut rng, 1..=8), vocabulary.len());
        vocabulary.push(candidate);
    }

    vocabulary
}

/// Pick `count` entries from `vocabulary`, biased toward the first few so the
/// session produces plenty of repeats.
pub fn generate_messages(seed: u64, vocabulary: &[String], count: usize) -> Vec<String> {
    if vocabulary.is_empty() {
        return Vec::new();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let r: f64 = rng.gen();
            let index = ((r * r) * vocabulary.len() as f64) as usize;
            vocabulary[index.min(vocabulary.len() - 1)].clone()
        })
        .collect()
}

/// Float drawn from a mix of ordinary values and awkward bit patterns.
fn random_float(rng: &mut ChaCha8Rng) -> f32 {
    match rng.gen_range(0..10) {
        0 => f32::from_bits(rng.gen()),
        1 => -0.0,
        2 => f32::MIN_POSITIVE / 2.0,
        _ => rng.gen_range(-1.0e6..1.0e6),
    }
}

fn random_string(rng: &mut ChaCha8Rng, len: std::ops::RangeInclusive<usize>) -> String {
    let len = rng.gen_range(len);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}
