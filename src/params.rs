//! Random choice of file parameters.
use std::fmt;
use std::fmt::Display;
use std::ops::RangeInclusive;

use rand::Rng;

use crate::{FileParameters, QOA_MAX_SAMPLE_RATE};

/// Inclusive ranges the parameters of each file are drawn from.
///
/// The default ranges keep files small (20..=1000 samples) and channel counts
/// low (1..=8) while covering the whole 24-bit sample rate range. Every range
/// is checked on construction, so [`ParameterRanges::choose`] always returns
/// parameters that fit their fields. Channel counts of 32 and up are allowed
/// and will fail to encode with a geometry overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRanges {
    samples: RangeInclusive<u32>,
    channels: RangeInclusive<u8>,
    sample_rate: RangeInclusive<u32>,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            samples: 20..=1000,
            channels: 1..=8,
            sample_rate: 1..=QOA_MAX_SAMPLE_RATE,
        }
    }
}

impl ParameterRanges {
    pub fn new(
        samples: RangeInclusive<u32>,
        channels: RangeInclusive<u8>,
        sample_rate: RangeInclusive<u32>,
    ) -> Result<Self, RangeError> {
        check_range("samples", &samples, 1, u32::MAX)?;
        check_range("channels", &channels, 1, u8::MAX)?;
        check_range("sample_rate", &sample_rate, 1, QOA_MAX_SAMPLE_RATE)?;
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Default ranges with the channel count drawn from `1..=max_channels`.
    pub fn with_max_channels(max_channels: u8) -> Result<Self, RangeError> {
        let defaults = Self::default();
        Self::new(defaults.samples, 1..=max_channels, defaults.sample_rate)
    }

    pub fn samples(&self) -> &RangeInclusive<u32> {
        &self.samples
    }

    pub fn channels(&self) -> &RangeInclusive<u8> {
        &self.channels
    }

    pub fn sample_rate(&self) -> &RangeInclusive<u32> {
        &self.sample_rate
    }

    /// Draw samples, channels and sample rate, in that order, each uniformly
    /// from its range.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> FileParameters {
        FileParameters {
            samples: rng.random_range(self.samples.clone()),
            channels: rng.random_range(self.channels.clone()),
            sample_rate: rng.random_range(self.sample_rate.clone()),
        }
    }
}

/// Draw parameters from the default [`ParameterRanges`].
pub fn choose_parameters<R: Rng>(rng: &mut R) -> FileParameters {
    ParameterRanges::default().choose(rng)
}

fn check_range<T: PartialOrd + Copy + Display>(
    field: &'static str,
    range: &RangeInclusive<T>,
    min: T,
    max: T,
) -> Result<(), RangeError> {
    if range.is_empty() {
        return Err(RangeError::Empty { field });
    }
    if *range.start() < min || *range.end() > max {
        return Err(RangeError::OutOfBounds {
            field,
            range: format!("{}..={}", range.start(), range.end()),
            bounds: format!("{}..={}", min, max),
        });
    }
    Ok(())
}

/// A parameter range that cannot produce valid file parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The range contains no values
    Empty { field: &'static str },
    /// The range reaches outside what the field can hold
    OutOfBounds {
        field: &'static str,
        range: String,
        bounds: String,
    },
}

impl std::error::Error for RangeError {}

impl Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RangeError::Empty { field } => write!(f, "Range for {} is empty", field),
            RangeError::OutOfBounds {
                field,
                range,
                bounds,
            } => write!(
                f,
                "Range {} for {} is outside of {}",
                range, field, bounds
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode, EncodeError};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_default_draws_stay_in_range() {
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..10_000 {
            let params = choose_parameters(&mut rng);
            assert!((20..=1000).contains(&params.samples));
            assert!((1..=8).contains(&params.channels));
            assert!((1..=0xff_ffff).contains(&params.sample_rate));
        }
    }

    #[test]
    fn test_default_draws_cover_channel_range() {
        let mut rng = Pcg64::seed_from_u64(7);
        let mut seen = [false; 9];
        for _ in 0..1000 {
            seen[choose_parameters(&mut rng).channels as usize] = true;
        }
        assert!(!seen[0]);
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn test_default_draws_always_encode() {
        let mut rng = Pcg64::seed_from_u64(11);
        for _ in 0..200 {
            let params = choose_parameters(&mut rng);
            let bytes = encode(&params, &mut rng).unwrap();
            let frame_size = 8 + params.channels as usize * (16 + 256 * 8);
            assert_eq!(bytes.len(), 8 + frame_size);
        }
    }

    #[test]
    fn test_seeded_draws_are_deterministic() {
        let ranges = ParameterRanges::default();
        let a = ranges.choose(&mut Pcg64::seed_from_u64(3));
        let b = ranges.choose(&mut Pcg64::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_value_ranges() {
        let ranges = ParameterRanges::new(100..=100, 2..=2, 44100..=44100).unwrap();
        let params = ranges.choose(&mut Pcg64::seed_from_u64(0));
        assert_eq!(params, FileParameters::new(100, 2, 44100).unwrap());
    }

    #[test]
    fn test_wide_channel_range_allows_overflow() {
        let ranges = ParameterRanges::new(20..=20, 32..=255, 1..=1).unwrap();
        let mut rng = Pcg64::seed_from_u64(5);
        let params = ranges.choose(&mut rng);
        assert!(matches!(
            encode(&params, &mut rng),
            Err(EncodeError::GeometryOverflow { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_ranges() {
        assert_eq!(
            ParameterRanges::with_max_channels(0),
            Err(RangeError::Empty { field: "channels" })
        );
        assert_eq!(
            ParameterRanges::new(20..=1000, 0..=8, 1..=44100),
            Err(RangeError::OutOfBounds {
                field: "channels",
                range: "0..=8".to_string(),
                bounds: "1..=255".to_string(),
            })
        );
        #[allow(clippy::reversed_empty_ranges)]
        let inverted = ParameterRanges::new(1000..=20, 1..=8, 1..=44100);
        assert_eq!(inverted, Err(RangeError::Empty { field: "samples" }));
        assert!(matches!(
            ParameterRanges::new(0..=10, 1..=8, 1..=44100),
            Err(RangeError::OutOfBounds {
                field: "samples",
                ..
            })
        ));
        assert!(matches!(
            ParameterRanges::new(1..=10, 1..=8, 1..=0x100_0000),
            Err(RangeError::OutOfBounds {
                field: "sample_rate",
                ..
            })
        ));
    }
}
