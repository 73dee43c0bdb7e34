#![forbid(unsafe_code)]
//! # qoaseed - structural QOA files for fuzzing
//!
//! Generates byte sequences laid out exactly like QOA ("Quite OK Audio")
//! files: file header, frame headers, per-channel LMS state and slices. The
//! declared fields (magic, sample counts, sample rate, frame sizes) are always
//! consistent with the layout, while LMS state and slice payloads are random.
//! The result is a seed corpus for fuzzing QOA decoders, not playable audio.
//!
//! ```
//! use qoaseed::{encode, FileParameters};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(1);
//! let params = FileParameters::new(100, 1, 44100).unwrap();
//! let bytes = encode(&params, &mut rng).unwrap();
//! assert_eq!(bytes.len(), 2080);
//! assert_eq!(&bytes[..4], b"qoaf");
//! ```
use std::fmt;
use std::fmt::Display;

use rand::Rng;

mod corpus;
mod params;

pub use corpus::{CorpusConfig, CorpusError, CorpusGenerator, CorpusReport, DEFAULT_COUNT};
pub use params::{choose_parameters, ParameterRanges, RangeError};

pub const QOA_SLICE_LEN: usize = 20;
pub const QOA_LMS_LEN: usize = 4;
pub const QOA_HEADER_SIZE: usize = 8;
pub const QOA_FRAME_HEADER_SIZE: usize = 8;
pub const QOA_MAGIC: u32 = u32::from_be_bytes(*b"qoaf");
pub const QOA_SLICES_PER_FRAME: usize = 256;
pub const QOA_FRAME_LEN: usize = QOA_SLICES_PER_FRAME * QOA_SLICE_LEN;
/// Bytes of one encoded slice (scalefactor + 20 residuals).
pub const QOA_SLICE_SIZE: usize = 8;
/// Bytes of LMS state per channel: 4 history and 4 weights of 16 bits each.
pub const QOA_LMS_SIZE: usize = QOA_LMS_LEN * 2 * 2;
pub const QOA_MAX_SAMPLE_RATE: u32 = 0xff_ffff;
pub const QOA_MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Parameters of one generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileParameters {
    /// Number of samples per channel in the entire file.
    pub samples: u32,
    /// Number of channels.
    pub channels: u8,
    /// The sample rate in HZ, must fit in 24 bits.
    pub sample_rate: u32,
}

impl FileParameters {
    /// Create parameters, checking that every field fits the width the QOA
    /// layout gives it.
    ///
    /// This does not check the frame geometry; a channel count that is too
    /// large for the 16-bit frame size is reported by [`encode`] as
    /// [`EncodeError::GeometryOverflow`].
    pub fn new(samples: u32, channels: u8, sample_rate: u32) -> Result<Self, EncodeError> {
        let params = Self {
            samples,
            channels,
            sample_rate,
        };
        params.validate()?;
        Ok(params)
    }

    /// File name used for this file in a generated corpus.
    pub fn file_name(&self) -> String {
        format!(
            "fuzz_qoa_{}_{}_{}.qoa",
            self.samples, self.channels, self.sample_rate
        )
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.samples == 0 {
            return Err(EncodeError::InvalidSamples);
        }
        if self.channels == 0 {
            return Err(EncodeError::InvalidChannels);
        }
        if self.sample_rate == 0 || self.sample_rate > QOA_MAX_SAMPLE_RATE {
            return Err(EncodeError::InvalidSampleRate);
        }
        Ok(())
    }
}

/// How the per-frame sample count is written into each frame header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleCountMode {
    /// Every frame declares `min(samples, QOA_FRAME_LEN)`, never decremented
    /// between frames. In files with more than one frame all frames declare a
    /// full frame, including the last one. Keeps byte parity with existing
    /// corpora.
    #[default]
    Reference,
    /// Each frame declares the samples actually left for it, so the last frame
    /// of a multi-frame file declares the remainder.
    Exact,
}

/// Frame layout derived from a [`FileParameters`].
///
/// Every frame carries the full 256 slices per channel, so all frames share
/// the same size, even a last frame that declares fewer samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    samples: u32,
    channels: u8,
    frame_count: u32,
    frame_size: u16,
}

impl FrameGeometry {
    pub fn new(params: &FileParameters) -> Result<Self, EncodeError> {
        params.validate()?;

        let frame_size = qoa_frame_size(params.channels as usize);
        let frame_size = u16::try_from(frame_size).map_err(|_| EncodeError::GeometryOverflow {
            channels: params.channels,
            frame_size,
        })?;

        Ok(Self {
            samples: params.samples,
            channels: params.channels,
            frame_count: params.samples.div_ceil(QOA_FRAME_LEN as u32),
            frame_size,
        })
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Size in bytes of every frame, including its header.
    pub fn frame_size(&self) -> u16 {
        self.frame_size
    }

    /// Total size in bytes of the encoded file.
    pub fn file_size(&self) -> usize {
        QOA_HEADER_SIZE + self.frame_count as usize * self.frame_size as usize
    }

    /// Samples per channel declared by the frame at `frame_index`.
    pub fn samples_in_frame(&self, frame_index: u32, mode: SampleCountMode) -> u16 {
        let remaining = match mode {
            SampleCountMode::Reference => self.samples,
            SampleCountMode::Exact => self
                .samples
                .saturating_sub(frame_index.saturating_mul(QOA_FRAME_LEN as u32)),
        };
        // QOA_FRAME_LEN fits in 16 bits.
        remaining.min(QOA_FRAME_LEN as u32) as u16
    }
}

/// The metadata at the beginning of each frame of slices.
///
/// Only built from values that fit their fields, so packing never truncates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameHeader {
    num_channels: u8,
    sample_rate: u32,
    num_samples_per_channel: u16,
    frame_size: u16,
}

impl FrameHeader {
    pub fn new(
        num_channels: u8,
        sample_rate: u32,
        num_samples_per_channel: u16,
        frame_size: u16,
    ) -> Result<Self, EncodeError> {
        if num_channels == 0 {
            return Err(EncodeError::InvalidChannels);
        }
        if sample_rate == 0 || sample_rate > QOA_MAX_SAMPLE_RATE {
            return Err(EncodeError::InvalidSampleRate);
        }
        Ok(Self {
            num_channels,
            sample_rate,
            num_samples_per_channel,
            frame_size,
        })
    }

    /// Number of channels in this frame
    pub fn num_channels(&self) -> u8 {
        self.num_channels
    }

    /// Sample rate in HZ for this frame
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel in this frame
    pub fn num_samples_per_channel(&self) -> u16 {
        self.num_samples_per_channel
    }

    /// Size of the frame in bytes, including this header
    pub fn frame_size(&self) -> u16 {
        self.frame_size
    }

    /// Pack the header into its 64 bit big endian wire form.
    pub fn to_be_bytes(&self) -> [u8; QOA_FRAME_HEADER_SIZE] {
        debug_assert!(self.sample_rate <= QOA_MAX_SAMPLE_RATE);
        let header = ((self.num_channels as u64) << 56)
            | ((self.sample_rate as u64) << 32)
            | ((self.num_samples_per_channel as u64) << 16)
            | (self.frame_size as u64);
        header.to_be_bytes()
    }
}

/// Predictor state written for one channel at the start of a frame.
///
/// The values are random and need not describe a stable predictor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LmsState {
    pub history: [i16; QOA_LMS_LEN],
    pub weights: [i16; QOA_LMS_LEN],
}

impl LmsState {
    /// Draw history then weights, each uniform over the whole `i16` range.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let history = std::array::from_fn(|_| rng.random());
        let weights = std::array::from_fn(|_| rng.random());
        Self { history, weights }
    }

    pub fn to_be_bytes(&self) -> [u8; QOA_LMS_SIZE] {
        let mut history = 0u64;
        let mut weights = 0u64;
        for i in 0..QOA_LMS_LEN {
            history = (history << 16) | (self.history[i] as u16 as u64);
            weights = (weights << 16) | (self.weights[i] as u16 as u64);
        }

        let mut bytes = [0u8; QOA_LMS_SIZE];
        bytes[..8].copy_from_slice(&history.to_be_bytes());
        bytes[8..].copy_from_slice(&weights.to_be_bytes());
        bytes
    }
}

/// Writer of structurally valid QOA files with random content.
///
/// Construction checks the parameters and the frame geometry, so
/// [`SeedEncoder::encode`] itself cannot fail.
#[derive(Debug, Clone)]
pub struct SeedEncoder {
    params: FileParameters,
    geometry: FrameGeometry,
    mode: SampleCountMode,
}

impl SeedEncoder {
    pub fn new(params: &FileParameters) -> Result<Self, EncodeError> {
        let geometry = FrameGeometry::new(params)?;
        Ok(Self {
            params: *params,
            geometry,
            mode: SampleCountMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: SampleCountMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Serialize one file, drawing LMS state and slices from `rng`.
    pub fn encode<R: Rng>(&self, rng: &mut R) -> Vec<u8> {
        log::debug!(
            "encoding {} samples, {} channels at {} Hz: {} frames of {} bytes",
            self.params.samples,
            self.params.channels,
            self.params.sample_rate,
            self.geometry.frame_count,
            self.geometry.frame_size
        );

        let mut encoded = Vec::with_capacity(self.geometry.file_size());
        self.write_file_header(&mut encoded);
        for frame_index in 0..self.geometry.frame_count {
            self.write_frame(&mut encoded, frame_index, rng);
        }

        debug_assert_eq!(encoded.len(), self.geometry.file_size());
        encoded
    }

    fn write_file_header(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&QOA_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&self.params.samples.to_be_bytes());
    }

    fn write_frame<R: Rng>(&self, bytes: &mut Vec<u8>, frame_index: u32, rng: &mut R) {
        // Fields were checked by FrameGeometry::new.
        let header = FrameHeader {
            num_channels: self.params.channels,
            sample_rate: self.params.sample_rate,
            num_samples_per_channel: self.geometry.samples_in_frame(frame_index, self.mode),
            frame_size: self.geometry.frame_size,
        };
        log::trace!("frame {}: {:?}", frame_index, header);
        bytes.extend_from_slice(&header.to_be_bytes());

        for _ in 0..self.params.channels {
            bytes.extend_from_slice(&LmsState::random(rng).to_be_bytes());
        }

        // One flat run of slices, interleaved per slice: (slice 0, ch 0),
        // (slice 0, ch 1), ... Content is opaque so the order only has to be
        // stable.
        for _ in 0..QOA_SLICES_PER_FRAME * self.params.channels as usize {
            let slice: u64 = rng.random();
            bytes.extend_from_slice(&slice.to_be_bytes());
        }
    }
}

/// Encode one file with [`SampleCountMode::Reference`] frame sample counts.
pub fn encode<R: Rng>(params: &FileParameters, rng: &mut R) -> Result<Vec<u8>, EncodeError> {
    encode_with_mode(params, SampleCountMode::Reference, rng)
}

/// Encode one file, choosing how frame sample counts are declared.
///
/// Fails without producing any bytes if the parameters cannot be laid out.
pub fn encode_with_mode<R: Rng>(
    params: &FileParameters,
    mode: SampleCountMode,
    rng: &mut R,
) -> Result<Vec<u8>, EncodeError> {
    let encoder = SeedEncoder::new(params)?.with_mode(mode);
    Ok(encoder.encode(rng))
}

/// Calculate the size of a frame carrying all 256 slices for every channel.
const fn qoa_frame_size(channels: usize) -> usize {
    QOA_FRAME_HEADER_SIZE + channels * (QOA_LMS_SIZE + QOA_SLICES_PER_FRAME * QOA_SLICE_SIZE)
}

/// Errors that can occur while laying out a QOA file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Invalid number of channels (must be at least 1)
    InvalidChannels,
    /// Invalid sample rate (must be 1..=16777215)
    InvalidSampleRate,
    /// Invalid number of samples (must be > 0)
    InvalidSamples,
    /// The frame size for this many channels does not fit the 16-bit field
    GeometryOverflow { channels: u8, frame_size: usize },
}

impl std::error::Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::InvalidChannels => write!(f, "Invalid number of channels (must be > 0)"),
            EncodeError::InvalidSampleRate => {
                write!(f, "Invalid sample rate (must be 1..={})", QOA_MAX_SAMPLE_RATE)
            }
            EncodeError::InvalidSamples => write!(f, "Invalid number of samples (must be > 0)"),
            EncodeError::GeometryOverflow {
                channels,
                frame_size,
            } => write!(
                f,
                "Frame size {} for {} channels exceeds {} bytes",
                frame_size, channels, QOA_MAX_FRAME_SIZE
            ),
        }
    }
}
