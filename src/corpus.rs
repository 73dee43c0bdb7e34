//! Writing a batch of generated files to disk.
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::{encode_with_mode, EncodeError, FileParameters, ParameterRanges, SampleCountMode};

/// Number of files generated when no count is given.
pub const DEFAULT_COUNT: usize = 20;

/// What to generate and where to put it.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Number of files to attempt
    pub count: usize,
    /// Directory the files are written to, created if missing
    pub out_dir: PathBuf,
    pub ranges: ParameterRanges,
    pub mode: SampleCountMode,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            out_dir: PathBuf::from("."),
            ranges: ParameterRanges::default(),
            mode: SampleCountMode::default(),
        }
    }
}

/// Outcome of [`CorpusGenerator::generate`].
#[derive(Debug, Default)]
pub struct CorpusReport {
    /// Paths written, in generation order. A path appears twice if the same
    /// parameters were drawn twice; the later file replaced the earlier one.
    pub written: Vec<PathBuf>,
    /// Parameters that could not be laid out and produced no file.
    pub skipped: Vec<FileParameters>,
}

/// Draws parameters, encodes and writes `count` files.
///
/// A draw that fails with [`EncodeError::GeometryOverflow`] is logged and
/// skipped; I/O errors stop the run.
#[derive(Debug)]
pub struct CorpusGenerator<R> {
    config: CorpusConfig,
    rng: R,
}

impl CorpusGenerator<Pcg64> {
    /// Generator whose output is fully determined by `seed`.
    pub fn seeded(config: CorpusConfig, seed: u64) -> Self {
        Self::new(config, Pcg64::seed_from_u64(seed))
    }
}

impl<R: Rng> CorpusGenerator<R> {
    pub fn new(config: CorpusConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn generate(&mut self) -> Result<CorpusReport, CorpusError> {
        fs::create_dir_all(&self.config.out_dir)?;

        let mut report = CorpusReport::default();
        for _ in 0..self.config.count {
            let params = self.config.ranges.choose(&mut self.rng);
            let encoded = match encode_with_mode(&params, self.config.mode, &mut self.rng) {
                Ok(encoded) => encoded,
                Err(e @ EncodeError::GeometryOverflow { .. }) => {
                    log::warn!("Skipping {}: {}", params.file_name(), e);
                    report.skipped.push(params);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let path = self.config.out_dir.join(params.file_name());
            fs::write(&path, &encoded)?;
            log::info!("Generated {} ({} bytes)", path.display(), encoded.len());
            report.written.push(path);
        }

        Ok(report)
    }
}

#[derive(Debug)]
pub enum CorpusError {
    Encode(EncodeError),
    IoError(io::Error),
}

impl std::error::Error for CorpusError {}

impl Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorpusError::Encode(e) => write!(f, "Encode error: {}", e),
            CorpusError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl From<EncodeError> for CorpusError {
    fn from(inner: EncodeError) -> Self {
        CorpusError::Encode(inner)
    }
}

impl From<io::Error> for CorpusError {
    fn from(inner: io::Error) -> Self {
        CorpusError::IoError(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameGeometry;

    fn config(out_dir: PathBuf, count: usize) -> CorpusConfig {
        CorpusConfig {
            count,
            out_dir,
            ..Default::default()
        }
    }

    #[test]
    fn test_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = CorpusGenerator::seeded(config(dir.path().to_path_buf(), 5), 1);
        let report = generator.generate().unwrap();

        assert_eq!(report.written.len(), 5);
        assert!(report.skipped.is_empty());
        for path in &report.written {
            let name = path.file_name().unwrap().to_str().unwrap();
            let fields: Vec<u32> = name
                .strip_prefix("fuzz_qoa_")
                .and_then(|n| n.strip_suffix(".qoa"))
                .unwrap()
                .split('_')
                .map(|f| f.parse().unwrap())
                .collect();
            let params = FileParameters::new(fields[0], fields[1] as u8, fields[2]).unwrap();

            let bytes = fs::read(path).unwrap();
            assert_eq!(&bytes[..4], b"qoaf");
            assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), params.samples);
            assert_eq!(bytes.len(), FrameGeometry::new(&params).unwrap().file_size());
        }
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();
        let first = CorpusGenerator::seeded(config(first_dir.path().to_path_buf(), 3), 9)
            .generate()
            .unwrap();
        let second = CorpusGenerator::seeded(config(second_dir.path().to_path_buf(), 3), 9)
            .generate()
            .unwrap();

        for (a, b) in first.written.iter().zip(&second.written) {
            assert_eq!(a.file_name(), b.file_name());
            assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
        }
    }

    #[test]
    fn test_creates_missing_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("corpus").join("qoa");
        let report = CorpusGenerator::seeded(config(out_dir.clone(), 1), 2)
            .generate()
            .unwrap();
        assert!(out_dir.is_dir());
        assert_eq!(report.written[0].parent(), Some(out_dir.as_path()));
    }

    #[test]
    fn test_skips_geometry_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let config = CorpusConfig {
            count: 4,
            out_dir: dir.path().to_path_buf(),
            ranges: ParameterRanges::new(20..=20, 40..=40, 1..=1).unwrap(),
            mode: SampleCountMode::Exact,
        };
        let report = CorpusGenerator::seeded(config, 3).generate().unwrap();

        assert!(report.written.is_empty());
        assert_eq!(report.skipped.len(), 4);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_count_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let report = CorpusGenerator::seeded(config(dir.path().to_path_buf(), 0), 0)
            .generate()
            .unwrap();
        assert!(report.written.is_empty());
        assert!(report.skipped.is_empty());
    }
}
