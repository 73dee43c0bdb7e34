#![no_main]

use libfuzzer_sys::fuzz_target;
use qoaseed::{EncodeError, FileParameters, SampleCountMode, QOA_FRAME_LEN, QOA_MAX_FRAME_SIZE};
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    // 4 bytes samples, 1 byte channels, 3 bytes sample rate, 1 byte mode,
    // 8 bytes seed
    if data.len() < 17 {
        return;
    }

    // Keep files to a handful of frames
    let samples = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) % (4 * QOA_FRAME_LEN as u32);
    let channels = data[4];
    let sample_rate = u32::from_be_bytes([0, data[5], data[6], data[7]]);
    let mode = if data[8] & 1 == 0 {
        SampleCountMode::Reference
    } else {
        SampleCountMode::Exact
    };
    let seed = u64::from_be_bytes(data[9..17].try_into().unwrap());

    let Ok(params) = FileParameters::new(samples, channels, sample_rate) else {
        return;
    };
    let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);

    let frame_size = 8 + channels as usize * (16 + 256 * 8);
    let encoded = match qoaseed::encode_with_mode(&params, mode, &mut rng) {
        Ok(encoded) => encoded,
        Err(EncodeError::GeometryOverflow { .. }) => {
            assert!(frame_size > QOA_MAX_FRAME_SIZE);
            return;
        }
        Err(e) => panic!("validated parameters failed to encode: {}", e),
    };

    // The declared layout must always describe the bytes exactly
    let frame_count = (samples as usize).div_ceil(QOA_FRAME_LEN);
    assert_eq!(encoded.len(), 8 + frame_count * frame_size);
    assert_eq!(&encoded[..4], b"qoaf");
    assert_eq!(u32::from_be_bytes(encoded[4..8].try_into().unwrap()), samples);

    for frame in encoded[8..].chunks_exact(frame_size) {
        assert_eq!(frame[0], channels);
        assert_eq!(u32::from_be_bytes([0, frame[1], frame[2], frame[3]]), sample_rate);
        let frame_samples = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        assert!((1..=QOA_FRAME_LEN).contains(&frame_samples));
        assert_eq!(u16::from_be_bytes([frame[6], frame[7]]) as usize, frame_size);
    }
});
