//! Audio resampling using rubato's FFT-based resampler.
//!
//! Converts Kokoro's 24 kHz output to whatever rate the output device runs at.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Chunk size for FFT-based resampling (provides good quality and performance).
const CHUNK_SIZE: usize = 1024;

/// Number of sub-chunks for FFT processing (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Resample a whole synthesized sentence to the device rate.
///
/// The sentence is fed through the resampler in fixed-size chunks; the last
/// chunk is zero-padded and the padding trimmed off the result.
///
/// # Arguments
/// * `samples` - Mono input samples
/// * `from_rate` - Input sample rate (24000 for Kokoro)
/// * `to_rate` - Output sample rate of the audio device
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
        FixedSync::Input,
    )
    .context("Failed to create resampler")?;

    let chunk_size = resampler.input_frames_next();
    let output_frames_max = resampler.output_frames_max();
    let mut output_buffer = vec![0.0f32; output_frames_max];
    let mut input_chunk = vec![0.0f32; chunk_size];

    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64) as usize;
    let mut output = Vec::with_capacity(expected_len + output_frames_max);

    for chunk in samples.chunks(chunk_size) {
        input_chunk[..chunk.len()].copy_from_slice(chunk);
        input_chunk[chunk.len()..].fill(0.0);

        let input_adapter = InterleavedSlice::new(&input_chunk, 1, chunk_size).context("Failed to create input adapter")?;
        let mut output_adapter = InterleavedSlice::new_mut(&mut output_buffer, 1, output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) = resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;
        output.extend_from_slice(&output_buffer[..frames_written]);
    }

    output.truncate(expected_len);
    Ok(output)
}
