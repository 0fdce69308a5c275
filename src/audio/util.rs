//! Output device helpers.

use anyhow::Result;
use cpal::traits::DeviceTrait;
use cpal::{Device, SampleFormat, SupportedStreamConfig, SupportedStreamConfigRange};

/// Get a human-readable device name.
///
/// # Arguments
/// * `device` - The audio device
///
/// # Returns
/// Device name string, or "Unknown" if the name cannot be retrieved.
pub fn get_device_name(device: &Device) -> String {
    device.description().ok().map(|desc| desc.name().to_string()).unwrap_or_else(|| "Unknown".to_string())
}

/// Find the best matching audio configuration.
///
/// Searches for a configuration that:
/// 1. Supports mono or stereo (max 2 channels)
/// 2. Uses F32 sample format (universally supported on modern hardware)
/// 3. Matches the target sample rate, or uses the closest available rate
///
/// # Arguments
/// * `configs` - Iterator of supported stream configurations
/// * `target_sample_rate` - Desired sample rate (e.g., 24000 for Kokoro output)
///
/// # Returns
/// The best matching `SupportedStreamConfig`, or an error if no suitable config found.
pub fn find_best_config(configs: impl Iterator<Item = SupportedStreamConfigRange>, target_sample_rate: u32) -> Result<SupportedStreamConfig> {
    let mut f32_configs: Vec<SupportedStreamConfigRange> = Vec::new();

    for config in configs {
        // Only consider mono or stereo
        if config.channels() > 2 {
            continue;
        }

        // Only accept F32 format (universally supported on Mac, Linux, Jetson)
        if config.sample_format() == SampleFormat::F32 {
            f32_configs.push(config);
        }
    }

    if f32_configs.is_empty() {
        anyhow::bail!("No F32 audio configuration found - this is unexpected on modern hardware");
    }

    // Find config that supports target sample rate, or use first available
    for config in &f32_configs {
        let min_rate = config.min_sample_rate();
        let max_rate = config.max_sample_rate();

        if target_sample_rate >= min_rate && target_sample_rate <= max_rate {
            return Ok((*config).with_sample_rate(target_sample_rate));
        }
    }

    // Use first config with closest sample rate
    let config = &f32_configs[0];
    let rate = if target_sample_rate < config.min_sample_rate() {
        config.min_sample_rate()
    } else {
        config.max_sample_rate()
    };
    Ok((*config).with_sample_rate(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SupportedBufferSize;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(channels, min, max, SupportedBufferSize::Unknown, format)
    }

    #[test]
    fn test_prefers_range_containing_target() {
        let configs = vec![range(2, 8000, 22050, SampleFormat::F32), range(2, 44100, 96000, SampleFormat::F32)];
        let config = find_best_config(configs.into_iter(), 48000).unwrap();
        assert_eq!(config.sample_rate(), 48000);
    }

    #[test]
    fn test_skips_multichannel_and_integer_formats() {
        let configs = vec![range(6, 48000, 48000, SampleFormat::F32), range(2, 48000, 48000, SampleFormat::I16)];
        assert!(find_best_config(configs.into_iter(), 48000).is_err());
    }

    #[test]
    fn test_clamps_to_nearest_rate() {
        let configs = vec![range(1, 32000, 44100, SampleFormat::F32)];
        let config = find_best_config(configs.into_iter(), 24000).unwrap();
        assert_eq!(config.sample_rate(), 32000);
    }
}
