//! Microphone capture and loudness metering.
//!
//! Opens the default input device and publishes a per-block RMS level for
//! the frame loop to sample. The stream runs for the life of the process;
//! there is no spectral analysis, only time-domain loudness.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Audio capture system owning the input stream and the shared level.
pub struct AudioSystem {
    /// Latest RMS level from the capture callback (thread-safe)
    level: Arc<Mutex<f32>>,

    /// Input stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioSystem {
    /// Open the default input device and start metering.
    pub fn new() -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or("No audio input device found")?;

        let config = device
            .default_input_config()
            .map_err(|e| format!("Failed to get input config: {}", e))?;

        log::info!(
            "Audio input: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0
        );

        let level = Arc::new(Mutex::new(0.0f32));
        let level_writer = Arc::clone(&level);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    *level_writer.lock().unwrap() = rms_level(data);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build input stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start input stream: {}", e))?;

        Ok(Self {
            level,
            _stream: stream,
        })
    }

    /// Latest raw loudness sample (thread-safe), >= 0.
    pub fn level(&self) -> f32 {
        *self.level.lock().unwrap()
    }
}

/// Root-mean-square level of one sample block.
fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    mean_square.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_empty_block_is_silence() {
        assert_eq!(rms_level(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_constant_block() {
        let block = [0.5f32; 256];
        assert!((rms_level(&block) - 0.5).abs() < 1e-6);

        // Sign does not matter
        let block = [-0.25f32; 256];
        assert!((rms_level(&block) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_rms_of_square_wave() {
        let block: Vec<f32> = (0..128).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((rms_level(&block) - 1.0).abs() < 1e-6);
    }
}
