//! Command-line argument parsing.

use clap::Parser;

use crate::params::{EaseMode, GridLayout, MicConfig, VolumeMapping};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Blobgrid")]
#[command(about = "Mic-reactive metaball grid", long_about = None)]
pub struct Args {
    /// Grid spacing between dots (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "160")]
    pub spacing: f32,

    /// Microphone gain applied to the normalized level
    #[arg(long, value_name = "FACTOR", default_value = "6.0")]
    pub gain: f32,

    /// Exponential smoothing factor for the volume signal
    #[arg(long, value_name = "FACTOR", default_value = "0.08")]
    pub smoothing: f32,

    /// Hard cap on rendered dot radius (pixels, off when omitted)
    #[arg(long, value_name = "PIXELS")]
    pub max_radius: Option<f32>,

    /// Easing preset: reactive (volume-dependent) or fixed
    #[arg(long, value_name = "PRESET", default_value = "reactive")]
    pub easing: String,
}

impl Args {
    /// Grid layout with the conventional half-spacing margins.
    pub fn grid_layout(&self) -> GridLayout {
        GridLayout::with_spacing(self.spacing)
    }

    /// Microphone normalization config with CLI overrides applied.
    pub fn mic_config(&self) -> MicConfig {
        MicConfig {
            gain: self.gain,
            smoothing: self.smoothing,
            ..MicConfig::default()
        }
    }

    /// Volume-to-parameter mapping with CLI overrides applied.
    pub fn volume_mapping(&self) -> VolumeMapping {
        VolumeMapping {
            ease: self.parse_ease_mode(),
            max_radius_px: self.max_radius,
            ..VolumeMapping::default()
        }
    }

    /// Parse the easing preset from command-line arguments.
    fn parse_ease_mode(&self) -> EaseMode {
        match self.easing.to_lowercase().as_str() {
            "fixed" => {
                println!("Easing: fixed fraction");
                EaseMode::Fixed(0.1)
            }
            "reactive" => {
                println!("Easing: volume-reactive");
                EaseMode::default()
            }
            other => {
                eprintln!("Warning: Unknown easing preset '{}', using reactive", other);
                EaseMode::default()
            }
        }
    }
}
