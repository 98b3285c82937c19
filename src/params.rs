//! Parameter definitions with documented ranges and semantics.
//!
//! Every tunable observed across the sketch variants lives here as a named,
//! documented field with an explicit default. Nothing in the pipeline reads
//! a hardcoded constant.

/// Linear output range for a volume-driven parameter.
///
/// `at(volume)` interpolates from `min` (silence) to `max` (full volume).
/// The input is clamped to [0, 1] first, so the output never leaves
/// `[min, max]` even when the smoothed volume overshoots by a float ulp.
#[derive(Debug, Clone, Copy)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Interpolated value at the given volume (clamped to [0, 1]).
    pub fn at(&self, volume: f32) -> f32 {
        let t = volume.clamp(0.0, 1.0);
        self.min + (self.max - self.min) * t
    }
}

/// Clamped linear remap of `v` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`.
///
/// The output range may be descending (out_lo > out_hi); the result still
/// stays between the two endpoints. A zero-width input domain is a
/// configuration error and yields `out_lo` instead of a non-finite value.
pub fn remap_clamp(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span.abs() < f32::EPSILON {
        return out_lo;
    }
    let t = ((v - in_lo) / span).clamp(0.0, 1.0);
    out_lo + (out_hi - out_lo) * t
}

/// How far each dot's diameter moves toward its wobble target per frame.
#[derive(Debug, Clone, Copy)]
pub enum EaseMode {
    /// Constant interpolation fraction per frame.
    Fixed(f32),

    /// Volume-dependent fraction: `quiet` at silence, `loud` at
    /// `full_volume` and above. Fast convergence when quiet, slow and
    /// smooth when loud.
    Reactive {
        /// Fraction applied at volume 0
        quiet: f32,
        /// Fraction applied at `full_volume`
        loud: f32,
        /// Volume treated as the top of the remap domain
        full_volume: f32,
    },
}

impl EaseMode {
    /// Easing fraction for the current smoothed volume.
    pub fn fraction(&self, volume: f32) -> f32 {
        match *self {
            EaseMode::Fixed(f) => f,
            EaseMode::Reactive {
                quiet,
                loud,
                full_volume,
            } => remap_clamp(volume, 0.0, full_volume, quiet, loud),
        }
    }
}

impl Default for EaseMode {
    fn default() -> Self {
        EaseMode::Reactive {
            quiet: 0.25,
            loud: 0.04,
            full_volume: 0.7,
        }
    }
}

/// Microphone loudness normalization parameters.
#[derive(Debug, Clone)]
pub struct MicConfig {
    /// Raw level treated as silence (rescaled to 0)
    pub silence_floor: f32,

    /// Raw level treated as full volume before gain (rescaled to 1).
    /// Must differ from `silence_floor`; equal values are guarded and
    /// normalize to 0.
    pub full_level: f32,

    /// Gain multiplier applied after the rescale, result clamped to [0, 1].
    /// Real microphone input rarely exceeds ~0.3, so the default boosts it
    /// into the usable range.
    pub gain: f32,

    /// Exponential smoothing factor per frame (responsiveness vs. jitter)
    pub smoothing: f32,
}

impl Default for MicConfig {
    fn default() -> Self {
        Self {
            silence_floor: 0.0,
            full_level: 1.0,
            gain: 6.0,
            smoothing: 0.08,
        }
    }
}

/// Mapping from smoothed volume to the rendered field parameters.
#[derive(Debug, Clone)]
pub struct VolumeMapping {
    /// Metaball merge strength bound as a shader uniform
    pub strength: ParamRange,

    /// Multiplier on every dot's eased radius
    pub size_scale: ParamRange,

    /// Per-frame easing of dot diameters toward their wobble targets
    pub ease: EaseMode,

    /// Optional hard cap on the serialized radius (pixels). Off by default;
    /// one sketch variant caps at 100 px.
    pub max_radius_px: Option<f32>,
}

impl Default for VolumeMapping {
    fn default() -> Self {
        Self {
            strength: ParamRange::new(0.20, 2.00),
            size_scale: ParamRange::new(1.0, 2.0),
            ease: EaseMode::default(),
            max_radius_px: None,
        }
    }
}

/// Dot lattice layout in canvas-centered pixel coordinates.
///
/// The first dot sits at `(-width/2 + margin_left, -height/2 + margin_top)`
/// and subsequent dots step by `spacing_px` while the coordinate stays
/// within the half-extent (inclusive). Only the left and top edges get an
/// enforced margin; the right and bottom gaps fall out of the step count.
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Distance between neighboring dots (pixels)
    pub spacing_px: f32,

    /// Gap before the first column (pixels)
    pub margin_left_px: f32,

    /// Gap before the first row (pixels)
    pub margin_top_px: f32,
}

impl GridLayout {
    /// Layout with the conventional half-spacing margins.
    pub fn with_spacing(spacing_px: f32) -> Self {
        Self {
            spacing_px,
            margin_left_px: spacing_px / 2.0,
            margin_top_px: spacing_px / 2.0,
        }
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::with_spacing(160.0)
    }
}

/// Per-dot wobble animation parameters.
#[derive(Debug, Clone)]
pub struct WobbleConfig {
    /// Sampling range for current and target diameters (pixels)
    pub diameter_px: (f32, f32),

    /// Delay before a dot picks its next target diameter (milliseconds)
    pub retarget_delay_ms: (f32, f32),
}

impl Default for WobbleConfig {
    fn default() -> Self {
        Self {
            diameter_px: (10.0, 50.0),
            retarget_delay_ms: (1000.0, 3000.0),
        }
    }
}

/// Window and surface configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_range_endpoints() {
        let strength = ParamRange::new(0.2, 12.0);

        // Silence maps to the minimum exactly (t = 0 contributes nothing)
        assert_eq!(strength.at(0.0), 0.2);
        assert!((strength.at(1.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_param_range_clamps_overshoot() {
        let scale = ParamRange::new(1.0, 2.0);

        // Slight float overshoot from the smoother must not escape the range
        assert_eq!(scale.at(1.000001), 2.0);
        assert_eq!(scale.at(-0.000001), 1.0);

        for i in 0..=10 {
            let v = scale.at(i as f32 / 10.0);
            assert!((1.0..=2.0).contains(&v));
        }
    }

    #[test]
    fn test_remap_clamp_descending_range() {
        // The reactive-easing shape: 0.25 at silence down to 0.04 at 0.7
        assert_eq!(remap_clamp(0.0, 0.0, 0.7, 0.25, 0.04), 0.25);
        assert!((remap_clamp(0.7, 0.0, 0.7, 0.25, 0.04) - 0.04).abs() < 1e-6);
        assert!((remap_clamp(1.0, 0.0, 0.7, 0.25, 0.04) - 0.04).abs() < 1e-6);

        let mid = remap_clamp(0.35, 0.0, 0.7, 0.25, 0.04);
        assert!(mid < 0.25 && mid > 0.04);
    }

    #[test]
    fn test_remap_clamp_degenerate_domain() {
        // Zero-width input domain is a config error, not a NaN source
        let out = remap_clamp(0.5, 0.3, 0.3, 0.25, 0.04);
        assert_eq!(out, 0.25);
        assert!(out.is_finite());
    }

    #[test]
    fn test_ease_mode_fraction() {
        assert_eq!(EaseMode::Fixed(0.1).fraction(0.9), 0.1);

        let ease = EaseMode::default();
        assert_eq!(ease.fraction(0.0), 0.25);
        assert!((ease.fraction(0.7) - 0.04).abs() < 1e-6);
        assert!((ease.fraction(1.0) - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_grid_layout_half_spacing_margins() {
        let layout = GridLayout::with_spacing(160.0);
        assert_eq!(layout.margin_left_px, 80.0);
        assert_eq!(layout.margin_top_px, 80.0);
    }
}
