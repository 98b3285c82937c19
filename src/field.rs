//! Dot lattice simulation: per-dot wobble state machines, audio-reactive
//! modulation, and per-frame serialization for the metaball shader.

use glam::Vec2;
use rand::Rng;

use crate::params::{GridLayout, MicConfig, VolumeMapping, WobbleConfig};
use crate::volume::VolumeTracker;

/// One grid cell: fixed position, breathing diameter.
///
/// Each dot runs a two-state machine: ease toward the target diameter until
/// the stored deadline passes, then resample target and deadline and keep
/// easing. The eased value converges toward the target, never jumps, so it
/// may briefly trail outside the sampling range right after a retarget.
struct Dot {
    /// Position in canvas-centered coordinates (pixels)
    pos: Vec2,
    current_diameter: f32,
    target_diameter: f32,
    /// Absolute time of the next target resample (milliseconds)
    retarget_at_ms: f32,
}

impl Dot {
    fn new(pos: Vec2, wobble: &WobbleConfig, now_ms: f32, rng: &mut impl Rng) -> Self {
        Self {
            pos,
            current_diameter: sample_range(rng, wobble.diameter_px),
            target_diameter: sample_range(rng, wobble.diameter_px),
            retarget_at_ms: now_ms + sample_range(rng, wobble.retarget_delay_ms),
        }
    }

    fn update(
        &mut self,
        now_ms: f32,
        ease_fraction: f32,
        wobble: &WobbleConfig,
        rng: &mut impl Rng,
    ) {
        if now_ms > self.retarget_at_ms {
            self.target_diameter = sample_range(rng, wobble.diameter_px);
            self.retarget_at_ms = now_ms + sample_range(rng, wobble.retarget_delay_ms);
        }
        self.current_diameter += (self.target_diameter - self.current_diameter) * ease_fraction;
    }
}

/// Uniform sample from a half-open range; collapses to `lo` when the range
/// is empty or inverted (degenerate configuration).
fn sample_range(rng: &mut impl Rng, (lo, hi): (f32, f32)) -> f32 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

/// Regular dot lattice over the canvas, rebuilt wholesale on resize.
pub struct DotField {
    dots: Vec<Dot>,
    layout: GridLayout,
    wobble: WobbleConfig,
    /// Current canvas size (pixels)
    width: f32,
    height: f32,
    /// Reused per-frame serialization target (x, y, radius per dot)
    buffer: Vec<f32>,
}

impl DotField {
    pub fn new(layout: GridLayout, wobble: WobbleConfig) -> Self {
        Self {
            dots: Vec::new(),
            layout,
            wobble,
            width: 0.0,
            height: 0.0,
            buffer: Vec::new(),
        }
    }

    /// Discard all dots and repopulate the lattice for a new canvas size.
    ///
    /// The first dot sits at `(-width/2 + margin_left, -height/2 +
    /// margin_top)`; rows and columns step by the configured spacing while
    /// the coordinate stays within the half-extent, inclusive. The `<=`
    /// bound gives the left and top edges their full margin and leaves the
    /// right and bottom with whatever partial gap remains.
    pub fn rebuild(&mut self, width: f32, height: f32, now_ms: f32) {
        self.width = width;
        self.height = height;
        self.dots.clear();

        let spacing = self.layout.spacing_px;
        if spacing <= 0.0 {
            // Degenerate layout; an empty field renders as a blank canvas.
            return;
        }

        let mut rng = rand::thread_rng();
        let start_x = -width / 2.0 + self.layout.margin_left_px;
        let start_y = -height / 2.0 + self.layout.margin_top_px;

        let mut y = start_y;
        while y <= height / 2.0 {
            let mut x = start_x;
            while x <= width / 2.0 {
                self.dots
                    .push(Dot::new(Vec2::new(x, y), &self.wobble, now_ms, &mut rng));
                x += spacing;
            }
            y += spacing;
        }
    }

    /// Advance every dot's wobble one frame.
    pub fn update(&mut self, now_ms: f32, ease_fraction: f32) {
        let mut rng = rand::thread_rng();
        for dot in &mut self.dots {
            dot.update(now_ms, ease_fraction, &self.wobble, &mut rng);
        }
    }

    /// Pack the field into the flat per-frame payload: pixel-space x, y and
    /// final radius per dot, in insertion order.
    ///
    /// The returned slice is valid until the next call; the render step
    /// uploads it immediately and must not retain it.
    pub fn serialize(&mut self, size_scale: f32, max_radius_px: Option<f32>) -> &[f32] {
        self.buffer.clear();
        let half = Vec2::new(self.width / 2.0, self.height / 2.0);

        for dot in &self.dots {
            let mut radius = dot.current_diameter * 0.5 * size_scale;
            if let Some(cap) = max_radius_px {
                radius = radius.min(cap);
            }
            self.buffer.push(dot.pos.x + half.x);
            self.buffer.push(dot.pos.y + half.y);
            self.buffer.push(radius);
        }
        &self.buffer
    }

    pub fn dot_count(&self) -> usize {
        self.dots.len()
    }
}

/// Full pipeline state: loudness tracking, parameter mapping, and the dot
/// lattice, driven once per frame.
pub struct FieldSystem {
    pub field: DotField,
    volume: VolumeTracker,
    mapping: VolumeMapping,
}

impl FieldSystem {
    pub fn new(
        layout: GridLayout,
        wobble: WobbleConfig,
        mic: MicConfig,
        mapping: VolumeMapping,
    ) -> Self {
        Self {
            field: DotField::new(layout, wobble),
            volume: VolumeTracker::new(mic),
            mapping,
        }
    }

    /// Rebuild the lattice for a new canvas size.
    pub fn rebuild(&mut self, width: f32, height: f32, now_ms: f32) {
        self.field.rebuild(width, height, now_ms);
    }

    /// Run one frame of the pipeline: fold the raw level into the smoothed
    /// volume, derive the mapped parameters, and advance the wobble.
    ///
    /// # Returns
    /// * Tuple of (strength, size_scale) for the render step
    pub fn update(&mut self, raw_level: f32, now_ms: f32) -> (f32, f32) {
        let volume = self.volume.update(raw_level);

        let strength = self.mapping.strength.at(volume);
        let size_scale = self.mapping.size_scale.at(volume);
        let ease_fraction = self.mapping.ease.fraction(volume);

        self.field.update(now_ms, ease_fraction);

        (strength, size_scale)
    }

    /// Serialize the field with the configured radius cap applied.
    pub fn serialize(&mut self, size_scale: f32) -> &[f32] {
        self.field.serialize(size_scale, self.mapping.max_radius_px)
    }

    pub fn dot_count(&self) -> usize {
        self.field.dot_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{EaseMode, ParamRange};

    fn test_field() -> DotField {
        DotField::new(GridLayout::with_spacing(160.0), WobbleConfig::default())
    }

    #[test]
    fn test_rebuild_lattice_point_count() {
        let mut field = test_field();
        field.rebuild(640.0, 480.0, 0.0);

        // startX = -240, startY = -160; x steps -240,-80,80,240 (400 > 320
        // stops the row), y steps -160,0,160 (320 > 240 stops the column)
        assert_eq!(field.dot_count(), 12);
        assert_eq!(field.dots[0].pos, Vec2::new(-240.0, -160.0));
        assert_eq!(field.dots[3].pos, Vec2::new(240.0, -160.0));
        assert_eq!(field.dots[11].pos, Vec2::new(240.0, 160.0));
    }

    #[test]
    fn test_serialize_layout_and_length() {
        let mut field = test_field();
        field.rebuild(640.0, 480.0, 0.0);

        let buf = field.serialize(1.0, None);
        assert_eq!(buf.len(), 3 * 12);

        // First dot lands at pixel-space (80, 80): canvas-centered -240,-160
        // shifted by the half extents
        assert_eq!(buf[0], 80.0);
        assert_eq!(buf[1], 80.0);

        // Unscaled radius is half a diameter sampled from 10..50
        assert!(buf[2] >= 5.0 && buf[2] < 25.0);
    }

    #[test]
    fn test_dot_construction_invariants() {
        let mut field = test_field();
        field.rebuild(640.0, 480.0, 500.0);

        for dot in &field.dots {
            assert!((10.0..50.0).contains(&dot.current_diameter));
            assert!((10.0..50.0).contains(&dot.target_diameter));
            assert!(dot.retarget_at_ms >= 1500.0 && dot.retarget_at_ms < 3500.0);
        }
    }

    #[test]
    fn test_retarget_past_deadline() {
        let mut field = test_field();
        field.rebuild(640.0, 480.0, 0.0);

        // Every deadline is at most 3000 ms out; a full easing step lands
        // the current diameter exactly on the fresh target
        field.update(10_000.0, 1.0);

        for dot in &field.dots {
            assert!((dot.current_diameter - dot.target_diameter).abs() < 1e-4);
            assert!((10.0..50.0).contains(&dot.target_diameter));
            assert!(dot.retarget_at_ms >= 11_000.0 && dot.retarget_at_ms < 13_000.0);
        }
    }

    #[test]
    fn test_easing_converges_without_jumping() {
        let mut field = test_field();
        field.rebuild(640.0, 480.0, 0.0);

        let targets: Vec<f32> = field.dots.iter().map(|d| d.target_diameter).collect();
        let before: Vec<f32> = field.dots.iter().map(|d| d.current_diameter).collect();

        // Before any deadline passes, one partial step halves each gap
        field.update(500.0, 0.5);

        for (i, dot) in field.dots.iter().enumerate() {
            let expected = before[i] + (targets[i] - before[i]) * 0.5;
            assert!((dot.current_diameter - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_radius_cap() {
        let mut field = DotField::new(
            GridLayout::with_spacing(160.0),
            WobbleConfig {
                // Degenerate range collapses every diameter to exactly 300
                diameter_px: (300.0, 300.0),
                retarget_delay_ms: (1000.0, 3000.0),
            },
        );
        field.rebuild(640.0, 480.0, 0.0);

        let uncapped = field.serialize(1.0, None).to_vec();
        assert_eq!(uncapped[2], 150.0);

        for triple in field.serialize(4.0, Some(100.0)).chunks(3) {
            assert_eq!(triple[2], 100.0);
        }
    }

    #[test]
    fn test_nonpositive_spacing_degenerates_to_empty() {
        let mut field = DotField::new(
            GridLayout {
                spacing_px: 0.0,
                margin_left_px: 0.0,
                margin_top_px: 0.0,
            },
            WobbleConfig::default(),
        );
        field.rebuild(640.0, 480.0, 0.0);

        assert_eq!(field.dot_count(), 0);
        assert!(field.serialize(1.0, None).is_empty());
    }

    #[test]
    fn test_system_maps_silence_to_range_minimums() {
        let mut system = FieldSystem::new(
            GridLayout::default(),
            WobbleConfig::default(),
            MicConfig::default(),
            VolumeMapping {
                strength: ParamRange::new(0.2, 12.0),
                size_scale: ParamRange::new(1.0, 2.0),
                ease: EaseMode::Fixed(0.1),
                max_radius_px: None,
            },
        );
        system.rebuild(640.0, 480.0, 0.0);

        let (strength, size_scale) = system.update(0.0, 16.0);
        assert_eq!(strength, 0.2);
        assert_eq!(size_scale, 1.0);
        assert_eq!(system.serialize(size_scale).len(), 3 * system.dot_count());
    }
}
