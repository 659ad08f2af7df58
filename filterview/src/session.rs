use crate::filter::{self, FilterMode, Frame};
use image::RgbImage;
use std::ops::RangeInclusive;
use std::sync::{Arc, RwLock};

/// Range of the cosmetic overlay counter.
pub const OVERLAY_RANGE: RangeInclusive<i32> = 0..=400;

/// Session state mutated by the control surface and read by the processing
/// thread once per frame. Exactly one mode is active at any time.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub mode: FilterMode,
    /// Drawn as text over the frame; no effect on filtering.
    pub overlay_value: i32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: FilterMode::Original,
            overlay_value: 10,
        }
    }
}

/// A processed frame paired with the raw capture it came from. The display
/// shows the filtered image; snapshots store the raw one.
pub struct RenderedFrame {
    pub raw: RgbImage,
    pub filtered: Frame,
}

/// The per-frame pipeline: reads the active mode and applies it exactly once.
/// Runs inside the capture thread's processing closure, so it carries no UI
/// coupling.
pub struct FrameProcessor {
    settings: Arc<RwLock<SessionSettings>>,
}

impl FrameProcessor {
    #[must_use]
    pub fn new(settings: Arc<RwLock<SessionSettings>>) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn process(&self, raw: RgbImage) -> RenderedFrame {
        let mode = self.settings.read().unwrap().mode;
        let filtered = filter::apply(raw.clone(), mode);
        RenderedFrame { raw, filtered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn processor_applies_the_selected_mode() {
        let settings = Arc::new(RwLock::new(SessionSettings::default()));
        let processor = FrameProcessor::new(settings.clone());
        let raw = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));

        settings.write().unwrap().mode = FilterMode::Gray;
        let rendered = processor.process(raw.clone());
        assert_eq!(rendered.filtered.channels(), 1);
        assert_eq!(rendered.raw, raw);

        settings.write().unwrap().mode = FilterMode::Original;
        let rendered = processor.process(raw.clone());
        assert_eq!(rendered.filtered, Frame::Color(raw));
    }

    #[test]
    fn default_settings_match_the_initial_ui_state() {
        let settings = SessionSettings::default();
        assert_eq!(settings.mode, FilterMode::Original);
        assert_eq!(settings.overlay_value, 10);
        assert!(OVERLAY_RANGE.contains(&settings.overlay_value));
    }
}
