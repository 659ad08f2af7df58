use image::{imageops, GrayImage, RgbImage};
use std::fmt;

/// Sigma of the fixed smoothing kernel used by [`FilterMode::Blur`]
/// (the sigma of a 15x15 gaussian kernel).
const BLUR_SIGMA: f32 = 2.6;
const CANNY_LOW: f32 = 100.;
const CANNY_HIGH: f32 = 200.;

/// One captured or processed image buffer. Filters may narrow a color frame
/// down to a single intensity channel, so both layouts are first-class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Color(RgbImage),
    Mono(GrayImage),
}

impl Frame {
    #[must_use]
    pub fn channels(&self) -> u8 {
        match self {
            Frame::Color(_) => 3,
            Frame::Mono(_) => 1,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Color(image) => image.dimensions(),
            Frame::Mono(image) => image.dimensions(),
        }
    }
}

/// The active image transform. Exactly one is selected at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Original,
    Gray,
    Blur,
    Canny,
    Invert,
}

impl FilterMode {
    /// Selector order shown in the UI.
    pub const ALL: [FilterMode; 5] = [
        FilterMode::Original,
        FilterMode::Gray,
        FilterMode::Blur,
        FilterMode::Canny,
        FilterMode::Invert,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Original => "Original",
            FilterMode::Gray => "Gray",
            FilterMode::Blur => "Blur",
            FilterMode::Canny => "Canny",
            FilterMode::Invert => "Invert",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Applies `mode` to a raw color frame. Pure and deterministic; the input is
/// consumed and a fresh frame is produced.
#[must_use]
pub fn apply(image: RgbImage, mode: FilterMode) -> Frame {
    match mode {
        FilterMode::Original => Frame::Color(image),
        FilterMode::Gray => Frame::Mono(imageops::grayscale(&image)),
        FilterMode::Blur => Frame::Color(imageproc::filter::gaussian_blur_f32(&image, BLUR_SIGMA)),
        FilterMode::Canny => Frame::Mono(imageproc::edges::canny(
            &imageops::grayscale(&image),
            CANNY_LOW,
            CANNY_HIGH,
        )),
        FilterMode::Invert => {
            let mut image = image;
            imageops::invert(&mut image);
            Frame::Color(image)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_frame() -> RgbImage {
        RgbImage::from_fn(16, 12, |x, y| {
            Rgb([(x * 16) as u8, (y * 21) as u8, ((x + y) * 7) as u8])
        })
    }

    #[test]
    fn channel_count_per_mode() {
        let frame = gradient_frame();
        let expected = [
            (FilterMode::Original, 3),
            (FilterMode::Gray, 1),
            (FilterMode::Blur, 3),
            (FilterMode::Canny, 1),
            (FilterMode::Invert, 3),
        ];
        for (mode, channels) in expected {
            assert_eq!(apply(frame.clone(), mode).channels(), channels, "{mode}");
        }
    }

    #[test]
    fn original_is_identity() {
        let frame = gradient_frame();
        assert_eq!(
            apply(frame.clone(), FilterMode::Original),
            Frame::Color(frame)
        );
    }

    #[test]
    fn double_invert_restores_the_input() {
        let frame = gradient_frame();
        let Frame::Color(once) = apply(frame.clone(), FilterMode::Invert) else {
            panic!("invert should keep three channels");
        };
        assert_ne!(once, frame);
        assert_eq!(apply(once, FilterMode::Invert), Frame::Color(frame));
    }

    #[test]
    fn blur_keeps_dimensions_and_changes_pixels() {
        let frame = gradient_frame();
        let blurred = apply(frame.clone(), FilterMode::Blur);
        assert_eq!(blurred.dimensions(), (16, 12));
        assert_ne!(blurred, Frame::Color(frame));
    }
}
