use crate::filter::Frame;
use common::convert::DisplayImage;
use egui::ImageData;

/// Converts a processed frame into the layout the display surface expects.
/// Mono frames are expanded to a displayable three-channel representation.
#[must_use]
pub fn to_display(frame: &Frame) -> ImageData {
    match frame {
        Frame::Color(image) => DisplayImage::from(image).0,
        Frame::Mono(image) => DisplayImage::from(image).0,
    }
}

#[cfg(test)]
mod tests {
    use super::to_display;
    use crate::filter::Frame;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn both_frame_layouts_are_displayable() {
        let color = Frame::Color(RgbImage::from_pixel(6, 2, Rgb([1, 2, 3])));
        assert_eq!(to_display(&color).size(), [6, 2]);

        let mono = Frame::Mono(GrayImage::from_pixel(3, 7, Luma([200])));
        assert_eq!(to_display(&mono).size(), [3, 7]);
    }
}
