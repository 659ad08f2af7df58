pub mod cam {
    use image::RgbImage;
    use nokhwa::{
        pixel_format::RgbFormat,
        utils::{CameraIndex, RequestedFormat, RequestedFormatType},
        Camera,
    };
    use simple_moving_average::{SumTreeSMA, SMA};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tracing::{debug, error};

    /// Consecutive read failures tolerated before the stream gives up.
    const ERROR_LIMIT: u32 = 30;

    struct FpsMeter {
        average: SumTreeSMA<f64, f64, 5>,
        previous: Option<Instant>,
    }

    impl FpsMeter {
        fn new() -> Self {
            Self {
                average: SumTreeSMA::new(),
                previous: None,
            }
        }

        fn tick(&mut self) -> f64 {
            let now = Instant::now();
            if let Some(previous) = self.previous {
                self.average
                    .add_sample(1. / now.duration_since(previous).as_secs_f64());
            }
            self.previous = Some(now);
            self.average.get_average()
        }
    }

    /// Spawns a thread that owns the camera, runs `process` on every decoded
    /// frame and sends the result (paired with a smoothed FPS estimate) over
    /// a bounded channel. A slow consumer drops frames instead of queueing
    /// them. Dropping the receiver ends the thread and releases the device.
    ///
    /// # Panics
    ///
    /// The capture thread panics if the camera at `index` cannot be opened;
    /// the session cannot proceed without a source.
    #[must_use]
    pub fn create_camera_stream<F, I>(index: CameraIndex, process: F) -> mpsc::Receiver<(I, f64)>
    where
        F: Fn(RgbImage) -> I + Send + 'static,
        I: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(2);

        thread::spawn(move || {
            let mut camera = Camera::new(
                index,
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
            )
            .expect("expected a camera on received index");
            if !camera.is_stream_open() {
                camera
                    .open_stream()
                    .expect("should be able to open stream on camera");
            }
            {
                let info = camera.info();
                debug!(?info, "opened camera");
            }

            let mut fps = FpsMeter::new();
            let mut fails = 0;
            loop {
                match camera
                    .frame()
                    .and_then(|frame| frame.decode_image::<RgbFormat>())
                {
                    Ok(frame) => {
                        fails = 0;
                        let frame = process(frame);
                        if sender.send((frame, fps.tick())).is_err() {
                            debug!("frame receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        fails += 1;
                        error!(%fails, %e);
                        if fails >= ERROR_LIMIT {
                            error!(ERROR_LIMIT, "exceeded error limit");
                            break;
                        }
                    }
                }
            }
            debug!("end of capture loop");
        });

        receiver
    }

    /// Still-image counterpart of [`create_camera_stream`]: re-sends the same
    /// decoded image every `interval` through the same channel contract, so
    /// the rest of the pipeline cannot tell the two sources apart.
    #[must_use]
    pub fn create_still_stream<F, I>(
        image: RgbImage,
        interval: Duration,
        process: F,
    ) -> mpsc::Receiver<(I, f64)>
    where
        F: Fn(RgbImage) -> I + Send + 'static,
        I: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(2);

        thread::spawn(move || {
            let mut fps = FpsMeter::new();
            loop {
                thread::sleep(interval);
                let frame = process(image.clone());
                if sender.send((frame, fps.tick())).is_err() {
                    debug!("frame receiver dropped");
                    break;
                }
            }
            debug!("end of still loop");
        });

        receiver
    }
}

pub mod convert {
    use image::{GrayImage, RgbImage};
    use lazy_static::lazy_static;

    /// A frame converted to the layout the display surface expects.
    pub struct DisplayImage(pub egui::ImageData);

    impl From<&RgbImage> for DisplayImage {
        fn from(value: &RgbImage) -> Self {
            let image = egui::ColorImage::from_rgb(
                [value.width() as usize, value.height() as usize],
                value.as_ref(),
            );
            DisplayImage(image.into())
        }
    }

    impl From<&GrayImage> for DisplayImage {
        fn from(value: &GrayImage) -> Self {
            let image = value.clone().expand_palette(&(*PALETTE), None);
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_ref(),
            );
            DisplayImage(image.into())
        }
    }

    lazy_static! {
        static ref PALETTE: [(u8, u8, u8); 256] = {
            let mut palette = [(0_u8, 0_u8, 0_u8); 256];
            for v in 0_u8..=255 {
                palette[v as usize] = (v, v, v);
            }
            palette
        };
    }
}

#[cfg(test)]
mod tests {
    use super::cam::create_still_stream;
    use super::convert::DisplayImage;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn still_stream_delivers_processed_frames() {
        let image = RgbImage::from_pixel(4, 3, Rgb([7, 8, 9]));
        let receiver = create_still_stream(image, Duration::from_millis(1), |img| {
            (img.width(), img.height())
        });
        let ((width, height), _fps) = receiver.recv().expect("stream should produce a frame");
        assert_eq!((width, height), (4, 3));
    }

    #[test]
    fn dropping_the_receiver_ends_the_stream_and_releases_its_resources() {
        let marker = Arc::new(());
        let receiver = {
            let marker = Arc::clone(&marker);
            create_still_stream(
                RgbImage::from_pixel(2, 2, Rgb([1, 1, 1])),
                Duration::from_millis(1),
                move |img| {
                    let _held = &marker;
                    img.width()
                },
            )
        };
        receiver.recv().expect("stream should produce a frame");
        drop(receiver);

        // The loop owns the processing closure (and, on the camera path, the
        // device handle); once the send fails the thread must exit and drop
        // them, leaving our handle as the only one.
        let deadline = Instant::now() + Duration::from_secs(5);
        while Arc::strong_count(&marker) > 1 {
            assert!(
                Instant::now() < deadline,
                "capture loop kept running after the receiver was dropped"
            );
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn gray_frames_expand_to_a_displayable_size() {
        let gray = GrayImage::from_pixel(5, 4, Luma([128]));
        let DisplayImage(data) = (&gray).into();
        assert_eq!(data.size(), [5, 4]);
    }
}
