use anyhow::Context as _;
use chrono::Local;
use clap::Parser;
use common::cam::{create_camera_stream, create_still_stream};
use eframe::egui::{
    self, Align2, CentralPanel, Color32, ComboBox, Context, FontId, ImageData, Key, Separator,
    SidePanel, Slider, TextureOptions, Widget,
};
use eframe::{App, Frame};
use filterview::filter::FilterMode;
use filterview::render::to_display;
use filterview::session::{FrameProcessor, RenderedFrame, SessionSettings, OVERLAY_RANGE};
use filterview::snapshot::SnapshotWriter;
use image::RgbImage;
use nokhwa::utils::CameraIndex;
use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

/// Interval between re-renders of a still image.
const STILL_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Parser)]
#[command(about = "Live camera viewer with selectable filters and snapshot capture")]
struct Args {
    /// Camera device index
    #[arg(long, default_value_t = 0)]
    camera: u32,
    /// Show a still image instead of the camera feed
    #[arg(long)]
    image: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings = Arc::new(RwLock::new(SessionSettings::default()));
    let processor = FrameProcessor::new(settings.clone());

    let receiver = match args.image {
        Some(path) => {
            let image = image::open(&path)
                .with_context(|| format!("cannot open image {}", path.display()))?
                .to_rgb8();
            create_still_stream(image, STILL_INTERVAL, move |img| processor.process(img))
        }
        None => create_camera_stream(CameraIndex::Index(args.camera), move |img| {
            processor.process(img)
        }),
    };

    let stream = move || match receiver.try_recv() {
        Ok(item) => Some(item),
        Err(TryRecvError::Disconnected) => {
            panic!("frame stream ended; capture source is gone")
        }
        Err(TryRecvError::Empty) => None,
    };

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(800., 600.)),
        ..Default::default()
    };
    let app = FilterApp::new(stream, settings);
    eframe::run_native("Filter Selection", options, Box::new(|_cc| Box::new(app)))
        .expect("should be able to run app");
    Ok(())
}

struct FilterApp<ImageStreamFn>
where
    ImageStreamFn: FnMut() -> Option<(RenderedFrame, f64)>,
{
    image_stream: ImageStreamFn,
    latest_display: Option<ImageData>,
    latest_raw: Option<RgbImage>,
    latest_fps: f64,
    settings: Arc<RwLock<SessionSettings>>,
    snapshots: SnapshotWriter,
}

impl<ImageStreamFn> FilterApp<ImageStreamFn>
where
    ImageStreamFn: FnMut() -> Option<(RenderedFrame, f64)>,
{
    fn new(image_stream: ImageStreamFn, settings: Arc<RwLock<SessionSettings>>) -> Self {
        Self {
            image_stream,
            latest_display: None,
            latest_raw: None,
            latest_fps: 0.,
            settings,
            snapshots: SnapshotWriter::default(),
        }
    }

    /// Saves the latest raw frame. Prompts for a folder first if none is set;
    /// a cancelled prompt writes nothing. Write failures are logged only.
    fn capture_photo(&mut self) {
        if self.snapshots.folder().is_none() {
            match choose_capture_folder() {
                Some(folder) => self.snapshots.set_folder(folder),
                None => {
                    debug!("capture folder selection cancelled");
                    return;
                }
            }
        }
        let Some(raw) = self.latest_raw.as_ref() else {
            warn!("no frame available to capture");
            return;
        };
        if let Err(e) = self.snapshots.save(raw, Local::now()) {
            error!(%e, "could not save photo");
        }
    }
}

fn choose_capture_folder() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Choose Capture Folder")
        .pick_folder()
}

impl<ImageStreamFn> App for FilterApp<ImageStreamFn>
where
    ImageStreamFn: FnMut() -> Option<(RenderedFrame, f64)>,
{
    fn update(&mut self, ctx: &Context, epi_frame: &mut Frame) {
        if let Some((rendered, fps)) = (self.image_stream)() {
            self.latest_display = Some(to_display(&rendered.filtered));
            self.latest_raw = Some(rendered.raw);
            self.latest_fps = fps;
        }

        let mut configuration = self.settings.read().unwrap().clone();
        let mut changed = false;

        SidePanel::left("Controls").show(ctx, |sidebar| {
            sidebar.spacing_mut().item_spacing.y = 10.;

            ComboBox::from_label("filter")
                .selected_text(configuration.mode.label())
                .show_ui(sidebar, |ui| {
                    for mode in FilterMode::ALL {
                        changed |= ui
                            .selectable_value(&mut configuration.mode, mode, mode.label())
                            .changed();
                    }
                });

            let slider = Slider::new(&mut configuration.overlay_value, OVERLAY_RANGE)
                .step_by(1.)
                .text("overlay");
            changed |= sidebar.add(slider).changed();

            Separator::default().ui(sidebar);

            if sidebar.button("Choose Folder").clicked() {
                if let Some(folder) = choose_capture_folder() {
                    self.snapshots.set_folder(folder);
                }
            }
            if let Some(folder) = self.snapshots.folder() {
                sidebar.label(folder.display().to_string());
            }
            if sidebar.button("Capture Photo").clicked() {
                self.capture_photo();
            }

            Separator::default().ui(sidebar);
            sidebar.label(format!("{:.1} fps", self.latest_fps));
        });

        if changed {
            self.settings.write().unwrap().clone_from(&configuration);
        }

        CentralPanel::default().show(ctx, |image_draw_area| match &self.latest_display {
            Some(image) => {
                let tex = image_draw_area.ctx().load_texture(
                    "frame",
                    image.clone(),
                    TextureOptions::LINEAR,
                );
                let response = image_draw_area.image(&tex, image_draw_area.available_size());
                image_draw_area.painter().text(
                    response.rect.left_top() + egui::vec2(24., 24.),
                    Align2::LEFT_TOP,
                    configuration.overlay_value.to_string(),
                    FontId::proportional(48.),
                    Color32::RED,
                );
            }
            None => {
                image_draw_area.colored_label(
                    image_draw_area.visuals().error_fg_color,
                    "no image received from capture source",
                );
            }
        });

        if ctx.input(|i| {
            [Key::Q, Key::Escape]
                .into_iter()
                .any(|key| i.key_pressed(key))
        }) {
            epi_frame.close();
        }

        ctx.request_repaint();
    }
}
