//! Interactive viewer around one report image.
//!
//! Wraps a [`ViewportEngine`] with the keyboard map, best-effort fullscreen
//! and a short-lived notice for operations the platform refused.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use tokio::time::Instant;

use crate::models::report::ReportImage;
use crate::services::viewport::ViewportEngine;

/// How long a notice stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

const FULLSCREEN_UNSUPPORTED: &str = "Fullscreen mode is not supported in your browser";
const IMAGE_DOWNLOAD_FAILED: &str = "Failed to download image";

/// Platform side of fullscreen handling.
pub trait FullscreenHost {
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError>;
    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FullscreenError {
    #[error("fullscreen request rejected: {0}")]
    Rejected(String),
}

/// Host for environments without fullscreen support.
#[derive(Debug, Default)]
pub struct NoFullscreen;

impl FullscreenHost for NoFullscreen {
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError> {
        Err(FullscreenError::Rejected("not available".to_string()))
    }

    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Close,
    ZoomIn,
    ZoomOut,
    Reset,
    Rotate,
    ToggleFullscreen,
}

impl ViewerCommand {
    /// Map a key name (as reported by the host) to a command.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Escape" => Some(ViewerCommand::Close),
            "+" => Some(ViewerCommand::ZoomIn),
            "-" => Some(ViewerCommand::ZoomOut),
            "0" => Some(ViewerCommand::Reset),
            "r" => Some(ViewerCommand::Rotate),
            "f" => Some(ViewerCommand::ToggleFullscreen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The viewer should be closed and dropped.
    Close,
    Handled,
    Ignored,
}

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

pub struct ImageViewer<H: FullscreenHost> {
    image: ReportImage,
    engine: ViewportEngine,
    host: H,
    fullscreen: bool,
    notice: Option<Notice>,
}

impl<H: FullscreenHost> ImageViewer<H> {
    pub fn open(image: ReportImage, host: H) -> Self {
        tracing::debug!(page = image.page_number, "Image viewer opened");
        Self {
            image,
            engine: ViewportEngine::new(),
            host,
            fullscreen: false,
            notice: None,
        }
    }

    pub fn image(&self) -> &ReportImage {
        &self.image
    }

    pub fn engine(&self) -> &ViewportEngine {
        &self.engine
    }

    /// Pointer events go straight to the engine.
    pub fn engine_mut(&mut self) -> &mut ViewportEngine {
        &mut self.engine
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// The current notice, if it has not yet expired.
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| Instant::now() < n.expires_at)
            .map(|n| n.message.as_str())
    }

    pub fn handle_key(&mut self, key: &str) -> KeyOutcome {
        match ViewerCommand::from_key(key) {
            Some(command) => self.apply(command),
            None => KeyOutcome::Ignored,
        }
    }

    pub fn apply(&mut self, command: ViewerCommand) -> KeyOutcome {
        match command {
            ViewerCommand::Close => return KeyOutcome::Close,
            ViewerCommand::ZoomIn => self.engine.zoom_in(),
            ViewerCommand::ZoomOut => self.engine.zoom_out(),
            ViewerCommand::Reset => self.engine.reset(),
            ViewerCommand::Rotate => self.engine.rotate(),
            ViewerCommand::ToggleFullscreen => self.toggle_fullscreen(),
        }
        KeyOutcome::Handled
    }

    /// Enter or leave fullscreen. A refusal only raises a notice.
    pub fn toggle_fullscreen(&mut self) {
        let result = if self.fullscreen {
            self.host.exit_fullscreen()
        } else {
            self.host.request_fullscreen()
        };

        match result {
            Ok(()) => self.fullscreen = !self.fullscreen,
            Err(e) => {
                tracing::debug!(error = %e, "Fullscreen toggle refused");
                self.show_notice(FULLSCREEN_UNSUPPORTED);
            }
        }
    }

    /// Decode the image and save it as `image-{page}.png` in `dir`.
    pub async fn export_image(&mut self, dir: &Path) -> Result<PathBuf, ImageExportError> {
        match write_image(&self.image, dir).await {
            Ok(path) => Ok(path),
            Err(e) => {
                tracing::warn!(page = self.image.page_number, error = %e, "Image export failed");
                self.show_notice(IMAGE_DOWNLOAD_FAILED);
                Err(e)
            }
        }
    }

    fn show_notice(&mut self, message: &str) {
        self.notice = Some(Notice {
            message: message.to_string(),
            expires_at: Instant::now() + NOTICE_DURATION,
        });
    }
}

async fn write_image(img: &ReportImage, dir: &Path) -> Result<PathBuf, ImageExportError> {
    let encoded = strip_data_url(&img.base64_image);
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    image::guess_format(&bytes)?;

    let path = dir.join(img.file_name());
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

/// Accept both bare base64 and `data:image/png;base64,...` payloads.
fn strip_data_url(raw: &str) -> &str {
    match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageExportError {
    #[error("Image data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Image data is not a recognised image format: {0}")]
    Format(#[from] image::ImageError),

    #[error("Failed to save image: {0}")]
    Io(#[from] std::io::Error),
}
