use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::selection::{RectangleOrientation, Selection, StickerMaterial, StickerShape};

/// Message shown for every failed generation, whatever the cause.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate the sticker preview. Please try again.";

/// An image picked by the user. The path doubles as the local preview
/// reference; the bytes are read when a submit starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub path: PathBuf,
    pub file_name: String,
}

impl UploadedImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("image")
            .to_string();
        Self { path, file_name }
    }

    pub fn preview_ref(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewStatus {
    #[default]
    Idle,
    Loading,
    Success { data_url: String },
    Error { message: String },
}

impl PreviewStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data_url(&self) -> Option<&str> {
        match self {
            Self::Success { data_url } => Some(data_url.as_str()),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    NoImage,
    InFlight,
}

impl fmt::Display for SubmitBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoImage => f.write_str("upload an image first (/upload <path>)"),
            Self::InFlight => f.write_str("a preview is already being generated"),
        }
    }
}

impl std::error::Error for SubmitBlocked {}

/// Snapshot taken when a submit starts; later edits to the form do not
/// affect the request already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub image: UploadedImage,
    pub selection: Selection,
}

/// Form state plus the idle/loading/success/error status machine.
#[derive(Debug, Clone, Default)]
pub struct PreviewSession {
    selection: Selection,
    image: Option<UploadedImage>,
    status: PreviewStatus,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    pub fn set_shape(&mut self, shape: StickerShape) {
        self.selection.shape = shape;
    }

    pub fn set_material(&mut self, material: StickerMaterial) {
        self.selection.material = material;
    }

    pub fn set_orientation(&mut self, orientation: RectangleOrientation) {
        self.selection.orientation = orientation;
    }

    /// The orientation control is only offered for rectangles.
    pub fn orientation_visible(&self) -> bool {
        self.selection.uses_orientation()
    }

    /// Replaces the image and clears any displayed result. Selections stay.
    pub fn upload(&mut self, image: UploadedImage) {
        self.image = Some(image);
        if !self.status.is_loading() {
            self.status = PreviewStatus::Idle;
        }
    }

    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.status.is_loading()
    }

    pub fn begin_submit(&mut self) -> Result<Submission, SubmitBlocked> {
        if self.status.is_loading() {
            return Err(SubmitBlocked::InFlight);
        }
        let Some(image) = self.image.clone() else {
            return Err(SubmitBlocked::NoImage);
        };
        self.status = PreviewStatus::Loading;
        Ok(Submission {
            image,
            selection: self.selection,
        })
    }

    pub fn complete_success(&mut self, b64: &str, mime: &str) {
        self.status = PreviewStatus::Success {
            data_url: format!("data:{mime};base64,{b64}"),
        };
    }

    pub fn complete_failure(&mut self) {
        self.status = PreviewStatus::Error {
            message: GENERATION_FAILED_MESSAGE.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_image() -> PreviewSession {
        let mut session = PreviewSession::new();
        session.upload(UploadedImage::new("/tmp/logo.png"));
        session
    }

    #[test]
    fn starts_idle_with_default_selection() {
        let session = PreviewSession::new();
        assert_eq!(session.status(), &PreviewStatus::Idle);
        assert_eq!(session.selection(), Selection::default());
        assert!(session.image().is_none());
    }

    #[test]
    fn submit_without_image_is_refused() {
        let mut session = PreviewSession::new();
        assert!(!session.can_submit());
        assert_eq!(session.begin_submit(), Err(SubmitBlocked::NoImage));
        assert_eq!(session.status(), &PreviewStatus::Idle);
    }

    #[test]
    fn submit_moves_to_loading_and_snapshots_form() {
        let mut session = session_with_image();
        session.set_shape(StickerShape::Rectangle);
        session.set_orientation(RectangleOrientation::Portrait);

        let submission = session.begin_submit().expect("submit");
        assert!(session.status().is_loading());
        assert!(!session.can_submit());
        assert_eq!(submission.image.file_name, "logo.png");
        assert_eq!(submission.selection.shape, StickerShape::Rectangle);

        session.set_shape(StickerShape::Round);
        assert_eq!(submission.selection.shape, StickerShape::Rectangle);
    }

    #[test]
    fn second_submit_while_loading_is_refused() {
        let mut session = session_with_image();
        session.begin_submit().expect("first submit");
        assert_eq!(session.begin_submit(), Err(SubmitBlocked::InFlight));
    }

    #[test]
    fn success_holds_displayable_data_url() {
        let mut session = session_with_image();
        session.begin_submit().expect("submit");
        session.complete_success("aGVsbG8=", "image/png");
        assert_eq!(
            session.status().data_url(),
            Some("data:image/png;base64,aGVsbG8=")
        );
        assert!(!session.status().is_loading());
    }

    #[test]
    fn failure_shows_generic_message_and_clears_loading() {
        let mut session = session_with_image();
        session.begin_submit().expect("submit");
        session.complete_failure();
        assert_eq!(session.status().name(), "error");
        assert_eq!(
            session.status().error_message(),
            Some(GENERATION_FAILED_MESSAGE)
        );
        assert!(session.can_submit());
    }

    #[test]
    fn resubmit_clears_previous_result() {
        let mut session = session_with_image();
        session.begin_submit().expect("submit");
        session.complete_failure();
        session.begin_submit().expect("resubmit");
        assert_eq!(session.status(), &PreviewStatus::Loading);
    }

    #[test]
    fn reupload_clears_result_but_keeps_selection() {
        let mut session = session_with_image();
        session.set_material(StickerMaterial::Domed);
        session.begin_submit().expect("submit");
        session.complete_success("AAAA", "image/png");

        session.upload(UploadedImage::new("/tmp/other.jpg"));
        assert_eq!(session.status(), &PreviewStatus::Idle);
        assert_eq!(session.selection().material, StickerMaterial::Domed);
        assert_eq!(
            session.image().map(|image| image.file_name.as_str()),
            Some("other.jpg")
        );
    }

    #[test]
    fn orientation_control_only_for_rectangles() {
        let mut session = PreviewSession::new();
        assert!(!session.orientation_visible());
        session.set_shape(StickerShape::Rectangle);
        assert!(session.orientation_visible());
    }
}
