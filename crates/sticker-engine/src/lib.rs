use std::time::Instant;

use serde_json::{json, Value};
use sticker_contracts::events::EventWriter;
use sticker_contracts::prompt::build_prompt;
use sticker_contracts::selection::{Choice, Selection};
use sticker_contracts::session::{PreviewSession, PreviewStatus, SubmitBlocked, UploadedImage};

pub mod client;
pub mod config;
pub mod encoder;
pub mod error;

use client::{GenerateRequest, GeneratorRegistry, ImageGenerator};
use config::GenerationConfig;
use encoder::{encode_image_file, EncodedImage};
use error::{error_chain_text, GenerationError, GenerationResult};

const ERROR_DETAIL_MAX_CHARS: usize = 800;

/// A successful generation, ready to display.
#[derive(Debug, Clone)]
pub struct GeneratedPreview {
    pub image: EncodedImage,
    pub prompt: String,
    pub model: String,
    pub provider: String,
    pub elapsed_s: f64,
}

/// Outcome of one submit cycle on a [`PreviewSession`].
#[derive(Debug)]
pub enum SubmitOutcome {
    Blocked(SubmitBlocked),
    Generated(GeneratedPreview),
    Failed(GenerationError),
}

/// Runs upload → prompt → generation for a session.
pub struct PreviewEngine {
    config: GenerationConfig,
    generator: Box<dyn ImageGenerator>,
    events: EventWriter,
}

impl PreviewEngine {
    /// Fails when the configured provider is unknown. A missing API key is
    /// reported by the first generation, before any network call.
    pub fn new(config: GenerationConfig, events: EventWriter) -> GenerationResult<Self> {
        let generator = GeneratorRegistry::from_config(&config).take(&config.provider)?;
        Ok(Self::with_generator(config, generator, events))
    }

    pub fn with_generator(
        config: GenerationConfig,
        generator: Box<dyn ImageGenerator>,
        events: EventWriter,
    ) -> Self {
        Self {
            config,
            generator,
            events,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn provider(&self) -> &str {
        self.generator.name()
    }

    /// Appends to the event log. A failed write is reported on stderr and
    /// never interrupts the caller.
    pub fn record_event(&self, event_type: &str, payload: Value) {
        if let Err(err) = self.events.emit_json(event_type, payload) {
            eprintln!("sticker-preview: failed to record {event_type} event: {err:#}");
        }
    }

    /// Encodes the image, builds the prompt and calls the generator once.
    pub fn generate_preview(
        &self,
        image: &UploadedImage,
        selection: &Selection,
    ) -> GenerationResult<GeneratedPreview> {
        let prompt = build_prompt(selection);
        self.record_event(
            "generation_started",
            json!({
                "provider": self.provider(),
                "model": self.config.model,
                "size": self.config.size,
                "image": image.path.to_string_lossy(),
                "shape": selection.shape.as_str(),
                "material": selection.material.as_str(),
                "orientation": selection.orientation.as_str(),
            }),
        );

        let started = Instant::now();
        let outcome = self.run_generation(image, prompt);
        let elapsed_s = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(preview) => self.record_event(
                "generation_finished",
                json!({
                    "provider": preview.provider,
                    "model": preview.model,
                    "mime": preview.image.mime,
                    "b64_chars": preview.image.b64.len(),
                    "elapsed_s": elapsed_s,
                }),
            ),
            Err(err) => self.record_event(
                "generation_failed",
                json!({
                    "provider": self.provider(),
                    "kind": err.kind(),
                    "error": error_chain_text(err, ERROR_DETAIL_MAX_CHARS),
                    "elapsed_s": elapsed_s,
                }),
            ),
        }

        outcome.map(|mut preview| {
            preview.elapsed_s = elapsed_s;
            preview
        })
    }

    fn run_generation(
        &self,
        image: &UploadedImage,
        prompt: String,
    ) -> GenerationResult<GeneratedPreview> {
        let reference = encode_image_file(&image.path)?;
        let request = GenerateRequest {
            prompt,
            model: self.config.model.clone(),
            size: self.config.size.clone(),
            reference,
        };
        let generated = self.generator.generate(&request)?;
        Ok(GeneratedPreview {
            image: generated.image,
            prompt: request.prompt,
            model: request.model,
            provider: self.provider().to_string(),
            elapsed_s: 0.0,
        })
    }

    /// One full submit: blocked, or loading followed by success or error.
    /// The session always ends outside `Loading`.
    pub fn submit(&self, session: &mut PreviewSession) -> SubmitOutcome {
        let submission = match session.begin_submit() {
            Ok(submission) => submission,
            Err(blocked) => {
                self.record_event("submit_blocked", json!({ "reason": blocked.to_string() }));
                return SubmitOutcome::Blocked(blocked);
            }
        };

        match self.generate_preview(&submission.image, &submission.selection) {
            Ok(preview) => {
                session.complete_success(&preview.image.b64, &preview.image.mime);
                SubmitOutcome::Generated(preview)
            }
            Err(err) => {
                session.complete_failure();
                SubmitOutcome::Failed(err)
            }
        }
    }
}

/// Human-facing description of a status, as the preview pane shows it.
pub fn describe_status(status: &PreviewStatus) -> String {
    match status {
        PreviewStatus::Idle => {
            "Your preview will appear here. Complete the steps to begin.".to_string()
        }
        PreviewStatus::Loading => {
            "The AI is creating your sticker... This may take a moment.".to_string()
        }
        PreviewStatus::Success { data_url } => {
            format!("Your sticker preview is ready ({} chars).", data_url.len())
        }
        PreviewStatus::Error { message } => format!("An error occurred. {message}"),
    }
}
