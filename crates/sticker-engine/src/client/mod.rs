use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::config::GenerationConfig;
use crate::encoder::EncodedImage;
use crate::error::{GenerationError, GenerationResult};

mod dryrun;
mod openai;

pub use dryrun::DryrunGenerator;
pub use openai::OpenAiGenerator;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub size: String,
    pub reference: EncodedImage,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image: EncodedImage,
    /// What was sent, minus the image payload.
    pub provider_request: Map<String, Value>,
    pub provider_response: Map<String, Value>,
}

/// One external (or simulated) image service.
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &GenerateRequest) -> GenerationResult<GeneratedImage>;
}

#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<String, Box<dyn ImageGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in generators, configured from `config`.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(DryrunGenerator);
        registry.register(OpenAiGenerator::new(
            config.api_base.clone(),
            config.api_key.clone(),
        ));
        registry
    }

    pub fn register<G: ImageGenerator + 'static>(&mut self, generator: G) {
        self.generators
            .insert(generator.name().to_string(), Box::new(generator));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ImageGenerator> {
        self.generators.get(name).map(|generator| generator.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.generators.keys().cloned().collect()
    }

    /// Removes and returns a generator, or explains which ones exist.
    pub fn take(&mut self, name: &str) -> GenerationResult<Box<dyn ImageGenerator>> {
        match self.generators.remove(name) {
            Some(generator) => Ok(generator),
            None => Err(GenerationError::UnknownProvider {
                name: name.to_string(),
                available: self.names().join(", "),
            }),
        }
    }
}

pub(crate) fn parse_dims(size: &str) -> (u32, u32) {
    let raw = size.trim().to_ascii_lowercase();
    if let Some((w, h)) = raw.split_once('x') {
        let width = w.trim().parse::<u32>().unwrap_or(1024);
        let height = h.trim().parse::<u32>().unwrap_or(1024);
        return (width.max(1), height.max(1));
    }
    (1024, 1024)
}

pub(crate) fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
