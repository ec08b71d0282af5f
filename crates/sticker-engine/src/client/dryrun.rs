use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{map_object, parse_dims, GenerateRequest, GeneratedImage, ImageGenerator};
use crate::encoder::EncodedImage;
use crate::error::{GenerationError, GenerationResult};

/// Largest edge the offline renderer will allocate.
const MAX_SIDE: u32 = 4096;

/// Offline generator: a flat PNG whose colour is derived from the prompt and
/// the reference image. Needs no credential and never touches the network.
pub struct DryrunGenerator;

impl ImageGenerator for DryrunGenerator {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &GenerateRequest) -> GenerationResult<GeneratedImage> {
        let (width, height) = parse_dims(&request.size);
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(GenerationError::Render {
                what: "dryrun preview",
                detail: format!("size {width}x{height} exceeds {MAX_SIDE}x{MAX_SIDE}"),
            });
        }
        let (r, g, b) = color_from_prompt(&request.prompt, &request.reference.b64);
        let image = RgbImage::from_pixel(width, height, Rgb([r, g, b]));

        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|err| GenerationError::Render {
                what: "dryrun preview",
                detail: err.to_string(),
            })?;

        Ok(GeneratedImage {
            image: EncodedImage::from_bytes(&out.into_inner()),
            provider_request: map_object(json!({
                "endpoint": "dryrun-native",
                "payload": {
                    "model": request.model,
                    "prompt": request.prompt,
                    "size": request.size,
                }
            })),
            provider_response: map_object(json!({
                "status": "ok",
                "color": hex::encode([r, g, b]),
            })),
        })
    }
}

fn color_from_prompt(prompt: &str, reference_b64: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(reference_b64.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}
