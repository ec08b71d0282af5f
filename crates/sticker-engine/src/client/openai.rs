use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use super::{map_object, GenerateRequest, GeneratedImage, ImageGenerator};
use crate::config::API_KEY_VAR;
use crate::encoder::{sniff_mime, EncodedImage};
use crate::error::{truncate_text, GenerationError, GenerationResult};

const PROVIDER: &str = "OpenAI";

/// OpenAI Images API, edits endpoint, with the uploaded image as the
/// reference. One request per call; no retries.
pub struct OpenAiGenerator {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl OpenAiGenerator {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|value| !value.trim().is_empty()),
            // Image edits routinely outlive the blocking client's default timeout.
            http: HttpClient::builder()
                .timeout(None::<Duration>)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images/edits", self.api_base)
    }

    fn payload(request: &GenerateRequest) -> Value {
        json!({
            "model": request.model,
            "prompt": request.prompt,
            "size": request.size,
            "n": 1,
            "images": [{ "image_url": request.reference.data_url() }],
        })
    }

    fn payload_manifest(request: &GenerateRequest) -> Value {
        json!({
            "model": request.model,
            "prompt": request.prompt,
            "size": request.size,
            "n": 1,
            "images": [{
                "mime": request.reference.mime,
                "b64_chars": request.reference.b64.len(),
            }],
        })
    }

    fn post_json(
        &self,
        endpoint: &str,
        api_key: &str,
        payload: &Value,
    ) -> GenerationResult<(u16, Value)> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .map_err(|source| GenerationError::Transport {
                provider: PROVIDER.to_string(),
                endpoint: endpoint.to_string(),
                source,
            })?;
        let status_code = response.status().as_u16();
        let parsed = response_json_or_error(endpoint, response)?;
        Ok((status_code, parsed))
    }
}

fn response_json_or_error(endpoint: &str, response: HttpResponse) -> GenerationResult<Value> {
    let status = response.status();
    let body = response.text().map_err(|source| GenerationError::Transport {
        provider: PROVIDER.to_string(),
        endpoint: endpoint.to_string(),
        source,
    })?;
    if !status.is_success() {
        return Err(GenerationError::Service {
            provider: PROVIDER.to_string(),
            status: status.as_u16(),
            body: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|err| GenerationError::InvalidResponse {
        provider: PROVIDER.to_string(),
        detail: err.to_string(),
    })
}

/// Pulls the first `b64_json` image out of an Images API response.
pub(crate) fn extract_first_image(response_payload: &Value) -> GenerationResult<EncodedImage> {
    let b64 = response_payload
        .get("data")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("b64_json"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GenerationError::EmptyResponse {
            provider: PROVIDER.to_string(),
        })?;
    let bytes = BASE64
        .decode(b64.as_bytes())
        .map_err(|err| GenerationError::InvalidResponse {
            provider: PROVIDER.to_string(),
            detail: format!("image base64 decode failed: {err}"),
        })?;
    Ok(EncodedImage {
        b64: b64.to_string(),
        mime: sniff_mime(&bytes).unwrap_or("image/png").to_string(),
    })
}

impl ImageGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, request: &GenerateRequest) -> GenerationResult<GeneratedImage> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationError::MissingCredential { key: API_KEY_VAR });
        };

        let endpoint = self.endpoint();
        let (status_code, response_payload) =
            self.post_json(&endpoint, api_key, &Self::payload(request))?;
        let image = extract_first_image(&response_payload)?;

        let mut provider_response = map_object(json!({
            "status_code": status_code,
            "created": response_payload.get("created").cloned().unwrap_or(Value::Null),
        }));
        if let Some(usage) = response_payload.get("usage").cloned() {
            provider_response.insert("usage".to_string(), usage);
        }

        Ok(GeneratedImage {
            image,
            provider_request: map_object(json!({
                "endpoint": endpoint,
                "payload": Self::payload_manifest(request),
            })),
            provider_response,
        })
    }
}
