use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::VoiceError;

pub const UPLIFT_STT_URL: &str = "https://api.upliftai.org/v1/transcribe/speech-to-text";

/// Largest upload the provider accepts
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// An audio file received from the client
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    pub text: String,
    pub raw: Value,
}

/// Uplift AI speech-to-text client
#[derive(Clone)]
pub struct Transcriber {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl Transcriber {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, timeout, UPLIFT_STT_URL.to_string())
    }

    pub fn with_endpoint(api_key: Option<String>, timeout: Duration, endpoint: String) -> Self {
        let client = super::http_client(timeout);
        Self {
            client,
            api_key,
            endpoint,
        }
    }

    pub async fn transcribe(&self, upload: AudioUpload) -> Result<Transcription, VoiceError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            VoiceError::NotConfigured("UPLIFT_AI_API_KEY not configured".to_string())
        })?;

        check_audio_size(upload.bytes.len())?;

        let model = upload.model.unwrap_or_else(|| "scribe".to_string());
        let language = upload.language.unwrap_or_else(|| "ur".to_string());
        let domain = upload.domain.unwrap_or_else(|| "phone-commerce".to_string());
        let size = upload.bytes.len();

        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|e| {
                VoiceError::InvalidInput(format!("Invalid audio content type: {}", e))
            })?;
        }

        let form = Form::new()
            .part("file", part)
            .text("model", model.clone())
            .text("language", language.clone())
            .text("domain", domain.clone());

        tracing::info!(model = %model, language = %language, domain = %domain, size, "Sending audio to Uplift AI");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Uplift AI returned an error");
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("Uplift AI API error: {}", status));
            return Err(VoiceError::Provider {
                message,
                details: Some(body),
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|_| VoiceError::Provider {
            message: "Invalid response from Uplift AI".to_string(),
            details: Some(body.clone()),
        })?;

        let text = transcript_text(&raw).ok_or_else(|| VoiceError::Provider {
            message: "Transcription response missing text field".to_string(),
            details: Some(raw.to_string()),
        })?;

        Ok(Transcription { text, raw })
    }
}

pub fn check_audio_size(len: usize) -> Result<(), VoiceError> {
    if len == 0 {
        return Err(VoiceError::InvalidInput(
            "Audio file is empty. Please record some audio.".to_string(),
        ));
    }
    if len > MAX_AUDIO_BYTES {
        return Err(VoiceError::InvalidInput(
            "Audio file too large. Maximum size is 25MB.".to_string(),
        ));
    }
    Ok(())
}

/// `text` wins over `transcript`; blank values count as missing
fn transcript_text(raw: &Value) -> Option<String> {
    ["text", "transcript"]
        .iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
