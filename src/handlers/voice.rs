use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::extract::ApiJson;
use crate::error::ApiError;
use crate::voice::{AudioUpload, ExtractedLoanInfo, LoanInfoExtractor, Transcriber};

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
    pub raw: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub success: bool,
    pub loan_info: ExtractedLoanInfo,
    pub raw: Value,
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", err))
}

pub async fn transcribe(
    State(transcriber): State<Arc<Transcriber>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut file = None;
    let mut model = None;
    let mut language = None;
    let mut domain = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("audio.webm").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((bytes.to_vec(), file_name, content_type));
            }
            Some("model") => model = Some(field.text().await.map_err(multipart_error)?),
            Some("language") => language = Some(field.text().await.map_err(multipart_error)?),
            Some("domain") => domain = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let (bytes, file_name, content_type) =
        file.ok_or_else(|| ApiError::BadRequest("Audio file is required".to_string()))?;

    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let transcription = transcriber
        .transcribe(AudioUpload {
            bytes,
            file_name,
            content_type,
            model: non_blank(model),
            language: non_blank(language),
            domain: non_blank(domain),
        })
        .await?;

    Ok(Json(TranscribeResponse {
        success: true,
        text: transcription.text,
        raw: transcription.raw,
    }))
}

pub async fn extract_loan_info(
    State(extractor): State<Arc<LoanInfoExtractor>>,
    ApiJson(request): ApiJson<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let extraction = extractor.extract(request.text.as_deref()).await?;

    Ok(Json(ExtractResponse {
        success: true,
        loan_info: extraction.loan_info,
        raw: extraction.raw,
    }))
}
