use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::VoiceError;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are an expert at extracting loan information from Urdu text. \
Extract the following information:
- Partner/Borrower name (the person receiving the loan)
- Loan amount in PKR (extract only the number)
- Description (reason or details about the loan)
- Loan date (when the loan was given - convert to YYYY-MM-DD format if possible)
- Expected return date (when the loan should be returned - convert to YYYY-MM-DD format if possible)

If any information is missing, leave it as null. Return dates in YYYY-MM-DD format.";

/// Loan fields recovered from a transcript; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLoanInfo {
    pub partner_name: Option<String>,
    pub loan_amount: Option<f64>,
    pub description: Option<String>,
    pub loan_date: Option<String>,
    pub expected_return_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub loan_info: ExtractedLoanInfo,
    pub raw: Value,
}

/// OpenAI structured-output client
#[derive(Clone)]
pub struct LoanInfoExtractor {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl LoanInfoExtractor {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Self {
        let client = super::http_client(timeout);
        Self {
            client,
            api_key,
            model,
            endpoint: OPENAI_CHAT_URL.to_string(),
        }
    }

    pub async fn extract(&self, text: Option<&str>) -> Result<Extraction, VoiceError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            VoiceError::NotConfigured("OPENAI_API_KEY not configured".to_string())
        })?;

        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VoiceError::InvalidInput("Text is required".to_string()))?;

        tracing::info!(model = %self.model, chars = text.chars().count(), "Extracting loan info");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        let raw: Value = response.json().await?;

        if !status.is_success() {
            let message = raw
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("OpenAI request failed")
                .to_string();
            tracing::error!(status = %status, error = %message, "OpenAI returned an error");
            return Err(VoiceError::Provider {
                message,
                details: Some(raw.to_string()),
            });
        }

        let loan_info = parse_completion(&raw)?;
        tracing::debug!(?loan_info, "Extracted loan info");

        Ok(Extraction { loan_info, raw })
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("Extract loan information from this Urdu text: {}", text)
                }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "loanInfo",
                    "strict": true,
                    "schema": loan_info_schema()
                }
            }
        })
    }
}

fn loan_info_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "partnerName": {
                "type": ["string", "null"],
                "description": "Name of the partner/borrower mentioned in the text"
            },
            "loanAmount": {
                "type": ["number", "null"],
                "description": "Loan amount in PKR (extract the number only)"
            },
            "description": {
                "type": ["string", "null"],
                "description": "Description or reason for the loan"
            },
            "loanDate": {
                "type": ["string", "null"],
                "description": "Date when loan was given (YYYY-MM-DD)"
            },
            "expectedReturnDate": {
                "type": ["string", "null"],
                "description": "Expected return date (YYYY-MM-DD)"
            }
        },
        "required": ["partnerName", "loanAmount", "description", "loanDate", "expectedReturnDate"],
        "additionalProperties": false
    })
}

/// Pulls the structured answer out of a chat completion
fn parse_completion(raw: &Value) -> Result<ExtractedLoanInfo, VoiceError> {
    let message = raw
        .pointer("/choices/0/message")
        .ok_or_else(|| VoiceError::Provider {
            message: "OpenAI response has no choices".to_string(),
            details: Some(raw.to_string()),
        })?;

    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Err(VoiceError::Provider {
            message: format!("Model refused: {}", refusal),
            details: None,
        });
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| VoiceError::Provider {
            message: "OpenAI response has no content".to_string(),
            details: Some(raw.to_string()),
        })?;

    serde_json::from_str(content).map_err(|e| VoiceError::Provider {
        message: "OpenAI response did not match the loan schema".to_string(),
        details: Some(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"partnerName\":\"Ali\",\"loanAmount\":500,\"description\":null,\"loanDate\":\"2024-05-01\",\"expectedReturnDate\":null}",
                    "refusal": null
                }
            }]
        });

        let info = parse_completion(&raw).unwrap();
        assert_eq!(info.partner_name.as_deref(), Some("Ali"));
        assert_eq!(info.loan_amount, Some(500.0));
        assert_eq!(info.description, None);
        assert_eq!(info.loan_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_parse_completion_refusal_and_garbage() {
        let refused = json!({"choices": [{"message": {"content": null, "refusal": "no"}}]});
        assert!(matches!(
            parse_completion(&refused),
            Err(VoiceError::Provider { .. })
        ));

        let garbage = json!({"choices": [{"message": {"content": "not json"}}]});
        assert!(parse_completion(&garbage).is_err());
        assert!(parse_completion(&json!({})).is_err());
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = loan_info_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[tokio::test]
    async fn test_missing_text_and_key() {
        let no_key = LoanInfoExtractor::new(None, "m".to_string(), Duration::from_secs(1));
        assert!(matches!(
            no_key.extract(Some("hello")).await,
            Err(VoiceError::NotConfigured(_))
        ));

        let keyed = LoanInfoExtractor::new(
            Some("sk-test".to_string()),
            "m".to_string(),
            Duration::from_secs(1),
        );
        assert!(matches!(
            keyed.extract(Some("   ")).await,
            Err(VoiceError::InvalidInput(_))
        ));
    }
}
