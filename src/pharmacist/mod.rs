use crate::model::{Language, MedicineInfo};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("medicine lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("medicine lookup service responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("no response from AI")]
    EmptyResponse,
    #[error("medicine lookup response did not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct PharmacistClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl PharmacistClient {
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .unwrap_or_default();
        Self::new(api_key)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub async fn lookup(
        &self,
        medicine_name: &str,
        language: Language,
    ) -> Result<MedicineInfo, LookupError> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&lookup_request(medicine_name, language))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = candidate_text(&body).ok_or(LookupError::EmptyResponse)?;
        parse_medicine_info(&text)
    }
}

fn lookup_prompt(medicine_name: &str, language: Language) -> String {
    let language_prompt = if language == Language::En {
        String::new()
    } else {
        format!(
            "IMPORTANT: Provide all text field values in {} language script.",
            language.as_str()
        )
    };

    format!(
        "Provide detailed medical information for the medicine: {medicine_name}. \
         Include primary uses, common side effects, safer alternatives if applicable, \
         and important precautions. {language_prompt}"
    )
}

fn lookup_request(medicine_name: &str, language: Language) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": lookup_prompt(medicine_name, language) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "uses": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "sideEffects": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "alternatives": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "precautions": { "type": "STRING" }
                },
                "required": ["name", "uses", "sideEffects", "alternatives", "precautions"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn candidate_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_medicine_info(text: &str) -> Result<MedicineInfo, LookupError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_the_medicine_name() {
        let prompt = lookup_prompt("Paracetamol", Language::En);
        assert!(prompt.contains("the medicine: Paracetamol."));
        assert!(!prompt.contains("language script"));
    }

    #[test]
    fn prompt_adds_the_script_instruction_for_other_languages() {
        let prompt = lookup_prompt("Paracetamol", Language::Hi);
        assert!(prompt.contains("IMPORTANT: Provide all text field values in Hindi language script."));
    }

    #[test]
    fn request_declares_every_field_as_required() {
        let request = lookup_request("Paracetamol", Language::En);
        let required = request["generationConfig"]["responseSchema"]["required"]
            .as_array()
            .expect("schema should list required fields");
        let names: Vec<&str> = required.iter().filter_map(Value::as_str).collect();
        assert_eq!(
            names,
            ["name", "uses", "sideEffects", "alternatives", "precautions"]
        );
        assert_eq!(
            request["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn candidate_text_concatenates_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"na"},{"text":"me\":1}"}]}}]}"#,
        )
        .expect("response envelope should parse");
        assert_eq!(candidate_text(&body).as_deref(), Some("{\"name\":1}"));
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        let empty: GenerateContentResponse =
            serde_json::from_str(r#"{}"#).expect("empty envelope should parse");
        assert_eq!(candidate_text(&empty), None);

        let no_parts: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#)
                .expect("envelope without parts should parse");
        assert_eq!(candidate_text(&no_parts), None);
    }

    #[test]
    fn complete_payload_parses_into_medicine_info() {
        let info = parse_medicine_info(
            r#"{
                "name": "Paracetamol",
                "uses": ["fever", "mild pain"],
                "sideEffects": ["nausea"],
                "alternatives": ["ibuprofen"],
                "precautions": "Avoid exceeding 4g per day."
            }"#,
        )
        .expect("complete payload should parse");
        assert_eq!(info.name, "Paracetamol");
        assert_eq!(info.uses.len(), 2);
        assert_eq!(info.side_effects, ["nausea"]);
    }

    #[test]
    fn payload_missing_precautions_is_a_schema_error() {
        let err = parse_medicine_info(
            r#"{
                "name": "Paracetamol",
                "uses": ["fever"],
                "sideEffects": ["nausea"],
                "alternatives": ["ibuprofen"]
            }"#,
        )
        .expect_err("missing required field should fail");
        assert!(matches!(err, LookupError::Schema(_)));
    }

    #[test]
    fn non_json_payload_is_a_schema_error() {
        let err = parse_medicine_info("Paracetamol is a common analgesic.")
            .expect_err("prose payload should fail");
        assert!(matches!(err, LookupError::Schema(_)));
    }
}
