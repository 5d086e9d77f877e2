use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::{Config, MeaningLanguage};
use crate::generator::{GenerateError, ScenarioGenerator};
use crate::http::{HttpClient, Method};
use crate::library::{DialogueSection, Expression, ScenarioContent, VocabItem, now_millis};

pub const DIALOGUE_SECTIONS: usize = 3;

/// Study-guide generator backed by the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    language: MeaningLanguage,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(config: &Config, api_key: &str) -> Result<Self, GenerateError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GenerateError::MissingApiKey);
        }
        let http = HttpClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self {
            api_key: api_key.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.text_model.clone(),
            language: config.meaning_language,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    pub fn request_body(&self, scenario: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(scenario, self.language) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": 0.9
            }
        })
    }
}

impl ScenarioGenerator for GeminiClient {
    fn generate(&self, scenario: &str) -> Result<ScenarioContent, GenerateError> {
        info!(scenario, model = %self.model, "requesting study guide");
        let body = self.request_body(scenario);
        let headers = [("x-goog-api-key", self.api_key.clone())];
        let reply = self
            .http
            .send(Method::Post, &self.endpoint(), &headers, Some(&body))?
            .ok_or_else(|| GenerateError::Malformed("model endpoint not found".to_string()))?;

        let text = extract_text(&reply)?;
        let content = parse_study_guide(&text, scenario, now_millis())?;
        debug!(
            scenario,
            vocab = content.vocabulary.len(),
            expressions = content.expressions.len(),
            sections = content.dialogue.len(),
            "study guide parsed"
        );
        Ok(content)
    }
}

pub fn build_prompt(scenario: &str, language: MeaningLanguage) -> String {
    let lang = language.prompt_name();
    format!(
        "You are a Japanese conversation tutor. Build a study guide for the real-life \
         scenario \"{scenario}\".\n\
         - vocabulary: 10 to 15 useful words, each with kanji/kana form, hiragana reading, \
         romaji and a {lang} meaning.\n\
         - expressions: 6 to 10 natural phrases with reading, romaji, {lang} meaning and an \
         optional usage note.\n\
         - dialogue: exactly {DIALOGUE_SECTIONS} consecutive scenes, each with a short \
         {lang} title and 4 to 8 lines alternating between speaker A and speaker B, \
         with reading, romaji and a {lang} translation for every line.\n\
         Use polite spoken Japanese that a traveller would actually hear."
    )
}

fn string_schema() -> Value {
    json!({ "type": "STRING" })
}

/// Typed schema handed to the model so the reply is machine readable.
pub fn response_schema() -> Value {
    let vocab = json!({
        "type": "OBJECT",
        "properties": {
            "word": string_schema(),
            "reading": string_schema(),
            "romaji": string_schema(),
            "meaning": string_schema()
        },
        "required": ["word", "reading", "romaji", "meaning"]
    });
    let expression = json!({
        "type": "OBJECT",
        "properties": {
            "phrase": string_schema(),
            "reading": string_schema(),
            "romaji": string_schema(),
            "meaning": string_schema(),
            "note": string_schema()
        },
        "required": ["phrase", "reading", "romaji", "meaning"]
    });
    let line = json!({
        "type": "OBJECT",
        "properties": {
            "speaker": { "type": "STRING", "enum": ["A", "B"] },
            "text": string_schema(),
            "reading": string_schema(),
            "romaji": string_schema(),
            "translation": string_schema()
        },
        "required": ["speaker", "text", "reading", "romaji", "translation"]
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "scenario": string_schema(),
            "vocabulary": { "type": "ARRAY", "items": vocab },
            "expressions": { "type": "ARRAY", "items": expression },
            "dialogue": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string_schema(),
                        "lines": { "type": "ARRAY", "items": line }
                    },
                    "required": ["title", "lines"]
                }
            }
        },
        "required": ["scenario", "vocabulary", "expressions", "dialogue"]
    })
}

/// Pull the first candidate's text out of a `generateContent` reply.
pub fn extract_text(reply: &Value) -> Result<String, GenerateError> {
    reply["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .and_then(|parts| parts.iter().find_map(|p| p["text"].as_str()))
        .map(str::to_string)
        .ok_or_else(|| GenerateError::Malformed("missing candidate text".to_string()))
}

#[derive(Deserialize)]
struct StudyGuidePayload {
    #[serde(default)]
    scenario: String,
    vocabulary: Vec<VocabItem>,
    expressions: Vec<Expression>,
    dialogue: Vec<DialogueSection>,
}

/// Parse the model's JSON text. The requested name stays the scenario key so
/// history lookups match what the user typed; the model's echo is only used
/// when no name was requested.
pub fn parse_study_guide(
    text: &str,
    requested: &str,
    now: i64,
) -> Result<ScenarioContent, GenerateError> {
    let payload: StudyGuidePayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerateError::Malformed(e.to_string()))?;

    if payload.dialogue.is_empty() {
        return Err(GenerateError::Malformed("no dialogue sections".to_string()));
    }
    if payload.dialogue.len() != DIALOGUE_SECTIONS {
        warn!(
            sections = payload.dialogue.len(),
            "model returned an unexpected number of dialogue sections"
        );
    }

    let scenario = if requested.trim().is_empty() {
        payload.scenario.trim().to_string()
    } else {
        requested.trim().to_string()
    };

    Ok(ScenarioContent {
        scenario,
        vocabulary: payload.vocabulary,
        expressions: payload.expressions,
        dialogue: payload.dialogue,
        created_at: now,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
