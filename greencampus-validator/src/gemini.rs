//! Photo validation through the Gemini `generateContent` API.

use async_trait::async_trait;
use greencampus_dependencies::reqwest::{self, header};
use serde::{Deserialize, Serialize};

use crate::prompt::user_instruction;
use crate::{MissionIntent, Proof, ProofValidator, ResponseSchema, ValidatorError, Verdict};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, securefmt::Debug)]
pub struct GeminiConfig {
    pub base_url: url::Url,
    pub model: String,
    #[sensitive]
    pub api_key: String,
    pub schema: ResponseSchema,
}

pub struct GeminiValidator {
    client: reqwest::Client,
    config: GeminiConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(String),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'static str,
        data: &'a str,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiValidator {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> Result<url::Url, ValidatorError> {
        self.config
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.config.model))
            .map_err(|e| ValidatorError::Unavailable(format!("invalid Gemini endpoint: {}", e)))
    }
}

#[async_trait]
impl ProofValidator for GeminiValidator {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, proof), fields(model = %self.config.model))]
    async fn validate(&self, intent: &MissionIntent, proof: &Proof) -> Result<Verdict, ValidatorError> {
        let data = proof
            .photo_data()
            .ok_or_else(|| ValidatorError::Unavailable("no photo to send".to_string()))?;
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text(self.config.schema.system_prompt(intent))],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData {
                        mime_type: "image/jpeg",
                        data,
                    },
                    Part::Text(user_instruction(intent)),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Gemini answered {}: {}", status, detail);
            return Err(ValidatorError::Unavailable(format!("HTTP {}", status)));
        }

        let response: GenerateResponse = response.json().await?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| ValidatorError::MalformedResponse("no candidate text".to_string()))?;
        debug!("Gemini verdict: {}", text);
        self.config.schema.parse(&text)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, schema: ResponseSchema) -> GeminiConfig {
        GeminiConfig {
            base_url: server.uri().parse().unwrap(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test-key".to_string(),
            schema,
        }
    }

    fn answer(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        }))
    }

    fn photo() -> Proof {
        Proof::Photo("data:image/jpeg;base64,aGVsbG8=".to_string())
    }

    #[tokio::test]
    async fn test_accepted_photo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(answer(
                r#"{"accepted": true, "points": 20, "label": "Plastic bottle", "message": "Well sorted"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let validator = GeminiValidator::new(reqwest::Client::new(), config(&server, ResponseSchema::Canonical));
        let verdict = validator.validate(&crate::test::intent(true), &photo()).await.unwrap();
        assert_eq!(Verdict::accept(Some(20), "Plastic bottle", "Well sorted"), verdict);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!("aGVsbG8=", body["contents"][0]["parts"][0]["inlineData"]["data"]);
        assert_eq!("image/jpeg", body["contents"][0]["parts"][0]["inlineData"]["mimeType"]);
        assert_eq!("application/json", body["generationConfig"]["responseMimeType"]);
    }

    #[tokio::test]
    async fn test_unreadable_answer_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer("Looks like a bottle to me!"))
            .mount(&server)
            .await;

        let validator = GeminiValidator::new(reqwest::Client::new(), config(&server, ResponseSchema::Canonical));
        let err = validator.validate(&crate::test::intent(true), &photo()).await.unwrap_err();
        assert!(matches!(err, ValidatorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let validator = GeminiValidator::new(reqwest::Client::new(), config(&server, ResponseSchema::Canonical));
        let err = validator.validate(&crate::test::intent(true), &photo()).await.unwrap_err();
        assert_eq!(ValidatorError::Unavailable("HTTP 503 Service Unavailable".to_string()), err);
    }

    #[tokio::test]
    async fn test_bottle_hunter_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer(
                "```json\n{\"mission_success\": true, \"detected_item\": \"Water bottle\", \"xp_reward\": 50, \"message\": \"Bravo\"}\n```",
            ))
            .mount(&server)
            .await;

        let validator = GeminiValidator::new(reqwest::Client::new(), config(&server, ResponseSchema::BottleHunter));
        let verdict = validator.validate(&crate::test::intent(true), &photo()).await.unwrap();
        assert!(verdict.accepted);
        assert_eq!(Some(50), verdict.points);
        assert_eq!("Water bottle", verdict.label);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("PLASTIC BOTTLE HUNTER"));
    }
}
