//! Generation service: angles and long-form content from a creative brief.
//!
//! [`GenerationService`] assembles prompts ([`prompts`]), calls the provider ([`client`]) and
//! validates what comes back. Without an API key it runs in mock mode and returns canned output,
//! which keeps local development and tests offline.
//!
//! Admission checks (daily limit, Pro plan) are the caller's job; this module never touches the
//! database.

pub mod client;
pub mod images;
pub mod prompts;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{config::AiConfig, errors::Error};
use client::{AiClient, ChatOptions};

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider could not be reached or returned an error status
    #[error("AI provider request failed: {0}")]
    Provider(String),

    /// The provider answered with something we cannot use
    #[error("AI provider returned unusable output: {0}")]
    InvalidOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GenerationError> for Error {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Provider(message) | GenerationError::InvalidOutput(message) => Error::Upstream {
                service: "AI provider",
                message,
            },
            GenerationError::Io(e) => Error::Internal {
                operation: format!("store generated file: {e}"),
            },
        }
    }
}

/// The creative brief angles are generated from
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub topic: String,
    pub audience: Option<String>,
    pub channel: String,
    pub tone: String,
    pub goal: String,
    pub competitor_url: Option<String>,
    pub competitor_copy: Option<String>,
}

/// A generated (not yet saved) angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAngle {
    pub angle_name: String,
    pub hook: String,
    pub headline: String,
    pub explanation: String,
    pub visual_suggestion: String,
    pub channel: String,
    pub audience: Option<String>,
    pub tone: String,
    pub goal: String,
}

/// Angle as the model returns it; every field is optional until validated
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAngle {
    angle_name: Option<String>,
    hook: Option<String>,
    headline: Option<String>,
    explanation: Option<String>,
    visual_suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAngles {
    angles: Vec<RawAngle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ContentType {
    #[serde(rename = "LinkedIn Post")]
    LinkedInPost,
    #[serde(rename = "Blog Post")]
    BlogPost,
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "Ad Copy")]
    AdCopy,
    #[serde(rename = "Social Caption")]
    SocialCaption,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::LinkedInPost => "LinkedIn Post",
            ContentType::BlogPost => "Blog Post",
            ContentType::Email => "Email",
            ContentType::AdCopy => "Ad Copy",
            ContentType::SocialCaption => "Social Caption",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ContentLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentLength::Short => "Short",
            ContentLength::Medium => "Medium",
            ContentLength::Long => "Long",
        }
    }
}

/// Request to expand an angle into long-form content
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub angle_name: String,
    pub hook: String,
    pub headline: String,
    pub explanation: String,
    pub visual_suggestion: Option<String>,
    pub content_type: ContentType,
    pub length: Option<ContentLength>,
    #[serde(rename = "customCTA")]
    pub custom_cta: Option<String>,
    pub audience: Option<String>,
    pub source_topic: Option<String>,
    pub tone: Option<String>,
    pub channel: Option<String>,
    pub goal: Option<String>,
    #[serde(default)]
    pub generate_image: bool,
}

/// Generated long-form content, with an optional provider image URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub content_type: ContentType,
    pub content: String,
    pub image_url: Option<String>,
}

const MOCK_ANGLE_COUNT: usize = 5;

#[derive(Clone, Debug)]
pub struct GenerationService {
    client: Option<AiClient>,
}

impl GenerationService {
    pub fn new(config: &AiConfig) -> Self {
        let client = AiClient::from_config(config);
        if client.is_none() {
            warn!("No AI provider API key configured, generation will return mock data");
        }
        Self { client }
    }

    /// A service that always returns mock output.
    pub fn mock() -> Self {
        Self { client: None }
    }

    pub fn is_mock(&self) -> bool {
        self.client.is_none()
    }

    /// Generate up to `max_angles` angles for a brief, enriched with the brief's channel, tone,
    /// goal and audience.
    #[instrument(skip(self, brief), fields(max_angles), err)]
    pub async fn generate_angles(&self, brief: &Brief, max_angles: usize) -> Result<Vec<GeneratedAngle>> {
        let Some(client) = &self.client else {
            return Ok(mock_angles(brief, max_angles.min(MOCK_ANGLE_COUNT)));
        };

        let options = ChatOptions {
            json: true,
            ..Default::default()
        };
        let raw = client
            .chat(prompts::ANGLE_SYSTEM_PROMPT, &prompts::angle_prompt(brief, max_angles), &options)
            .await?;

        let angles = parse_angles(&raw, brief, max_angles)?;
        info!("Generated {} angles", angles.len());
        Ok(angles)
    }

    /// Expand an angle into the requested content type. Image generation failures are logged and
    /// yield no image rather than an error.
    #[instrument(skip(self, request), fields(content_type = request.content_type.as_str()), err)]
    pub async fn generate_content(&self, request: &ContentRequest) -> Result<GeneratedContent> {
        let Some(client) = &self.client else {
            return Ok(GeneratedContent {
                content_type: request.content_type,
                content: format!("[Mock {} content based on: {}]", request.content_type.as_str(), request.angle_name),
                image_url: None,
            });
        };

        let options = ChatOptions {
            temperature: Some(0.8),
            max_tokens: Some(prompts::max_tokens(request)),
            json: false,
        };
        let content = client
            .chat(prompts::CONTENT_SYSTEM_PROMPT, &prompts::content_prompt(request), &options)
            .await?;

        let image_url = match prompts::image_prompt(request).filter(|_| request.generate_image) {
            Some(prompt) => match client.image(&prompt).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Image generation failed, returning text only: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(GeneratedContent {
            content_type: request.content_type,
            content: content.trim().to_string(),
            image_url,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validate the model's JSON into angles. Entries without a name or hook are dropped.
fn parse_angles(raw: &str, brief: &Brief, max_angles: usize) -> Result<Vec<GeneratedAngle>> {
    let parsed: RawAngles = serde_json::from_str(raw.trim())
        .map_err(|e| GenerationError::InvalidOutput(format!("angles are not valid JSON: {e}")))?;

    let total = parsed.angles.len();
    let angles: Vec<GeneratedAngle> = parsed
        .angles
        .into_iter()
        .filter_map(|a| {
            Some(GeneratedAngle {
                angle_name: non_empty(a.angle_name)?,
                hook: non_empty(a.hook)?,
                headline: non_empty(a.headline).unwrap_or_default(),
                explanation: non_empty(a.explanation).unwrap_or_default(),
                visual_suggestion: non_empty(a.visual_suggestion).unwrap_or_default(),
                channel: brief.channel.clone(),
                audience: brief.audience.clone(),
                tone: brief.tone.clone(),
                goal: brief.goal.clone(),
            })
        })
        .take(max_angles)
        .collect();

    if angles.is_empty() {
        return Err(GenerationError::InvalidOutput("no usable angles returned".to_string()));
    }
    if angles.len() < total.min(max_angles) {
        warn!("Dropped {} incomplete angles", total.min(max_angles) - angles.len());
    }

    Ok(angles)
}

fn mock_angles(brief: &Brief, count: usize) -> Vec<GeneratedAngle> {
    (1..=count)
        .map(|i| GeneratedAngle {
            angle_name: format!("Mock Angle {i}"),
            hook: format!("This is a hook for {}", brief.topic),
            headline: format!("Headline {i}: Why this matters"),
            explanation: format!(
                "This is an explanation of why this angle works for {}.",
                brief.audience.as_deref().unwrap_or("everyone")
            ),
            visual_suggestion: "A photo of a happy person.".to_string(),
            channel: brief.channel.clone(),
            audience: brief.audience.clone(),
            tone: brief.tone.clone(),
            goal: brief.goal.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::client::tests::{ai_config, chat_response};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    fn brief() -> Brief {
        Brief {
            topic: "Payroll software".to_string(),
            audience: Some("CFOs".to_string()),
            channel: "LinkedIn".to_string(),
            tone: "Direct".to_string(),
            goal: "Sales".to_string(),
            competitor_url: None,
            competitor_copy: None,
        }
    }

    fn content_request(generate_image: bool) -> ContentRequest {
        serde_json::from_value(json!({
            "angleName": "Spreadsheet Fatigue",
            "hook": "Your CFO hates Mondays.",
            "headline": "Close the books by Friday",
            "explanation": "Manual payroll eats weeks.",
            "visualSuggestion": "A tired accountant",
            "contentType": "Blog Post",
            "length": "Long",
            "customCTA": "Start a trial",
            "generateImage": generate_image
        }))
        .unwrap()
    }

    #[test]
    fn test_content_request_wire_format() {
        let req = content_request(true);
        assert_eq!(req.content_type, ContentType::BlogPost);
        assert_eq!(req.length, Some(ContentLength::Long));
        assert_eq!(req.custom_cta.as_deref(), Some("Start a trial"));
        assert!(req.generate_image);

        let bad: std::result::Result<ContentRequest, _> = serde_json::from_value(json!({
            "angleName": "a", "hook": "b", "headline": "c", "explanation": "d", "contentType": "Podcast"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_angles_enriches_and_filters() {
        let raw = json!({
            "angles": [
                { "angleName": "One", "hook": "H1", "headline": "HL1", "explanation": "E1", "visualSuggestion": "V1" },
                { "angleName": "  ", "hook": "dropped" },
                { "angleName": "Two", "hook": "H2" }
            ]
        })
        .to_string();

        let angles = parse_angles(&raw, &brief(), 10).unwrap();
        assert_eq!(angles.len(), 2);
        assert_eq!(angles[0].angle_name, "One");
        assert_eq!(angles[0].channel, "LinkedIn");
        assert_eq!(angles[0].audience.as_deref(), Some("CFOs"));
        assert_eq!(angles[1].headline, "");
        assert_eq!(angles[1].goal, "Sales");
    }

    #[test]
    fn test_parse_angles_caps_count() {
        let items: Vec<_> = (0..30).map(|i| json!({ "angleName": format!("A{i}"), "hook": "h" })).collect();
        let raw = json!({ "angles": items }).to_string();
        assert_eq!(parse_angles(&raw, &brief(), 10).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_angles_rejects_garbage() {
        assert!(matches!(
            parse_angles("not json", &brief(), 10),
            Err(GenerationError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_angles(r#"{"angles": []}"#, &brief(), 10),
            Err(GenerationError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_angles(r#"{"ideas": []}"#, &brief(), 10),
            Err(GenerationError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_mode_is_offline() {
        let service = GenerationService::mock();
        assert!(service.is_mock());

        let angles = service.generate_angles(&brief(), 10).await.unwrap();
        assert_eq!(angles.len(), 5);
        assert_eq!(angles[0].hook, "This is a hook for Payroll software");

        let content = service.generate_content(&content_request(true)).await.unwrap();
        assert_eq!(content.content, "[Mock Blog Post content based on: Spreadsheet Fatigue]");
        assert!(content.image_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_angles_against_provider() {
        let server = MockServer::start().await;
        let model_output = json!({
            "angles": [{ "angleName": "Audit Panic", "hook": "H", "headline": "HL", "explanation": "E", "visualSuggestion": "V" }]
        })
        .to_string();
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(&model_output)))
            .expect(1)
            .mount(&server)
            .await;

        let service = GenerationService::new(&ai_config(&server));
        let angles = service.generate_angles(&brief(), 10).await.unwrap();
        assert_eq!(angles.len(), 1);
        assert_eq!(angles[0].angle_name, "Audit Panic");
        assert_eq!(angles[0].tone, "Direct");
    }

    #[tokio::test]
    async fn test_content_survives_image_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "max_completion_tokens": 3000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("\n## Close faster\n\nBody text.\n")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_string("content policy"))
            .expect(1)
            .mount(&server)
            .await;

        let service = GenerationService::new(&ai_config(&server));
        let content = service.generate_content(&content_request(true)).await.unwrap();
        assert_eq!(content.content, "## Close faster\n\nBody text.");
        assert!(content.image_url.is_none());
    }

    #[tokio::test]
    async fn test_image_not_requested_means_no_image_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Post")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = GenerationService::new(&ai_config(&server));
        let content = service.generate_content(&content_request(false)).await.unwrap();
        assert_eq!(content.content, "Post");
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = GenerationService::new(&ai_config(&server));
        let err: Error = service.generate_angles(&brief(), 10).await.unwrap_err().into();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
    }
}
