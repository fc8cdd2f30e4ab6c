//! Request and response shapes of the Generative Language API.

use serde::{Deserialize, Serialize};

use aarini_types::llm::{Citation, GenerateRequest, MessageRole};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl From<&GenerateRequest> for GeminiRequest {
    fn from(request: &GenerateRequest) -> Self {
        let contents = request
            .contents
            .iter()
            .map(|m| GeminiContent {
                role: Some(role_name(m.role).to_string()),
                parts: vec![GeminiPart::text(&m.text)],
            })
            .collect();

        let system_instruction = request
            .system_instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(s)],
            });

        let tools = if request.web_grounding {
            vec![GeminiTool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        let generation_config = request.max_output_tokens.map(|max| GenerationConfig {
            max_output_tokens: Some(max),
        });

        Self {
            contents,
            system_instruction,
            tools,
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on reasoning parts of thinking models; never shown.
    #[serde(default, skip_serializing)]
    pub thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiTool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// One `generateContent` response, or one event of a streamed response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Why the prompt was refused, when the upstream blocked it outright.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    /// Visible text of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Web citations of the first candidate.
    pub fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| Citation::new(web.uri.as_deref(), web.title.as_deref()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Error object returned in error bodies and in-stream error events.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

/// Role names as the API expects them.
pub fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarini_types::llm::Message;

    fn request() -> GenerateRequest {
        GenerateRequest {
            model: "gemini-2.5-flash".into(),
            contents: vec![Message::user("hi"), Message::model("hello"), Message::user("flats?")],
            system_instruction: Some("Be brief.".into()),
            web_grounding: true,
            max_output_tokens: Some(1000),
        }
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(GeminiRequest::from(&request())).unwrap();
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "flats?");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!(body["tools"][0]["google_search"].is_object());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_request_omits_optional_sections() {
        let mut req = request();
        req.system_instruction = None;
        req.web_grounding = false;
        req.max_output_tokens = None;
        let body = serde_json::to_value(GeminiRequest::from(&req)).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("tools").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_and_citations() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Bandra "},
                    {"text": "is nice."}
                ]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://a.example", "title": "A"}},
                    {"web": {"uri": "https://b.example"}},
                    {"web": {"title": "no url"}},
                    {}
                ]}
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text(), "Bandra is nice.");

        let citations = resp.citations();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[1].title, "Web Source");
    }

    #[test]
    fn test_empty_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"usageMetadata":{}}"#).unwrap();
        assert_eq!(resp.text(), "");
        assert!(resp.citations().is_empty());
        assert!(resp.block_reason().is_none());
    }

    #[test]
    fn test_blocked_prompt_reason() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(resp.block_reason(), Some("SAFETY"));
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn test_role_names() {
        assert_eq!(role_name(MessageRole::User), "user");
        assert_eq!(role_name(MessageRole::Model), "model");
    }
}
