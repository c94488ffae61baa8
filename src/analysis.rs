use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedStyle {
    pub style: String,
    pub reason: String,
    #[serde(default)]
    pub link: String,
}

/// Structured face-shape recommendation as produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub face_shape: String,
    #[serde(default)]
    pub explanation_face_shape: String,
    #[serde(default)]
    pub celebrities: Vec<String>,
    #[serde(default)]
    pub recommended_styles: Vec<RecommendedStyle>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Output-shape declaration sent alongside every classification request.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "face_shape": { "type": "STRING" },
            "explanation_face_shape": { "type": "STRING" },
            "celebrities": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "recommended_styles": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "style": { "type": "STRING" },
                        "reason": { "type": "STRING" },
                        "link": { "type": "STRING" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_result_body() {
        let body = r#"{"face_shape":"Oval","explanation_face_shape":"Balanced proportions.","celebrities":["A","B"],"recommended_styles":[{"style":"Aviator","reason":"Softens the jaw.","link":"https://example.com"}]}"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.face_shape, "Oval");
        assert_eq!(result.celebrities, vec!["A", "B"]);
        assert_eq!(result.recommended_styles.len(), 1);
        assert_eq!(result.recommended_styles[0].link, "https://example.com");
    }

    #[test]
    fn rejects_body_without_face_shape() {
        let parsed = serde_json::from_str::<AnalysisResult>(r#"{"celebrities":[]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn schema_declares_every_result_field() {
        let schema = analysis_response_schema();
        for field in [
            "face_shape",
            "explanation_face_shape",
            "celebrities",
            "recommended_styles",
        ] {
            assert!(schema.pointer(&format!("/properties/{field}")).is_some());
        }
        assert_eq!(
            schema.pointer("/properties/recommended_styles/items/properties/link/type"),
            Some(&json!("STRING"))
        );
    }
}
