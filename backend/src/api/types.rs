//! REST API types.
//!
//! Every successful response wraps its payload in [`ApiResponse`]; failures
//! use [`error_response`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::correlation::CorrelationPolicy;

/// Envelope for report payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Unique request identifier
    pub request_id: String,
    /// RFC 3339 timestamp of generation
    pub generated_at: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }
}

/// `?year=` query
#[derive(Debug, Clone, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// `?sector=&threshold=&policy=` query
#[derive(Debug, Clone, Deserialize)]
pub struct RelatedQuery {
    pub sector: String,
    pub threshold: Option<f64>,
    pub policy: Option<CorrelationPolicy>,
}

/// Body of `POST /api/correlation`. Empty selections use the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrelationRequest {
    pub sectors: Vec<String>,
    pub categories: Vec<String>,
    pub policy: Option<CorrelationPolicy>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_fields() {
        let json = serde_json::to_value(ApiResponse::new(vec![1, 2])).unwrap();
        assert!(json["requestId"].as_str().is_some_and(|id| id.len() == 36));
        assert!(chrono::DateTime::parse_from_rfc3339(json["generatedAt"].as_str().unwrap()).is_ok());
        assert_eq!(json["data"][1], 2);
    }

    #[test]
    fn test_correlation_request_defaults() {
        let req: CorrelationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.sectors.is_empty() && req.categories.is_empty());
        assert!(req.policy.is_none());

        let req: CorrelationRequest =
            serde_json::from_str(r#"{"categories":["0. Bahan makanan"],"policy":"listwise"}"#).unwrap();
        assert_eq!(req.policy, Some(CorrelationPolicy::Listwise));
    }

    #[test]
    fn test_error_response() {
        let err = error_response("sector not found: 'Z'");
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"], "sector not found: 'Z'");
    }
}
