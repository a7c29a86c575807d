//! Interface to the translation backend.

use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a translation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend failed or returned a response of the wrong shape.
    #[error("Backend failure: {0}")]
    Failure(String),

    /// The backend did not answer in time.
    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),
}

/// One text segment in a translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequest {
    /// Identifier echoed back in the response.
    pub id: usize,
    pub text: String,
    /// Neighbouring text supplied for terminology consistency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hint: Option<String>,
}

/// A translated segment returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedSegment {
    pub id: usize,
    pub text: String,
}

/// A single request to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub target_language: String,
    pub strategy: Strategy,
    pub segments: Vec<SegmentRequest>,
}

/// A synchronous translation service.
///
/// Implementations must answer every segment id exactly once; order is free.
pub trait TranslationBackend {
    fn translate(&self, request: &TranslationRequest) -> Result<Vec<TranslatedSegment>, BackendError>;
}

impl<F> TranslationBackend for F
where
    F: Fn(&TranslationRequest) -> Result<Vec<TranslatedSegment>, BackendError>,
{
    fn translate(&self, request: &TranslationRequest) -> Result<Vec<TranslatedSegment>, BackendError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_backend() {
        let backend = |request: &TranslationRequest| -> Result<Vec<TranslatedSegment>, BackendError> {
            Ok(request
                .segments
                .iter()
                .map(|s| TranslatedSegment {
                    id: s.id,
                    text: s.text.to_uppercase(),
                })
                .collect())
        };

        let request = TranslationRequest {
            target_language: "fr".to_string(),
            strategy: Strategy::Batch,
            segments: vec![SegmentRequest {
                id: 0,
                text: "hello".to_string(),
                context_hint: None,
            }],
        };

        let response = backend.translate(&request).unwrap();
        assert_eq!(response[0].text, "HELLO");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BackendError::Failure("bad response".to_string()).to_string(),
            "Backend failure: bad response"
        );
        assert!(BackendError::Timeout(Duration::from_secs(3))
            .to_string()
            .contains("3s"));
    }
}
