use crate::models::{ClassificationResult, ClassifierBackend, ClassifierSettings, ImageArtifact};
use anyhow::{Result, bail};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while classifying an image
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Classification failed: {0}")]
    Failure(String),

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("No waste items detected above the confidence threshold")]
    NoDetections,

    #[error("Invalid classification result: {0}")]
    InvalidResult(String),
}

/// Maps an image to an ordered list of detections, primary detection first.
///
/// The session controller only sees this trait, so the mock backend and a
/// real inference service are interchangeable.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        artifact: &ImageArtifact,
    ) -> Result<Vec<ClassificationResult>, ClassificationError>;

    fn name(&self) -> &'static str;
}

/// Post-processing applied to every backend's output.
///
/// - results below `min_confidence` are dropped
/// - at most `max_results` are kept, preserving order
/// - ids must be unique within a batch, otherwise [`ClassificationError::InvalidResult`]
/// - an empty remainder is [`ClassificationError::NoDetections`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierPolicy {
    pub min_confidence: f64,
    pub max_results: usize,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_results: 10,
        }
    }
}

impl From<&ClassifierSettings> for ClassifierPolicy {
    fn from(settings: &ClassifierSettings) -> Self {
        Self {
            min_confidence: settings.min_confidence,
            max_results: settings.max_results,
        }
    }
}

impl ClassifierPolicy {
    pub fn apply(
        &self,
        results: Vec<ClassificationResult>,
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        let mut seen = HashSet::with_capacity(results.len());
        for result in &results {
            result.validate()?;
            if !seen.insert(result.id.as_str()) {
                return Err(ClassificationError::InvalidResult(format!(
                    "duplicate result id '{}'",
                    result.id
                )));
            }
        }

        let total = results.len();
        let kept: Vec<_> = results
            .into_iter()
            .filter(|r| r.confidence >= self.min_confidence)
            .take(self.max_results)
            .collect();

        if kept.len() != total {
            tracing::debug!(
                "Classifier policy kept {} of {} results (min confidence {}, max {})",
                kept.len(),
                total,
                self.min_confidence,
                self.max_results
            );
        }

        if kept.is_empty() {
            return Err(ClassificationError::NoDetections);
        }
        Ok(kept)
    }
}

/// Deterministic stand-in for a detection model.
///
/// Always answers with the same canned list (two organic items by default),
/// optionally after a fixed delay.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    results: Vec<ClassificationResult>,
    latency: Duration,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            results: Self::canned_results(),
            latency: Duration::ZERO,
        }
    }

    /// Answer with a custom list instead of the canned one.
    pub fn with_results(results: Vec<ClassificationResult>) -> Self {
        Self {
            results,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn canned_results() -> Vec<ClassificationResult> {
        let organic = |id: &str, confidence: f64| ClassificationResult {
            id: id.to_string(),
            category: "Organic".to_string(),
            confidence,
            recyclable: false,
            disposal_tip: "Compost at home or use organic waste bin".to_string(),
            co2_impact: 0.3,
            energy_impact: 0.1,
        };
        vec![organic("1", 0.95), organic("2", 0.89)]
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        artifact: &ImageArtifact,
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!(
            "Mock classifier answering {} results for {}",
            self.results.len(),
            artifact.display_name()
        );
        Ok(self.results.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    mime_type: &'a str,
    source: String,
    file_name: Option<&'a str>,
    image_base64: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDetection {
    #[serde(default)]
    id: Option<String>,
    category: String,
    confidence: f64,
    recyclable: bool,
    #[serde(default)]
    disposal_tip: String,
    #[serde(default)]
    co2_impact: f64,
    #[serde(default)]
    energy_impact: f64,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    detections: Vec<RemoteDetection>,
}

impl From<RemoteDetection> for ClassificationResult {
    fn from(d: RemoteDetection) -> Self {
        Self {
            id: d
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            category: d.category,
            confidence: d.confidence,
            recyclable: d.recyclable,
            disposal_tip: d.disposal_tip,
            co2_impact: d.co2_impact,
            energy_impact: d.energy_impact,
        }
    }
}

/// Classifier backed by an HTTP inference endpoint.
///
/// Sends `POST <endpoint>` with a JSON body carrying the base64-encoded
/// image and expects `{ "detections": [ ... ] }` in camelCase. Detections
/// without an id are assigned a UUID.
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(
        &self,
        artifact: &ImageArtifact,
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        let request = ClassifyRequest {
            mime_type: artifact.mime_type(),
            source: artifact.source().to_string(),
            file_name: artifact.file_name(),
            image_base64: base64::engine::general_purpose::STANDARD.encode(artifact.bytes()),
        };

        tracing::info!(
            "Sending {} bytes to remote classifier at {}",
            artifact.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassificationError::Failure(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ClassificationError::Failure(format!("endpoint error: {}", e)))?;

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::Failure(format!("invalid response: {}", e)))?;

        Ok(body.detections.into_iter().map(Into::into).collect())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Build the classifier selected in the settings.
pub fn classifier_from_settings(settings: &ClassifierSettings) -> Result<Arc<dyn Classifier>> {
    match settings.backend {
        ClassifierBackend::Mock => {
            Ok(Arc::new(MockClassifier::new().with_latency(settings.mock_latency())))
        }
        ClassifierBackend::Remote => {
            if settings.endpoint.trim().is_empty() {
                bail!("Remote classifier selected but no endpoint is configured");
            }
            Ok(Arc::new(RemoteClassifier::new(settings.endpoint.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::capture::capture_from_file;

    fn detection(id: &str, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            id: id.to_string(),
            category: "Plastic".to_string(),
            confidence,
            recyclable: true,
            disposal_tip: "Rinse and place in blue bin".to_string(),
            co2_impact: 0.5,
            energy_impact: 0.2,
        }
    }

    #[tokio::test]
    async fn test_mock_returns_canned_results() {
        let artifact = capture_from_file(vec![1, 2, 3], "image/jpeg", None).unwrap();
        let results = MockClassifier::new().classify(&artifact).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "1");
        assert_eq!(results[0].category, "Organic");
        assert_eq!(results[0].confidence, 0.95);
        assert_eq!(results[1].confidence, 0.89);
        assert!(results.iter().all(|r| !r.recyclable));
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let artifact = capture_from_file(vec![7; 32], "image/png", None).unwrap();
        let classifier = MockClassifier::new();

        let first = classifier.classify(&artifact).await.unwrap();
        let second = classifier.classify(&artifact).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mock_with_custom_results() {
        let artifact = capture_from_file(vec![1], "image/gif", None).unwrap();
        let classifier = MockClassifier::with_results(vec![detection("x", 0.7)]);

        let results = tokio_test::block_on(classifier.classify(&artifact));
        let results = tokio_test::assert_ok!(results);
        assert_eq!(results, vec![detection("x", 0.7)]);
    }

    #[test]
    fn test_policy_filters_low_confidence() {
        let policy = ClassifierPolicy::default();
        let kept = policy
            .apply(vec![detection("a", 0.9), detection("b", 0.2), detection("c", 0.5)])
            .unwrap();

        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_policy_truncates_preserving_order() {
        let policy = ClassifierPolicy {
            min_confidence: 0.0,
            max_results: 2,
        };
        let kept = policy
            .apply(vec![detection("a", 0.6), detection("b", 0.9), detection("c", 0.7)])
            .unwrap();

        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_policy_empty_is_no_detections() {
        let policy = ClassifierPolicy::default();
        assert_eq!(policy.apply(Vec::new()), Err(ClassificationError::NoDetections));
        assert_eq!(
            policy.apply(vec![detection("a", 0.1)]),
            Err(ClassificationError::NoDetections)
        );
    }

    #[test]
    fn test_policy_rejects_duplicate_ids() {
        let policy = ClassifierPolicy::default();
        let err = policy
            .apply(vec![detection("1", 0.9), detection("2", 0.8), detection("1", 0.7)])
            .unwrap_err();

        assert_eq!(
            err,
            ClassificationError::InvalidResult("duplicate result id '1'".to_string())
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_never_reach_session() {
        let artifact = capture_from_file(vec![1], "image/png", None).unwrap();
        let classifier =
            MockClassifier::with_results(vec![detection("1", 0.9), detection("1", 0.8)]);

        let raw = classifier.classify(&artifact).await.unwrap();
        let err = ClassifierPolicy::default().apply(raw).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidResult(_)));
    }

    #[test]
    fn test_policy_rejects_invalid_results() {
        let policy = ClassifierPolicy::default();
        let err = policy.apply(vec![detection("a", 1.5)]).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidResult(_)));
    }

    #[test]
    fn test_remote_detection_gets_generated_id() {
        let json = r#"{"detections":[{"category":"Metal","confidence":0.8,"recyclable":true,"co2Impact":1.2}]}"#;
        let response: ClassifyResponse = serde_json::from_str(json).unwrap();
        let results: Vec<ClassificationResult> =
            response.detections.into_iter().map(Into::into).collect();

        assert_eq!(results.len(), 1);
        assert!(uuid::Uuid::parse_str(&results[0].id).is_ok());
        assert_eq!(results[0].co2_impact, 1.2);
        assert_eq!(results[0].energy_impact, 0.0);
    }

    #[test]
    fn test_classifier_from_settings() {
        let mock = classifier_from_settings(&ClassifierSettings::default()).unwrap();
        assert_eq!(mock.name(), "mock");

        let remote_settings = ClassifierSettings {
            backend: ClassifierBackend::Remote,
            endpoint: "http://127.0.0.1:9/classify".to_string(),
            ..Default::default()
        };
        let remote = classifier_from_settings(&remote_settings).unwrap();
        assert_eq!(remote.name(), "remote");

        let missing = ClassifierSettings {
            backend: ClassifierBackend::Remote,
            ..Default::default()
        };
        assert!(classifier_from_settings(&missing).is_err());
    }

    #[tokio::test]
    async fn test_remote_unreachable_is_failure() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let classifier = RemoteClassifier::new("http://127.0.0.1:9/classify");
        let artifact = capture_from_file(vec![1, 2, 3], "image/jpeg", None).unwrap();

        let err = classifier.classify(&artifact).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Failure(_)));
    }
}
