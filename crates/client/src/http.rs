use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use study_core::model::{GroupId, SessionId, SessionSummary, WordId, WordItem};

use crate::provider::{ApiError, ReviewSink, SessionCloser, WordProvider};

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl PortalConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("STUDY_PORTAL_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".into());
        let api_token = env::var("STUDY_PORTAL_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self {
            base_url,
            api_token,
        }
    }
}

/// HTTP adapter for the word/group, review, and session-end endpoints.
#[derive(Clone)]
pub struct HttpPortal {
    client: Client,
    config: PortalConfig,
}

impl HttpPortal {
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(PortalConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl WordProvider for HttpPortal {
    async fn fetch_words(
        &self,
        group_id: GroupId,
        per_page: u32,
    ) -> Result<Vec<WordItem>, ApiError> {
        let url = self.url(&format!("groups/{group_id}/words"));
        let response = self
            .send(self.client.get(url).query(&[("per_page", per_page)]))
            .await?;

        let body: WordsEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if !body.success {
            return Err(ApiError::NotFound);
        }

        body.data
            .words
            .into_iter()
            .map(|dto| {
                WordItem::new(
                    WordId::new(dto.id),
                    dto.native_text,
                    dto.translation,
                    dto.transliteration,
                )
                .map_err(|e| ApiError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn fetch_group_name(&self, group_id: GroupId) -> Result<String, ApiError> {
        let url = self.url(&format!("groups/{group_id}"));
        let response = self.send(self.client.get(url)).await?;

        let body: GroupEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if !body.success {
            return Err(ApiError::NotFound);
        }
        Ok(body.data.name)
    }
}

#[async_trait]
impl ReviewSink for HttpPortal {
    async fn submit_review(
        &self,
        session_id: SessionId,
        word_id: WordId,
        correct: bool,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("study-sessions/{session_id}/words/{word_id}/review"));
        let payload = ReviewRequest { is_correct: correct };
        self.send(self.client.post(url).json(&payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionCloser for HttpPortal {
    async fn end_session(
        &self,
        session_id: SessionId,
        summary: Option<&SessionSummary>,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("study-sessions/{session_id}/end"));
        let request = match summary {
            Some(summary) => self.client.post(url).json(&EndSessionRequest {
                correct_count: summary.correct_count(),
                total_count: summary.total_count(),
                duration_seconds: summary.duration_seconds(),
            }),
            None => self.client.post(url),
        };
        self.send(request).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct WordsEnvelope {
    success: bool,
    data: WordsData,
}

#[derive(Debug, Deserialize)]
struct WordsData {
    words: Vec<WordDto>,
}

#[derive(Debug, Deserialize)]
struct WordDto {
    id: u64,
    native_text: String,
    translation: String,
    #[serde(default)]
    transliteration: String,
}

#[derive(Debug, Deserialize)]
struct GroupEnvelope {
    success: bool,
    data: GroupData,
}

#[derive(Debug, Deserialize)]
struct GroupData {
    name: String,
}

#[derive(Debug, Serialize)]
struct ReviewRequest {
    is_correct: bool,
}

#[derive(Debug, Serialize)]
struct EndSessionRequest {
    correct_count: u32,
    total_count: u32,
    duration_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_doubled_slash() {
        let portal = HttpPortal::new(PortalConfig::new("http://localhost:5000/api/"));
        assert_eq!(
            portal.url("groups/7/words"),
            "http://localhost:5000/api/groups/7/words"
        );
    }

    #[test]
    fn config_token_is_optional() {
        let config = PortalConfig::new("http://localhost:5000/api");
        assert!(config.api_token.is_none());
        let config = config.with_token("secret");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn words_envelope_decodes() {
        let body = r#"{
            "success": true,
            "data": {
                "words": [
                    {"id": 3, "native_text": "पानी", "translation": "water", "transliteration": "paani"},
                    {"id": 4, "native_text": "घर", "translation": "house"}
                ]
            }
        }"#;
        let envelope: WordsEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.words.len(), 2);
        assert_eq!(envelope.data.words[1].transliteration, "");
    }
}
