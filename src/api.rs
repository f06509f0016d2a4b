use crate::clock::Clock;
use crate::error::ApiError;
use crate::models::{
    BabyDevelopment, ChatReply, ConsultationRecord, PregnancyInput, PregnancyState, VaccineReminder,
};
use crate::pregnancy;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Trait defining the contract with the backend.
// Reads that feed passive panels (history, reminders) come in two forms: the
// `try_` form reports failures so callers can keep what they already show,
// the plain form degrades to an empty result and only logs.
#[async_trait]
pub trait HealthApi: Send + Sync {
    async fn send_chat_message(&self, text: &str) -> Result<ChatReply, ApiError>;

    async fn try_fetch_consultation_history(&self, limit: u32) -> Result<Vec<ConsultationRecord>, ApiError>;

    async fn fetch_consultation_history(&self, limit: u32) -> Vec<ConsultationRecord> {
        match self.try_fetch_consultation_history(limit).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load consultation history: {}", e);
                Vec::new()
            }
        }
    }

    /// `Ok(None)` means no pregnancy is registered for this user. A failed
    /// read is an error, not an absence.
    async fn try_fetch_pregnancy_state(&self) -> Result<Option<PregnancyState>, ApiError>;

    async fn fetch_pregnancy_state(&self) -> Option<PregnancyState> {
        match self.try_fetch_pregnancy_state().await {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to load pregnancy: {}", e);
                None
            }
        }
    }

    async fn save_pregnancy_state(&self, input: &PregnancyInput) -> Result<PregnancyState, ApiError>;

    async fn fetch_baby_development(&self) -> Option<BabyDevelopment>;

    async fn try_fetch_vaccine_reminders(&self) -> Result<Vec<VaccineReminder>, ApiError>;

    async fn fetch_vaccine_reminders(&self) -> Vec<VaccineReminder> {
        match self.try_fetch_vaccine_reminders().await {
            Ok(reminders) => reminders,
            Err(e) => {
                log::error!("Failed to load vaccine reminders: {}", e);
                Vec::new()
            }
        }
    }
}

// --- Wire envelopes ---

#[derive(Serialize, Debug)]
struct ChatRequestBody<'a> {
    message: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ConsultationsEnvelope {
    #[serde(default)]
    consultations: Vec<ConsultationRecord>,
}

#[derive(Deserialize, Debug)]
struct PregnancyEnvelope {
    #[serde(default)]
    pregnancy: Option<PregnancyState>,
}

#[derive(Deserialize, Debug)]
struct RemindersEnvelope {
    #[serde(default)]
    reminders: Vec<VaccineReminder>,
}

// --- reqwest implementation ---

pub struct HttpHealthApi {
    client: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl HttpHealthApi {
    pub fn new(base_url: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url, clock }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Turns a non-2xx response into a Rejected error carrying the server's message
    async fn rejection(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed ({})", status));
        log::error!("Backend rejected request with status {}: {}", status, body);
        ApiError::Rejected { status: status.as_u16(), message }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(ApiError::transport)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        response.json::<T>().await.map_err(ApiError::transport)
    }

    async fn try_fetch_pregnancy(&self) -> Result<Option<PregnancyState>, ApiError> {
        let url = self.url("/api/pregnancy");
        let response = self.client.get(&url).send().await.map_err(ApiError::transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let envelope = response
            .json::<PregnancyEnvelope>()
            .await
            .map_err(ApiError::transport)?;
        Ok(envelope.pregnancy)
    }
}

#[async_trait]
impl HealthApi for HttpHealthApi {
    async fn send_chat_message(&self, text: &str) -> Result<ChatReply, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::validation("message"));
        }
        let url = self.url("/api/chat");
        log::info!("Sending chat message ({} chars) to {}", text.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequestBody { message: text })
            .send()
            .await
            .map_err(|e| {
                log::error!("Chat request failed to send: {:?}", e);
                ApiError::transport(e)
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response.json::<ChatReply>().await.map_err(|e| {
            log::error!("Failed to parse chat reply: {:?}", e);
            ApiError::transport(e)
        })
    }

    async fn try_fetch_consultation_history(&self, limit: u32) -> Result<Vec<ConsultationRecord>, ApiError> {
        let path = format!("/api/consultations?limit={}", limit);
        let mut records = self.get_json::<ConsultationsEnvelope>(&path).await?.consultations;
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn try_fetch_pregnancy_state(&self) -> Result<Option<PregnancyState>, ApiError> {
        self.try_fetch_pregnancy().await
    }

    async fn save_pregnancy_state(&self, input: &PregnancyInput) -> Result<PregnancyState, ApiError> {
        let start_date = pregnancy::validate_input(input)?;
        let url = self.url("/api/pregnancy");
        log::info!("Saving pregnancy starting {}", start_date);

        let body = PregnancyInput {
            start_date: start_date.format("%Y-%m-%d").to_string(),
            medical_history: input.medical_history,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Pregnancy save failed to send: {:?}", e);
                ApiError::transport(e)
            })?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // The server owns the derived fields, so read back what it stored
        match self.try_fetch_pregnancy().await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => {
                log::warn!("Pregnancy saved but not returned by the backend, deriving locally");
                Ok(PregnancyState::derive(start_date, input.medical_history, self.clock.today()))
            }
            Err(e) => {
                log::warn!("Pregnancy saved but re-read failed ({}), deriving locally", e);
                Ok(PregnancyState::derive(start_date, input.medical_history, self.clock.today()))
            }
        }
    }

    async fn fetch_baby_development(&self) -> Option<BabyDevelopment> {
        match self.get_json::<BabyDevelopment>("/api/baby-development").await {
            Ok(development) => Some(development),
            Err(ApiError::Rejected { status: 404, .. }) => None,
            Err(e) => {
                log::error!("Failed to load baby development: {}", e);
                None
            }
        }
    }

    async fn try_fetch_vaccine_reminders(&self) -> Result<Vec<VaccineReminder>, ApiError> {
        Ok(self
            .get_json::<RemindersEnvelope>("/api/vaccine-reminders")
            .await?
            .reminders)
    }
}
