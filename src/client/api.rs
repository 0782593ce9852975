use std::time::Duration;

use thiserror::Error;

use crate::dto::draft_dto::ActionType;
use crate::dto::sync_dto::{
    DraftActionRequest, DraftActionResponse, DraftEditRequest, SyncStatusResponse,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rejected by the gateway: {0}")]
    Rejected(String),
}

/// Thin HTTP client over the gateway's wire operations. Every request
/// carries a bounded timeout so a dead server never stalls the caller.
#[derive(Clone)]
pub struct DraftApi {
    http: reqwest::Client,
    base_url: String,
}

impl DraftApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn submit_action(
        &self,
        match_id: i64,
        actor_id: &str,
        champion_id: i64,
        action: ActionType,
    ) -> Result<DraftActionResponse, ApiError> {
        let request = DraftActionRequest {
            match_id,
            actor_id: actor_id.to_string(),
            champion_id,
            action,
        };
        let response: DraftActionResponse = self
            .http
            .post(format!("{}/draft-action", self.base_url))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        if response.success {
            Ok(response)
        } else {
            Err(ApiError::Rejected(response.message))
        }
    }

    pub async fn sync_status(&self, actor_id: &str) -> Result<SyncStatusResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/draft-sync-status", self.base_url))
            .query(&[("actorId", actor_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    pub async fn request_edit(
        &self,
        match_id: i64,
        actor_id: &str,
        slot_index: usize,
    ) -> Result<DraftActionResponse, ApiError> {
        let request = DraftEditRequest {
            match_id,
            actor_id: actor_id.to_string(),
            slot_index,
        };
        let response: DraftActionResponse = self
            .http
            .post(format!("{}/draft-edit", self.base_url))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        if response.success {
            Ok(response)
        } else {
            Err(ApiError::Rejected(response.message))
        }
    }
}
