use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::api::model::{
    LanguageEntry, ListResponse, LocationEntry, TaskGetResponse, TaskPostResponse,
};
use crate::model::{Batch, CreationStatus, Offer, SubmittedTask};

pub mod model;

const DEFAULT_API_BASE: &str = "https://api.dataforseo.com/";

const TASK_POST_PATH: &str = "v3/merchant/google/products/task_post";
const TASK_GET_PATH: &str = "v3/merchant/google/products/task_get/advanced/";
const LANGUAGES_PATH: &str = "v3/merchant/google/languages";
const LOCATIONS_PATH: &str = "v3/merchant/google/locations";

/// Overall success for a whole response.
pub const STATUS_OK: u32 = 20000;
/// An individual task was accepted into the queue.
pub const STATUS_TASK_CREATED: u32 = 20100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api returned http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed api response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

/// Outcome of one batch submission call, reduced to what the submitter
/// needs. `raw` is the untouched response body kept for the audit file.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    pub status_code: u32,
    pub status_message: String,
    pub tasks: Vec<SubmittedTask>,
    pub raw: Value,
}

impl BatchResponse {
    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// Outcome of one task retrieval call, reduced to what the poller needs.
#[derive(Debug, Clone)]
pub struct TaskFetch {
    pub status_code: u32,
    pub status_message: String,
    pub keyword: String,
    pub offers: Vec<Offer>,
    pub raw: Value,
}

impl TaskFetch {
    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// The remote bulk-search capability. Production uses [`MerchantClient`];
/// tests substitute recording mocks.
#[async_trait]
pub trait SearchApi: Send + Sync + Any {
    async fn submit(&self, batch: &Batch) -> Result<BatchResponse, ApiError>;

    async fn fetch(&self, task_id: &str) -> Result<TaskFetch, ApiError>;
}

#[derive(Clone)]
pub struct MerchantClient {
    http: Client,
    base_url: Url,
    login: String,
    password: String,
}

impl fmt::Debug for MerchantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MerchantClient {
    pub fn new(login: String, password: String) -> Self {
        let base_url = Url::parse(DEFAULT_API_BASE).expect("valid default api URL");
        Self::with_base_url(login, password, base_url)
    }

    pub fn with_base_url(login: String, password: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("pricescout/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            login,
            password,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let res = self
            .http
            .get(url)
            .basic_auth(&self.login, Some(&self.password))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            warn!(status, %body, "api GET failed");
            return Err(ApiError::Http { status, body });
        }
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Encodes a batch the way the service expects it: a JSON object keyed
    /// by the task's index within the call.
    fn batch_payload(batch: &Batch) -> Value {
        let mut payload = Map::new();
        for (i, task) in batch.tasks().iter().enumerate() {
            let spec = serde_json::json!({
                "location_name": task.location_name,
                "language_name": task.language_name,
                "sort_by": task.sort_by.as_str(),
                "priority": task.priority,
                "keyword": task.keyword,
                "price_min": task.price_min,
            });
            payload.insert(i.to_string(), spec);
        }
        Value::Object(payload)
    }

    /// Supported languages for the merchant endpoint; operator tooling.
    pub async fn languages(&self) -> Result<Vec<LanguageEntry>, ApiError> {
        let raw = self.get_json(LANGUAGES_PATH).await?;
        let parsed: ListResponse<LanguageEntry> = serde_json::from_value(raw)?;
        Ok(parsed
            .tasks
            .into_iter()
            .filter_map(|t| t.result)
            .flatten()
            .collect())
    }

    /// Supported locations for the merchant endpoint; operator tooling.
    pub async fn locations(&self) -> Result<Vec<LocationEntry>, ApiError> {
        let raw = self.get_json(LOCATIONS_PATH).await?;
        let parsed: ListResponse<LocationEntry> = serde_json::from_value(raw)?;
        Ok(parsed
            .tasks
            .into_iter()
            .filter_map(|t| t.result)
            .flatten()
            .collect())
    }
}

/// Reduce a submission envelope to the boundary type. Per-task status
/// 20100 means the task entered the queue; everything else is a rejection.
pub fn reduce_post_response(raw: Value) -> Result<BatchResponse, ApiError> {
    let parsed: TaskPostResponse = serde_json::from_value(raw.clone())?;
    let tasks = parsed
        .tasks
        .into_iter()
        .map(|t| SubmittedTask {
            creation_status: if t.status_code == STATUS_TASK_CREATED {
                CreationStatus::Created
            } else {
                warn!(id = %t.id, code = t.status_code, message = %t.status_message, "task rejected by service");
                CreationStatus::Rejected
            },
            id: t.id,
        })
        .collect();
    Ok(BatchResponse {
        status_code: parsed.status_code,
        status_message: parsed.status_message,
        tasks,
        raw,
    })
}

/// Reduce a retrieval envelope to the boundary type. The keyword is echoed
/// back in the task's `data` block; offers are flattened across result
/// pages, skipping listings with no usable price or url.
pub fn reduce_get_response(raw: Value) -> Result<TaskFetch, ApiError> {
    let parsed: TaskGetResponse = serde_json::from_value(raw.clone())?;

    // The retrieval endpoint returns one task per call.
    let task = parsed.tasks.into_iter().next();
    let (status_code, status_message) = match &task {
        Some(t) if parsed.status_code == STATUS_OK => (t.status_code, t.status_message.clone()),
        _ => (parsed.status_code, parsed.status_message.clone()),
    };

    let mut keyword = String::new();
    let mut offers = Vec::new();
    if let Some(task) = task {
        if let Some(data) = task.data {
            keyword = data.keyword;
        }
        for page in task.result.into_iter().flatten() {
            for item in page.items.into_iter().flatten() {
                if let (Some(price), Some(url)) = (item.price, item.url) {
                    offers.push(Offer { price, url });
                }
            }
        }
    }

    Ok(TaskFetch {
        status_code,
        status_message,
        keyword,
        offers,
        raw,
    })
}

#[async_trait]
impl SearchApi for MerchantClient {
    async fn submit(&self, batch: &Batch) -> Result<BatchResponse, ApiError> {
        let url = self
            .base_url
            .join(TASK_POST_PATH)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let payload = Self::batch_payload(batch);
        let res = self
            .http
            .post(url)
            .basic_auth(&self.login, Some(&self.password))
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            warn!(status, %body, "task submission http failure");
            return Err(ApiError::Http { status, body });
        }
        let body = res.text().await?;
        reduce_post_response(serde_json::from_str(&body)?)
    }

    async fn fetch(&self, task_id: &str) -> Result<TaskFetch, ApiError> {
        let raw = self.get_json(&format!("{TASK_GET_PATH}{task_id}")).await?;
        reduce_get_response(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SortOrder, TaskSpec};
    use serde_json::json;

    fn sample_batch() -> Batch {
        let mut batch = Batch::new();
        batch.push(TaskSpec {
            location_name: "Canada".into(),
            language_name: "English".into(),
            sort_by: SortOrder::PriceLowToHigh,
            priority: 2,
            keyword: "red kettle".into(),
            price_min: 7.5,
        });
        batch.push(TaskSpec {
            location_name: "Canada".into(),
            language_name: "English".into(),
            sort_by: SortOrder::PriceLowToHigh,
            priority: 2,
            keyword: "blue kettle".into(),
            price_min: 9.0,
        });
        batch
    }

    #[test]
    fn batch_payload_is_index_keyed() {
        let payload = MerchantClient::batch_payload(&sample_batch());
        assert_eq!(payload["0"]["keyword"], "red kettle");
        assert_eq!(payload["1"]["keyword"], "blue kettle");
        assert_eq!(payload["0"]["sort_by"], "price_low_to_high");
        assert_eq!(payload["1"]["price_min"], 9.0);
        assert!(payload.get("2").is_none());
    }

    #[test]
    fn reduce_post_maps_creation_statuses() {
        let raw = json!({
            "status_code": 20000,
            "status_message": "Ok.",
            "tasks": [
                { "id": "t-1", "status_code": 20100, "status_message": "Task Created." },
                { "id": "t-2", "status_code": 40501, "status_message": "Invalid Field." },
            ]
        });
        let resp = reduce_post_response(raw).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.tasks.len(), 2);
        assert_eq!(resp.tasks[0].creation_status, CreationStatus::Created);
        assert_eq!(resp.tasks[1].creation_status, CreationStatus::Rejected);
    }

    #[test]
    fn reduce_post_surfaces_batch_error() {
        let raw = json!({
            "status_code": 40200,
            "status_message": "Payment Required.",
            "tasks": []
        });
        let resp = reduce_post_response(raw).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.status_message, "Payment Required.");
        assert!(resp.tasks.is_empty());
    }

    #[test]
    fn reduce_get_flattens_offers_and_keeps_keyword() {
        let raw = json!({
            "status_code": 20000,
            "status_message": "Ok.",
            "tasks": [{
                "id": "t-1",
                "status_code": 20000,
                "status_message": "Ok.",
                "data": { "keyword": "red kettle" },
                "result": [{
                    "items": [
                        { "price": 19.99, "url": "https://shop.example/a" },
                        { "price": null, "url": "https://shop.example/ad" },
                        { "price": 24.50, "url": "https://shop.example/b" },
                    ]
                }]
            }]
        });
        let fetch = reduce_get_response(raw).unwrap();
        assert!(fetch.is_ok());
        assert_eq!(fetch.keyword, "red kettle");
        assert_eq!(fetch.offers.len(), 2);
        assert_eq!(fetch.offers[0].price, 19.99);
        assert_eq!(fetch.offers[1].url, "https://shop.example/b");
    }

    #[test]
    fn reduce_get_handles_unfinished_task() {
        let raw = json!({
            "status_code": 20000,
            "status_message": "Ok.",
            "tasks": [{
                "id": "t-1",
                "status_code": 40102,
                "status_message": "Task In Queue.",
                "data": { "keyword": "red kettle" },
                "result": null
            }]
        });
        let fetch = reduce_get_response(raw).unwrap();
        assert!(!fetch.is_ok());
        assert_eq!(fetch.status_code, 40102);
        assert!(fetch.offers.is_empty());
    }

    #[test]
    fn client_debug_redacts_credentials() {
        let client = MerchantClient::new("login@example.com".into(), "secret".into());
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("base_url"));
    }
}
