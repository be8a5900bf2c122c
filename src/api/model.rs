use serde::Deserialize;

/// Top-level envelope of a task submission call.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPostResponse {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub tasks: Vec<PostedTask>,
}

/// Per-task entry inside a submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedTask {
    pub id: String,
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
}

/// Top-level envelope of a task retrieval call.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskGetResponse {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub tasks: Vec<FetchedTask>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchedTask {
    pub id: String,
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    pub data: Option<TaskData>,
    /// `null` until the task has finished processing.
    pub result: Option<Vec<ResultPage>>,
}

/// Echo of the submitted parameters; only the keyword matters downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultPage {
    pub items: Option<Vec<ResultItem>>,
}

/// One listing in a result page. Price and url can be absent on ads and
/// malformed listings, so both are optional at the wire level.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultItem {
    pub price: Option<f64>,
    pub url: Option<String>,
}

/// Envelope shared by the locations and languages lookup endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub tasks: Vec<ListTask<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListTask<T> {
    pub result: Option<Vec<T>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageEntry {
    pub language_name: String,
    pub language_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationEntry {
    pub location_code: i64,
    pub location_name: String,
    pub country_iso_code: Option<String>,
}
