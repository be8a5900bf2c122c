use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Maximum number of task specs the remote service accepts in one call.
pub const MAX_TASKS_PER_CALL: usize = 100;

/// Reference price reported for keywords that cannot be matched back to a
/// catalog product.
pub const UNMATCHED_PRICE: f64 = -1.0;

/// One catalog item, as produced by the catalog reader. Immutable for the
/// duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub title: String,
    pub reference_price: f64,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::PriceLowToHigh => "price_low_to_high",
            SortOrder::PriceHighToLow => "price_high_to_low",
        }
    }
}

/// One search task as submitted to the remote service. Derived one-to-one
/// from a `ProductRecord` whose title becomes the keyword.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub location_name: String,
    pub language_name: String,
    pub sort_by: SortOrder,
    pub priority: i64,
    pub keyword: String,
    pub price_min: f64,
}

/// Ordered accumulator of task specs, capped at the remote service's
/// per-call limit. Modeled as an explicit bounded sequence rather than a
/// generic map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    tasks: Vec<TaskSpec>,
}

impl Batch {
    pub fn new() -> Self {
        Self {
            tasks: Vec::with_capacity(MAX_TASKS_PER_CALL),
        }
    }

    /// Appends a task. Panics if the batch is already full; callers must
    /// check `is_full` and seal first.
    pub fn push(&mut self, task: TaskSpec) {
        assert!(self.tasks.len() < MAX_TASKS_PER_CALL, "batch over capacity");
        self.tasks.push(task);
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= MAX_TASKS_PER_CALL
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CreationStatus {
    Created,
    Rejected,
}

/// Per-task outcome of a submission call. The id is opaque and assigned by
/// the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmittedTask {
    pub id: String,
    pub creation_status: CreationStatus,
}

/// One competitor listing returned for a keyword.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub price: f64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Error,
}

/// Outcome of fetching one task, independent of submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    pub status: ResultStatus,
    pub keyword: String,
    pub offers: Vec<Offer>,
}

/// Maps a keyword (product title) back to the originating product id and its
/// reference price. Built once during batching, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: HashMap<String, (String, f64)>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-wins on duplicate titles; the displaced mapping is logged so
    /// operators can spot catalog collisions.
    pub fn insert(&mut self, keyword: &str, product_id: &str, reference_price: f64) {
        if let Some((prev_id, _)) = self
            .entries
            .insert(keyword.to_string(), (product_id.to_string(), reference_price))
        {
            warn!(
                keyword,
                displaced = %prev_id,
                kept = %product_id,
                "duplicate product title; keeping later record"
            );
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&(String, f64)> {
        self.entries.get(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Competitor offers grouped by keyword, preserving the order in which
/// keywords were first seen. Iteration order is contractual: report rows
/// come out in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    order: Vec<String>,
    offers: HashMap<String, Vec<Offer>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, keyword: &str, offer: Offer) {
        match self.offers.get_mut(keyword) {
            Some(existing) => existing.push(offer),
            None => {
                self.order.push(keyword.to_string());
                self.offers.insert(keyword.to_string(), vec![offer]);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Offer])> {
        self.order
            .iter()
            .map(move |k| (k.as_str(), self.offers[k].as_slice()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One line of the final report. `product_id` is empty and
/// `reference_price` is the sentinel when the keyword had no index entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub product_id: String,
    pub product_name: String,
    pub reference_price: f64,
    pub offers: Vec<Offer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(keyword: &str) -> TaskSpec {
        TaskSpec {
            location_name: "Canada".into(),
            language_name: "English".into(),
            sort_by: SortOrder::PriceLowToHigh,
            priority: 2,
            keyword: keyword.into(),
            price_min: 1.0,
        }
    }

    #[test]
    fn batch_tracks_capacity() {
        let mut batch = Batch::new();
        for i in 0..MAX_TASKS_PER_CALL {
            assert!(!batch.is_full());
            batch.push(spec(&format!("kw-{i}")));
        }
        assert!(batch.is_full());
        assert_eq!(batch.len(), MAX_TASKS_PER_CALL);
    }

    #[test]
    #[should_panic(expected = "over capacity")]
    fn batch_rejects_overflow() {
        let mut batch = Batch::new();
        for i in 0..=MAX_TASKS_PER_CALL {
            batch.push(spec(&format!("kw-{i}")));
        }
    }

    #[test]
    fn keyword_index_last_wins() {
        let mut index = KeywordIndex::new();
        index.insert("widget", "p-1", 10.0);
        index.insert("widget", "p-2", 12.0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("widget"), Some(&("p-2".to_string(), 12.0)));
    }

    #[test]
    fn price_book_preserves_first_seen_order() {
        let mut book = PriceBook::new();
        book.add("beta", Offer { price: 2.0, url: "b".into() });
        book.add("alpha", Offer { price: 1.0, url: "a".into() });
        book.add("beta", Offer { price: 3.0, url: "c".into() });

        let keys: Vec<&str> = book.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["beta", "alpha"]);
        let (_, beta) = book.iter().next().unwrap();
        assert_eq!(beta.len(), 2);
        assert_eq!(beta[1].url, "c");
    }

    #[test]
    fn sort_order_serializes_snake_case() {
        let s = serde_json::to_string(&SortOrder::PriceLowToHigh).unwrap();
        assert_eq!(s, "\"price_low_to_high\"");
    }
}
