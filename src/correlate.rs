//! Correlation: match fetched results back to catalog products by keyword
//! and aggregate competitor offers per product.
use crate::model::{
    KeywordIndex, PriceBook, ReportRow, ResultStatus, TaskResult, UNMATCHED_PRICE,
};
use tracing::warn;

/// Folds successful results into a [`PriceBook`]. Error-status results are
/// logged and excluded; multiple results for the same keyword accumulate in
/// processing order.
pub fn build_price_book(results: &[TaskResult]) -> PriceBook {
    let mut book = PriceBook::new();
    for result in results {
        match result.status {
            ResultStatus::Success => {
                for offer in &result.offers {
                    book.add(&result.keyword, offer.clone());
                }
            }
            ResultStatus::Error => {
                warn!(task_id = %result.task_id, keyword = %result.keyword, "excluding error result");
            }
        }
    }
    book
}

/// Produces one report row per keyword, in the book's first-seen order. A
/// keyword with no index entry still gets a row, with an empty product id
/// and the sentinel reference price, so index mismatches stay visible.
pub fn correlate(book: &PriceBook, index: &KeywordIndex) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(book.len());
    for (keyword, offers) in book.iter() {
        let (product_id, reference_price) = match index.get(keyword) {
            Some((id, price)) => (id.clone(), *price),
            None => {
                warn!(keyword, "result keyword not present in catalog index");
                (String::new(), UNMATCHED_PRICE)
            }
        };
        rows.push(ReportRow {
            product_id,
            product_name: keyword.to_string(),
            reference_price,
            offers: offers.to_vec(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Offer;

    fn success(task_id: &str, keyword: &str, offers: Vec<(f64, &str)>) -> TaskResult {
        TaskResult {
            task_id: task_id.into(),
            status: ResultStatus::Success,
            keyword: keyword.into(),
            offers: offers
                .into_iter()
                .map(|(price, url)| Offer { price, url: url.into() })
                .collect(),
        }
    }

    fn failure(task_id: &str) -> TaskResult {
        TaskResult {
            task_id: task_id.into(),
            status: ResultStatus::Error,
            keyword: String::new(),
            offers: Vec::new(),
        }
    }

    #[test]
    fn error_results_are_excluded() {
        let results = vec![
            success("t-1", "kettle", vec![(19.99, "https://a")]),
            failure("t-2"),
        ];
        let book = build_price_book(&results);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn shared_keyword_offers_union_in_processing_order() {
        let results = vec![
            success("t-1", "kettle", vec![(19.99, "https://a"), (21.00, "https://b")]),
            success("t-2", "kettle", vec![(18.50, "https://c")]),
        ];
        let book = build_price_book(&results);

        let mut index = KeywordIndex::new();
        index.insert("kettle", "p-1", 20.0);
        let rows = correlate(&book, &index);

        assert_eq!(rows.len(), 1);
        let urls: Vec<&str> = rows[0].offers.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b", "https://c"]);
        assert_eq!(rows[0].product_id, "p-1");
        assert_eq!(rows[0].reference_price, 20.0);
    }

    #[test]
    fn unknown_keyword_gets_sentinel_row() {
        let results = vec![success("t-1", "mystery item", vec![(5.0, "https://x")])];
        let book = build_price_book(&results);
        let rows = correlate(&book, &KeywordIndex::new());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, "");
        assert_eq!(rows[0].reference_price, UNMATCHED_PRICE);
        assert_eq!(rows[0].offers.len(), 1);
    }

    #[test]
    fn rows_follow_first_seen_order() {
        let results = vec![
            success("t-1", "beta", vec![(2.0, "https://b")]),
            success("t-2", "alpha", vec![(1.0, "https://a")]),
            success("t-3", "beta", vec![(3.0, "https://c")]),
        ];
        let book = build_price_book(&results);
        let mut index = KeywordIndex::new();
        index.insert("alpha", "p-a", 1.0);
        index.insert("beta", "p-b", 2.0);

        let rows = correlate(&book, &index);
        let names: Vec<&str> = rows.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }
}
