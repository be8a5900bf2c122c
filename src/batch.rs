//! Task batching: catalog records in, capped batches of task specs plus
//! the keyword index out.
use crate::config::Campaign;
use crate::model::{Batch, KeywordIndex, ProductRecord, TaskSpec};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub batches: Vec<Batch>,
    pub index: KeywordIndex,
    /// Records excluded for a missing or empty barcode.
    pub skipped: usize,
}

impl BatchPlan {
    pub fn task_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// Walks the records in source order. Each record with a barcode yields one
/// task spec (title as keyword, `price_min` scaled off the reference price)
/// and one keyword index entry; batches seal at the service's per-call cap.
pub fn plan_batches(records: &[ProductRecord], campaign: &Campaign) -> BatchPlan {
    let mut plan = BatchPlan::default();
    let mut open = Batch::new();

    for record in records {
        let has_barcode = record
            .barcode
            .as_deref()
            .map(|b| !b.trim().is_empty())
            .unwrap_or(false);
        if !has_barcode {
            plan.skipped += 1;
            continue;
        }

        if open.is_full() {
            plan.batches.push(std::mem::replace(&mut open, Batch::new()));
        }
        open.push(TaskSpec {
            location_name: campaign.location_name.clone(),
            language_name: campaign.language_name.clone(),
            sort_by: campaign.sort_by,
            priority: campaign.priority,
            keyword: record.title.clone(),
            price_min: campaign.price_min_ratio * record.reference_price,
        });
        plan.index
            .insert(&record.title, &record.id, record.reference_price);
    }
    if !open.is_empty() {
        plan.batches.push(open);
    }

    info!(
        batches = plan.batches.len(),
        tasks = plan.task_count(),
        skipped = plan.skipped,
        "batch plan ready"
    );
    plan
}
