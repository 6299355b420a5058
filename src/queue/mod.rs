//! Review queue: persistence and querying for
//! ALERT/BLOCK verdicts awaiting human feedback, plus the auto-accept
//! sweep that resolves items nobody reviewed in time.

use std::sync::Arc;

use crate::config::defaults;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::{FeedbackStatus, ReviewQueueFilter, ReviewQueueItem, StatusCounts};

pub struct ReviewQueue<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ReviewQueue<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: Store> ReviewQueue<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn save(&self, item: &ReviewQueueItem) -> Result<(), StoreError> {
        self.store.put(defaults::SET_REVIEW_QUEUE, &item.txn_id, item).await
    }

    pub async fn find_by_txn_id(&self, txn_id: &str) -> Result<Option<ReviewQueueItem>, StoreError> {
        self.store.get(defaults::SET_REVIEW_QUEUE, txn_id).await
    }

    async fn all(&self) -> Result<Vec<ReviewQueueItem>, StoreError> {
        self.store.scan_all(defaults::SET_REVIEW_QUEUE).await
    }

    pub async fn find_all_with_feedback(&self) -> Result<Vec<ReviewQueueItem>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|i| matches!(i.feedback_status, FeedbackStatus::TruePositive | FeedbackStatus::FalsePositive))
            .collect())
    }

    /// Applies feedback only if the item is still PENDING; a
    /// late or duplicate review is a no-op, reported as `false`.
    pub async fn update_feedback(
        &self,
        txn_id: &str,
        status: FeedbackStatus,
        by: Option<String>,
        at: i64,
    ) -> Result<bool, StoreError> {
        let Some(mut item) = self.find_by_txn_id(txn_id).await? else {
            return Ok(false);
        };
        if !item.is_pending() {
            return Ok(false);
        }
        item.feedback_status = status;
        item.feedback_at = Some(at);
        item.feedback_by = by;
        self.save(&item).await?;
        Ok(true)
    }

    /// Applies `update_feedback` to every id, returning how many actually
    /// changed.
    pub async fn bulk_update_feedback(
        &self,
        txn_ids: &[String],
        status: FeedbackStatus,
        by: Option<String>,
        at: i64,
    ) -> Result<usize, StoreError> {
        let mut updated = 0;
        for id in txn_ids {
            if self.update_feedback(id, status, by.clone(), at).await? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let mut counts = StatusCounts::default();
        for item in self.all().await? {
            match item.feedback_status {
                FeedbackStatus::Pending => counts.pending += 1,
                FeedbackStatus::TruePositive => counts.true_positive += 1,
                FeedbackStatus::FalsePositive => counts.false_positive += 1,
                FeedbackStatus::AutoAccepted => counts.auto_accepted += 1,
            }
        }
        Ok(counts)
    }

    /// Filtered, newest-first, cursor-paginated query.
    pub async fn query(&self, filter: &ReviewQueueFilter) -> Result<Vec<ReviewQueueItem>, StoreError> {
        let mut items = self.all().await?;
        items.retain(|item| {
            filter.action.map_or(true, |a| item.action == a)
                && filter.client_id.as_deref().map_or(true, |c| item.client_id == c)
                && filter.from_date.map_or(true, |from| item.enqueued_at >= from)
                && filter.to_date.map_or(true, |to| item.enqueued_at <= to)
                && filter
                    .rule_id
                    .as_deref()
                    .map_or(true, |r| item.triggered_rule_ids.iter().any(|id| id == r))
                && filter.before_cursor.map_or(true, |cursor| item.enqueued_at < cursor)
        });
        items.sort_by(|a, b| b.enqueued_at.cmp(&a.enqueued_at));
        if filter.limit > 0 {
            items.truncate(filter.limit);
        }
        Ok(items)
    }

    /// Marks every still-PENDING item past its `autoAcceptDeadline` as
    /// AUTO_ACCEPTED, returning how many were swept.
    pub async fn auto_accept_sweep(&self, now: i64) -> Result<usize, StoreError> {
        let mut accepted = 0;
        for mut item in self.all().await? {
            if item.is_pending() && now >= item.auto_accept_deadline {
                item.feedback_status = FeedbackStatus::AutoAccepted;
                item.feedback_at = Some(now);
                self.save(&item).await?;
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}
