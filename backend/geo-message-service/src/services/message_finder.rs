/// Message retrieval service
///
/// Runs the plan produced by [`GeoRangeQueryPlanner`] against a
/// [`MessageStore`], applies the residual filter, removes duplicate ids and
/// truncates to the caller's bound. Holds no per-call state; concurrent
/// calls only share the store handle.
use super::query_planner::{
    sort_by_latitude_then_id, GeoQueryPlan, GeoRangeQueryPlanner, PlannerSettings, Termination,
};
use crate::config::RetrievalConfig;
use crate::db::{Cursor, KeyField, MessageStore, SortKey, StoreError, StoreQuery};
use crate::error::ValidationError;
use crate::metrics::{
    GEO_MESSAGE_CANDIDATES_SCANNED, GEO_MESSAGE_QUERIES_TOTAL, GEO_MESSAGE_QUERY_DURATION_SECONDS,
    GEO_MESSAGE_RESIDUAL_DISCARDS_TOTAL,
};
use crate::models::{BoundingBox, Message};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FinderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl FinderError {
    fn outcome(&self) -> &'static str {
        match self {
            FinderError::Validation(_) => "invalid",
            FinderError::StoreUnavailable(_) => "unavailable",
            FinderError::Timeout(_) => "timeout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FinderSettings {
    pub max_records_ceiling: usize,
    pub store_timeout: Duration,
}

impl From<&RetrievalConfig> for FinderSettings {
    fn from(cfg: &RetrievalConfig) -> Self {
        Self {
            max_records_ceiling: cfg.max_records_ceiling,
            store_timeout: Duration::from_millis(cfg.store_timeout_ms),
        }
    }
}

pub struct MessageFinder {
    store: Arc<dyn MessageStore>,
    planner: GeoRangeQueryPlanner,
    settings: FinderSettings,
}

/// Counters for one bounding-box scan
#[derive(Debug, Default)]
struct ScanStats {
    pages: usize,
    scanned: usize,
    discarded: usize,
}

impl MessageFinder {
    pub fn new(store: Arc<dyn MessageStore>, retrieval: &RetrievalConfig) -> Self {
        Self::with_settings(
            store,
            PlannerSettings::from(retrieval),
            FinderSettings::from(retrieval),
        )
    }

    pub fn with_settings(
        store: Arc<dyn MessageStore>,
        planner: PlannerSettings,
        settings: FinderSettings,
    ) -> Self {
        Self {
            store,
            planner: GeoRangeQueryPlanner::new(planner),
            settings,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        self.settings.store_timeout
    }

    /// Messages inside `bbox`, ordered by latitude then id, at most `max_records`.
    pub async fn find_by_bounding_box(
        &self,
        bbox: &BoundingBox,
        max_records: i64,
    ) -> Result<Vec<Message>, FinderError> {
        self.find_by_bounding_box_within(bbox, max_records, self.settings.store_timeout)
            .await
    }

    /// Same as [`find_by_bounding_box`](Self::find_by_bounding_box) with an explicit deadline.
    /// On expiry nothing fetched so far is returned.
    pub async fn find_by_bounding_box_within(
        &self,
        bbox: &BoundingBox,
        max_records: i64,
        timeout: Duration,
    ) -> Result<Vec<Message>, FinderError> {
        let start = Instant::now();
        let result = self.bounding_box_inner(bbox, max_records, timeout).await;
        record("bounding_box", start, &result);
        result
    }

    /// All messages of `user_id`, ordered by id. Unknown users yield an empty list.
    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Message>, FinderError> {
        let start = Instant::now();
        let query = StoreQuery::new()
            .where_eq(KeyField::UserId, user_id)
            .order_by(SortKey::Id);

        let result = match tokio::time::timeout(self.settings.store_timeout, self.store.query(&query))
            .await
        {
            Ok(Ok(mut messages)) => {
                // Stores may not guarantee order; id order is part of the contract.
                messages.sort_by(|a, b| a.id.cmp(&b.id));
                messages.dedup_by(|a, b| a.id == b.id);
                Ok(messages)
            }
            Ok(Err(e)) => {
                warn!(user_id = %user_id, error = %e, "Store query by user_id failed");
                Err(FinderError::StoreUnavailable(e))
            }
            Err(_) => {
                warn!(user_id = %user_id, timeout = ?self.settings.store_timeout, "Store query by user_id timed out");
                Err(FinderError::Timeout(self.settings.store_timeout))
            }
        };

        record("user_id", start, &result);
        result
    }

    fn validate_max_records(&self, max_records: i64) -> Result<usize, ValidationError> {
        if max_records <= 0 {
            return Err(ValidationError::NonPositiveMaxRecords);
        }
        let ceiling = self.settings.max_records_ceiling;
        match usize::try_from(max_records) {
            Ok(n) if n <= ceiling => Ok(n),
            _ => Err(ValidationError::MaxRecordsTooLarge { ceiling }),
        }
    }

    async fn bounding_box_inner(
        &self,
        bbox: &BoundingBox,
        max_records: i64,
        timeout: Duration,
    ) -> Result<Vec<Message>, FinderError> {
        let max_records = self.validate_max_records(max_records)?;
        let plan = self.planner.plan(bbox, max_records);

        match tokio::time::timeout(timeout, self.scan(&plan)).await {
            Ok(Ok(messages)) => Ok(messages),
            Ok(Err(e)) => {
                warn!(
                    pushed = plan.pushed().as_str(),
                    error = %e,
                    "Store query by bounding box failed"
                );
                Err(FinderError::StoreUnavailable(e))
            }
            Err(_) => {
                warn!(
                    pushed = plan.pushed().as_str(),
                    timeout = ?timeout,
                    "Store query by bounding box timed out"
                );
                Err(FinderError::Timeout(timeout))
            }
        }
    }

    /// Pages through the pushed band until the plan's termination rule is met.
    async fn scan(&self, plan: &GeoQueryPlan) -> Result<Vec<Message>, StoreError> {
        let mut stats = ScanStats::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut kept: Vec<Message> = Vec::new();
        let mut cursor: Option<Cursor> = None;

        loop {
            let query = plan.page_query(cursor.take());
            let page = self.store.query(&query).await?;

            stats.pages += 1;
            stats.scanned += page.len();
            let exhausted = page.len() < plan.page_size();
            cursor = page.last().map(|m| Cursor::after(m, plan.sort_key()));

            let before = kept.len();
            for message in page {
                if !plan.accepts(&message) {
                    stats.discarded += 1;
                    continue;
                }
                if seen.insert(message.id.clone()) {
                    kept.push(message);
                }
            }

            debug!(
                pushed = plan.pushed().as_str(),
                page = stats.pages,
                page_size = plan.page_size(),
                kept = kept.len() - before,
                "Scanned message page"
            );

            if exhausted || cursor.is_none() {
                break;
            }
            if plan.termination() == Termination::StopWhenFilled
                && kept.len() >= plan.max_records()
            {
                break;
            }
        }

        let dimension = plan.pushed().as_str();
        GEO_MESSAGE_CANDIDATES_SCANNED
            .with_label_values(&[dimension])
            .observe(stats.scanned as f64);
        GEO_MESSAGE_RESIDUAL_DISCARDS_TOTAL
            .with_label_values(&[dimension])
            .inc_by(stats.discarded as u64);

        sort_by_latitude_then_id(&mut kept);
        kept.truncate(plan.max_records());

        debug!(
            pushed = dimension,
            pages = stats.pages,
            scanned = stats.scanned,
            discarded = stats.discarded,
            returned = kept.len(),
            "Bounding box retrieval complete"
        );

        Ok(kept)
    }
}

fn record(mode: &str, start: Instant, result: &Result<Vec<Message>, FinderError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    GEO_MESSAGE_QUERIES_TOTAL
        .with_label_values(&[mode, outcome])
        .inc();
    GEO_MESSAGE_QUERY_DURATION_SECONDS
        .with_label_values(&[mode])
        .observe(start.elapsed().as_secs_f64());
}
