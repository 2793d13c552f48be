//! Message store capability
//!
//! Models what the backing document store can answer in one request: any
//! number of equality predicates, at most ONE inclusive range predicate, an
//! ascending sort on a single key (ties broken by id), an optional
//! `start_after` cursor and an optional limit. Anything richer has to be
//! planned on top of this by the caller.

use crate::models::{Message, NewMessage};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Fields usable in equality predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    Id,
    UserId,
}

/// Fields usable in range predicates and coordinate orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

impl CoordinateField {
    pub fn value_of(&self, message: &Message) -> f64 {
        match self {
            CoordinateField::Latitude => message.latitude,
            CoordinateField::Longitude => message.longitude,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateField::Latitude => "latitude",
            CoordinateField::Longitude => "longitude",
        }
    }
}

impl KeyField {
    pub fn value_of<'a>(&self, message: &'a Message) -> &'a str {
        match self {
            KeyField::Id => &message.id,
            KeyField::UserId => &message.user_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyField::Id => "id",
            KeyField::UserId => "user_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub field: KeyField,
    pub value: String,
}

/// Inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub field: CoordinateField,
    pub lower: f64,
    pub upper: f64,
}

impl RangeFilter {
    pub fn matches(&self, message: &Message) -> bool {
        (self.lower..=self.upper).contains(&self.field.value_of(message))
    }
}

/// Total order on coordinates in which `-0.0` and `0.0` are equal, matching
/// PostgreSQL's comparison of `DOUBLE PRECISION`.
pub fn coordinate_cmp(a: f64, b: f64) -> std::cmp::Ordering {
    (a + 0.0).total_cmp(&(b + 0.0))
}

/// Ascending sort; equal keys are ordered by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Coordinate(CoordinateField),
}

/// Position of the last row of the previous page. `value` is ignored when
/// sorting by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub value: f64,
    pub id: String,
}

impl Cursor {
    pub fn after(message: &Message, sort: SortKey) -> Self {
        let value = match sort {
            SortKey::Id => 0.0,
            SortKey::Coordinate(field) => field.value_of(message) + 0.0,
        };
        Self {
            value,
            id: message.id.clone(),
        }
    }

    /// True when `message` sorts strictly after this cursor.
    pub fn precedes(&self, message: &Message, sort: SortKey) -> bool {
        match sort {
            SortKey::Id => message.id > self.id,
            SortKey::Coordinate(field) => {
                match coordinate_cmp(field.value_of(message), self.value) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Equal => message.id > self.id,
                    std::cmp::Ordering::Less => false,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub equals: Vec<EqualityFilter>,
    pub range: Option<RangeFilter>,
    pub order_by: SortKey,
    pub start_after: Option<Cursor>,
    pub limit: Option<usize>,
}

impl Default for StoreQuery {
    fn default() -> Self {
        Self {
            equals: Vec::new(),
            range: None,
            order_by: SortKey::Id,
            start_after: None,
            limit: None,
        }
    }
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: KeyField, value: impl Into<String>) -> Self {
        self.equals.push(EqualityFilter {
            field,
            value: value.into(),
        });
        self
    }

    /// Sets the single range predicate, replacing any previous one.
    pub fn where_range(mut self, field: CoordinateField, lower: f64, upper: f64) -> Self {
        self.range = Some(RangeFilter {
            field,
            lower,
            upper,
        });
        self
    }

    pub fn order_by(mut self, sort: SortKey) -> Self {
        self.order_by = sort;
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluates every predicate of this query against one record.
    pub fn matches(&self, message: &Message) -> bool {
        self.equals
            .iter()
            .all(|eq| eq.field.value_of(message) == eq.value)
            && self.range.as_ref().map_or(true, |r| r.matches(message))
            && self
                .start_after
                .as_ref()
                .map_or(true, |c| c.precedes(message, self.order_by))
    }
}

/// Read side of the store. Implementations own their connections.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Message>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Write side used by the message editor.
#[async_trait]
pub trait MessageRepository: MessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Returns `None` when no message with `id` belongs to `user_id`.
    async fn update_content(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        image_url: &str,
    ) -> Result<Option<Message>, StoreError>;

    /// Returns `false` when no message with `id` belongs to `user_id`.
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError>;
}
