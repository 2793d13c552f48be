//! In-process message store
//!
//! Answers exactly the query shape described by [`StoreQuery`], with the
//! same ordering rules as the PostgreSQL adapter. Used for local
//! development (`STORE_BACKEND=memory`) and tests.

use super::message_store::{
    coordinate_cmp, MessageRepository, MessageStore, SortKey, StoreError, StoreQuery,
};
use crate::models::{Message, NewMessage};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<BTreeMap<String, Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with messages that already carry ids.
    pub fn with_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let map = messages
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect::<BTreeMap<_, _>>();
        Self {
            messages: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

fn compare(sort: SortKey, a: &Message, b: &Message) -> Ordering {
    let primary = match sort {
        SortKey::Id => Ordering::Equal,
        SortKey::Coordinate(field) => coordinate_cmp(field.value_of(a), field.value_of(b)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;

        let mut rows: Vec<Message> = messages
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare(query.order_by, a, b));

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let stored = Message {
            id: Uuid::new_v4().to_string(),
            user_id: message.user_id,
            text: message.text,
            image_url: message.image_url,
            latitude: message.latitude,
            longitude: message.longitude,
        };

        self.messages
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());

        Ok(stored)
    }

    async fn update_content(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        image_url: &str,
    ) -> Result<Option<Message>, StoreError> {
        let mut messages = self.messages.write().await;

        match messages.get_mut(id) {
            Some(message) if message.user_id == user_id => {
                message.text = text.to_string();
                message.image_url = image_url.to_string();
                Ok(Some(message.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let mut messages = self.messages.write().await;

        match messages.get(id) {
            Some(message) if message.user_id == user_id => {
                messages.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::message_store::{CoordinateField, Cursor, KeyField};

    fn message(id: &str, user_id: &str, latitude: f64, longitude: f64) -> Message {
        Message {
            id: id.to_string(),
            user_id: user_id.to_string(),
            text: format!("text {id}"),
            image_url: format!("https://img.example.com/{id}.jpg"),
            latitude,
            longitude,
        }
    }

    fn seeded() -> InMemoryMessageStore {
        InMemoryMessageStore::with_messages(vec![
            message("c", "u1", 10.0, 10.0),
            message("a", "u1", 10.0, 20.0),
            message("b", "u2", 20.0, 10.0),
            message("d", "u2", -5.0, 0.0),
        ])
    }

    #[tokio::test]
    async fn orders_by_coordinate_then_id() {
        let store = seeded();
        let query = StoreQuery::new()
            .where_range(CoordinateField::Latitude, 0.0, 30.0)
            .order_by(SortKey::Coordinate(CoordinateField::Latitude));

        let ids: Vec<String> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn pages_with_cursor_and_limit() {
        let store = seeded();
        let sort = SortKey::Coordinate(CoordinateField::Latitude);
        let first = StoreQuery::new()
            .where_range(CoordinateField::Latitude, -90.0, 90.0)
            .order_by(sort)
            .limit(2);

        let page_one = store.query(&first).await.unwrap();
        assert_eq!(page_one.len(), 2);
        assert_eq!(page_one[0].id, "d");
        assert_eq!(page_one[1].id, "a");

        let second = first.clone().start_after(Some(Cursor::after(&page_one[1], sort)));
        let page_two = store.query(&second).await.unwrap();
        let ids: Vec<&str> = page_two.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn signed_zero_coordinates_page_as_equal() {
        let store = InMemoryMessageStore::with_messages(vec![
            message("b", "u1", -0.0, 1.0),
            message("a", "u1", 0.0, 1.0),
        ]);
        let sort = SortKey::Coordinate(CoordinateField::Latitude);
        let first = StoreQuery::new()
            .where_range(CoordinateField::Latitude, -1.0, 1.0)
            .order_by(sort)
            .limit(1);

        let page_one = store.query(&first).await.unwrap();
        assert_eq!(page_one[0].id, "a");

        let second = first.clone().start_after(Some(Cursor::after(&page_one[0], sort)));
        let page_two = store.query(&second).await.unwrap();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].id, "b");
    }

    #[tokio::test]
    async fn equality_query_returns_empty_for_unknown_user() {
        let store = seeded();
        let query = StoreQuery::new().where_eq(KeyField::UserId, "nobody");
        assert!(store.query(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_require_owner() {
        let store = seeded();

        let updated = store
            .update_content("u2", "a", "new", "https://img.example.com/new.jpg")
            .await
            .unwrap();
        assert!(updated.is_none());

        let updated = store
            .update_content("u1", "a", "new", "https://img.example.com/new.jpg")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "new");
        assert_eq!(updated.latitude, 10.0);

        assert!(!store.delete("u2", "a").await.unwrap());
        assert!(store.delete("u1", "a").await.unwrap());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn insert_assigns_id() {
        let store = InMemoryMessageStore::new();
        let stored = store
            .insert(NewMessage {
                user_id: "u1".to_string(),
                text: "hello".to_string(),
                image_url: "https://img.example.com/x.jpg".to_string(),
                latitude: 1.0,
                longitude: 2.0,
            })
            .await
            .unwrap();

        assert!(Uuid::parse_str(&stored.id).is_ok());
        assert_eq!(store.len().await, 1);
    }
}
