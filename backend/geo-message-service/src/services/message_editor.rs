/// Message write service
///
/// Create, caption/image update and delete for a user's own messages.
/// Coordinates are set once at creation.
use crate::db::MessageRepository;
use crate::error::{AppError, Result};
use crate::models::{Message, NewMessage, NewMessageRequest, UpdateMessageRequest};
use std::sync::Arc;
use validator::Validate;

pub struct MessageEditor {
    repo: Arc<dyn MessageRepository>,
}

impl MessageEditor {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: &str, request: NewMessageRequest) -> Result<Message> {
        validate_user_id(user_id)?;
        request.validate()?;

        let message = self
            .repo
            .insert(NewMessage {
                user_id: user_id.to_string(),
                text: request.text,
                image_url: request.image_url,
                latitude: request.latitude,
                longitude: request.longitude,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            message_id = %message.id,
            latitude = message.latitude,
            longitude = message.longitude,
            "Message created"
        );

        Ok(message)
    }

    pub async fn update(
        &self,
        user_id: &str,
        message_id: &str,
        request: UpdateMessageRequest,
    ) -> Result<Message> {
        validate_user_id(user_id)?;
        request.validate()?;

        let updated = self
            .repo
            .update_content(user_id, message_id, &request.text, &request.image_url)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("message {}", message_id)))?;

        tracing::info!(user_id = %user_id, message_id = %message_id, "Message updated");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: &str, message_id: &str) -> Result<()> {
        validate_user_id(user_id)?;

        if !self.repo.delete(user_id, message_id).await? {
            return Err(AppError::NotFound(format!("message {}", message_id)));
        }

        tracing::info!(user_id = %user_id, message_id = %message_id, "Message deleted");
        Ok(())
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryMessageStore;
    use crate::error::ValidationError;

    fn new_request(latitude: f64, longitude: f64) -> NewMessageRequest {
        NewMessageRequest {
            text: "harbour at dusk".to_string(),
            image_url: "https://img.example.com/harbour.jpg".to_string(),
            latitude,
            longitude,
        }
    }

    #[tokio::test]
    async fn create_then_update_keeps_coordinates() {
        let editor = MessageEditor::new(Arc::new(InMemoryMessageStore::new()));

        let created = editor.create("alice", new_request(12.5, -3.25)).await.unwrap();
        assert_eq!(created.user_id, "alice");

        let updated = editor
            .update(
                "alice",
                &created.id,
                UpdateMessageRequest {
                    text: "edited".to_string(),
                    image_url: "https://img.example.com/edited.jpg".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.text, "edited");
        assert_eq!((updated.latitude, updated.longitude), (12.5, -3.25));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_coordinates() {
        let editor = MessageEditor::new(Arc::new(InMemoryMessageStore::new()));

        let err = editor.create("alice", new_request(0.0, 181.0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::Payload(_))));
    }

    #[tokio::test]
    async fn foreign_or_unknown_message_is_not_found() {
        let store = Arc::new(InMemoryMessageStore::new());
        let editor = MessageEditor::new(store.clone());
        let created = editor.create("alice", new_request(1.0, 1.0)).await.unwrap();

        assert!(matches!(
            editor.delete("mallory", &created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            editor.delete("alice", "missing").await,
            Err(AppError::NotFound(_))
        ));

        editor.delete("alice", &created.id).await.unwrap();
        assert!(store.is_empty().await);
    }
}
