/// Geo-tagged message data models
///
/// A message is a caption plus an image URL pinned to a WGS84 coordinate.
/// Coordinates and ownership are fixed at creation; only the caption and
/// image can change afterwards.
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_TEXT_LENGTH: u64 = 2000;

/// Stored message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned identifier, immutable
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub image_url: String,
    /// Latitude (-90 to 90)
    pub latitude: f64,
    /// Longitude (-180 to 180)
    pub longitude: f64,
}

/// API Request: Create message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageRequest {
    #[validate(length(max = 2000))]
    pub text: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// API Request: Update message caption/image
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    #[validate(length(max = 2000))]
    pub text: String,
    #[validate(url)]
    pub image_url: String,
}

/// Validated insert payload handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub user_id: String,
    pub text: String,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// API Response: list of messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// API Response: single message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: Message,
}
