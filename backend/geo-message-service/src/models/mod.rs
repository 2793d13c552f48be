pub mod bounding_box;
pub mod message;

pub use bounding_box::BoundingBox;
pub use message::{
    Message, MessageResponse, MessagesResponse, NewMessage, NewMessageRequest,
    UpdateMessageRequest,
};
