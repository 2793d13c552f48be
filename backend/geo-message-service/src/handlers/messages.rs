/// Message handlers - HTTP endpoints for geo-tagged messages
///
/// **Endpoints**:
/// - `GET /messages?latitude_top&longitude_left&latitude_bottom&longitude_right&max_records`
/// - `GET /messages/{user_id}`
/// - `POST /messages/{user_id}`
/// - `PUT /messages/{user_id}/{message_id}`
/// - `DELETE /messages/{user_id}/{message_id}`
use crate::error::{AppError, Result, ValidationError};
use crate::models::{
    BoundingBox, MessageResponse, MessagesResponse, NewMessageRequest, UpdateMessageRequest,
};
use crate::services::FinderError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BoundingBoxQuery {
    pub latitude_top: f64,
    pub longitude_left: f64,
    pub latitude_bottom: f64,
    pub longitude_right: f64,
    pub max_records: i64,
}

/// Messages inside a latitude/longitude rectangle
pub async fn get_messages_in_box(
    state: web::Data<AppState>,
    params: web::Query<BoundingBoxQuery>,
) -> Result<HttpResponse> {
    let params = params.into_inner();

    tracing::info!(
        latitude_top = params.latitude_top,
        latitude_bottom = params.latitude_bottom,
        longitude_left = params.longitude_left,
        longitude_right = params.longitude_right,
        max_records = params.max_records,
        "Getting messages in bounding box"
    );

    let bbox = match BoundingBox::new(
        params.latitude_bottom,
        params.latitude_top,
        params.longitude_left,
        params.longitude_right,
    ) {
        Ok(bbox) => bbox,
        Err(e) => return validation_failure(&state, e),
    };

    match state
        .finder
        .find_by_bounding_box(&bbox, params.max_records)
        .await
    {
        Ok(messages) => Ok(HttpResponse::Ok().json(MessagesResponse { messages })),
        Err(FinderError::Validation(e)) => validation_failure(&state, e),
        Err(e) => Err(e.into()),
    }
}

/// In legacy mode the error text is sent with a 200, as older clients expect.
fn validation_failure(state: &AppState, err: ValidationError) -> Result<HttpResponse> {
    tracing::debug!(error = %err, "Rejected bounding box request");

    if state.legacy_inband_errors {
        return Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(err.legacy_message()));
    }
    Err(AppError::Validation(err))
}

/// All messages posted by a user
pub async fn get_user_messages(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    tracing::info!(user_id = %user_id, "Getting messages for user");

    let messages = state.finder.find_by_user_id(&user_id).await?;
    Ok(HttpResponse::Ok().json(MessagesResponse { messages }))
}

pub async fn create_message(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    req: web::Json<NewMessageRequest>,
) -> Result<HttpResponse> {
    let message = state
        .editor
        .create(&user_id.into_inner(), req.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse { message }))
}

pub async fn update_message(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: web::Json<UpdateMessageRequest>,
) -> Result<HttpResponse> {
    let (user_id, message_id) = path.into_inner();
    let message = state
        .editor
        .update(&user_id, &message_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse { message }))
}

pub async fn delete_message(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, message_id) = path.into_inner();
    state.editor.delete(&user_id, &message_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}
