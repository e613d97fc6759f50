use crate::controller::ApiResponse;
use crate::params::notification::{
    CreateParams, DeleteParams, MarkAsReadParams, NotifyParams, SearchParams,
};
use crate::response::notification::NotificationPageResponse;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{intake, notification as NotificationApi};
use serde_json::json;

use log::*;

/// POST create a new Notification on a Topic
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully Created a New Notification", body = domain::notifications::Model),
        (status = 404, description = "Topic not found"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Notification from: {params:?}");

    let notification =
        NotificationApi::create(&app_state.stores, params.topic_id, params.subject).await?;

    debug!("New Notification: {notification:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), notification)),
    ))
}

/// POST push a Notification to the currently connected subscribers of its Topic.
/// Delivery happens asynchronously on the notify-subscriber queue.
#[utoipa::path(
    post,
    path = "/notifications/notify",
    request_body = NotifyParams,
    responses(
        (status = 200, description = "Notify request accepted"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Queue unavailable")
    )
)]
pub async fn notify(
    State(app_state): State<AppState>,
    Json(params): Json<NotifyParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Notify subscribers: {params:?}");

    intake::enqueue_notify(
        app_state.publisher.as_ref(),
        params.topic_id,
        params.notification_id,
    )
    .await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}

/// POST search the Notifications of a subscriber
#[utoipa::path(
    post,
    path = "/notifications/search",
    request_body = SearchParams,
    responses(
        (status = 200, description = "Successfully retrieved a page of Notifications", body = NotificationPageResponse),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn search(
    State(app_state): State<AppState>,
    Json(params): Json<SearchParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Search Notifications: {params:?}");

    let page = NotificationApi::find_for_subscriber(&app_state.stores, params.into()).await?;

    debug!("Found {} of {} Notification(s)", page.notifications.len(), page.total);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        NotificationPageResponse::from(page),
    )))
}

/// PATCH mark Notifications as read
#[utoipa::path(
    patch,
    path = "/notifications/read",
    request_body = MarkAsReadParams,
    responses(
        (status = 200, description = "Successfully marked Notifications as read"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn mark_as_read(
    State(app_state): State<AppState>,
    Json(params): Json<MarkAsReadParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PATCH Mark Notifications as read: {params:?}");

    let updated = NotificationApi::mark_as_read(
        app_state.stores.notifications.as_ref(),
        &params.notification_ids,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "updated": updated }),
    )))
}

/// DELETE Notifications (soft delete of their delivery records)
#[utoipa::path(
    delete,
    path = "/notifications",
    request_body = DeleteParams,
    responses(
        (status = 200, description = "Successfully deleted Notifications"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Json(params): Json<DeleteParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Notifications: {params:?}");

    let updated =
        NotificationApi::delete(app_state.stores.notifications.as_ref(), &params.ids).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "updated": updated }),
    )))
}
