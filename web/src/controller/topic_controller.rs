use crate::controller::ApiResponse;
use crate::params::topic::{CreateParams, SubscribeParams};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{intake, topic as TopicApi};

use log::*;

/// POST create a new Topic
#[utoipa::path(
    post,
    path = "/topics",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully Created a New Topic", body = domain::topics::Model),
        (status = 409, description = "A Topic with this domain already exists"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Topic from: {params:?}");

    let topic = TopicApi::create(
        app_state.stores.subscriptions.as_ref(),
        params.domain,
        params.description,
    )
    .await?;

    debug!("New Topic: {topic:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), topic)),
    ))
}

/// POST subscribe a batch of subscribers to a Topic. The subscription is
/// applied asynchronously by the topic-subscription queue consumer.
#[utoipa::path(
    post,
    path = "/topics/subscribe",
    request_body = SubscribeParams,
    responses(
        (status = 200, description = "Subscription request accepted"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Queue unavailable")
    )
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    Json(params): Json<SubscribeParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Subscribe to Topic: {params:?}");

    let subscriber_ids = params.subscriber_ids();
    intake::enqueue_subscription(app_state.publisher.as_ref(), params.domain, subscriber_ids)
        .await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}
