use crate::{
    controller::{health_check_controller, notification_controller, topic_controller},
    params, response, sse, AppState,
};
use axum::{
    routing::{get, patch, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Notification Hub API"
        ),
        paths(
            health_check_controller::health_check,
            topic_controller::create,
            topic_controller::subscribe,
            notification_controller::create,
            notification_controller::notify,
            notification_controller::search,
            notification_controller::mark_as_read,
            notification_controller::delete,
            sse::handler::sse_handler,
        ),
        components(
            schemas(
                domain::topics::Model,
                domain::notifications::Model,
                domain::subscriber_notifications::Model,
                params::topic::CreateParams,
                params::topic::SubscribeParams,
                params::topic::SubscriberParam,
                params::notification::CreateParams,
                params::notification::NotifyParams,
                params::notification::SearchParams,
                params::notification::SearchOptions,
                params::notification::MarkAsReadParams,
                params::notification::DeleteParams,
                response::notification::NotificationPageResponse,
            )
        ),
        tags(
            (name = "notification_hub", description = "Topic based notification fan-out over server-sent events")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(topic_routes(app_state.clone()))
        .merge(notification_routes(app_state.clone()))
        .merge(sse_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn topic_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/topics", post(topic_controller::create))
        .route("/topics/subscribe", post(topic_controller::subscribe))
        .with_state(app_state)
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/notifications",
            post(notification_controller::create).delete(notification_controller::delete),
        )
        .route("/notifications/notify", post(notification_controller::notify))
        .route("/notifications/search", post(notification_controller::search))
        .route(
            "/notifications/read",
            patch(notification_controller::mark_as_read),
        )
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse/{subscriber_id}", get(sse::handler::sse_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, BodyDataStream};
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use domain::store::memory::MemoryStore;
    use domain::{Dispatcher, Id, QueueIntake, Reconciler, Stores, SubscriptionStore};
    use events::InMemoryBroker;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use service::config::Config;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
    }

    fn test_app() -> TestApp {
        let config = Config::parse_from(["notification_hub", "--storage-backend", "memory"]);
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::new(store.clone());
        let registry = ::sse::ConnectionRegistry::new();
        let manager = Arc::new(::sse::Manager::new(
            registry.clone(),
            stores.subscriber_directory(),
        ));

        let broker = InMemoryBroker::new();
        let reconciler = Arc::new(Reconciler::new(
            stores.subscriptions.clone(),
            config.resubscribe_policy,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            stores.subscriptions.clone(),
            stores.notifications.clone(),
        ));
        Arc::new(QueueIntake::new(reconciler, dispatcher)).spawn_consumers(&broker);

        let app_state = AppState::new(config, stores, manager, Arc::new(broker));
        TestApp {
            router: define_routes(app_state),
            store,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn next_frame(body: &mut BodyDataStream) -> String {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("frame within timeout")
            .expect("stream still open")
            .unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    async fn wait_for_subscription(store: &MemoryStore, subscriber_id: Id) {
        for _ in 0..100 {
            if !store
                .find_subscriptions_by_subscriber(subscriber_id)
                .await
                .unwrap()
                .is_empty()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subscription for {subscriber_id} never applied");
    }

    #[test]
    fn openapi_document_describes_ids_as_uuid_strings() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(doc["paths"].get("/sse/{subscriber_id}").is_some());
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        let (_, topic) = schemas
            .iter()
            .find(|(name, _)| name.ends_with("topics.Model") && !name.contains("subscriber"))
            .unwrap();
        assert_eq!(topic["properties"]["id"]["type"], "string");
        assert_eq!(topic["properties"]["id"]["format"], "uuid");
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = test_app();

        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn topic_domains_are_unique() {
        let app = test_app();

        let (status, body) = send(&app.router, "POST", "/topics", Some(json!({"domain": "orders"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status_code"], 201);
        assert_eq!(body["data"]["domain"], "orders");

        let (status, _) = send(&app.router, "POST", "/topics", Some(json!({"domain": "orders"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn notification_for_unknown_topic_is_not_found() {
        let app = test_app();

        let (status, _) = send(
            &app.router,
            "POST",
            "/notifications",
            Some(json!({"topicId": Id::new_v4(), "subject": "Order shipped"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stream_for_unknown_subscriber_is_not_found() {
        let app = test_app();

        let (status, _) = send(&app.router, "GET", &format!("/sse/{}", Id::new_v4()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notification_reaches_a_connected_subscriber() {
        let app = test_app();
        let alice = app
            .store
            .insert_subscriber("Alice", "alice@example.com")
            .await
            .unwrap();

        let (_, topic) = send(&app.router, "POST", "/topics", Some(json!({"domain": "orders"}))).await;
        let topic_id = topic["data"]["id"].as_str().unwrap().to_owned();

        let (status, _) = send(
            &app.router,
            "POST",
            "/topics/subscribe",
            Some(json!({"domain": "orders", "subscribers": [{"subId": alice.id}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        wait_for_subscription(&app.store, alice.id).await;

        let (status, notification) = send(
            &app.router,
            "POST",
            "/notifications",
            Some(json!({"topicId": topic_id, "subject": "Order shipped"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let notification_id = notification["data"]["id"].as_str().unwrap().to_owned();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/sse/{}", alice.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut stream = response.into_body().into_data_stream();
        assert_eq!(
            next_frame(&mut stream).await,
            format!(
                "data: Connection with SSE for subscriber {} has been established!\n\n",
                alice.id
            )
        );

        let (status, _) = send(
            &app.router,
            "POST",
            "/notifications/notify",
            Some(json!({"topicId": topic_id, "notificationId": notification_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(next_frame(&mut stream).await, "data: Order shipped\n\n");

        let mut sent_total = Value::Null;
        for _ in 0..100 {
            let (_, page) = send(
                &app.router,
                "POST",
                "/notifications/search",
                Some(json!({"subId": alice.id, "options": {"isSent": true}})),
            )
            .await;
            sent_total = page["data"]["total"].clone();
            if sent_total == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sent_total, 1);
    }

    #[tokio::test]
    async fn read_and_delete_update_the_listing() {
        let app = test_app();
        let alice = app
            .store
            .insert_subscriber("Alice", "alice@example.com")
            .await
            .unwrap();
        let orders = app
            .store
            .create_topic("orders".to_owned(), None)
            .await
            .unwrap();
        app.store
            .create_subscription(alice.id, orders.id)
            .await
            .unwrap();

        let (_, created) = send(
            &app.router,
            "POST",
            "/notifications",
            Some(json!({"topicId": orders.id, "subject": "Order shipped"})),
        )
        .await;
        let notification_id = created["data"]["id"].clone();

        let (status, body) = send(
            &app.router,
            "PATCH",
            "/notifications/read",
            Some(json!({"notificationIds": [notification_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], 1);

        let (status, _) = send(
            &app.router,
            "DELETE",
            "/notifications",
            Some(json!({"ids": [notification_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, unread) = send(
            &app.router,
            "POST",
            "/notifications/search",
            Some(json!({"subId": alice.id, "options": {"isRead": false}})),
        )
        .await;
        let (_, deleted) = send(
            &app.router,
            "POST",
            "/notifications/search",
            Some(json!({"subId": alice.id, "page": 1, "limit": 5, "options": {"isDeleted": true}})),
        )
        .await;

        assert_eq!(unread["data"]["total"], 0);
        assert_eq!(deleted["data"]["total"], 1);
        assert_eq!(deleted["data"]["limit"], 5);
        assert_eq!(deleted["data"]["notifications"][0]["subject"], "Order shipped");
    }
}
