//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use relayhub_app::ports::RelayEffector;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the JSON API under `/api` next to a `/health` check. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG` level.
pub fn build<E>(state: AppState<E>) -> Router
where
    E: RelayEffector + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use relayhub_app::services::relay_service::{RelayService, TimingSettings};
    use relayhub_domain::device::Device;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct NullRelay;

    impl RelayEffector for NullRelay {
        fn set_relay(&self, _device: &Device, _closed: bool) {}
    }

    fn test_app() -> Router {
        app_with(vec![
            Device::builder()
                .id("air")
                .pin(18)
                .label("Aire")
                .build()
                .unwrap(),
            Device::builder()
                .id("power")
                .pin(23)
                .label("Electricidad")
                .build()
                .unwrap(),
        ])
    }

    fn app_with(devices: Vec<Device>) -> Router {
        let service = RelayService::new(devices, NullRelay, TimingSettings::default()).unwrap();
        build(AppState::new(service))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_configured_devices() {
        let app = test_app();
        let (status, body) = get_json(&app, "/api/devices").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "air");
        assert_eq!(body[1]["label"], "Electricidad");
        let mut keys: Vec<_> = body[0].as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["icon", "id", "label"]);
    }

    #[tokio::test]
    async fn should_report_every_device_idle_at_startup() {
        let app = test_app();
        let (status, body) = get_json(&app, "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        let idle = json!({"mode": "idle", "phase": "", "seconds_left": 0, "total": 0, "percent": 0});
        assert_eq!(body["air"], idle);
        assert_eq!(body["power"], idle);
    }

    #[tokio::test]
    async fn should_keep_configuration_order_in_status_map() {
        let app = app_with(vec![
            Device::builder().id("zone").pin(5).build().unwrap(),
            Device::builder().id("air").pin(18).build().unwrap(),
        ]);

        let response = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        let zone = text.find("\"zone\"").unwrap();
        let air = text.find("\"air\"").unwrap();
        assert!(zone < air, "expected configuration order in {text}");
    }

    #[tokio::test]
    async fn should_reject_status_of_unknown_device() {
        let app = test_app();
        let (status, body) = get_json(&app, "/api/status/fan").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("fan"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_start_single_and_expose_it_in_status() {
        let app = test_app();
        let (status, body) = post_json(&app, "/api/single", r#"{"device":"air","seconds":60}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (_, snap) = get_json(&app, "/api/status/air").await;
        assert_eq!(snap["mode"], "single");
        assert_eq!(snap["phase"], "on");
        assert_eq!(snap["total"], 60);
        assert_eq!(snap["seconds_left"], 60);
        assert_eq!(snap["percent"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_reject_start_on_busy_device() {
        let app = test_app();
        post_json(&app, "/api/single", r#"{"device":"air","seconds":60}"#).await;

        let (status, body) = post_json(
            &app,
            "/api/loop",
            r#"{"device":"air","on_seconds":1,"off_seconds":1,"total_seconds":10}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn should_start_loop_on_other_device_while_first_runs() {
        let app = test_app();
        post_json(&app, "/api/single", r#"{"device":"air","seconds":60}"#).await;

        let (status, _) = post_json(
            &app,
            "/api/loop",
            r#"{"device":"power","on_seconds":2,"off_seconds":3,"total_seconds":30}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get_json(&app, "/api/status").await;
        assert_eq!(body["air"]["mode"], "single");
        assert_eq!(body["power"]["mode"], "loop");
    }

    #[tokio::test]
    async fn should_reject_zero_duration() {
        let app = test_app();
        let (status, body) = post_json(&app, "/api/single", r#"{"device":"air","seconds":0}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn should_reject_missing_or_ill_typed_fields() {
        let app = test_app();
        for body in [
            r#"{"device":"air"}"#,
            r#"{"device":"air","seconds":"ten"}"#,
            r#"{"device":"air","seconds":-5}"#,
            "not json",
        ] {
            let (status, json) = post_json(&app, "/api/single", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["ok"], false);
        }
    }

    #[tokio::test]
    async fn should_reject_start_on_unknown_device() {
        let app = test_app();
        let (status, _) = post_json(&app, "/api/single", r#"{"device":"fan","seconds":5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_cancel_when_idle() {
        let app = test_app();
        let (status, body) = post_json(&app, "/api/devices/air/cancel", "").await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn should_reject_cancel_of_unknown_device() {
        let app = test_app();
        let (status, _) = post_json(&app, "/api/devices/fan/cancel", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn should_accept_cancel_and_settle_idle() {
        let app = test_app();
        post_json(&app, "/api/single", r#"{"device":"air","seconds":60}"#).await;

        let (status, body) = post_json(&app, "/api/devices/air/cancel", "").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, json!({"ok": true}));

        tokio::time::sleep(Duration::from_millis(500)).await;
        let (_, snap) = get_json(&app, "/api/status/air").await;
        assert_eq!(snap["mode"], "idle");
    }
}
