use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod profiles;

/// Compose the health, session, profile and documentation routes over shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(game::router())
        .merge(profiles::router())
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::profile_store::MemoryProfileStore,
        state::{
            AppState,
            players::tests::sample_database,
            prompt::tests::{ScriptedPrompts, arsenal_forward},
        },
    };

    fn app() -> Router<()> {
        router(AppState::with_prompts(
            AppConfig::default(),
            sample_database(),
            Arc::new(MemoryProfileStore::new()),
            Box::new(|| Box::new(ScriptedPrompts::new([arsenal_forward()]))),
        ))
    }

    async fn call(app: &Router<()>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn a_game_can_be_played_over_http() {
        let app = app();

        let (status, created) = call(&app, "POST", "/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_owned();

        for (user, name) in [("u1", "Ada"), ("u2", "Bob")] {
            let (status, _) = call(
                &app,
                "POST",
                &format!("/sessions/{id}/join"),
                Some(json!({ "user_id": user, "display_name": name })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = call(
            &app,
            "POST",
            &format!("/sessions/{id}/guess"),
            Some(json!({ "slot": 0, "name": "Eddie Nketiah" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["kind"], "accepted");
        assert_eq!(body["session"]["slots"][0]["score"], 463);

        let (status, body) = call(&app, "GET", &format!("/sessions/{id}/search?q=nke"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["names"], json!([]));

        let (status, body) = call(
            &app,
            "POST",
            &format!("/sessions/{id}/guess"),
            Some(json!({ "slot": 0, "name": "Thierry Henry" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("turn"));
    }

    #[tokio::test]
    async fn invalid_payloads_are_bad_requests() {
        let app = app();
        let (_, created) = call(&app, "POST", "/sessions", None).await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/sessions/{id}/join"),
            Some(json!({ "user_id": "../../etc", "display_name": "Ada" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("bad request"));

        let (status, _) = call(&app, "GET", "/profiles/bad.id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_resources_are_not_found() {
        let app = app();
        let (status, _) = call(&app, "GET", "/sessions/NOPE00", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "GET", "/profiles/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn healthcheck_reports_counts() {
        let app = app();
        call(&app, "POST", "/sessions", None).await;

        let (status, body) = call(&app, "GET", "/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "players": 10, "sessions": 1 }));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = app();
        let (status, body) = call(&app, "GET", docs::OPENAPI_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/sessions/{id}/guess"].is_object());
    }
}
