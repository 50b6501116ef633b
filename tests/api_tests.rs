mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{SCENARIO, StubGateway, app_state};
use immo_chatbot::message::ChatResponse;
use immo_chatbot::routes::create_router;
use immo_chatbot::services::wizard::{Control, Step};
use serde_json::Value;
use tower::util::ServiceExt;

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

async fn chat(app: &Router, session_id: &str, answer: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/chat",
            format!(r#"{{"answer": "{answer}", "session_id": "{session_id}"}}"#),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn start(app: &Router) -> ChatResponse {
    let response = app
        .clone()
        .oneshot(post_json("/chat/start", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(body_json(response).await).unwrap()
}

/// Poll until the conversation leaves `loading`.
async fn wait_for_result(app: &Router, session_id: &str) -> ChatResponse {
    for _ in 0..100 {
        let response = app
            .clone()
            .oneshot(get(&format!("/chat/{session_id}")))
            .await
            .unwrap();
        let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();
        if chat.conversation.step == Step::Result {
            return chat;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("conversation never reached the result step");
}

#[tokio::test]
async fn test_start_endpoint() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let chat = start(&app).await;

    assert!(!chat.session_id.is_empty());
    assert_eq!(chat.conversation.step, Step::TransactionType);
    assert_eq!(chat.conversation.messages.len(), 1);
    assert!(chat.conversation.banner.is_none());
    assert!(matches!(
        chat.conversation.messages[0].control,
        Some(Control::Buttons { .. })
    ));
}

#[tokio::test]
async fn test_full_estimation_integration() {
    let gateway = Arc::new(StubGateway::healthy());
    let app = create_router(app_state(gateway.clone()));
    let session_id = start(&app).await.session_id;

    for value in SCENARIO {
        let (status, body) = chat(&app, &session_id, value).await;
        assert_eq!(status, StatusCode::OK, "answer {value}: {body}");
    }

    let chat = wait_for_result(&app, &session_id).await;
    let conversation = chat.conversation;
    assert!(conversation.result.is_some());
    let last = conversation.messages.last().unwrap();
    assert_eq!(last.message.content, "✨ Voici votre estimation :");
    assert!(matches!(last.control, Some(Control::ResultCard { .. })));

    let recorded = gateway.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].city, "Casablanca");
    assert_eq!(recorded[0].surface_m2, 120);
}

#[tokio::test]
async fn test_failed_prediction_integration() {
    let app = create_router(app_state(Arc::new(StubGateway::failing_predictions())));
    let session_id = start(&app).await.session_id;
    for value in SCENARIO {
        chat(&app, &session_id, value).await;
    }

    let conversation = wait_for_result(&app, &session_id).await.conversation;
    assert!(conversation.result.is_none());
    let last = conversation.messages.last().unwrap();
    assert!(last.message.content.starts_with("❌"));
    assert!(matches!(last.control, Some(Control::Restart { .. })));
}

#[tokio::test]
async fn test_surface_validation_stays_on_step() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let session_id = start(&app).await.session_id;
    for value in &SCENARIO[..4] {
        chat(&app, &session_id, value).await;
    }

    let (status, body) = chat(&app, &session_id, "15000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation"]["step"], "surface");
    assert!(
        body["conversation"]["validation_error"]
            .as_str()
            .unwrap()
            .contains("10 000")
    );

    let (_, body) = chat(&app, &session_id, "120").await;
    assert_eq!(body["conversation"]["step"], "rooms");
    assert!(body["conversation"]["validation_error"].is_null());
}

#[tokio::test]
async fn test_unknown_city_is_unprocessable() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let session_id = start(&app).await.session_id;
    chat(&app, &session_id, "vente").await;
    chat(&app, &session_id, "Villa").await;

    let (status, body) = chat(&app, &session_id, "Paris").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Paris"));
}

#[tokio::test]
async fn test_empty_answer_is_bad_request() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let session_id = start(&app).await.session_id;
    let (status, _) = chat(&app, &session_id, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_without_session_starts_one() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let response = app
        .oneshot(post_json(
            "/chat",
            r#"{"message": "location", "session_id": null}"#.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert!(!chat.session_id.is_empty());
    assert_eq!(chat.conversation.step, Step::PropertyType);
}

#[tokio::test]
async fn test_options_failure_shows_banner() {
    let gateway = StubGateway {
        options: None,
        ..StubGateway::healthy()
    };
    let app = create_router(app_state(Arc::new(gateway)));
    let chat = start(&app).await;

    assert_eq!(chat.conversation.step, Step::TransactionType);
    assert_eq!(
        chat.conversation.banner.as_deref(),
        Some("Impossible de charger les données. Veuillez réessayer.")
    );
}

#[tokio::test]
async fn test_restart_command_integration() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let session_id = start(&app).await.session_id;
    for value in SCENARIO {
        chat(&app, &session_id, value).await;
    }
    wait_for_result(&app, &session_id).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/chat/restart",
            format!(r#"{{"session_id": "{session_id}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chat: ChatResponse = serde_json::from_value(body_json(response).await).unwrap();

    assert_eq!(chat.conversation.step, Step::TransactionType);
    assert_eq!(chat.conversation.messages.len(), 1);
    assert!(chat.conversation.result.is_none());
    assert!(chat.conversation.answers.city.is_none());
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let session_id = start(&app).await.session_id;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/chat/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/chat/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let response = app.oneshot(get("/stats?type=vente")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["cities"][0], "Casablanca");
    assert_eq!(body["summary"][0]["value"], "1200");
    assert_eq!(body["city"]["city"], "Casablanca");
    assert_eq!(body["city"]["cards"][0]["value"], "2.10M DH");
    assert_eq!(body["city"]["chart"][0]["quartier"], "Anfa");
    assert_eq!(body["city"]["cards"][2]["value"], "15 000 DH/m²");
    assert!(body["city"]["empty"].is_null());
    assert!(
        body["city"]["narrative"]
            .as_str()
            .unwrap()
            .contains("Anfa")
    );
}

#[tokio::test]
async fn test_stats_without_rental_figures() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let response = app
        .oneshot(get("/stats?type=location&city=Casablanca"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let city = &body["city"];
    assert_eq!(city["kind"], "location");
    assert_eq!(city["cards"].as_array().unwrap().len(), 0);
    assert!(city["narrative"].is_null());
    assert!(city["error"].is_null());
    assert_eq!(city["empty"], "Aucune donnée disponible pour la location");
}

#[tokio::test]
async fn test_stats_summary_failure_is_bad_gateway() {
    let gateway = StubGateway {
        summary: None,
        ..StubGateway::healthy()
    };
    let app = create_router(app_state(Arc::new(gateway)));
    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_status_reports_each_call() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));
    let response = app.oneshot(get("/status")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["backend"]["models_loaded"], true);
    assert!(body["model"].is_null());
    assert!(body["model_error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_admin_metrics_requires_key() {
    let app = create_router(app_state(Arc::new(StubGateway::healthy())));

    let response = app.clone().oneshot(get("/admin/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/metrics")
                .header("x-admin-key", "test-admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["predictions_succeeded"], 0);
}
