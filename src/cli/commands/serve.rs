//! Browser surface: a single HTML form backed by a JSON API.

use super::templates::template_rows;
use crate::cli::Output;
use crate::compose::Composer;
use crate::config::{Prompts, Settings};
use crate::error::DistillError;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    composer: Composer,
}

/// Run the HTTP server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let composer = Composer::new(prompts, settings.prompts.length_hint);
    let orchestrator = Orchestrator::new(settings)?;

    let app = router(Arc::new(AppState {
        orchestrator,
        composer,
    }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Distill");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Form", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Templates", "GET  /api/templates");
    Output::kv("Run", "POST /api/run");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/templates", get(templates))
        .route("/api/run", post(run))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct TemplateInfo {
    key: String,
    label: &'static str,
    phrase: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP status for a failed run.
fn status_for(error: &DistillError) -> StatusCode {
    match error {
        DistillError::InvalidInput(_) | DistillError::MissingCredential(..) => StatusCode::BAD_REQUEST,
        DistillError::FetchDenied(_) => StatusCode::FORBIDDEN,
        DistillError::TranscriptUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DistillError::PageFetch(_)
        | DistillError::Generation(_)
        | DistillError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn templates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rows: Vec<TemplateInfo> = template_rows(&state.composer)
        .into_iter()
        .map(|(key, phrase)| TemplateInfo {
            key: key.to_string(),
            label: key.label(),
            phrase,
        })
        .collect();
    Json(rows)
}

/// Runs a session with the credential typed into the form. The server's own
/// environment keys are never used here.
async fn run(State(state): State<Arc<AppState>>, Json(session): Json<Session>) -> impl IntoResponse {
    match state.orchestrator.run(&session, |_| {}).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            warn!("Run failed: {}", e);
            (
                status_for(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::generation::{Backend, GenerationRequest, Generator};
    use crate::source::{ContentSource, FetchedContent, SourceKind};
    use async_trait::async_trait;
    use std::net::SocketAddr;

    struct CannedPage;

    #[async_trait]
    impl ContentSource for CannedPage {
        fn kind(&self) -> SourceKind {
            SourceKind::Page
        }

        fn can_handle(&self, locator: &str) -> bool {
            locator.starts_with("http")
        }

        async fn fetch(&self, locator: &str) -> Result<FetchedContent> {
            if locator.contains("private") {
                return Err(DistillError::FetchDenied(locator.to_string()));
            }
            Ok(FetchedContent {
                text: "Quarterly numbers went up.".to_string(),
                title: Some("Report".to_string()),
                preview_image_url: None,
            })
        }
    }

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        fn backend(&self) -> Backend {
            Backend::OpenAi
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(format!("{} chars in", request.instruction.len()))
        }
    }

    async fn serve() -> SocketAddr {
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Composer::default(),
            vec![Arc::new(CannedPage) as Arc<dyn ContentSource>],
            vec![Arc::new(Echo) as Arc<dyn Generator>],
        );
        let app = router(Arc::new(AppState {
            orchestrator,
            composer: Composer::default(),
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[tokio::test]
    async fn test_index_and_templates() {
        let addr = serve().await;
        let client = reqwest::Client::new();

        let page = client.get(format!("http://{}/", addr)).send().await.unwrap();
        let html = page.text().await.unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains(r#"<button id="copy""#));
        assert!(html.contains("navigator.clipboard.writeText"));

        let templates: Vec<serde_json::Value> = client
            .get(format!("http://{}/api/templates", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(templates.len(), 21);
        assert_eq!(templates[0]["label"], "Summary");
        assert_eq!(templates[0]["phrase"], "Summarize the following content:");
    }

    #[tokio::test]
    async fn test_run_endpoint() {
        let addr = serve().await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/api/run", addr);

        let response = client
            .post(&url)
            .json(&serde_json::json!({
                "locator": "https://example.com/report",
                "backend": "openai",
                "api_key": "sk-test"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["content"]["title"], "Report");
        assert_eq!(body["rendered"]["kind"], "text");
        assert!(body.to_string().find("sk-test").is_none());

        let response = client
            .post(&url)
            .json(&serde_json::json!({
                "locator": "https://example.com/private",
                "backend": "openai",
                "api_key": "sk-test"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_run_without_form_key_ignores_server_env() {
        std::env::set_var("OPENAI_API_KEY", "sk-from-server-env");
        let addr = serve().await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/run", addr))
            .json(&serde_json::json!({
                "locator": "https://example.com/report",
                "backend": "openai"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
        assert!(!body.to_string().contains("sk-from-server-env"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&DistillError::MissingCredential("OpenAI".into(), "OPENAI_API_KEY".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DistillError::MalformedResponse("empty".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DistillError::ToolNotFound("yt-dlp".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
