// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with the
// fixture video source, in-memory transcripts and mock LLM providers.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use content_planner::api::{self, AppState};
use content_planner::config::{AppConfig, ProviderConfig};
use content_planner::ingest::providers::FixtureSource;
use content_planner::llm::{DynLlm, LlmRegistry, MockProvider, OpenAiProvider};
use content_planner::session::SessionStore;
use content_planner::transcript::{InMemoryTranscripts, Segment};

const BODY_LIMIT: usize = 1024 * 1024;
const FIXTURE: &str = "tests/fixtures/videos.json";

fn transcripts() -> InMemoryTranscripts {
    let seg = |start: f64, text: &str| Segment {
        start,
        duration: 2.0,
        text: text.into(),
    };
    InMemoryTranscripts::new()
        .with_track("dQw4w9WgXcQ", "ko", true, vec![seg(0.0, "자동 생성 자막")])
        .with_track(
            "dQw4w9WgXcQ",
            "ko",
            false,
            vec![seg(0.0, "안녕하세요 여러분"), seg(65.5, "오늘은 러스트 이야기")],
        )
        .with_track("dQw4w9WgXcQ", "en", false, vec![seg(1.0, "hello there")])
        .with_track("nocaptions1", "ko", false, Vec::new())
}

fn router_with(videos: FixtureSource, llm: LlmRegistry) -> Router {
    let state = AppState::new(
        AppConfig::default(),
        Arc::new(videos),
        Arc::new(transcripts()),
        llm,
    )
    .expect("build state");
    api::router(state)
}

/// Build the Router the binary uses, minus real upstreams.
fn test_router() -> Router {
    router_with(
        FixtureSource::from_path(FIXTURE).expect("fixture"),
        LlmRegistry::mock("mock"),
    )
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, v)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn send(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

fn ids(v: &Value) -> Vec<String> {
    v["videos"]
        .as_array()
        .expect("videos array")
        .iter()
        .map(|x| x["video_id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_sources_and_providers() {
    let app = test_router();
    let (status, v) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "healthy");
    assert_eq!(v["youtube_enabled"], true);
    assert!(v["llm_providers"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "mock"));
    assert!(v["version"].is_string());
}

#[tokio::test]
async fn search_excludes_shorts_and_keeps_wire_shape() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/search?keyword=rust&exclude_shorts=true")).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["success"], true);
    assert_eq!(v["keyword"], "rust");
    assert!(v.get("type").is_none());
    assert_eq!(
        v["filters"],
        json!({
            "shorts_only": false,
            "exclude_shorts": true,
            "duration_filter": "any",
            "upload_period": "any",
            "language": "any",
            "trending_mode": false,
            "min_views": 0
        })
    );

    let got = ids(&v);
    assert_eq!(v["count"], got.len());
    assert!(!got.contains(&"rustshort03".to_string()));
    assert!(!got.contains(&"kimchijjig5".to_string()));
    assert_eq!(got.len(), 4);

    let first = &v["videos"][0];
    for key in [
        "video_id",
        "title",
        "channel_title",
        "published_at",
        "thumbnail",
        "description",
        "view_count",
        "like_count",
        "comment_count",
        "duration",
        "duration_seconds",
        "is_shorts",
        "quality_score",
        "views_per_day",
        "days_ago",
        "engagement_rate",
        "url",
    ] {
        assert!(first.get(key).is_some(), "missing '{key}'");
    }
    assert!(v["videos"]
        .as_array()
        .unwrap()
        .iter()
        .all(|x| x["is_shorts"] == false));
}

#[tokio::test]
async fn shorts_only_keeps_only_shorts() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/search?keyword=rust&shorts_only=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&v), vec!["rustshort03"]);
}

#[tokio::test]
async fn min_views_above_everything_is_empty_not_error() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/search?keyword=rust&min_views=50000000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["count"], 0);
    assert_eq!(v["videos"], json!([]));
}

#[tokio::test]
async fn invalid_search_parameters_are_400_with_detail() {
    let app = test_router();
    for uri in [
        "/youtube/search?keyword=rust&shorts_only=true&exclude_shorts=true",
        "/youtube/search?keyword=rust&duration_filter=epic",
        "/youtube/search?keyword=rust&upload_period=decade",
        "/youtube/search?keyword=rust&top_n=0",
        "/youtube/search?keyword=rust&top_n=51",
        "/youtube/search?keyword=rust&top_n=ten",
        "/youtube/search?keyword=rust&views_weight=101",
    ] {
        let (status, v) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(v["detail"].is_string(), "{uri}: {v}");
    }
}

#[tokio::test]
async fn blank_keyword_ranks_the_trending_surface() {
    let app = test_router();
    for uri in [
        "/youtube/search",
        "/youtube/search?keyword=%20%20&trending_mode=true",
    ] {
        let (status, v) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {v}");
        assert_eq!(v["type"], "trending");
        assert_eq!(v["keyword"], "");
        // the non-rust video only shows up when the trending chart is used
        assert!(ids(&v).contains(&"kimchijjig5".to_string()), "{uri}");
    }

    // the trending surface keeps its own top_n cap on this route too
    let (status, _) = call(&app, get("/youtube/search?top_n=31")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, get("/youtube/search?keyword=rust&top_n=31")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn language_filter_drops_undeclared() {
    let app = test_router();
    let (_, v) = call(&app, get("/youtube/search?keyword=rust&language=en")).await;
    let got = ids(&v);
    assert!(!got.contains(&"rustnolang6".to_string()));
    assert!(!got.contains(&"rustkorea04".to_string()));
    assert!(got.contains(&"rustasync02".to_string()));
}

#[tokio::test]
async fn post_search_accepts_weights_and_top_n() {
    let app = test_router();
    let (status, v) = call(
        &app,
        send(
            "POST",
            "/youtube/search",
            json!({
                "keyword": "rust",
                "top_n": 2,
                "exclude_shorts": true,
                "views_weight": 100,
                "engagement_weight": 0,
                "recency_weight": 0
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["count"], 2);
    // views only: the most viewed long-form rust video leads
    assert_eq!(ids(&v)[0], "rustintro01");

    let (status, _) = call(&app, send("POST", "/youtube/search", json!({"keyword": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trending_uses_config_defaults() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/trending")).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["type"], "trending");
    assert_eq!(v["keyword"], "");
    let got = ids(&v);
    // default trending config excludes shorts and ranks by views per day
    assert_eq!(v["filters"]["exclude_shorts"], true);
    assert_eq!(v["filters"]["trending_mode"], true);
    assert!(!got.contains(&"rustshort03".to_string()));
    assert_eq!(got[0], "kimchijjig5");

    let (status, _) = call(&app, get("/youtube/trending?top_n=31")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_failure_is_502() {
    let app = router_with(
        FixtureSource::unavailable("backend down"),
        LlmRegistry::mock("mock"),
    );
    let (status, v) = call(&app, get("/youtube/search?keyword=rust")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(v["detail"].as_str().unwrap().contains("backend down"));
}

#[tokio::test]
async fn transcript_prefers_manual_track_and_formats_timestamps() {
    let app = test_router();
    let (status, v) = call(
        &app,
        get("/youtube/transcript/dQw4w9WgXcQ?lang=ko&timestamps=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["success"], true);
    assert_eq!(v["video_id"], "dQw4w9WgXcQ");
    assert_eq!(v["language"], "ko");
    assert_eq!(v["is_generated"], false);
    assert_eq!(v["text"], "[00:00] 안녕하세요 여러분\n[01:05] 오늘은 러스트 이야기");

    let (_, plain) = call(&app, get("/youtube/transcript/dQw4w9WgXcQ?lang=en")).await;
    assert_eq!(plain["text"], "hello there");
    assert_eq!(plain["word_count"], 2);
}

#[tokio::test]
async fn transcript_languages_split_manual_and_generated() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/transcript/dQw4w9WgXcQ/languages")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["manual_captions"].as_array().unwrap().len(), 2);
    assert_eq!(v["auto_generated"], json!([{"code": "ko", "name": "ko"}]));
}

#[tokio::test]
async fn missing_transcripts_are_404() {
    let app = test_router();
    let (status, v) = call(&app, get("/youtube/transcript/unknownvid1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(v["detail"].is_string());

    // only a Korean track exists; Japanese priority is ja, ko, en so ko is used
    let (status, _) = call(&app, get("/youtube/transcript/nocaptions1?lang=ja")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rewrite_and_analyze_script() {
    let app = test_router();
    let (status, v) = call(
        &app,
        send(
            "POST",
            "/youtube/rewrite",
            json!({"original_script": "오늘은 러스트를 배워 봅시다", "style": "educational", "provider": "mock"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["success"], true);
    assert_eq!(v["style"], "educational");
    assert_eq!(v["target_length"], "similar");
    assert_eq!(v["original_length"], 15);
    assert_eq!(v["model_used"], "mock-mock");

    let (status, _) = call(
        &app,
        send("POST", "/youtube/rewrite", json!({"original_script": "x", "style": "poetic"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        send("POST", "/youtube/rewrite", json!({"original_script": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = call(
        &app,
        send("POST", "/youtube/analyze-script", json!({"original_script": "script"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["analysis"].as_str().unwrap().starts_with("[mock #"));
}

#[tokio::test]
async fn unknown_and_unconfigured_providers() {
    let app = test_router();
    let (status, v) = call(
        &app,
        send("POST", "/youtube/analyze-script", json!({"original_script": "s", "provider": "llama"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["detail"].as_str().unwrap().contains("llama"));

    let openai = OpenAiProvider::new(&ProviderConfig::default(), 5).expect("client");
    let llm = LlmRegistry::new("openai", vec![Arc::new(openai) as DynLlm]);
    let app = router_with(FixtureSource::new(Vec::new()), llm);
    let (status, v) = call(
        &app,
        send("POST", "/youtube/analyze-script", json!({"original_script": "s"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["detail"], "OPENAI_API_KEY is not configured");
}

#[tokio::test]
async fn channel_catalog_and_prompts() {
    let app = test_router();
    let (status, v) = call(&app, get("/channels")).await;
    assert_eq!(status, StatusCode::OK);
    let list = v.as_array().unwrap();
    assert_eq!(list.len(), 5);
    assert!(list.iter().all(|c| c.get("prompt").is_none()));
    assert_eq!(list[4]["name"], "X (Twitter)");

    let (status, v) = call(&app, get("/prompts/instagram")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["channel"], "instagram");
    assert!(v["prompt"].as_str().unwrap().contains("{content}"));

    let (status, v) = call(&app, get("/prompts/tiktok")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(v["detail"].as_str().unwrap().contains("tiktok"));
}

#[tokio::test]
async fn transform_runs_each_channel_then_calendar() {
    let app = test_router();
    let (status, v) = call(
        &app,
        send(
            "POST",
            "/transform",
            json!({
                "content": "Rust 2024 edition is out.",
                "channels": ["blog", "twitter"],
                "style_config": {"tone": "professional", "emoji_level": 0}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    let results = v["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["channel"], "blog");
    assert_eq!(results[1]["channel_name"], "X (Twitter)");
    assert!(results[0]["content"]
        .as_str()
        .unwrap()
        .starts_with("[mock #1] You are an SEO-savvy blog writer."));
    assert!(v["calendar"].as_str().unwrap().starts_with("[mock #3]"));
}

#[tokio::test]
async fn transform_defaults_and_rejections() {
    let app = test_router();
    let (status, v) = call(&app, send("POST", "/transform", json!({"content": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    let channels: Vec<&str> = v["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["channel"].as_str().unwrap())
        .collect();
    assert_eq!(channels, vec!["blog", "instagram", "threads"]);

    for bad in [
        json!({"content": "hello", "channels": ["tiktok"]}),
        json!({"content": "   ", "channels": ["blog"]}),
        json!({"content": "hello", "channels": []}),
        json!({"content": "hello", "style_config": {"tone": "sarcastic"}}),
        json!({"content": "hello", "style_config": {"emoji_level": 4}}),
        json!({"channels": ["blog"]}),
    ] {
        let (status, v) = call(&app, send("POST", "/transform", bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert!(v["detail"].is_string());
    }
}

#[tokio::test]
async fn failing_provider_aborts_transform() {
    let llm = LlmRegistry::new("mock", vec![Arc::new(MockProvider::failing("mock")) as DynLlm]);
    let app = router_with(FixtureSource::new(Vec::new()), llm);
    let (status, _) = call(&app, send("POST", "/transform", json!({"content": "hello"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn content_session_lifecycle() {
    let app = test_router();

    let (status, v) = call(&app, get("/sessions/alice/current")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["current_content"], Value::Null);

    let (status, v) = call(
        &app,
        send("PUT", "/sessions/alice/current", json!({"content": "draft", "channel": "blog"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["current_channel"], "blog");

    let (_, v) = call(&app, get("/sessions/alice/current")).await;
    assert_eq!(v["current_content"], "draft");

    let (status, first) = call(
        &app,
        send("POST", "/sessions/alice/saved", json!({"channel": "threads", "content": "one"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["channel_name"], "Threads");
    let first_id = first["id"].as_str().unwrap().to_string();

    call(
        &app,
        send("POST", "/sessions/alice/saved", json!({"id": "fixed", "channel": "blog", "content": "two"})),
    )
    .await;

    let (_, v) = call(&app, get("/sessions/alice/saved")).await;
    assert_eq!(v["count"], 2);
    assert_eq!(v["saved_contents"][0]["id"], "fixed");
    assert_eq!(v["saved_contents"][1]["id"], first_id.as_str());

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/sessions/alice/saved/{first_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/sessions/alice/saved/{first_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // other sessions are isolated
    let (_, v) = call(&app, get("/sessions/bob/saved")).await;
    assert_eq!(v["count"], 0);

    let req = Request::builder()
        .method("DELETE")
        .uri("/sessions/alice/current")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, v) = call(&app, get("/sessions/alice/current")).await;
    assert_eq!(v["current_content"], Value::Null);

    let (status, _) = call(&app, get("/sessions/not.valid/current")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("build DELETE")
}

#[tokio::test]
async fn deletes_on_unknown_sessions_are_404_and_keep_the_store() {
    let mut state = AppState::new(
        AppConfig::default(),
        Arc::new(FixtureSource::from_path(FIXTURE).expect("fixture")),
        Arc::new(transcripts()),
        LlmRegistry::mock("mock"),
    )
    .expect("build state");
    // a single slot, so any new session would evict alice
    let sessions = Arc::new(SessionStore::with_capacity(1));
    state.sessions = sessions.clone();
    let app = api::router(state);

    let (status, _) = call(
        &app,
        send("PUT", "/sessions/alice/current", json!({"content": "draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &app,
        send("POST", "/sessions/alice/saved", json!({"id": "keep", "channel": "blog", "content": "post"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for uri in [
        "/sessions/ghost/current",
        "/sessions/ghost/saved",
        "/sessions/ghost/saved/keep",
    ] {
        let (status, v) = call(&app, delete(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(v["detail"], "session 'ghost' not found", "{uri}");
    }
    assert_eq!(sessions.len(), 1);

    let (_, v) = call(&app, get("/sessions/alice/current")).await;
    assert_eq!(v["current_content"], "draft");
    let (_, v) = call(&app, get("/sessions/alice/saved")).await;
    assert_eq!(v["count"], 1);
    assert_eq!(v["saved_contents"][0]["id"], "keep");

    let (status, _) = call(&app, delete("/sessions/alice/saved")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, v) = call(&app, get("/sessions/alice/saved")).await;
    assert_eq!(v["count"], 0);
}
