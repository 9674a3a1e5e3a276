// tests/transcript_watch.rs
//
// Watch-page transcript source against a mock server.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_planner::error::TranscriptError;
use content_planner::transcript::{available_languages, fetch_transcript, WatchPageTranscripts};

const VIDEO: &str = "abcdefghijk";

fn watch_page(base: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body><script>var ytInitialPlayerResponse = {{"playabilityStatus":{{"status":"OK"}},"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{base}/api/timedtext?lang=ko&kind=asr","name":{{"simpleText":"Korean (auto-generated)"}},"languageCode":"ko","kind":"asr"}},{{"baseUrl":"{base}/api/timedtext?lang=ko","name":{{"simpleText":"Korean"}},"languageCode":"ko"}},{{"baseUrl":"{base}/api/timedtext?lang=en","name":{{"runs":[{{"text":"English"}}]}},"languageCode":"en"}}]}}}}}};</script></body></html>"#
    )
}

const MANUAL_KO: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">안녕하세요</text><text start="61.2" dur="3">It&amp;#39;s 러스트</text></transcript>"#;

async fn mount_page(server: &MockServer, body: String, status: u16) {
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", VIDEO))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn manual_track_is_fetched_and_formatted() {
    let server = MockServer::start().await;
    mount_page(&server, watch_page(&server.uri()), 200).await;
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .and(query_param("lang", "ko"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANUAL_KO))
        .mount(&server)
        .await;

    let src = WatchPageTranscripts::new(server.uri()).unwrap();

    let url = format!("https://www.youtube.com/watch?v={VIDEO}&t=10s");
    let t = fetch_transcript(&src, &url, "ko", false).await.unwrap();
    assert_eq!(t.video_id, VIDEO);
    assert_eq!(t.language, "ko");
    assert!(!t.is_generated);
    assert_eq!(t.text, "안녕하세요 It's 러스트");
    assert_eq!(t.word_count, 3);

    let stamped = fetch_transcript(&src, VIDEO, "ko", true).await.unwrap();
    assert_eq!(stamped.text, "[00:00] 안녕하세요\n[01:01] It's 러스트");
}

#[tokio::test]
async fn languages_are_split_by_kind() {
    let server = MockServer::start().await;
    mount_page(&server, watch_page(&server.uri()), 200).await;

    let src = WatchPageTranscripts::new(server.uri()).unwrap();
    let langs = available_languages(&src, &format!("https://youtu.be/{VIDEO}"))
        .await
        .unwrap();
    let manual: Vec<&str> = langs.manual_captions.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(manual, vec!["Korean", "English"]);
    assert_eq!(langs.auto_generated.len(), 1);
    assert_eq!(langs.auto_generated[0].code, "ko");
}

#[tokio::test]
async fn page_without_captions_is_disabled() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        r#"<html><script>{"playabilityStatus":{"status":"OK"}}</script></html>"#.into(),
        200,
    )
    .await;

    let src = WatchPageTranscripts::new(server.uri()).unwrap();
    let err = fetch_transcript(&src, VIDEO, "ko", false).await.unwrap_err();
    assert!(matches!(err, TranscriptError::Disabled), "{err:?}");
}

#[tokio::test]
async fn login_wall_and_404_are_unavailable() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        r#"<html><script>{"playabilityStatus":{"status":"LOGIN_REQUIRED"}}</script></html>"#.into(),
        200,
    )
    .await;
    let src = WatchPageTranscripts::new(server.uri()).unwrap();
    let err = fetch_transcript(&src, VIDEO, "ko", false).await.unwrap_err();
    assert!(matches!(err, TranscriptError::VideoUnavailable(ref id) if id == VIDEO));

    let gone = MockServer::start().await;
    mount_page(&gone, String::new(), 404).await;
    let src = WatchPageTranscripts::new(gone.uri()).unwrap();
    let err = fetch_transcript(&src, VIDEO, "ko", false).await.unwrap_err();
    assert!(matches!(err, TranscriptError::VideoUnavailable(_)));
}

#[tokio::test]
async fn missing_language_lists_the_priority() {
    let server = MockServer::start().await;
    let page = format!(
        r#"<script>{{"captionTracks":[{{"baseUrl":"{}/t?lang=de","languageCode":"de"}}]}}</script>"#,
        server.uri()
    );
    mount_page(&server, page, 200).await;

    let src = WatchPageTranscripts::new(server.uri()).unwrap();
    let err = fetch_transcript(&src, VIDEO, "en", false).await.unwrap_err();
    match err {
        TranscriptError::NoTranscript(langs) => assert_eq!(langs, vec!["en", "ko", "ja"]),
        other => panic!("unexpected {other:?}"),
    }
}
