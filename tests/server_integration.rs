//! HTTP surface tests over the in-memory backend fake.

mod common;

use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;

use common::{FakeBackend, TEST_TOKEN};
use huddle::chat::RoomDirectory;
use huddle::config::AppConfig;
use huddle::server::build_router;
use huddle::session::SessionStore;
use huddle::AppState;

async fn test_state(backend: Arc<FakeBackend>) -> AppState {
    let directory = Arc::new(RoomDirectory::open(backend.clone()).await);
    let config = Arc::new(AppConfig::load_from_args(["huddle"]).expect("default config"));
    AppState {
        backend,
        directory,
        sessions: SessionStore::new(),
        config,
    }
}

fn server_with_saved_cookies(state: AppState) -> TestServer {
    let mut server = TestServer::new(build_router(state)).expect("test server");
    server.save_cookies();
    server
}

#[tokio::test]
async fn anonymous_requests_get_the_signed_out_page() {
    let backend = Arc::new(FakeBackend::new());
    let server = server_with_saved_cookies(test_state(backend).await);

    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("Signed out"));
}

#[tokio::test]
async fn bad_tokens_get_the_signed_out_page() {
    let backend = Arc::new(FakeBackend::new());
    let server = server_with_saved_cookies(test_state(backend).await);

    let response = server
        .get("/")
        .add_cookie(Cookie::new("access_token", "nope"))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Signed out"));
}

#[tokio::test]
async fn index_shows_directory_for_signed_in_users() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed_room("general");
    let state = test_state(backend).await;
    let server = server_with_saved_cookies(state);

    let response = server
        .get("/")
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .await;
    response.assert_status_ok();

    let text = response.text();
    assert!(text.contains("Chat Rooms"));
    assert!(text.contains("general"));
    assert!(text.contains("Welcome, Ada"));
    assert!(text.contains("No room selected"));
}

#[tokio::test]
async fn creating_a_room_redirects_into_it() {
    let backend = Arc::new(FakeBackend::new());
    let state = test_state(backend).await;
    let server = server_with_saved_cookies(state);

    let response = server
        .post("/rooms")
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .form(&[("name", "general")])
        .await;
    response.assert_status_ok();

    let redirect = response
        .headers()
        .get("HX-Redirect")
        .expect("HX-Redirect header")
        .to_str()
        .expect("header value");
    assert!(redirect.starts_with("/rooms/"));
}

#[tokio::test]
async fn duplicate_room_names_answer_a_notice_fragment() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed_room("general");
    let state = test_state(backend).await;
    let server = server_with_saved_cookies(state);

    let response = server
        .post("/rooms")
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .form(&[("name", "general")])
        .await;
    response.assert_status_ok();

    let text = response.text();
    assert!(text.contains("A room with this name already exists"));
    assert!(response.headers().get("HX-Redirect").is_none());
}

#[tokio::test]
async fn room_page_mounts_the_room_view() {
    let backend = Arc::new(FakeBackend::new());
    let room = backend.seed_room("general");
    backend.push_message(room.id, "bob", "hello there");
    let state = test_state(backend).await;
    let server = server_with_saved_cookies(state);

    let response = server
        .get(&format!("/rooms/{}", room.id))
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .await;
    response.assert_status_ok();

    let text = response.text();
    assert!(text.contains("# general"));
    assert!(text.contains("hello there"));
    assert!(text.contains("users online"));
}

#[tokio::test]
async fn unknown_rooms_redirect_to_the_directory() {
    let backend = Arc::new(FakeBackend::new());
    let state = test_state(backend).await;
    let server = server_with_saved_cookies(state);

    let response = server
        .get(&format!("/rooms/{}", uuid::Uuid::new_v4()))
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .await;
    response.assert_status(axum::http::StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn sending_into_the_mounted_room_answers_empty() {
    let backend = Arc::new(FakeBackend::new());
    let room = backend.seed_room("general");
    let state = test_state(backend.clone()).await;
    let server = server_with_saved_cookies(state);

    // Mount the room, then send.
    server
        .get(&format!("/rooms/{}", room.id))
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/rooms/{}/messages", room.id))
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .form(&[("content", "hello")])
        .await;
    response.assert_status_ok();
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn signout_clears_the_session_and_redirects() {
    let backend = Arc::new(FakeBackend::new());
    let state = test_state(backend).await;
    let sessions = state.sessions.clone();
    let server = server_with_saved_cookies(state);

    server
        .get("/")
        .add_cookie(Cookie::new("access_token", TEST_TOKEN))
        .await
        .assert_status_ok();
    assert_eq!(sessions.len(), 1);

    let response = server.post("/signout").await;
    response.assert_status(axum::http::StatusCode::SEE_OTHER);
    assert!(sessions.is_empty());
}
