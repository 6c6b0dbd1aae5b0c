use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{
    app, Account, Relationship, Status, PHOTOGRAPHER_ID, RESTRICTED_ID, VIEWER_ID, VIEWER_TOKEN,
};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {VIEWER_TOKEN}"))
        .body(String::new())
        .unwrap()
}

fn authed_json(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {VIEWER_TOKEN}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/accounts/verify_credentials")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_401_everywhere() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/accounts/{PHOTOGRAPHER_ID}/follow"))
                .header(http::header::AUTHORIZATION, "Bearer expired")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- verify_credentials ---

#[tokio::test]
async fn verify_credentials_returns_viewer() {
    let resp = app()
        .oneshot(authed("GET", "/api/v1/accounts/verify_credentials"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let account: Account = body_json(resp).await;
    assert_eq!(account.id, VIEWER_ID);
    assert_eq!(account.username, "alice");
}

// --- statuses ---

#[tokio::test]
async fn statuses_of_photographer() {
    let resp = app()
        .oneshot(authed("GET", &format!("/api/v1/accounts/{PHOTOGRAPHER_ID}/statuses")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let statuses: Vec<Status> = body_json(resp).await;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].media_attachments.len(), 1);
}

#[tokio::test]
async fn statuses_empty_is_an_empty_array() {
    let resp = app()
        .oneshot(authed("GET", &format!("/api/v1/accounts/{VIEWER_ID}/statuses")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"[]");
}

#[tokio::test]
async fn statuses_of_unknown_account_is_404() {
    let resp = app()
        .oneshot(authed("GET", "/api/v1/accounts/999/statuses"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- relationships ---

#[tokio::test]
async fn relationships_batch_skips_unknown_ids() {
    let resp = app()
        .oneshot(authed_json(
            "POST",
            "/api/v1/accounts/relationships",
            r#"{"id":["7","8","999"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rels: Vec<Relationship> = body_json(resp).await;
    assert_eq!(rels.len(), 2);
    assert_eq!(rels[0].id, PHOTOGRAPHER_ID);
    assert!(!rels[0].following);
    assert!(rels[0].followed_by);
    assert_eq!(rels[1].id, RESTRICTED_ID);
    assert!(rels[1].following);
}

// --- follow / unfollow ---

#[tokio::test]
async fn following_yourself_is_403() {
    let resp = app()
        .oneshot(authed("POST", &format!("/api/v1/accounts/{VIEWER_ID}/follow")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn following_restricted_account_is_403() {
    let resp = app()
        .oneshot(authed("POST", &format!("/api/v1/accounts/{RESTRICTED_ID}/follow")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn follow_unknown_account_is_404() {
    let resp = app()
        .oneshot(authed("POST", "/api/v1/accounts/999/follow"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full follow lifecycle ---

#[tokio::test]
async fn follow_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // follow
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("POST", &format!("/api/v1/accounts/{PHOTOGRAPHER_ID}/follow")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rel: Relationship = body_json(resp).await;
    assert!(rel.following);

    // the photographer now lists the viewer as a follower
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", &format!("/api/v1/accounts/{PHOTOGRAPHER_ID}/followers")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let followers: Vec<Account> = body_json(resp).await;
    assert!(followers.iter().any(|a| a.id == VIEWER_ID));

    // and the viewer's following count went up
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/v1/accounts/verify_credentials"))
        .await
        .unwrap();
    let me: Account = body_json(resp).await;
    assert_eq!(me.following_count, 2);

    // unfollow
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("POST", &format!("/api/v1/accounts/{PHOTOGRAPHER_ID}/unfollow")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rel: Relationship = body_json(resp).await;
    assert!(!rel.following);

    // relationship reflects the unfollow
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_json(
            "POST",
            "/api/v1/accounts/relationships",
            r#"{"id":["7"]}"#,
        ))
        .await
        .unwrap();
    let rels: Vec<Relationship> = body_json(resp).await;
    assert!(!rels[0].following);

    // following list of the viewer is back to the restricted account only
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", &format!("/api/v1/accounts/{VIEWER_ID}/following")))
        .await
        .unwrap();
    let following: Vec<Account> = body_json(resp).await;
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].id, RESTRICTED_ID);
}
