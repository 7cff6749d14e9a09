//! Integration tests for the transfer API endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use api::auth::UserInfo;
use api::state::AppState;
use common::wire::{FILE_PATH_HEADER, FORCE_HEADER, SRC_NAME_HEADER};

const ALICE: &str = "11111111-1111-4111-8111-111111111111";
const BOB: &str = "22222222-2222-4222-8222-222222222222";

/// Space layout used by every test:
/// docs/
/// |- a.txt ("hi")
/// |- b.txt ("second")
/// |- sub/
///    |- c.txt ("nested")
fn setup(max_tree_depth: usize) -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
    std::fs::write(dir.path().join("b.txt"), "second").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("c.txt"), "nested").unwrap();

    let mut spaces = std::collections::HashMap::new();
    spaces.insert("docs".to_string(), dir.path().to_path_buf());

    let mut users = std::collections::HashMap::new();
    users.insert(
        ALICE.to_string(),
        UserInfo {
            guid: ALICE.to_string(),
            spaces: ["docs".to_string()].into_iter().collect(),
        },
    );
    users.insert(
        BOB.to_string(),
        UserInfo {
            guid: BOB.to_string(),
            spaces: std::collections::HashSet::new(),
        },
    );

    let state = AppState::new(spaces, users, max_tree_depth);
    (dir, api::create_router(state))
}

async fn get(router: &axum::Router, uri: &str, guid: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(guid) = guid {
        builder = builder.header("authorization", format!("simple {guid}"));
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(router: &axum::Router, uri: &str, guid: Option<&str>) -> (StatusCode, Value) {
    let (status, body) = get(router, uri, guid).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn put_file(
    router: &axum::Router,
    dest: &str,
    src_name: &str,
    force: bool,
    body: &[u8],
    guid: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("PUT")
        .uri("/api/files/new")
        .header("authorization", format!("simple {guid}"))
        .header(FILE_PATH_HEADER, dest)
        .header(SRC_NAME_HEADER, src_name)
        .header(FORCE_HEADER, if force { "true" } else { "false" })
        .body(Body::from(body.to_vec()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/files/stat?path=docs/a.txt", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "unauthorized");

    // wrong scheme
    let request = Request::builder()
        .method("GET")
        .uri("/api/files/stat?path=docs/a.txt")
        .header("authorization", format!("bearer {ALICE}"))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // unknown credential
    let (status, _) = get(
        &router,
        "/api/files/stat?path=docs/a.txt",
        Some("not-a-known-guid"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unauthorized_space_does_not_leak_existence() {
    let (_dir, router) = setup(16);
    // the path exists, but bob may not know that
    let (status, json) = get_json(&router, "/api/files/stat?path=docs/a.txt", Some(BOB)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "unauthorized");
    // and neither for a path that does not exist
    let (status, json) = get_json(&router, "/api/files/stat?path=docs/nope.txt", Some(BOB)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "unauthorized");
}

#[tokio::test]
async fn traversal_outside_the_space_root_is_rejected() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(
        &router,
        "/api/files/stat?path=docs/../../etc/passwd",
        Some(ALICE),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_path");
}

#[tokio::test]
async fn list_returns_sorted_children() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/dirs/list?path=docs", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let children = json["children"].as_array().unwrap();
    let names: Vec<&str> = children
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
    assert_eq!(children[2]["isDir"], true);
    assert_eq!(children[0]["isDir"], false);
}

#[tokio::test]
async fn list_on_a_file_is_rejected() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/dirs/list?path=docs/a.txt", Some(ALICE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "not_a_directory");
}

#[tokio::test]
async fn list_on_a_missing_path_is_not_found() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/dirs/list?path=docs/gone", Some(ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn get_file_streams_content_with_length() {
    let (_dir, router) = setup(16);
    let request = Request::builder()
        .method("GET")
        .uri("/api/files?path=docs/a.txt")
        .header("authorization", format!("simple {ALICE}"))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-length"].to_str().unwrap(),
        "2"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"hi");
}

#[tokio::test]
async fn get_file_on_a_directory_is_rejected() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/files?path=docs/sub", Some(ALICE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "is_a_directory");
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let (_dir, router) = setup(16);
    let (status, _) = put_file(&router, "docs/new.txt", "new.txt", false, b"payload", ALICE).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = get(&router, "/api/files?path=docs/new.txt", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"payload");
}

#[tokio::test]
async fn put_without_force_rejects_existing_files() {
    let (dir, router) = setup(16);
    let (status, json) = put_file(&router, "docs/a.txt", "a.txt", false, b"other", ALICE).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "already_exists");
    // the original content is untouched
    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hi");

    let (status, _) = put_file(&router, "docs/a.txt", "a.txt", true, b"other", ALICE).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "other"
    );
}

#[tokio::test]
async fn put_into_a_directory_uses_the_source_basename() {
    let (dir, router) = setup(16);
    let (status, _) = put_file(&router, "docs/sub", "copied.txt", false, b"x", ALICE).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("sub").join("copied.txt")).unwrap(),
        "x"
    );
}

#[tokio::test]
async fn put_with_a_missing_parent_is_rejected() {
    let (_dir, router) = setup(16);
    let (status, json) = put_file(&router, "docs/nowhere/x.txt", "x.txt", false, b"x", ALICE).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "parent_missing");
}

#[tokio::test]
async fn put_rejects_source_names_with_separators() {
    let (_dir, router) = setup(16);
    let (status, json) = put_file(&router, "docs/sub", "../evil.txt", false, b"x", ALICE).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_path");
}

#[tokio::test]
async fn matches_excludes_directories_and_rewrites_paths() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/files/matches?pattern=docs/*", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let matches: Vec<&str> = json["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap())
        .collect();
    assert_eq!(matches, vec!["docs/a.txt", "docs/b.txt"]);
}

#[tokio::test]
async fn matches_with_no_hits_is_not_found() {
    let (_dir, router) = setup(16);
    let (status, json) =
        get_json(&router, "/api/files/matches?pattern=docs/*.rs", Some(ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn malformed_patterns_are_rejected() {
    let (_dir, router) = setup(16);
    // "docs/a[" with the bracket percent-encoded
    let (status, json) =
        get_json(&router, "/api/files/matches?pattern=docs/a%5B", Some(ALICE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_pattern");
}

#[tokio::test]
async fn stat_reports_files_and_directories() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/files/stat?path=docs/a.txt", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stat"]["name"], "a.txt");
    assert_eq!(json["stat"]["isDir"], false);
    assert_eq!(json["stat"]["size"], 2);

    let (status, json) = get_json(&router, "/api/files/stat?path=docs/sub", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stat"]["isDir"], true);
}

#[tokio::test]
async fn tree_uses_virtual_paths_and_honors_the_depth_bound() {
    let (_dir, router) = setup(1);
    let (status, json) = get_json(&router, "/api/dirs/tree?path=docs", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let tree = &json["tree"];
    assert_eq!(tree["path"], "docs");
    assert_eq!(tree["isDir"], true);
    let children: Vec<&str> = tree["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["path"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["docs/a.txt", "docs/b.txt", "docs/sub"]);
    // depth 1: sub's own children are not expanded
    let sub = &tree["children"].as_array().unwrap()[2];
    assert!(sub["children"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tree_expands_nested_directories_within_the_bound() {
    let (_dir, router) = setup(8);
    let (status, json) = get_json(&router, "/api/dirs/tree?path=docs", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let sub = &json["tree"]["children"].as_array().unwrap()[2];
    let grandchildren: Vec<&str> = sub["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["path"].as_str().unwrap())
        .collect();
    assert_eq!(grandchildren, vec!["docs/sub/c.txt"]);
}

#[tokio::test]
async fn spaces_lists_only_the_callers_spaces() {
    let (_dir, router) = setup(16);
    let (status, json) = get_json(&router, "/api/spaces", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["spaces"], serde_json::json!(["docs"]));

    let (status, json) = get_json(&router, "/api/spaces", Some(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["spaces"], serde_json::json!([]));
}
