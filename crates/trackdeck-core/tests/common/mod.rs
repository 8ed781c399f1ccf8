#![allow(clippy::unwrap_used, dead_code)]
// Shared fixtures for controller integration tests.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trackdeck_api::{ProjectView, ProjectsClient};

pub fn client_for(server: &MockServer) -> ProjectsClient {
    ProjectsClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap()
}

pub fn project_row(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "status": "active",
        "deadline": "2026-12-31",
        "assigned_to": "user-1",
        "budget": 1000.0,
        "created_at": "2026-01-10T08:00:00Z",
        "updated_at": "2026-01-10T08:00:00Z",
        "assigned_user": { "id": "user-1", "name": "Dana" }
    })
}

pub fn view(id: &str, name: &str) -> ProjectView {
    serde_json::from_value(project_row(id, name)).unwrap()
}

pub fn page_envelope(
    rows: Vec<serde_json::Value>,
    page: u32,
    total: u64,
    total_pages: u32,
) -> serde_json::Value {
    json!({
        "data": rows,
        "pagination": {
            "page": page,
            "limit": 10,
            "total": total,
            "totalPages": total_pages,
            "hasNext": page < total_pages,
            "hasPrev": page > 1
        }
    })
}

/// Mount the identity endpoints used by `bootstrap()`.
pub async fn mount_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/user/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "user-1", "name": "Dana" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "user-1", "name": "Dana" },
            { "id": "user-2", "name": "Rowan" }
        ])))
        .mount(server)
        .await;
}

/// Count GET requests against the list endpoint so far.
pub async fn list_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/api/projects")
        .count()
}

/// Query-string of the most recent list request.
pub async fn last_list_query(server: &MockServer) -> String {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/api/projects")
        .next_back()
        .map(|r| r.url.query().unwrap_or("").to_owned())
        .unwrap()
}
