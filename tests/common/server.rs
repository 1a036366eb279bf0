//! wiremock helpers emulating the court search and download endpoints

use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve `body` (verbatim) for every search request
pub async fn mount_search(server: &MockServer, body: &Value) -> String {
    let raw = serde_json::to_string_pretty(body).unwrap_or_default();
    Mock::given(method("POST"))
        .and(path("/Home/SearchVerdicts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/json; charset=utf-8")
                .set_body_string(raw.clone()),
        )
        .mount(server)
        .await;
    raw
}

/// Answer every search request with `status`, expecting exactly `times` requests
pub async fn mount_search_status(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path("/Home/SearchVerdicts"))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

/// Content served for `file_name`
pub fn file_body(file_name: &str) -> Vec<u8> {
    format!("%PDF-1.7\n% verdict {}\n%%EOF\n", file_name).into_bytes()
}

/// Serve [`file_body`] for downloads of `file_name`
pub async fn mount_file(server: &MockServer, file_name: &str) {
    Mock::given(method("GET"))
        .and(path("/Home/Download"))
        .and(query_param("fileName", file_name))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/pdf")
                .set_body_bytes(file_body(file_name)),
        )
        .mount(server)
        .await;
}

/// Answer downloads of `file_name` with `status`, expecting exactly `times` requests
pub async fn mount_file_status(server: &MockServer, file_name: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path("/Home/Download"))
        .and(query_param("fileName", file_name))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

/// Fail the first `failures` downloads of `file_name` with `status`, then serve it
pub async fn mount_flaky_file(server: &MockServer, file_name: &str, status: u16, failures: u64) {
    Mock::given(method("GET"))
        .and(path("/Home/Download"))
        .and(query_param("fileName", file_name))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(failures)
        .with_priority(1)
        .mount(server)
        .await;
    mount_file(server, file_name).await;
}
