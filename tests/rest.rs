//! End-to-end REST edits against a mock server.
#![cfg(feature = "rest")]

use serde_json::{json, Value};
use tryon::image::prompt::REFERENCE_INSTRUCTION;
use tryon::{
    DataUri, EditRequest, ImageEditor, ImageLocator, RestEditor, TryOnError, TryOnSession,
    IDENTITY_DIRECTIVE,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EDIT_PATH: &str = "/v1/images/generations";
const SOURCE: &str = "data:image/jpeg;base64,/9j/UE9SVFJBSVQ=";

fn editor(server: &MockServer) -> RestEditor {
    RestEditor::builder()
        .api_key("tg-key")
        .model("test/kontext")
        .size(832, 1216)
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn request() -> EditRequest {
    EditRequest::new(DataUri::parse(SOURCE).unwrap(), "A green velvet blazer")
}

async fn mount_response(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(EDIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn url_result_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EDIT_PATH))
        .and(header("authorization", "Bearer tg-key"))
        .and(body_partial_json(json!({
            "model": "test/kontext",
            "image_url": SOURCE,
            "width": 832,
            "height": 1216,
            "n": 1,
            "response_format": "url"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": "https://x/y.png"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = editor(&server).edit(&request()).await.unwrap();
    assert_eq!(result, ImageLocator::Remote("https://x/y.png".into()));
    assert_eq!(result.as_str(), "https://x/y.png");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.starts_with(IDENTITY_DIRECTIVE));
    assert!(prompt.ends_with("A green velvet blazer"));
}

#[tokio::test]
async fn b64_result_is_wrapped() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": [{"b64_json": "AAAA"}]})).await;

    let result = editor(&server).edit(&request()).await.unwrap();
    assert_eq!(result.as_str(), "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn reference_image_only_changes_prompt() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": [{"url": "https://x/y.png"}]})).await;

    let reference = DataUri::parse("data:image/png;base64,R0FSTUVOVA==").unwrap();
    let editor = editor(&server);
    editor.edit(&request()).await.unwrap();
    editor
        .edit(&request().with_reference(reference))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let mut plain: Value = requests[0].body_json().unwrap();
    let mut with_ref: Value = requests[1].body_json().unwrap();

    let plain_prompt = plain["prompt"].take();
    let ref_prompt = with_ref["prompt"].take();
    assert_eq!(
        ref_prompt.as_str().unwrap(),
        format!("{}\n\n{}", plain_prompt.as_str().unwrap(), REFERENCE_INSTRUCTION)
    );
    assert_eq!(plain, with_ref);
    assert!(!String::from_utf8_lossy(&requests[1].body).contains("R0FSTUVOVA=="));
}

#[tokio::test]
async fn empty_data_is_no_image() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": []})).await;

    let err = editor(&server).edit(&request()).await.unwrap_err();
    assert!(matches!(err, TryOnError::NoImage(_)));
}

#[tokio::test]
async fn unexpected_shape_is_no_image() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": [{"revised_prompt": "x"}], "id": 7})).await;

    let err = editor(&server).edit(&request()).await.unwrap_err();
    assert!(matches!(err, TryOnError::NoImage(_)));
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EDIT_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "overloaded"}})),
        )
        .mount(&server)
        .await;

    let err = editor(&server).edit(&request()).await.unwrap_err();
    assert!(matches!(err, TryOnError::Api { status: 503, .. }));
    assert!(err.to_string().contains("503"));
    assert!(err.to_string().contains("overloaded"));
}

#[tokio::test]
async fn missing_credential_never_reaches_network() {
    let server = MockServer::start().await;

    let result = RestEditor::builder().base_url(server.uri()).build();
    assert!(matches!(result, Err(TryOnError::Configuration(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_records_rest_results() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": [{"url": "https://x/y.png"}]})).await;

    let mut session = TryOnSession::new(editor(&server));
    session.set_source_image(DataUri::parse(SOURCE).unwrap());
    session.set_prompt("A green velvet blazer");
    session.generate().await.unwrap();

    let record = session.history().next().unwrap();
    assert_eq!(record.result_url, "https://x/y.png");
    assert_eq!(record.source_url, SOURCE);
}

#[tokio::test]
async fn concurrent_edits_are_independent() {
    let server = MockServer::start().await;
    mount_response(&server, json!({"data": [{"url": "https://x/y.png"}]})).await;

    let editor = editor(&server);
    let req = request();
    let (a, b, c) = tokio::join!(editor.edit(&req), editor.edit(&req), editor.edit(&req));
    for result in [a, b, c] {
        assert_eq!(result.unwrap().as_str(), "https://x/y.png");
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
