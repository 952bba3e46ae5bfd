//! Request engine behavior against an in-memory transport.
//!
//! # Design
//! `Recorder` counts calls and keeps every request it receives, then answers
//! with a scripted reply. That makes "no network call happened" and "exactly
//! one request was sent" directly observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backoffice_core::error::{CANCELLED_MESSAGE, NETWORK_MESSAGE, NOT_FOUND_MESSAGE, SERVER_UNSTABLE_MESSAGE};
use backoffice_core::{
    ApiClient, ApiError, CancellationToken, ClientConfig, Endpoint, Environment, HttpMethod,
    HttpRequest, HttpResponse, HttpTransport, NetworkErrorKind, ParseAs, ParsedResponse, Query,
    RequestOptions, TransportError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
    Delayed(Duration, HttpResponse),
}

#[derive(Clone)]
struct Recorder {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    reply: Reply,
}

impl Recorder {
    fn new(reply: Reply) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            reply,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

impl HttpTransport for Recorder {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Respond(response) => Ok(response.clone()),
            Reply::Fail(err) => Err(err.clone()),
            Reply::Delayed(delay, response) => {
                tokio::time::sleep(*delay).await;
                Ok(response.clone())
            }
        }
    }
}

fn response(status: u16, content_type: Option<&str>, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: content_type
            .map(|ct| vec![("content-type".to_string(), ct.to_string())])
            .unwrap_or_default(),
        body: body.as_bytes().to_vec(),
    }
}

fn api(reply: Reply) -> (ApiClient<Recorder>, Recorder) {
    let recorder = Recorder::new(reply);
    let config = ClientConfig::new("https://api.example.com/")
        .unwrap()
        .with_environment(Environment::Test);
    (ApiClient::new(config, recorder.clone()), recorder)
}

// ---------------------------------------------------------------------------
// Request building through `request`
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_client_end_to_end() {
    let body = r#"{"id":"42","companyName":"Acme"}"#;
    let (api, recorder) = api(Reply::Respond(response(200, Some("application/json"), body)));

    let parsed = api
        .request("clients/{id}", HttpMethod::Get, RequestOptions::new().path_param("id", "42"))
        .await
        .unwrap();

    assert_eq!(recorder.calls(), 1);
    let sent = recorder.last_request();
    assert_eq!(sent.method, HttpMethod::Get);
    assert_eq!(sent.url, "https://api.example.com/clients/42");
    assert_eq!(parsed, ParsedResponse::Json(json!({"id": "42", "companyName": "Acme"})));
}

#[tokio::test]
async fn missing_path_param_never_reaches_transport() {
    let (api, recorder) = api(Reply::Respond(response(200, None, "")));

    let err = api
        .request("clients/{id}/contracts", HttpMethod::Get, RequestOptions::new())
        .await
        .unwrap_err();

    match err {
        ApiError::Configuration { message } => {
            assert!(message.contains("id"));
            assert!(message.contains("clients/{id}/contracts"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
    assert_eq!(recorder.calls(), 0);
}

#[tokio::test]
async fn query_is_serialized_in_order() {
    let (api, recorder) = api(Reply::Respond(response(200, Some("application/json"), "[]")));

    let query = Query::new()
        .set("a", 1)
        .set_opt("b", None::<String>)
        .set_list("c", ["x", "y"]);
    api.get("clients", RequestOptions::new().query(query)).await.unwrap();

    assert_eq!(
        recorder.last_request().url,
        "https://api.example.com/clients?a=1&c=x&c=y"
    );
}

#[tokio::test]
async fn post_sends_json_body_and_caller_headers() {
    let (api, recorder) = api(Reply::Respond(response(201, Some("application/json"), "{}")));

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct NewClient<'a> {
        company_name: &'a str,
        cnpj: &'a str,
    }

    api.post(
        "clients",
        RequestOptions::new()
            .json(&NewClient {
                company_name: "Acme",
                cnpj: "11222333000181",
            })
            .header("x-request-id", "req-1"),
    )
    .await
    .unwrap();

    let sent = recorder.last_request();
    assert_eq!(sent.method, HttpMethod::Post);
    assert_eq!(sent.header("content-type"), Some("application/json"));
    assert_eq!(sent.header("x-request-id"), Some("req-1"));
    let body: serde_json::Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"companyName": "Acme", "cnpj": "11222333000181"}));
}

// ---------------------------------------------------------------------------
// Response parsing through `request`
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_content_is_empty_regardless_of_mode() {
    for status in [204, 205, 304] {
        let (api, _) = api(Reply::Respond(response(status, Some("application/json"), "")));
        let parsed = api
            .request(
                "clients/{id}",
                HttpMethod::Delete,
                RequestOptions::new().path_param("id", 1).parse_as(ParseAs::Json),
            )
            .await
            .unwrap();
        assert!(parsed.is_empty(), "status {status}");
    }
}

#[tokio::test]
async fn text_plain_parses_as_text() {
    let (api, _) = api(Reply::Respond(response(200, Some("text/plain"), "hello")));
    let parsed = api.get("health", RequestOptions::new()).await.unwrap();
    assert_eq!(parsed, ParsedResponse::Text("hello".to_string()));
}

#[tokio::test]
async fn binary_mode_returns_raw_bytes() {
    let (api, _) = api(Reply::Respond(response(200, Some("application/json"), "{\"x\":1}")));
    let parsed = api
        .get("export", RequestOptions::new().parse_as(ParseAs::Binary))
        .await
        .unwrap();
    assert_eq!(parsed, ParsedResponse::Bytes(b"{\"x\":1}".to_vec()));
}

// ---------------------------------------------------------------------------
// Error normalization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_errors_are_normalized() {
    let cases = [
        (response(404, None, ""), NOT_FOUND_MESSAGE),
        (
            response(422, Some("application/json"), r#"{"message":"Campo obrigatório"}"#),
            "Campo obrigatório",
        ),
        (response(503, None, ""), SERVER_UNSTABLE_MESSAGE),
    ];
    for (resp, expected) in cases {
        let status = resp.status;
        let (api, recorder) = api(Reply::Respond(resp));
        let err = api.get("clients", RequestOptions::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.message(), expected);
        assert_eq!(recorder.calls(), 1, "no retries");
    }
}

#[tokio::test]
async fn connection_failure_is_network_error() {
    let (api, recorder) = api(Reply::Fail(TransportError::Connection("refused".to_string())));

    let err = api.get("clients", RequestOptions::new()).await.unwrap_err();

    assert_eq!(err.status(), None);
    assert_eq!(err.message(), NETWORK_MESSAGE);
    assert!(matches!(
        err,
        ApiError::Network {
            kind: NetworkErrorKind::Connection,
            ..
        }
    ));
    assert_eq!(recorder.calls(), 1);
}

#[tokio::test]
async fn slow_response_times_out() {
    let (api, _) = api(Reply::Delayed(
        Duration::from_secs(5),
        response(200, None, "late"),
    ));

    let err = api
        .get("slow", RequestOptions::new().timeout(Duration::from_millis(20)))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.message(), NETWORK_MESSAGE);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_before_send_makes_no_call() {
    let (api, recorder) = api(Reply::Respond(response(200, None, "")));
    let token = CancellationToken::new();
    token.cancel();

    let err = api
        .get("clients", RequestOptions::new().cancel_token(token))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Cancelled { .. }));
    assert_eq!(err.message(), CANCELLED_MESSAGE);
    assert_eq!(recorder.calls(), 0);
}

#[tokio::test]
async fn cancelled_in_flight() {
    let (api, recorder) = api(Reply::Delayed(
        Duration::from_secs(5),
        response(200, None, "late"),
    ));
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = api
        .get("clients", RequestOptions::new().cancel_token(token))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Cancelled { .. }));
    assert!(!err.is_timeout());
    assert_eq!(recorder.calls(), 1);
}

// ---------------------------------------------------------------------------
// Typed endpoints and independent clients
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ClientSummary {
    id: String,
    company_name: String,
}

struct GetClient;

impl Endpoint for GetClient {
    const METHOD: HttpMethod = HttpMethod::Get;
    const PATH: &'static str = "clients/{id}";
    type Body = ();
    type Response = ClientSummary;
}

#[tokio::test]
async fn typed_endpoint_decodes_response() {
    let body = r#"{"id":"42","companyName":"Acme","extra":true}"#;
    let (api, recorder) = api(Reply::Respond(response(200, Some("application/json"), body)));

    let client = api
        .call::<GetClient>(None, RequestOptions::new().path_param("id", "42"))
        .await
        .unwrap();

    assert_eq!(
        client,
        ClientSummary {
            id: "42".to_string(),
            company_name: "Acme".to_string(),
        }
    );
    assert!(recorder.last_request().body.is_none());
}

#[tokio::test]
async fn typed_decode_failure_is_decode_error() {
    let (api, _) = api(Reply::Respond(response(200, Some("application/json"), r#"{"id":42}"#)));

    let err = api
        .call::<GetClient>(None, RequestOptions::new().path_param("id", "42"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn independent_clients_keep_their_own_config() {
    let billing_recorder = Recorder::new(Reply::Respond(response(200, None, "")));
    let billing = ApiClient::new(
        ClientConfig::new("https://billing.example.com")
            .unwrap()
            .with_environment(Environment::Production)
            .with_bearer_token("t0k3n"),
        billing_recorder.clone(),
    );
    let (main, main_recorder) = api(Reply::Respond(response(200, None, "")));

    billing.get("invoices", RequestOptions::new()).await.unwrap();
    main.get("clients", RequestOptions::new()).await.unwrap();

    let billing_sent = billing_recorder.last_request();
    assert_eq!(billing_sent.url, "https://billing.example.com/invoices");
    assert_eq!(billing_sent.header("authorization"), Some("Bearer t0k3n"));

    let main_sent = main_recorder.last_request();
    assert_eq!(main_sent.url, "https://api.example.com/clients");
    assert_eq!(main_sent.header("authorization"), None);
}
