use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ControlError;
use crate::model::{
    ActionReply, CREATE_VALIDATION_TEXT, DeploymentRequest, StatusReply, StatusReport,
};

pub const CREATE_NAMESPACE_PATH: &str = "/create_namespace";
pub const DEPLOY_APP_PATH: &str = "/deploy_app";
pub const DESTROY_NAMESPACE_PATH: &str = "/destroy_namespace";
pub const CHECK_STATUS_PATH: &str = "/check_status";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Same-origin HTTP access to the orchestration backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path_and_query: &str) -> Result<HttpReply, ControlError>;

    async fn post_form(&self, path: &str, body: String) -> Result<HttpReply, ControlError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder().pool_idle_timeout(Duration::from_secs(90));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path_and_query: &str) -> Result<HttpReply, ControlError> {
        let response = self.client.get(self.url(path_and_query)).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }

    async fn post_form(&self, path: &str, body: String) -> Result<HttpReply, ControlError> {
        let response = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

/// Builds an `application/x-www-form-urlencoded` body with every value percent-encoded.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn status_query(namespace: &str) -> String {
    format!(
        "{CHECK_STATUS_PATH}?namespace={}",
        urlencoding::encode(namespace)
    )
}

pub struct ControlGateway<T> {
    transport: T,
}

impl<T: Transport> ControlGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn create_namespace(&self, name: &str) -> Result<String, ControlError> {
        if name.trim().is_empty() {
            return Err(ControlError::validation(CREATE_VALIDATION_TEXT));
        }
        self.post_action(CREATE_NAMESPACE_PATH, form_body(&[("namespace", name)]))
            .await
    }

    pub async fn deploy_app(&self, request: &DeploymentRequest) -> Result<String, ControlError> {
        let body = form_body(&[
            ("namespace", request.namespace()),
            ("image", request.image()),
        ]);
        self.post_action(DEPLOY_APP_PATH, body).await
    }

    pub async fn destroy_namespace(&self, namespace: &str) -> Result<String, ControlError> {
        if namespace.trim().is_empty() {
            return Err(ControlError::validation("No namespace selected."));
        }
        self.post_action(
            DESTROY_NAMESPACE_PATH,
            form_body(&[("namespace", namespace)]),
        )
        .await
    }

    pub async fn check_status(&self, namespace: &str) -> Result<StatusReport, ControlError> {
        let path = status_query(namespace);
        debug!("GET {path}");
        let reply = self.transport.get(&path).await.inspect_err(|error| {
            warn!("status request for '{namespace}' failed: {error}");
        })?;
        let parsed: StatusReply = decode_reply(&reply).inspect_err(|error| {
            warn!("status reply for '{namespace}' unreadable: {error}");
        })?;
        Ok(parsed.into())
    }

    async fn post_action(&self, path: &str, body: String) -> Result<String, ControlError> {
        debug!("POST {path}");
        let reply = self
            .transport
            .post_form(path, body)
            .await
            .inspect_err(|error| warn!("{path} request failed: {error}"))?;
        let parsed: ActionReply =
            decode_reply(&reply).inspect_err(|error| warn!("{path} reply unreadable: {error}"))?;
        parsed.into_result()
    }
}

fn decode_reply<R: DeserializeOwned>(reply: &HttpReply) -> Result<R, ControlError> {
    serde_json::from_str(&reply.body).map_err(|error| {
        if reply.is_success() {
            ControlError::transport(format!("malformed response ({error})"))
        } else {
            ControlError::transport(format!("server responded with HTTP {}", reply.status))
        }
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        CHECK_STATUS_PATH, ControlGateway, DEPLOY_APP_PATH, DESTROY_NAMESPACE_PATH, HttpReply,
        Transport, form_body, status_query,
    };
    use crate::error::ControlError;
    use crate::model::{DeploymentRequest, StatusReport};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Eq, PartialEq)]
    pub(crate) struct RecordedRequest {
        pub method: &'static str,
        pub path: String,
        pub body: Option<String>,
    }

    /// In-memory transport answering from a queue of canned replies.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        replies: Mutex<VecDeque<Result<HttpReply, ControlError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl FakeTransport {
        pub(crate) fn replying(status: u16, body: &str) -> Self {
            let fake = Self::default();
            fake.push(Ok(HttpReply {
                status,
                body: body.to_string(),
            }));
            fake
        }

        pub(crate) fn failing(error: ControlError) -> Self {
            let fake = Self::default();
            fake.push(Err(error));
            fake
        }

        pub(crate) fn push(&self, reply: Result<HttpReply, ControlError>) {
            self.replies.lock().expect("replies lock").push_back(reply);
        }

        pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().expect("requests lock").clone()
        }

        fn next_reply(&self) -> Result<HttpReply, ControlError> {
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(ControlError::transport("no canned reply")))
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, path_and_query: &str) -> Result<HttpReply, ControlError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(RecordedRequest {
                    method: "GET",
                    path: path_and_query.to_string(),
                    body: None,
                });
            self.next_reply()
        }

        async fn post_form(&self, path: &str, body: String) -> Result<HttpReply, ControlError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(RecordedRequest {
                    method: "POST",
                    path: path.to_string(),
                    body: Some(body),
                });
            self.next_reply()
        }
    }

    fn decode_form(body: &str) -> Vec<(String, String)> {
        body.split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| {
                (
                    key.to_string(),
                    urlencoding::decode(value).expect("utf-8").into_owned(),
                )
            })
            .collect()
    }

    #[test]
    fn form_body_encodes_reserved_characters() {
        let body = form_body(&[("namespace", "team a"), ("image", "ghcr.io/org/app:1.0")]);
        assert_eq!(body, "namespace=team%20a&image=ghcr.io%2Forg%2Fapp%3A1.0");
    }

    #[test]
    fn status_query_encodes_namespace() {
        assert_eq!(
            status_query("a&b=c"),
            format!("{CHECK_STATUS_PATH}?namespace=a%26b%3Dc")
        );
    }

    #[tokio::test]
    async fn deploy_sends_one_request_with_round_trippable_image() {
        let images = [
            "nginx:1.25",
            "registry.example.com:5000/team/app@sha256:abc123",
            "weird image+name&x=y/ü:tag",
        ];
        for image in images {
            let gateway = ControlGateway::new(FakeTransport::replying(
                200,
                r#"{"message":"App \"app\" created"}"#,
            ));
            let request = DeploymentRequest::new("team-a", image).expect("valid request");

            let outcome = gateway.deploy_app(&request).await;
            assert_eq!(outcome, Ok("App \"app\" created".to_string()));

            let requests = gateway.transport().requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].method, "POST");
            assert_eq!(requests[0].path, DEPLOY_APP_PATH);
            let fields = decode_form(requests[0].body.as_deref().unwrap_or_default());
            assert_eq!(
                fields,
                vec![
                    ("namespace".to_string(), "team-a".to_string()),
                    ("image".to_string(), image.to_string()),
                ]
            );
        }
    }

    #[tokio::test]
    async fn application_error_is_surfaced_verbatim() {
        let gateway = ControlGateway::new(FakeTransport::replying(
            404,
            r#"{"error":"Namespace not found!"}"#,
        ));

        let outcome = gateway.destroy_namespace("ghost").await;
        assert_eq!(
            outcome,
            Err(ControlError::Application("Namespace not found!".to_string()))
        );
        assert_eq!(gateway.transport().requests()[0].path, DESTROY_NAMESPACE_PATH);
    }

    #[tokio::test]
    async fn destroy_without_namespace_sends_nothing() {
        let gateway = ControlGateway::new(FakeTransport::default());
        assert!(matches!(
            gateway.destroy_namespace("  ").await,
            Err(ControlError::Validation(_))
        ));
        assert!(gateway.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn deploy_sends_image_with_surrounding_whitespace_unchanged() {
        for image in [" nginx", "nginx:1.25 ", "  ghcr.io/org/app:1.0\t", "   "] {
            let gateway =
                ControlGateway::new(FakeTransport::replying(200, r#"{"message":"ok"}"#));
            let request = DeploymentRequest::new("team-a", image).expect("non-empty image");

            assert_eq!(gateway.deploy_app(&request).await, Ok("ok".to_string()));
            let requests = gateway.transport().requests();
            assert_eq!(requests.len(), 1);
            let fields = decode_form(requests[0].body.as_deref().unwrap_or_default());
            assert_eq!(fields[1], ("image".to_string(), image.to_string()));
        }
    }

    #[tokio::test]
    async fn create_sends_name_as_entered() {
        let gateway = ControlGateway::new(FakeTransport::replying(200, r#"{"message":"ok"}"#));

        assert_eq!(gateway.create_namespace(" team-a ").await, Ok("ok".to_string()));
        assert_eq!(
            gateway.transport().requests()[0].body.as_deref(),
            Some("namespace=%20team-a%20")
        );
    }

    #[tokio::test]
    async fn create_encodes_namespace_in_form_body() {
        let gateway = ControlGateway::new(FakeTransport::replying(
            200,
            r#"{"message":"Namespace \"team-a\" created successfully!"}"#,
        ));

        let outcome = gateway.create_namespace("team-a").await;
        assert_eq!(
            outcome,
            Ok("Namespace \"team-a\" created successfully!".to_string())
        );
        assert_eq!(
            gateway.transport().requests()[0].body.as_deref(),
            Some("namespace=team-a")
        );
    }

    #[tokio::test]
    async fn non_json_error_page_becomes_transport_failure() {
        let gateway = ControlGateway::new(FakeTransport::replying(502, "<html>Bad Gateway</html>"));

        let outcome = gateway.create_namespace("team-a").await;
        assert_eq!(
            outcome,
            Err(ControlError::Transport(
                "server responded with HTTP 502".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn network_failure_propagates_as_transport_error() {
        let gateway = ControlGateway::new(FakeTransport::failing(ControlError::transport(
            "connection refused",
        )));

        let outcome = gateway.check_status("team-a").await;
        assert_eq!(
            outcome,
            Err(ControlError::Transport("connection refused".to_string()))
        );
    }

    #[tokio::test]
    async fn check_status_parses_report_from_encoded_query() {
        let gateway = ControlGateway::new(FakeTransport::replying(
            400,
            r#"{"error":"namespace not found"}"#,
        ));

        let report = gateway.check_status("team a").await;
        assert_eq!(
            report,
            Ok(StatusReport::Error("namespace not found".to_string()))
        );
        let requests = gateway.transport().requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/check_status?namespace=team%20a");
    }

    #[tokio::test]
    async fn malformed_success_body_is_transport_failure() {
        let gateway = ControlGateway::new(FakeTransport::replying(200, "not json"));
        assert!(matches!(
            gateway.check_status("team-a").await,
            Err(ControlError::Transport(_))
        ));
    }
}
