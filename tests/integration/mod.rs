//! Integration test utilities and helpers
//!
//! This module provides common test infrastructure: a mock CA web
//! enrollment server built on wiremock, request matchers for the NTLM
//! exchange, and fixture helpers.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use certsrv_client::{CertsrvClient, CertsrvClientConfig, Credentials};

mod auth_test;
mod pipeline_test;

/// Form handler path of the mock endpoint
pub const PATH_SUBMIT: &str = "/certsrv/certfnsh.asp";

/// Certificate download path, sibling of the form handler
pub const PATH_DOWNLOAD: &str = "/certsrv/certnew.cer";

/// Mock AD CS web enrollment server for integration tests
pub struct MockCaServer {
    server: MockServer,
}

impl MockCaServer {
    /// Create a new mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Full URL of the form handler on the mock server
    pub fn submit_url(&self) -> String {
        format!("{}{}", self.server.uri(), PATH_SUBMIT)
    }

    /// Get a reference to the inner MockServer for custom mocking
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Mock an accepted submission: 200 with the success page carrying
    /// the `certnew.cer?ReqID=...` link
    pub async fn mock_submit_accepted(&self, request_id: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_SUBMIT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(success_page(request_id))
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a 200 response whose page carries no request ID link
    /// (e.g. the "taken under submission" page)
    pub async fn mock_submit_pending(&self) {
        Mock::given(method("POST"))
            .and(path(PATH_SUBMIT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(
                        "<html><body>Your certificate request has been received \
                         and is pending administrator approval.</body></html>",
                    )
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a rejected submission with the given status and body
    pub async fn mock_submit_rejected(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_SUBMIT))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a successful certificate download for a request ID
    pub async fn mock_download(&self, request_id: &str, cert: &str) {
        Mock::given(method("GET"))
            .and(path(PATH_DOWNLOAD))
            .and(query_param("ReqID", request_id))
            .and(query_param("Enc", "b64"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(cert)
                    .insert_header("Content-Type", "application/pkix-cert"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a failing certificate download
    pub async fn mock_download_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(PATH_DOWNLOAD))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Assert that the download endpoint is never hit.
    ///
    /// The expectation is verified when the server is dropped at the end
    /// of the test.
    pub async fn expect_no_download(&self) {
        Mock::given(method("GET"))
            .and(path(PATH_DOWNLOAD))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }
}

/// Build a client pointed at the mock server
pub fn test_client(mock: &MockCaServer) -> CertsrvClient {
    let config = CertsrvClientConfig::builder()
        .server_url(mock.submit_url())
        .expect("valid URL")
        .build()
        .expect("valid config");

    CertsrvClient::new(config).expect("client creation failed")
}

/// Credentials used throughout the tests
pub fn test_credentials() -> Credentials {
    Credentials::new("EXAMPLE\\svc-enroll", "SecREt01")
}

/// A plausible rendition of the certsrv success page
pub fn success_page(request_id: &str) -> String {
    format!(
        "<html><body>Certificate Issued<br>\
         <a href=\"certnew.cer?ReqID={request_id}&Enc=b64\">Download certificate</a><br>\
         <a href=\"certnew.p7b?ReqID={request_id}&Enc=b64\">Download certificate chain</a>\
         </body></html>"
    )
}

/// Matches requests whose Authorization header starts with the given
/// prefix (used to tell the NTLM handshake legs apart)
pub struct AuthorizationPrefix(pub &'static str);

impl wiremock::Match for AuthorizationPrefix {
    fn matches(&self, request: &wiremock::Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with(self.0))
            .unwrap_or(false)
    }
}

/// Matches requests carrying no Authorization header
pub struct NoAuthorization;

impl wiremock::Match for NoAuthorization {
    fn matches(&self, request: &wiremock::Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}
