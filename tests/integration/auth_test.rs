//! Integration tests for the NTLM authentication exchange

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use certsrv_client::{EnrollError, EnrollmentForm, RequestProfile};

use crate::integration::{
    success_page, test_client, test_credentials, AuthorizationPrefix, MockCaServer,
    NoAuthorization, PATH_SUBMIT,
};

// Type 2 challenge from the well-known NTLM protocol documentation
// example (target "DOMAIN", challenge 0x0123456789abcdef).
const CHALLENGE_B64: &str = "TlRMTVNUUAACAAAADAAMADAAAAABAoEAASNFZ4mrze8AAAAAAAAAAGIAYgA8AAAARABPAE0AQQBJAE4AAgAMAEQATwBNAEEASQBOAAEADABTAEUAUgBWAEUAUgAEABQAZABvAG0AYQBpAG4ALgBjAG8AbQADACIAcwBlAHIAdgBlAHIALgBkAG8AbQBhAGkAbgAuAGMAbwBtAAAAAAA=";

// NTLMSSP message-type prefixes in base64: "NTLMSSP\0" + 0x01 / 0x03.
const TYPE1_PREFIX: &str = "NTLM TlRMTVNUUAAB";
const TYPE3_PREFIX: &str = "NTLM TlRMTVNUUAAD";

fn test_form() -> EnrollmentForm {
    let profile =
        RequestProfile::parse("CN = host.example.com\n[alt_names]\nDNS.1 = host.example.com\n")
            .expect("valid profile");
    EnrollmentForm::build("csr body", &profile, "WebServer2")
}

#[tokio::test]
async fn test_ntlm_handshake_completes() {
    let mock = MockCaServer::start().await;

    // Leg 1: unauthenticated request is offered NTLM.
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM"))
        .expect(1)
        .mount(mock.inner())
        .await;

    // Leg 2: negotiate message is answered with the challenge.
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(AuthorizationPrefix(TYPE1_PREFIX))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!("NTLM {}", CHALLENGE_B64).as_str(),
        ))
        .expect(1)
        .mount(mock.inner())
        .await;

    // Leg 3: authenticate message is accepted.
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(AuthorizationPrefix(TYPE3_PREFIX))
        .respond_with(ResponseTemplate::new(200).set_body_string(success_page("12345")))
        .expect(1)
        .mount(mock.inner())
        .await;

    let client = test_client(&mock);
    let outcome = client
        .submit_request(&test_form(), &test_credentials())
        .await
        .expect("handshake failed");

    assert_eq!(outcome.request_id(), Some("12345"));
}

#[tokio::test]
async fn test_missing_challenge_fails() {
    let mock = MockCaServer::start().await;

    // Every leg gets a bare NTLM offer with no challenge token.
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM"))
        .mount(mock.inner())
        .await;

    let client = test_client(&mock);
    let result = client
        .submit_request(&test_form(), &test_credentials())
        .await;

    match result {
        Err(EnrollError::Authentication(msg)) => {
            assert!(msg.contains("challenge"), "unexpected message: {msg}");
        }
        other => panic!("expected Authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_ntlm_offer_fails() {
    let mock = MockCaServer::start().await;

    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"certsrv\""),
        )
        .mount(mock.inner())
        .await;

    let client = test_client(&mock);
    let result = client
        .submit_request(&test_form(), &test_credentials())
        .await;

    match result {
        Err(EnrollError::Authentication(msg)) => {
            assert!(msg.contains("NTLM"), "unexpected message: {msg}");
        }
        other => panic!("expected Authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mock = MockCaServer::start().await;

    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM"))
        .mount(mock.inner())
        .await;

    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(AuthorizationPrefix(TYPE1_PREFIX))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!("NTLM {}", CHALLENGE_B64).as_str(),
        ))
        .mount(mock.inner())
        .await;

    // The final leg is refused: wrong password.
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(AuthorizationPrefix(TYPE3_PREFIX))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", "NTLM"))
        .mount(mock.inner())
        .await;

    let client = test_client(&mock);
    let result = client
        .submit_request(&test_form(), &test_credentials())
        .await;

    match result {
        Err(EnrollError::Authentication(msg)) => {
            assert!(msg.contains("rejected"), "unexpected message: {msg}");
        }
        other => panic!("expected Authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_handshake_when_not_challenged() {
    let mock = MockCaServer::start().await;
    mock.mock_submit_accepted("1").await;

    // A server that answers 200 directly never sees an Authorization
    // header; the credentials are simply unused.
    let client = test_client(&mock);
    let outcome = client
        .submit_request(&test_form(), &test_credentials())
        .await
        .expect("submit failed");

    assert_eq!(outcome.request_id(), Some("1"));
}
