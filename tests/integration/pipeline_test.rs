//! End-to-end tests for the full submit-then-download pipeline

use certsrv_client::{EnrollError, EnrollmentForm, RequestProfile};

use crate::integration::{test_client, test_credentials, MockCaServer};

const REQUEST_CFG: &str = "\
[req]
default_bits = 4096
distinguished_name = req_distinguished_name
req_extensions = req_ext

[req_distinguished_name]
CN = host.example.com

[alt_names]
DNS.1 = host.example.com
DNS.2 = www.example.com
";

fn form_from_cfg() -> (RequestProfile, EnrollmentForm) {
    let profile = RequestProfile::parse(REQUEST_CFG).expect("valid profile");
    let form = EnrollmentForm::build("csr body", &profile, "WebServer2");
    (profile, form)
}

#[tokio::test]
async fn test_end_to_end_enrollment() {
    let mock = MockCaServer::start().await;
    mock.mock_submit_accepted("42").await;
    mock.mock_download("42", "CERTDATA").await;

    let (profile, form) = form_from_cfg();
    assert_eq!(profile.common_name, "host.example.com");

    let client = test_client(&mock);
    let cert = client
        .enroll(&form, &test_credentials())
        .await
        .expect("enrollment failed");

    assert_eq!(cert, b"CERTDATA");

    // Persist the way the CLI does: <common-name>.crt, written only after
    // the download succeeded.
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join(format!("{}.crt", profile.common_name));
    std::fs::write(&output, &cert).unwrap();

    assert_eq!(output.file_name().unwrap(), "host.example.com.crt");
    assert_eq!(std::fs::read(&output).unwrap(), b"CERTDATA");
}

#[tokio::test]
async fn test_pending_response_stops_pipeline() {
    let mock = MockCaServer::start().await;
    mock.mock_submit_pending().await;
    mock.expect_no_download().await;

    let (_, form) = form_from_cfg();
    let client = test_client(&mock);
    let result = client.enroll(&form, &test_credentials()).await;

    assert!(matches!(result, Err(EnrollError::RequestIdNotFound)));
}

#[tokio::test]
async fn test_rejected_submission_stops_pipeline() {
    let mock = MockCaServer::start().await;
    mock.mock_submit_rejected(403, "Access is denied.").await;
    mock.expect_no_download().await;

    let (_, form) = form_from_cfg();
    let client = test_client(&mock);
    let result = client.enroll(&form, &test_credentials()).await;

    match result {
        Err(EnrollError::SubmissionFailed { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("Access is denied."));
        }
        other => panic!("expected SubmissionFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_error_leaves_no_file() {
    let mock = MockCaServer::start().await;
    mock.mock_submit_accepted("42").await;
    mock.mock_download_error(500).await;

    let (profile, form) = form_from_cfg();
    let client = test_client(&mock);
    let result = client.enroll(&form, &test_credentials()).await;

    match result {
        Err(EnrollError::DownloadFailed { status }) => assert_eq!(status, 500),
        other => panic!("expected DownloadFailed, got {:?}", other),
    }

    // Nothing was persisted for the failed attempt.
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join(format!("{}.crt", profile.common_name));
    assert!(!output.exists());
}
