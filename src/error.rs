//! Error types for the certsrv client.
//!
//! This module defines all error types that can occur during an enrollment
//! attempt, from config parsing through the submit and download phases.
//! Every variant is terminal for the attempt - there is no retry logic
//! anywhere in the pipeline.

use thiserror::Error;

/// Result type alias using [`EnrollError`].
pub type Result<T> = std::result::Result<T, EnrollError>;

/// Errors that can occur during certificate enrollment.
#[derive(Debug, Error)]
pub enum EnrollError {
    /// The request configuration document has no `CN = <value>` line.
    #[error("No 'CN = <value>' line found in the request configuration")]
    MissingCommonName,

    /// The request configuration document yielded no SAN DNS entries.
    ///
    /// Whether this blocks enrollment is caller policy; the library only
    /// raises it from
    /// [`RequestProfile::require_san`](crate::RequestProfile::require_san)
    /// for callers that want SANs to be mandatory.
    #[error("No DNS entries found in the [alt_names] section")]
    NoSanEntries,

    /// Configuration or input file problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external key/CSR generation tool exited non-zero.
    #[error("Key/CSR generation tool failed (exit status {status}): {stderr}")]
    ExternalTool {
        /// Exit status reported by the tool (-1 if killed by signal).
        status: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// Network-level failure (connection, timeout, TLS handshake).
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CA rejected the submission with a non-200 status.
    #[error("Certificate request submission failed with HTTP {status}")]
    SubmissionFailed {
        /// HTTP status code of the submit response.
        status: u16,
        /// Response body, kept for manual diagnosis.
        body: String,
    },

    /// The certificate download returned a non-200 status.
    #[error("Certificate download failed with HTTP {status}")]
    DownloadFailed {
        /// HTTP status code of the download response.
        status: u16,
    },

    /// The submit response was 200 but contained no recognizable request ID.
    ///
    /// The request may still have succeeded on the CA side (e.g. pending
    /// manual approval); the scraped page just did not carry the
    /// `certnew.cer?ReqID=...` link this client looks for.
    #[error("Could not retrieve a request ID from the submission response")]
    RequestIdNotFound,

    /// NTLM authentication exchange failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl EnrollError {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an external tool failure from an exit status and stderr.
    pub fn external_tool(status: i32, stderr: impl Into<String>) -> Self {
        Self::ExternalTool {
            status,
            stderr: stderr.into(),
        }
    }

    /// Create a submission failure with status and response body.
    pub fn submission_failed(status: u16, body: impl Into<String>) -> Self {
        Self::SubmissionFailed {
            status,
            body: body.into(),
        }
    }

    /// Create a download failure with the given status.
    pub fn download_failed(status: u16) -> Self {
        Self::DownloadFailed { status }
    }

    /// Create an authentication error with the given message.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }
}
