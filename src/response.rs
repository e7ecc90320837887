//! Submission response interpretation.
//!
//! The CA answers a successful submission with an HTML page, not a
//! structured document. The page embeds a hyperlink to the to-be-issued
//! certificate of the form `certnew.cer?ReqID=<digits>&...`, and scraping
//! that link out of the text is the only way to learn the request ID.
//! The matching strategy sits behind [`ResponseInterpreter`] so it can be
//! swapped or hardened (e.g. for a real HTML parser) without touching the
//! client's control flow.

use std::sync::LazyLock;

use regex::Regex;

/// Outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// The CA accepted the request and assigned it an identifier.
    Submitted {
        /// Request ID scraped from the response page.
        request_id: String,
    },

    /// The response was HTTP 200 but carried no recognizable request ID.
    ///
    /// The submission may still have succeeded on the CA side (for
    /// example, pending manual approval renders a different page). That
    /// ambiguity is inherent to scraping and is surfaced as-is rather
    /// than guessed away.
    Pending,

    /// The CA rejected the submission with a non-200 status.
    Failed {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnosis.
        body: String,
    },
}

impl EnrollmentOutcome {
    /// Create a submitted outcome.
    pub fn submitted(request_id: impl Into<String>) -> Self {
        Self::Submitted {
            request_id: request_id.into(),
        }
    }

    /// Returns the request ID if the submission was accepted.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Submitted { request_id } => Some(request_id),
            _ => None,
        }
    }

    /// Returns true if no request ID could be recovered.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Strategy for reading an [`EnrollmentOutcome`] out of a 200-status
/// submission response body.
pub trait ResponseInterpreter: Send + Sync {
    /// Interpret the raw response text.
    fn interpret(&self, body: &str) -> EnrollmentOutcome;
}

static REQ_ID_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"certnew\.cer\?ReqID=(\d+)&").expect("valid regex"));

/// Default interpreter: scrape the `certnew.cer?ReqID=<digits>&` link the
/// success page embeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqIdScraper;

impl ResponseInterpreter for ReqIdScraper {
    fn interpret(&self, body: &str) -> EnrollmentOutcome {
        match REQ_ID_LINK.captures(body) {
            Some(caps) => EnrollmentOutcome::submitted(&caps[1]),
            None => EnrollmentOutcome::Pending,
        }
    }
}
