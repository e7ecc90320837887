//! Enrollment client implementation.
//!
//! This module provides [`CertsrvClient`], which drives the two-phase
//! web enrollment protocol: POST the request form, scrape the request ID
//! out of the response, then GET the issued certificate. Each phase is
//! attempted exactly once per call; every failure is terminal for the
//! attempt.

use reqwest::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;

use crate::auth::{self, Credentials};
use crate::config::CertsrvClientConfig;
use crate::error::{EnrollError, Result};
use crate::form::EnrollmentForm;
use crate::response::{EnrollmentOutcome, ReqIdScraper, ResponseInterpreter};

/// Client for a Microsoft AD CS web enrollment endpoint.
///
/// One client handles one enrollment attempt at a time and holds no
/// mutable state across attempts; callers wanting parallel enrollments
/// run independent pipelines.
///
/// # Example
///
/// ```no_run
/// use certsrv_client::{CertsrvClient, CertsrvClientConfig, Credentials, EnrollmentForm, RequestProfile};
///
/// # async fn example() -> certsrv_client::Result<()> {
/// let config = CertsrvClientConfig::builder()
///     .server_url("https://ca.example.com/certsrv/certfnsh.asp")?
///     .build()?;
///
/// let client = CertsrvClient::new(config)?;
///
/// let profile = RequestProfile::from_file("request.cfg")?;
/// let csr = std::fs::read_to_string("request.csr")?;
/// let form = EnrollmentForm::build(&csr, &profile, &client.config().template);
///
/// let credentials = Credentials::new("EXAMPLE\\svc-enroll", "secret");
/// let cert = client.enroll(&form, &credentials).await?;
/// std::fs::write(format!("{}.crt", profile.common_name), cert)?;
/// # Ok(())
/// # }
/// ```
pub struct CertsrvClient {
    config: CertsrvClientConfig,
    http: reqwest::Client,
    interpreter: Box<dyn ResponseInterpreter>,
}

impl CertsrvClient {
    /// Create a new client with the default response interpreter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: CertsrvClientConfig) -> Result<Self> {
        Self::with_interpreter(config, Box::new(ReqIdScraper))
    }

    /// Create a new client with a custom response interpreter.
    pub fn with_interpreter(
        config: CertsrvClientConfig,
        interpreter: Box<dyn ResponseInterpreter>,
    ) -> Result<Self> {
        let http = build_http_client(&config)?;

        Ok(Self {
            config,
            http,
            interpreter,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &CertsrvClientConfig {
        &self.config
    }

    /// Submit an enrollment form to the CA.
    ///
    /// Returns the interpreted outcome of the submission. A non-200
    /// response yields [`EnrollmentOutcome::Failed`]; a 200 response is
    /// handed to the configured [`ResponseInterpreter`].
    pub async fn submit_request(
        &self,
        form: &EnrollmentForm,
        credentials: &Credentials,
    ) -> Result<EnrollmentOutcome> {
        let url = self.config.submit_url();
        tracing::debug!("POST {}", url);

        let request = self.http.post(url).form(&form.fields()).build()?;
        let response = self.send_authenticated(request, credentials).await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            tracing::warn!("Submission rejected with HTTP {}", status);
            return Ok(EnrollmentOutcome::Failed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(self.interpreter.interpret(&body))
    }

    /// Download the issued certificate for a request ID.
    ///
    /// Returns the raw response body (Base64-encoded certificate as the
    /// CA serves it) for the caller to persist.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollError::DownloadFailed`] on a non-200 response.
    pub async fn download_certificate(
        &self,
        request_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>> {
        let url = self.config.download_url(request_id)?;
        tracing::debug!("GET {}", url);

        let request = self.http.get(url).build()?;
        let response = self.send_authenticated(request, credentials).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EnrollError::download_failed(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Run the full submit-then-download sequence.
    ///
    /// A submission without a recoverable request ID maps to
    /// [`EnrollError::RequestIdNotFound`] and a rejected submission to
    /// [`EnrollError::SubmissionFailed`]; the download phase is only
    /// entered after a successful submission.
    pub async fn enroll(
        &self,
        form: &EnrollmentForm,
        credentials: &Credentials,
    ) -> Result<Vec<u8>> {
        match self.submit_request(form, credentials).await? {
            EnrollmentOutcome::Submitted { request_id } => {
                tracing::info!("Certificate request submitted, request ID {}", request_id);
                self.download_certificate(&request_id, credentials).await
            }
            EnrollmentOutcome::Pending => Err(EnrollError::RequestIdNotFound),
            EnrollmentOutcome::Failed { status, body } => {
                Err(EnrollError::submission_failed(status, body))
            }
        }
    }

    /// Send a request, completing the NTLM exchange if the server asks
    /// for it.
    ///
    /// The request is executed as-is first; servers that do not demand
    /// authentication (or have already authenticated the connection) are
    /// answered directly. On a 401 offering NTLM, the negotiate and
    /// authenticate legs replay clones of the original request with the
    /// appropriate `Authorization` tokens.
    async fn send_authenticated(
        &self,
        request: reqwest::Request,
        credentials: &Credentials,
    ) -> Result<reqwest::Response> {
        let retry = request.try_clone().ok_or_else(|| {
            EnrollError::authentication("Request body cannot be replayed for the NTLM exchange")
        })?;

        let response = self.http.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if !ntlm_offered(&response) {
            return Err(EnrollError::authentication(
                "Server requires authentication but does not offer NTLM",
            ));
        }

        tracing::debug!("Server requested NTLM authentication, starting handshake");

        let mut negotiate = retry.try_clone().ok_or_else(|| {
            EnrollError::authentication("Request body cannot be replayed for the NTLM exchange")
        })?;
        set_authorization(&mut negotiate, &auth::negotiate_token()?)?;

        let challenge_response = self.http.execute(negotiate).await?;
        if challenge_response.status() != StatusCode::UNAUTHORIZED {
            // Server was satisfied without the final leg.
            return Ok(challenge_response);
        }

        let challenge = challenge_from(&challenge_response).ok_or_else(|| {
            EnrollError::authentication("Server did not return an NTLM challenge")
        })?;

        let mut authenticate = retry;
        set_authorization(
            &mut authenticate,
            &auth::authenticate_token(&challenge, credentials)?,
        )?;

        let final_response = self.http.execute(authenticate).await?;
        if final_response.status() == StatusCode::UNAUTHORIZED {
            return Err(EnrollError::authentication(
                "Server rejected the NTLM credentials",
            ));
        }

        Ok(final_response)
    }
}

impl std::fmt::Debug for CertsrvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertsrvClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Build the reqwest client for a configuration.
fn build_http_client(config: &CertsrvClientConfig) -> Result<reqwest::Client> {
    // NTLM authenticates the underlying connection, so the handshake legs
    // and the authenticated request must share it: keep a single idle
    // connection per host and send strictly sequentially.
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .use_rustls_tls()
        .user_agent(crate::USER_AGENT)
        .pool_max_idle_per_host(1);

    if !config.verify_tls {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

fn set_authorization(request: &mut reqwest::Request, token: &str) -> Result<()> {
    let value = HeaderValue::from_str(&format!("{} {}", auth::SCHEME, token))
        .map_err(|e| EnrollError::authentication(format!("Invalid authorization header: {e}")))?;
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

fn ntlm_offered(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(auth::offers_ntlm)
}

fn challenge_from(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(auth::challenge_token)
        .map(str::to_string)
}
