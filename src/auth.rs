//! NTLM authentication support.
//!
//! The web enrollment endpoint authenticates requests with NTLM: the
//! server answers an unauthenticated request with 401 and a
//! `WWW-Authenticate: NTLM` offer, the client sends a negotiate (Type 1)
//! token, the server replies 401 with a challenge (Type 2) token, and the
//! client answers with an authenticate (Type 3) token on the final send.
//! Message construction and the NTLMv2 response computation are delegated
//! to the `ntlmclient` crate; this module only encodes/decodes the header
//! payloads and carries the credentials.
//!
//! Credentials are held in memory for the duration of the HTTP exchange
//! and are never logged; the [`std::fmt::Debug`] impl redacts the
//! password.

use std::io::Write;

use base64::prelude::*;

use crate::error::{EnrollError, Result};

/// Authorization scheme token used on the wire.
pub(crate) const SCHEME: &str = "NTLM";

/// Workstation name reported in NTLM messages.
const WORKSTATION: &str = "WORKSTATION";

/// Username/password pair for the two HTTP calls of one enrollment.
#[derive(Clone)]
pub struct Credentials {
    /// Account name, without the domain prefix.
    pub username: String,

    /// Account password.
    pub password: String,

    /// NT domain, empty when the username carried no `DOMAIN\` prefix.
    pub domain: String,
}

impl Credentials {
    /// Create credentials, splitting a leading `DOMAIN\` off the username.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let raw = username.into();
        let (domain, username) = match raw.split_once('\\') {
            Some((domain, user)) => (domain.to_string(), user.to_string()),
            None => (String::new(), raw),
        };

        Self {
            username,
            password: password.into(),
            domain,
        }
    }

    fn to_ntlm(&self) -> ntlmclient::Credentials {
        ntlmclient::Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Capability for obtaining credentials at the edge of the pipeline.
///
/// The library itself never touches a terminal; interactive prompting is
/// an implementation of this trait injected by the binary.
pub trait CredentialProvider {
    /// Produce the credentials for one enrollment attempt.
    fn credentials(&self) -> Result<Credentials>;
}

/// Interactive provider: username from stdin, password without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptProvider;

impl CredentialProvider for PromptProvider {
    fn credentials(&self) -> Result<Credentials> {
        print!("Enter your username: ");
        std::io::stdout().flush()?;
        let mut username = String::new();
        std::io::stdin().read_line(&mut username)?;

        let password = rpassword::prompt_password("Enter your password: ")?;

        Ok(Credentials::new(username.trim(), password))
    }
}

/// Fixed credentials, for callers that already hold them.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    credentials: Credentials,
}

impl StaticProvider {
    /// Create a provider returning the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticProvider {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

/// Does a `WWW-Authenticate` header offer NTLM (directly or via
/// Negotiate)?
pub(crate) fn offers_ntlm(www_authenticate: &str) -> bool {
    www_authenticate.split(',').any(|offer| {
        let scheme = offer.trim().split_whitespace().next().unwrap_or("");
        scheme.eq_ignore_ascii_case("NTLM") || scheme.eq_ignore_ascii_case("Negotiate")
    })
}

/// Extract the base64 challenge token from a `WWW-Authenticate` header.
pub(crate) fn challenge_token(www_authenticate: &str) -> Option<&str> {
    www_authenticate
        .split(',')
        .map(str::trim)
        .find_map(|offer| {
            offer
                .strip_prefix("NTLM ")
                .or_else(|| offer.strip_prefix("Negotiate "))
        })
        .map(str::trim)
}

/// Build the base64 negotiate (Type 1) token.
pub(crate) fn negotiate_token() -> Result<String> {
    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE
        | ntlmclient::Flags::REQUEST_TARGET
        | ntlmclient::Flags::NEGOTIATE_NTLM
        | ntlmclient::Flags::NEGOTIATE_WORKSTATION_SUPPLIED;

    let message = ntlmclient::Message::Negotiate(ntlmclient::NegotiateMessage {
        flags,
        supplied_domain: String::new(),
        supplied_workstation: WORKSTATION.to_string(),
        os_version: Default::default(),
    });

    let bytes = message.to_bytes().map_err(|e| {
        EnrollError::authentication(format!("Failed to encode NTLM negotiate message: {e:?}"))
    })?;

    Ok(BASE64_STANDARD.encode(bytes))
}

/// Answer a base64 challenge (Type 2) token with the base64 authenticate
/// (Type 3) token for the given credentials.
pub(crate) fn authenticate_token(challenge_b64: &str, credentials: &Credentials) -> Result<String> {
    let challenge_bytes = BASE64_STANDARD.decode(challenge_b64.trim()).map_err(|e| {
        EnrollError::authentication(format!("Invalid NTLM challenge encoding: {e}"))
    })?;

    let message = ntlmclient::Message::try_from(challenge_bytes.as_slice()).map_err(|e| {
        EnrollError::authentication(format!("Failed to decode NTLM challenge message: {e:?}"))
    })?;

    let challenge = match message {
        ntlmclient::Message::Challenge(challenge) => challenge,
        other => {
            return Err(EnrollError::authentication(format!(
                "Expected an NTLM challenge message, got {other:?}"
            )));
        }
    };

    let target_info: Vec<u8> = challenge
        .target_information
        .iter()
        .flat_map(|entry| entry.to_bytes())
        .collect();

    let ntlm_credentials = credentials.to_ntlm();
    let response = ntlmclient::respond_challenge_ntlm_v2(
        challenge.challenge,
        &target_info,
        ntlmclient::get_ntlm_time(),
        &ntlm_credentials,
    );

    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM;
    let authenticate = response.to_message(&ntlm_credentials, WORKSTATION, flags);

    let bytes = authenticate.to_bytes().map_err(|e| {
        EnrollError::authentication(format!("Failed to encode NTLM authenticate message: {e:?}"))
    })?;

    Ok(BASE64_STANDARD.encode(bytes))
}
