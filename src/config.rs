// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration types for the certsrv client.
//!
//! This module provides the client configuration: the web enrollment
//! endpoint URL, the certificate template to request, the HTTP timeout,
//! and the TLS verification switch.

use std::time::Duration;
use url::Url;

use crate::error::{EnrollError, Result};

/// Certificate template requested when none is configured.
pub const DEFAULT_TEMPLATE: &str = "WebServer2";

/// Configuration for a [`CertsrvClient`](crate::CertsrvClient).
#[derive(Debug, Clone)]
pub struct CertsrvClientConfig {
    /// Full URL of the web enrollment form handler
    /// (e.g. "https://ca.example.com/certsrv/certfnsh.asp").
    pub server_url: Url,

    /// Certificate template name sent in the `CertAttrib` field.
    pub template: String,

    /// Request timeout duration.
    pub timeout: Duration,

    /// Verify the CA server's TLS certificate.
    ///
    /// Defaults to `false`: AD CS web enrollment endpoints typically sit on
    /// an internal network behind a self-signed or private-CA certificate,
    /// and the deployment this client targets relies on that relaxation.
    /// Set to `true` for any endpoint with a properly chained certificate.
    pub verify_tls: bool,
}

impl Default for CertsrvClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse("https://localhost/certsrv/certfnsh.asp")
                .expect("valid default URL"),
            template: DEFAULT_TEMPLATE.to_string(),
            timeout: Duration::from_secs(30),
            verify_tls: false,
        }
    }
}

impl CertsrvClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CertsrvClientConfigBuilder {
        CertsrvClientConfigBuilder::new()
    }

    /// URL the enrollment form is POSTed to.
    pub fn submit_url(&self) -> Url {
        self.server_url.clone()
    }

    /// URL the issued certificate is fetched from.
    ///
    /// Derived from the endpoint URL by stripping its last path segment
    /// (the form handler page) and appending
    /// `certnew.cer?ReqID=<id>&Enc=b64`.
    pub fn download_url(&self, request_id: &str) -> Result<Url> {
        let mut url = self.server_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| EnrollError::config("Server URL cannot be a base URL"))?;
            segments.pop();
            segments.push("certnew.cer");
        }
        url.set_query(Some(&format!("ReqID={}&Enc=b64", request_id)));
        Ok(url)
    }
}

/// Builder for [`CertsrvClientConfig`].
#[derive(Default)]
pub struct CertsrvClientConfigBuilder {
    server_url: Option<Url>,
    template: Option<String>,
    timeout: Option<Duration>,
    verify_tls: Option<bool>,
}

impl CertsrvClientConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the web enrollment endpoint URL.
    pub fn server_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.server_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set the endpoint from a pre-parsed URL.
    pub fn server_url_parsed(mut self, url: Url) -> Self {
        self.server_url = Some(url);
        self
    }

    /// Set the certificate template name.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS certificate verification of the CA endpoint.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL is not set.
    pub fn build(self) -> Result<CertsrvClientConfig> {
        let server_url = self
            .server_url
            .ok_or_else(|| EnrollError::config("server_url is required"))?;

        Ok(CertsrvClientConfig {
            server_url,
            template: self.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
            verify_tls: self.verify_tls.unwrap_or(false),
        })
    }
}
