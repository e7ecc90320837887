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

//! # certsrv-client
//!
//! A Rust client for Microsoft Active Directory Certificate Services
//! (AD CS) web enrollment.
//!
//! AD CS exposes no structured API for certificate enrollment - only the
//! browser-facing `certsrv` HTML form. This library implements that form
//! flow as a protocol: it POSTs a CSR with the field set the form
//! expects, scrapes the assigned request ID out of the HTML response,
//! and fetches the issued certificate with a second request, all
//! authenticated with NTLM.
//!
//! ## Quick Start
//!
//! ```no_run
//! use certsrv_client::{
//!     CertsrvClient, CertsrvClientConfig, Credentials, EnrollmentForm, RequestProfile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> certsrv_client::Result<()> {
//!     // Parse the CSR configuration (Common Name + SAN DNS entries)
//!     let profile = RequestProfile::from_file("request.cfg")?;
//!
//!     // Build the form the web enrollment page submits
//!     let csr = std::fs::read_to_string("request.csr")?;
//!     let form = EnrollmentForm::build(&csr, &profile, "WebServer2");
//!
//!     // Submit and download
//!     let config = CertsrvClientConfig::builder()
//!         .server_url("https://ca.example.com/certsrv/certfnsh.asp")?
//!         .build()?;
//!     let client = CertsrvClient::new(config)?;
//!
//!     let credentials = Credentials::new("EXAMPLE\\svc-enroll", "secret");
//!     let cert = client.enroll(&form, &credentials).await?;
//!
//!     std::fs::write(format!("{}.crt", profile.common_name), cert)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Scraping caveat
//!
//! The success page's `certnew.cer?ReqID=<id>&...` hyperlink is the only
//! place the request ID appears. A 200 response without that link is
//! reported as pending rather than guessed at: the request may well be
//! waiting for manual approval on the CA side. The matching strategy is
//! pluggable via [`ResponseInterpreter`].
//!
//! ## TLS verification
//!
//! Server certificate verification defaults to **off** because the
//! typical target is an internal CA behind a self-signed or private-CA
//! certificate. Re-enable it with
//! [`verify_tls(true)`](config::CertsrvClientConfigBuilder::verify_tls)
//! for any properly certificated endpoint.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod keygen;
pub mod profile;
pub mod response;

// Re-export main types at crate root for convenience
pub use auth::{CredentialProvider, Credentials, PromptProvider, StaticProvider};
pub use client::CertsrvClient;
pub use config::{CertsrvClientConfig, CertsrvClientConfigBuilder, DEFAULT_TEMPLATE};
pub use error::{EnrollError, Result};
pub use form::EnrollmentForm;
pub use keygen::CsrGenerator;
pub use profile::RequestProfile;
pub use response::{EnrollmentOutcome, ReqIdScraper, ResponseInterpreter};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("certsrv-client/", env!("CARGO_PKG_VERSION"));
