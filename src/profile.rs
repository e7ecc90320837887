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

//! Request profile extraction from a CSR configuration document.
//!
//! The input is the OpenSSL-style request configuration used to generate
//! the CSR. Only two features of it are consumed: the top-level
//! `CN = <value>` line and the `DNS.<n> = <value>` lines of the
//! `[alt_names]` section. Everything else is ignored.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EnrollError, Result};

static CN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CN\s*=\s*(.*)$").expect("valid regex"));

static DNS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DNS\.\d+\s*=\s*(.*)$").expect("valid regex"));

/// Subject data recovered from a CSR configuration document.
///
/// `san_dns` preserves file order and duplicates; an empty list is not a
/// parse error (whether it blocks enrollment is up to the caller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestProfile {
    /// Common Name from the first `CN = <value>` line.
    pub common_name: String,

    /// DNS Subject Alternative Names, in the order they appear.
    pub san_dns: Vec<String>,
}

impl RequestProfile {
    /// Parse a request configuration document.
    ///
    /// The SAN scan enters the `[alt_names]` section when it sees that
    /// header and never leaves it: `DNS.<n>` lines under a later section
    /// header are still collected. This matches the single-pass scan of
    /// the tooling this client interoperates with.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollError::MissingCommonName`] if no `CN = <value>`
    /// line is present.
    pub fn parse(text: &str) -> Result<Self> {
        let mut common_name = None;
        let mut san_dns = Vec::new();
        let mut in_alt_names = false;

        for line in text.lines() {
            let line = line.trim();

            if common_name.is_none() {
                if let Some(caps) = CN_LINE.captures(line) {
                    common_name = Some(caps[1].trim().to_string());
                }
            }

            if line == "[alt_names]" {
                in_alt_names = true;
                continue;
            }

            if in_alt_names {
                if let Some(caps) = DNS_LINE.captures(line) {
                    san_dns.push(caps[1].trim().to_string());
                }
            }
        }

        let common_name = common_name.ok_or(EnrollError::MissingCommonName)?;

        Ok(Self {
            common_name,
            san_dns,
        })
    }

    /// Read and parse a request configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EnrollError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Enforce that at least one SAN DNS entry was found.
    ///
    /// Whether an empty SAN list blocks enrollment is caller policy; this
    /// is the hook for callers that want it fatal.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollError::NoSanEntries`] when the profile has no DNS
    /// entries.
    pub fn require_san(&self) -> Result<()> {
        if self.san_dns.is_empty() {
            return Err(EnrollError::NoSanEntries);
        }
        Ok(())
    }

    /// Build the SAN attribute string the CA web form expects.
    ///
    /// `dns=<name>` tokens joined with `&`, in profile order. Empty when
    /// there are no SAN entries.
    pub fn san_attribute(&self) -> String {
        self.san_dns
            .iter()
            .map(|dns| format!("dns={dns}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}
