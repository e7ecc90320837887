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

//! Key pair and CSR generation via the external OpenSSL tool.
//!
//! The client does not generate key material itself; it shells out to
//! `openssl req` with the same configuration document the profile was
//! parsed from. Only the exit status and the resulting CSR file matter
//! to the rest of the pipeline.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{EnrollError, Result};

/// Request-extension section passed to `-reqexts` when none is configured.
pub const DEFAULT_REQEXTS_SECTION: &str = "req_ext";

/// Wrapper around the external key/CSR generation tool.
#[derive(Debug, Clone)]
pub struct CsrGenerator {
    program: PathBuf,
    reqexts_section: String,
}

impl Default for CsrGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrGenerator {
    /// Create a generator invoking `openssl` from the search path.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("openssl"),
            reqexts_section: DEFAULT_REQEXTS_SECTION.to_string(),
        }
    }

    /// Override the tool binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Override the request-extension section name.
    pub fn with_reqexts(mut self, section: impl Into<String>) -> Self {
        self.reqexts_section = section.into();
        self
    }

    /// Generate a 4096-bit RSA key and CSR from a request configuration.
    ///
    /// Runs `openssl req -new -newkey rsa:4096 -nodes -keyout <key>
    /// -out <csr> -config <config> -reqexts <section>`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollError::ExternalTool`] when the tool exits non-zero
    /// (carrying its stderr), an I/O error when it cannot be spawned, and
    /// a configuration error when the tool succeeds but the CSR file is
    /// not readable afterwards.
    pub async fn generate(
        &self,
        config_path: &Path,
        key_path: &Path,
        csr_path: &Path,
    ) -> Result<()> {
        tracing::debug!(
            "Running {} req for {}",
            self.program.display(),
            config_path.display()
        );

        let output = Command::new(&self.program)
            .arg("req")
            .arg("-new")
            .arg("-newkey")
            .arg("rsa:4096")
            .arg("-nodes")
            .arg("-keyout")
            .arg(key_path)
            .arg("-out")
            .arg(csr_path)
            .arg("-config")
            .arg(config_path)
            .arg("-reqexts")
            .arg(&self.reqexts_section)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EnrollError::external_tool(
                output.status.code().unwrap_or(-1),
                stderr,
            ));
        }

        if std::fs::metadata(csr_path).is_err() {
            return Err(EnrollError::config(format!(
                "Key generation reported success but {} is not readable",
                csr_path.display()
            )));
        }

        Ok(())
    }
}
