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

//! AD CS Web Enrollment Command-Line Tool
//!
//! Obtains a signed TLS certificate from a Microsoft AD CS web enrollment
//! endpoint, given an OpenSSL request configuration and (optionally) a
//! pre-generated CSR.
//!
//! # Usage
//!
//! ```text
//! certsrv-enroll [OPTIONS] --server <URL> <CONFIG> [CSR]
//!
//! Arguments:
//!   <CONFIG>  Path to the OpenSSL request configuration file
//!   [CSR]     Path to an existing CSR (generated via openssl when omitted)
//!
//! Options:
//!   -s, --server <URL>        Web enrollment form handler URL
//!   -t, --template <NAME>     Certificate template [default: WebServer2]
//!   -o, --output <PATH>       Output file (default: <common-name>.crt)
//!       --reqexts <SECTION>   Request-extension section for openssl [default: req_ext]
//!       --timeout <SECONDS>   HTTP timeout [default: 30]
//!       --verify-tls          Verify the CA server's TLS certificate
//!   -v, --verbose             Enable verbose output
//!   -q, --quiet               Suppress non-error output
//!   -h, --help                Print help
//!   -V, --version             Print version
//! ```
//!
//! # Example
//!
//! ```bash
//! certsrv-enroll --server https://ca.example.com/certsrv/certfnsh.asp request.cfg
//! ```
//!
//! Username and password are prompted interactively; they are never taken
//! from the command line or the environment.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use certsrv_client::{
    CertsrvClient, CertsrvClientConfig, CredentialProvider, CsrGenerator, EnrollmentForm,
    PromptProvider, RequestProfile, DEFAULT_TEMPLATE,
};

/// AD CS Web Enrollment Command-Line Tool
#[derive(Parser)]
#[command(name = "certsrv-enroll")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Certificate enrollment via AD CS web enrollment (certsrv)", long_about = None)]
struct Cli {
    /// Path to the OpenSSL request configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to an existing CSR (generated via openssl when omitted)
    #[arg(value_name = "CSR")]
    csr: Option<PathBuf>,

    /// Web enrollment form handler URL
    /// (e.g. https://ca.example.com/certsrv/certfnsh.asp)
    #[arg(short, long, value_name = "URL")]
    server: String,

    /// Certificate template to request
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Output file (default: <common-name>.crt)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Request-extension section passed to openssl -reqexts
    #[arg(long, value_name = "SECTION", default_value = certsrv_client::keygen::DEFAULT_REQEXTS_SECTION)]
    reqexts: String,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value = "30")]
    timeout: u64,

    /// Verify the CA server's TLS certificate
    #[arg(long)]
    verify_tls: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Create runtime for async operations
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Parse the request configuration
    let profile = RequestProfile::from_file(&cli.config)?;

    if !cli.quiet {
        println!("Common Name: {}", profile.common_name);
        println!("DNS names:   {:?}", profile.san_dns);
    }

    if profile.san_dns.is_empty() {
        tracing::warn!(
            "No DNS entries found in [alt_names]; submitting with an empty SAN attribute"
        );
    }

    // Locate or generate the CSR
    let csr_path = match cli.csr {
        Some(path) => path,
        None => {
            let key_path = cli.config.with_extension("key");
            let csr_path = cli.config.with_extension("csr");

            if !cli.quiet {
                println!("Generating 4096-bit RSA key and CSR...");
            }

            CsrGenerator::new()
                .with_reqexts(&cli.reqexts)
                .generate(&cli.config, &key_path, &csr_path)
                .await?;

            csr_path
        }
    };

    let csr = std::fs::read_to_string(&csr_path)
        .map_err(|e| format!("Failed to read CSR {}: {e}", csr_path.display()))?;

    // Build the enrollment form and client
    let form = EnrollmentForm::build(&csr, &profile, &cli.template);

    let config = CertsrvClientConfig::builder()
        .server_url(&cli.server)?
        .template(&cli.template)
        .timeout(Duration::from_secs(cli.timeout))
        .verify_tls(cli.verify_tls)
        .build()?;

    let client = CertsrvClient::new(config)?;

    // Credentials are prompted, used for the two HTTP calls, and dropped.
    let credentials = PromptProvider.credentials()?;

    if !cli.quiet {
        println!("Submitting certificate request to {}...", cli.server);
    }

    let cert = client.enroll(&form, &credentials).await?;

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.crt", profile.common_name)));
    std::fs::write(&output, &cert)
        .map_err(|e| format!("Failed to write {}: {e}", output.display()))?;

    if !cli.quiet {
        println!("Certificate downloaded and saved as {}", output.display());
    }

    Ok(())
}
