//! Enrollment form construction.
//!
//! The AD CS web enrollment page is driven by a plain HTML form POST.
//! This module assembles the exact field set that form submits, with the
//! CSR body and the template/SAN attribute block filled in.

use crate::profile::RequestProfile;

/// `Mode` field value for a new certificate request.
const MODE_NEW_REQUEST: &str = "newreq";

/// `FriendlyType` field value for a pasted/saved request.
const FRIENDLY_TYPE: &str = "Saved-Request";

/// `TargetStoreFlags` field value (no store placement).
const TARGET_STORE_FLAGS: &str = "0";

/// `SaveCert` field value (ask the server to keep the issued cert).
const SAVE_CERT: &str = "yes";

/// The form payload POSTed to the web enrollment endpoint.
///
/// Built once per submission attempt. Values are trusted local input;
/// no escaping is applied to the template name or DNS entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentForm {
    /// Request mode, always `newreq`.
    pub mode: &'static str,

    /// PEM body of the CSR.
    pub cert_request: String,

    /// Two-line attribute block: `CertificateTemplate:<template>` then
    /// `SAN:<san-attribute-string>`.
    pub cert_attrib: String,

    /// Friendly request type, always `Saved-Request`.
    pub friendly_type: &'static str,

    /// Store placement flags, always `0`.
    pub target_store_flags: &'static str,

    /// Always `yes`.
    pub save_cert: &'static str,
}

impl EnrollmentForm {
    /// Assemble the form for one submission.
    ///
    /// Pure and deterministic: identical inputs produce a byte-identical
    /// payload. An empty SAN list yields a bare trailing `SAN:` line,
    /// which the endpoint accepts.
    pub fn build(csr_pem: &str, profile: &RequestProfile, template: &str) -> Self {
        let cert_attrib = format!(
            "CertificateTemplate:{}\nSAN:{}",
            template,
            profile.san_attribute()
        );

        Self {
            mode: MODE_NEW_REQUEST,
            cert_request: csr_pem.to_string(),
            cert_attrib,
            friendly_type: FRIENDLY_TYPE,
            target_store_flags: TARGET_STORE_FLAGS,
            save_cert: SAVE_CERT,
        }
    }

    /// The form fields as name/value pairs, named exactly as the web
    /// enrollment page names them.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("Mode", self.mode),
            ("CertRequest", &self.cert_request),
            ("CertAttrib", &self.cert_attrib),
            ("FriendlyType", self.friendly_type),
            ("TargetStoreFlags", self.target_store_flags),
            ("SaveCert", self.save_cert),
        ]
    }
}
