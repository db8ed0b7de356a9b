//! Crash fingerprinting.
//!
//! A fingerprint is the SHA-256 of the report's identity fields: app id,
//! platform, title, reason and the raw stack trace text. Version, build, OS,
//! device and user are deliberately left out so the same fault reported from
//! different releases or devices lands on one aggregate.
//!
//! This is an approximation of fault identity, not an exact one. Stack traces
//! are compared as raw text (no symbolication), so address or line-number
//! noise splits one fault into several aggregates, and two distinct faults
//! with identical title, reason and trace text are merged.

use sha2::{Digest, Sha256};

use crate::models::CrashReport;

/// Separator placed between length-prefixed fields
const FIELD_SEPARATOR: &str = "|";

/// Length of a hex-encoded fingerprint
pub const FINGERPRINT_LEN: usize = 64;

/// The fields that define a crash's identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintInput<'a> {
    pub app_id: &'a str,
    pub platform: &'a str,
    pub title: &'a str,
    pub reason: &'a str,
    pub stack_trace: &'a str,
}

impl<'a> FingerprintInput<'a> {
    /// Identity fields of a report, with absent values read as empty strings
    pub fn from_report(report: &'a CrashReport) -> Self {
        Self {
            app_id: report.app_id.as_deref().unwrap_or(""),
            platform: report.platform.as_deref().unwrap_or(""),
            title: report.title.as_deref().unwrap_or(""),
            reason: report.reason.as_deref().unwrap_or(""),
            stack_trace: report.stack_trace.as_deref().unwrap_or(""),
        }
    }

    fn fields(&self) -> [&'a str; 5] {
        [
            self.app_id,
            self.platform,
            self.title,
            self.reason,
            self.stack_trace,
        ]
    }
}

/// Builds the canonical string that is hashed.
///
/// Each field is written as `<byte length>:<value>`, so no choice of field
/// contents can shift a boundary between two fields.
pub fn canonical_form(input: &FingerprintInput<'_>) -> String {
    input
        .fields()
        .iter()
        .map(|field| format!("{}:{}", field.len(), field))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Computes the lowercase hex SHA-256 fingerprint
pub fn compute_fingerprint(input: &FingerprintInput<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(input).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of a report's identity fields
pub fn fingerprint_report(report: &CrashReport) -> String {
    compute_fingerprint(&FingerprintInput::from_report(report))
}
