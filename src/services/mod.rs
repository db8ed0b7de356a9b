pub mod crash;
pub mod feedback;
pub mod fingerprint;
pub mod lifecycle;
pub mod validation;

pub use crash::{validate_report, CrashService};
pub use feedback::{validate_feedback, FeedbackService};
pub use fingerprint::{compute_fingerprint, fingerprint_report, FingerprintInput};
pub use lifecycle::{parse_status, status_after_reoccurrence, LifecycleService};
