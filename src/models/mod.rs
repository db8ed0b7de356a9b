pub mod crash;
pub mod feedback;

pub use crash::{
    CrashAggregate, CrashListResponse, CrashReport, CrashStatus, IngestOutcome, ListPendingQuery,
    UnknownStatus, UpdateCrashStatus,
};
pub use feedback::{Feedback, FeedbackCreated, SubmitFeedback};
