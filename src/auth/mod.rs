pub mod extractors;

pub use extractors::{ApiKeyAuth, API_KEY_HEADER};
