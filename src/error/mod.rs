mod app;
mod assertion;
mod config;
mod http;
mod record;
mod run;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use assertion::AssertionError;
pub use config::ConfigError;
pub use http::HttpError;
pub use record::RecordError;
pub use run::RunError;
pub use validation::ValidationError;
