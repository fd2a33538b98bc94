//! Request templates, transports and the rate-driven worker pool.
mod executor;
mod rate;
mod template;
mod transport;
mod worker;

#[cfg(test)]
mod tests;

pub use executor::RequestExecutor;
pub use rate::{FireSignal, RateScheduler};
pub use template::{BodySource, RequestTemplate};
pub use transport::{ReqwestTransport, Transport};
pub use worker::{RESULT_CHANNEL_CAPACITY, WorkerMessage, WorkerPool};
