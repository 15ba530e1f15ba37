//! Telemetry delivery to the remote REST store.
//!
//! - `retry`     – bounded retry with exponential backoff, typed outcome
//! - `transport` – the send seam and its HTTPS implementation
//! - `dispatch`  – bounded queue plus background sender task
//!
//! The control loop only ever touches [`TelemetryQueue`]; backoff sleeps run
//! in the sender task so they never stretch a control cycle.

mod dispatch;
mod retry;
mod transport;

pub use dispatch::{spawn_sender, TelemetryQueue};
pub use retry::{deliver, AttemptError, Delivery, RetryPolicy};
pub use transport::{HttpTransport, Response, Transport};
