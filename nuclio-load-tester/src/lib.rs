//! Nuclio Load Tester Library
//!
//! Sends a fixed number of repeated POST invocations to a Nuclio function
//! endpoint from a fixed-size group of concurrent workers, printing every
//! outcome and the total wall-clock duration.

pub mod config;
pub mod driver;
pub mod error;
pub mod invoker;
pub mod origin;
pub mod output;
pub mod payload;
pub mod telemetry;
pub mod worker;

// Re-export commonly used types
pub use config::{CliArgs, LoadTestConfig};
pub use driver::{LoadTest, RunReport};
pub use error::{LoadTestError, Result};
pub use invoker::{InvocationOutcome, Invoker};
pub use origin::MockOrigin;
pub use output::{MemorySink, OutputSink, StdoutSink};
pub use payload::ConversionPayload;
pub use worker::WorkerPool;
