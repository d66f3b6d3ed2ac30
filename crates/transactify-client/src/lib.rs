pub mod commands;
pub mod config;
pub mod contracts;
pub mod discovery;
pub mod error;
pub mod excel;
pub mod hashing;
pub mod output;
pub mod qfx;
pub mod status;

pub use contracts::envelope::{CommandData, FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};
pub use status::{CollectingReporter, ConsoleReporter, SilentReporter, StatusReporter};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
