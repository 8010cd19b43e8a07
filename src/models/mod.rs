pub mod config;
pub mod error;
pub mod summary;

pub use config::{ExchangeConfig, ReportFormat};
pub use error::{ExchangeResult, KeyExchangeError};
pub use summary::{Report, Summary};
