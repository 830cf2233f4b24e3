//! CCR Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the CCR loader workspace.
//!
//! - **Error Handling**: [`CcrError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use ccr_common::logging::{init_logging, LogConfig};
//! use ccr_common::{CcrError, Result};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     let missing: Result<()> = Err(CcrError::FileNotFound {
//!         path: "ccrs.autosomes.v2.20180420.bed".into(),
//!     });
//!     tracing::error!("{}", missing.unwrap_err());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{CcrError, Result};
