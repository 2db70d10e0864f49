//! A small Rust client for the Vena ETL API.
//!
//! This crate implements a `vepi`-style flow: import tabular data into an
//! ETL template, export intersection data from a model, query dimension
//! hierarchies, and drive asynchronous jobs (create, submit, poll until a
//! terminal status, cancel). All I/O is synchronous and blocking; run the
//! client on your own thread if you need concurrency.
//!
//! ## Quick start
//! - Configure credentials via environment variables (`VENA_HUB`,
//!   `VENA_API_USER`, `VENA_API_KEY`, `VENA_TEMPLATE_ID`, `VENA_MODEL_ID`)
//!   or a `.venarc` file (supported in the current directory and in your
//!   home directory), or pass a [`ClientConfig`] explicitly.
//! - Import a [`Frame`] and wait for the job, or run a template job.
//!
//! ```no_run
//! use std::time::Duration;
//! use vepi::{Client, Frame};
//!
//! fn main() -> vepi::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let frame = Frame::from_columns([
//!         ("Account", vec!["4000".to_string(), "4100".to_string()]),
//!         ("Period", vec!["2024-01".to_string(), "2024-01".to_string()]),
//!         ("Amount", vec!["1000".to_string(), "2000".to_string()]),
//!     ])?;
//!     let job = client.import_frame(
//!         &frame,
//!         Duration::from_secs(5),
//!         Duration::from_secs(3600),
//!     )?;
//!     println!("import finished with status {}", job.status);
//!
//!     let exported = client.export_data(None)?;
//!     println!("exported {} record(s)", exported.num_rows());
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

// `forbid` cannot be relaxed locally, and one unit test needs `unsafe`
// for `std::env::set_var` (unsafe in edition 2024); tests use `deny`
// with a targeted allow instead.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

mod client;
mod config;
mod error;
mod export;
mod frame;
mod hierarchy;
mod jobs;
mod util;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use frame::{Frame, ImportInput};
pub use hierarchy::DimensionMember;
pub use jobs::{ImportReceipt, Job, JobStatus};
