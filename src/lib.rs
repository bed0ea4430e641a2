//! SIMaaS worker — pulls simulation tasks from an HTTP queue, drives
//! the external FMPy engine and reports time-series results back.

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod queue;
pub mod timeseries;
pub mod worker;
