//! Core library: filename classification, enrichment, reconciliation and sweeping.

pub mod classifier;
pub mod config;
pub mod enrichment;
pub mod models;
pub mod pipeline;
pub mod reconciler;
pub mod scanner;
pub mod store;
pub mod sweeper;
