// src/core/mod.rs

/// Hostnames, outcomes and the per-host probe result.
pub mod models;

/// The certificate prober and the concurrent scheduler around it.
pub mod scanner;

/// Typed probe failures and their mapping onto outcomes.
pub mod classifier;

/// The ordered table of report buckets, their labels and severities.
pub mod catalog;

/// Groups results into buckets and extracts the alert batch.
pub mod report;

/// Reading and normalizing the host list.
pub mod hosts;
