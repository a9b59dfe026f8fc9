//! Rule-definition and evaluation engine for versioned incentive
//! compensation schemes.
//!
//! A scheme is an immutable-per-version document describing tiered
//! commissions, qualification and exclusion rules, adjustment factors, and
//! custom conditional rules, all parameterized over an administrator-owned
//! KPI field catalog. The crate owns the document model, its validation,
//! the payout evaluation semantics, and the append-only versioning
//! protocol; transport and storage engines stay behind the repository
//! traits in [`versioning`] and [`catalog`].

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod scheme;
pub mod telemetry;
pub mod versioning;
