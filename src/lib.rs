//! # Pordego (Multifactor Authentication Execution Plan Engine)
//!
//! `pordego` assembles pluggable credential validators and multifactor
//! providers into an ordered, policy-governed execution plan. Per login
//! request it decides which factors are required, which may be skipped, in
//! what order competing providers are consulted, and records which factor
//! satisfied the request.
//!
//! ## Execution Plan
//!
//! The plan is built once from an immutable configuration snapshot and is
//! read-only at request time; arbitrarily many evaluations run concurrently
//! without locking. Reload builds a complete replacement plan and publishes
//! it with a single atomic swap, so in-flight evaluations observe either the
//! old or the new plan in full, never a mix.
//!
//! ## Providers, Ranking, Bypass
//!
//! A provider bundles a credential validator with an id, a rank, a failure
//! mode, and a bypass policy. When several providers could satisfy the same
//! step-up requirement the lowest rank wins and ties break by ascending id,
//! never arbitrarily. Bypass rules are ordered, first-match-wins; a bypassed
//! factor is recorded distinctly (`bypassed:<id>`) from a verified one.
//!
//! ## Failure Modes
//!
//! Failure modes govern provider *unavailability* only: `closed` denies,
//! `open` admits the request flagged `degraded=true`, and `phantom`
//! withdraws the provider from selection. Invalid credentials and locked
//! principals always deny.

pub mod authn;
pub mod cli;
pub mod config;
pub mod mfa;
pub mod plan;
