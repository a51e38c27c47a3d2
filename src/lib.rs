//! Data-reshaping helpers for evaluating power-market model results.
//!
//! The crate turns the raw decision-variable dumps of an investment and
//! dispatch optimization model into tables suitable for validation against
//! historical reference data. The main pipeline re-labels solver edge
//! variables into canonical unit identifiers ([`relabel`]), then groups and
//! sums them by energy carrier and/or technology ([`aggregate`]). Further
//! helpers reshape time series to a target frequency ([`timeseries`]) and
//! score model output against historical series ([`metrics`]).
//!
//! All routines are synchronous, in-memory and free of shared state; callers
//! hand in tables and receive new tables back.
pub mod aggregate;
pub mod carrier;
pub mod config;
#[cfg(test)]
pub mod fixture;
pub mod id;
pub mod input;
pub mod metrics;
pub mod relabel;
pub mod results;
pub mod timeseries;
pub mod units;
