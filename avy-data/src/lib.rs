//! Processing of mapped avalanche records.
//!
//! This crate turns the dangers and problems produced by the schema mappers
//! into reconciled assessments ready for analysis: problems are attached to
//! their dangers, observation problems get the forecast danger level of
//! their region, and every problem is placed in an EAWS category.

pub mod backfill;
pub mod eaws;
pub mod reconcile;
pub mod statistics;
