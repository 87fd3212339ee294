//! Tradeflow
//!
//! Entity lifecycle core for an agro-commodity trading CRM/ERP: the
//! declared dependency graph between business entities, the cascade reset
//! engine built on it, workflow state machines and derived-entity rules.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod migrator;
pub mod ops;
pub mod services;

pub use errors::ServiceError;
