//! A GitHub issues browser built on the GitHub GraphQL API.
//!
//! The core lives in three pieces: a normalized, identifier-keyed query
//! cache with per-field merge policies for paginated results ([`cache`]),
//! a debounce coordinator for settling rapidly changing filter input
//! ([`debounce`]), and per-query coordinators that bridge filter state and
//! pagination to the GraphQL client ([`search`], [`detail`]). The `ghi`
//! binary is a thin presentation layer over those.

pub mod cache;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod filters;
pub mod output;
pub mod search;
pub mod types;
