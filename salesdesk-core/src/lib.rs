//! SalesDesk Core — sales-reporting pipeline and query engine.
//!
//! This crate contains the heart of the reporting stack:
//! - Tabular loading with a TTL parquet cache
//! - Schema normalization across heterogeneous spreadsheet sources
//! - The roster join pipeline producing the unified UIT table
//! - Product-family segmentation of the ETF master
//! - The rank/pivot engine and client detail lookups
//! - Holdings summary text generation
//! - The session context tying one analyst session together

pub mod auth;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod session;

pub use config::AppConfig;
pub use session::{RankingRequest, Session, SessionError, WholesalerChannel};
