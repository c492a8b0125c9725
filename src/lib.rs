//! Security Audit Report Client
//!
//! This library submits documents to the security audit analysis service,
//! tracks each analysis job until it completes, materializes the resulting
//! report into ordered sections and provides the zoom/pan/rotate engine used
//! to inspect report images.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
