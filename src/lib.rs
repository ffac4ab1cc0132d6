//! Payhook - payment-link checkout and webhook reconciliation for Razorpay
//!
//! This library provides the core functionality for the payhook service,
//! including database operations, Razorpay API integration, the webhook
//! settlement pipeline, and API handlers.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod reconcile;
