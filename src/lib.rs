//! Council procurement backend
//!
//! Councils publish projects split into work packages, contractors bid on
//! them, and accepting a bid awards the package and places the contractor on
//! the project team.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod reporting;
pub mod repo;
pub mod routes;
pub mod services;
pub mod validation;
pub mod workflow;
