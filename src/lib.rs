//! Import/Export Trade Intelligence API Library
//!
//! This library provides the core functionality for the Trade Intelligence
//! API: a perceive -> decide -> act pipeline that turns a natural-language
//! trade question into structured intent, synthesizes partner-country trade
//! records, aggregates recommendations, and exports a spreadsheet.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `country`: Country name normalization.
//! - `errors`: Error handling types.
//! - `export`: Spreadsheet export.
//! - `handlers`: HTTP request handlers.
//! - `intent`: Query intent extraction (perceive).
//! - `models`: Core data models.
//! - `recommend`: Recommendation aggregation.
//! - `services`: External collaborator clients (OpenAI, Google Custom Search).
//! - `strategy`: Search strategy planning (decide).
//! - `synthesis`: Trade record synthesis.

pub mod config;
pub mod country;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod intent;
pub mod models;
pub mod recommend;
pub mod services;
pub mod strategy;
pub mod synthesis;
