//! NutriScale Library
//!
//! Calorie estimation, meal recommendation and the storage and MCP layers around them.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
