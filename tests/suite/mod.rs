//! Integration test suite modules

mod config;
mod render;
mod submission;
