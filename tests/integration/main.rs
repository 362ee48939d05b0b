//! Integration tests for Pixel-Harvest
//!
//! These tests run whole harvesting sessions against wiremock servers, with
//! a temporary directory for the images and the database.

mod crawl_tests;
mod download_tests;
mod support;
