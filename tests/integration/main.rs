//! Integration tests for the sitemap harvester
//!
//! These tests use wiremock to serve robots.txt and sitemap documents and
//! run the full discovery → resolution → persistence cycle end-to-end.

mod common;
mod discovery_tests;
mod harvest_tests;
mod retry_tests;
mod storage_tests;
