//! Shared fakes and builders for the service integration tests

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

/// Initialize a test subscriber; safe to call from every test
pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

// vim: ts=4
