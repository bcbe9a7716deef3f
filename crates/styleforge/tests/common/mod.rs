//! Shared test utilities for styleforge integration tests.
//!
//! This module provides:
//! - builders for ZIP bundles and service documents
//! - scripted fake clients standing in for the HTTP layer

pub mod builders;
pub mod fakes;

// Not every suite uses every helper.
#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use fakes::{FakeArtifactClient, FakeStageClient};
