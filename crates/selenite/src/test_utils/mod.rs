//
// test_utils/mod.rs
//
// Shared helpers for unit tests, integration tests and benchmarks
//

pub mod fixture_workspace;
pub mod mock_project;
pub mod recording_sink;

pub use mock_project::MockProject;
pub use recording_sink::{RecordingSink, RecordingUsageSink};
