// Shared test utilities

pub mod mock_server;
pub mod tracing;
