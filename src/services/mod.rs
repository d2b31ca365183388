pub mod projects;

#[cfg(feature = "runtime")]
pub mod log_dirs;
#[cfg(feature = "runtime")]
pub mod tracing_setup;
