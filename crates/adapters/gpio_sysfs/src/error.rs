//! GPIO adapter error types.

use std::path::PathBuf;

/// Errors specific to the GPIO adapter.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// Reading or writing a sysfs attribute failed.
    #[error("failed to write GPIO attribute {}", path.display())]
    Io {
        /// The attribute file involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
