// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for deployment operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for deployment operations.
///
/// The first failing operation aborts the whole upload; nothing is
/// retried or recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration field is missing or empty.
    /// Detected before any network attempt.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The remote host could not be reached or the connection broke down.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connecting took longer than the configured timeout.
    #[error("connection timed out: {0}")]
    Timeout(String),

    /// The server rejected the supplied identity.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The private key file could not be loaded or decrypted.
    #[error("cannot load private key: {0}")]
    Key(String),

    /// Remote directory creation failed.
    #[error("remote directory creation failed for '{path}': {reason}")]
    RemoteDir { path: String, reason: String },

    /// File content failed to transfer, either reading locally or
    /// writing remotely.
    #[error("transfer failed for '{path}': {reason}")]
    Transfer { path: String, reason: String },

    /// The local directory tree could not be listed.
    #[error("cannot traverse local path '{}': {source}", .path.display())]
    Traversal { path: PathBuf, source: io::Error },
}

impl From<russh::Error> for Error {
    fn from(err: russh::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("host is required".to_string());
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("host is required"));
    }

    #[test]
    fn test_remote_dir_error_display() {
        let err = Error::RemoteDir {
            path: "/srv/www".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/srv/www"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_traversal_error_display() {
        let err = Error::Traversal {
            path: PathBuf::from("./dist"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };
        assert!(err.to_string().contains("./dist"));
        assert!(err.to_string().contains("no such directory"));
    }
}
