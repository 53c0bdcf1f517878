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

//! Deployment configuration.
//!
//! The surrounding build integration resolves and merges its own
//! options; this crate consumes an already-resolved [`DeployConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Local directory uploaded when no explicit one is configured.
pub const DEFAULT_LOCAL_DIR: &str = "./dist";

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_inactivity_timeout() -> u64 {
    300
}

/// Authentication method for the SSH connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Authenticate with a password
    Password(String),
    /// Authenticate with a private key file
    Key {
        path: PathBuf,
        #[serde(default)]
        passphrase: Option<String>,
    },
}

impl AuthMethod {
    pub fn with_password(password: &str) -> Self {
        Self::Password(password.to_string())
    }

    pub fn with_key_file<P: AsRef<Path>>(path: P, passphrase: Option<&str>) -> Self {
        Self::Key {
            path: path.as_ref().to_path_buf(),
            passphrase: passphrase.map(str::to_string),
        }
    }
}

/// Configuration for one upload operation.
///
/// Immutable for the lifetime of the operation and never persisted by
/// this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Remote host name or address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    pub auth: AuthMethod,

    /// Local directory to upload. Defaults to [`DEFAULT_LOCAL_DIR`]
    /// when unset; the surrounding build integration normally fills
    /// this in with its resolved output directory.
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// Remote directory the local tree is mirrored into.
    pub remote_dir: String,

    /// Timeout for establishing the connection, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// SSH inactivity timeout, in seconds.
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,
}

impl DeployConfig {
    pub fn new(host: &str, username: &str, auth: AuthMethod, remote_dir: &str) -> Self {
        Self {
            host: host.to_string(),
            port: default_port(),
            username: username.to_string(),
            auth,
            local_dir: None,
            remote_dir: remote_dir.to_string(),
            connect_timeout_secs: default_connect_timeout(),
            inactivity_timeout_secs: default_inactivity_timeout(),
        }
    }

    /// Check that every required field is present.
    ///
    /// Runs before any network call so that a missing credential fails
    /// fast instead of surfacing as a late connection error.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Config("username is required".to_string()));
        }
        match &self.auth {
            AuthMethod::Password(password) if password.is_empty() => {
                return Err(Error::Config("password must not be empty".to_string()));
            }
            AuthMethod::Key { path, .. } if path.as_os_str().is_empty() => {
                return Err(Error::Config("key path must not be empty".to_string()));
            }
            _ => {}
        }
        if self.remote_dir.trim().is_empty() {
            return Err(Error::Config("remote_dir is required".to_string()));
        }
        Ok(())
    }

    /// The local directory to upload, falling back to [`DEFAULT_LOCAL_DIR`].
    pub fn local_root(&self) -> PathBuf {
        self.local_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_DIR))
    }
}
