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

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::PublicKey;
use russh::Disconnect;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::{AuthMethod, DeployConfig};
use crate::error::{Error, Result};
use crate::mirror::Transport;

/// Client handler that accepts any server host key.
///
/// Host keys are not verified; `check_server_key` is the single place
/// to add known-hosts verification.
struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// An authenticated SSH connection with one live SFTP channel.
///
/// Created once per upload operation and released exactly once via
/// [`SshSession::disconnect`].
pub struct SshSession {
    handle: client::Handle<ClientHandler>,
    sftp: SftpSession,
    host: String,
    port: u16,
}

impl SshSession {
    /// Connect, authenticate, and open the SFTP subsystem.
    pub async fn connect(config: &DeployConfig) -> Result<Self> {
        let ssh_config = client::Config {
            inactivity_timeout: Some(Duration::from_secs(config.inactivity_timeout_secs)),
            ..Default::default()
        };

        info!(
            "Connecting to {}@{}:{}",
            config.username, config.host, config.port
        );

        let mut handle = tokio::time::timeout(
            Duration::from_secs(config.connect_timeout_secs),
            client::connect(
                Arc::new(ssh_config),
                (config.host.as_str(), config.port),
                ClientHandler,
            ),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "connection to {}:{} timed out",
                config.host, config.port
            ))
        })?
        .map_err(|e| Error::Connection(e.to_string()))?;

        Self::authenticate(&mut handle, config).await?;

        debug!("Opening SFTP subsystem");
        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| Error::Connection(format!("failed to start SFTP subsystem: {e}")))?;

        Ok(Self {
            handle,
            sftp,
            host: config.host.clone(),
            port: config.port,
        })
    }

    async fn authenticate(
        handle: &mut client::Handle<ClientHandler>,
        config: &DeployConfig,
    ) -> Result<()> {
        let authenticated = match &config.auth {
            AuthMethod::Password(password) => handle
                .authenticate_password(&config.username, password)
                .await
                .map_err(|e| Error::Authentication(e.to_string()))?,
            AuthMethod::Key { path, passphrase } => {
                let key = russh::keys::load_secret_key(path, passphrase.as_deref())
                    .map_err(|e| Error::Key(e.to_string()))?;
                let key = PrivateKeyWithHashAlg::new(Arc::new(key), None);
                handle
                    .authenticate_publickey(&config.username, key)
                    .await
                    .map_err(|e| Error::Authentication(e.to_string()))?
            }
        };

        if !authenticated.success() {
            return Err(Error::Authentication(
                "credentials rejected by server".to_string(),
            ));
        }

        debug!("Authentication successful");
        Ok(())
    }

    /// Create `path` and all missing ancestors on the remote host.
    ///
    /// Idempotent: a directory that already exists is left alone.
    pub async fn ensure_dir(&self, path: &str) -> Result<()> {
        let mut prefix = String::with_capacity(path.len());
        if path.starts_with('/') {
            prefix.push('/');
        }

        for component in path.split('/').filter(|c| !c.is_empty()) {
            if !prefix.is_empty() && !prefix.ends_with('/') {
                prefix.push('/');
            }
            prefix.push_str(component);
            self.mkdir_unless_present(&prefix).await?;
        }

        Ok(())
    }

    async fn mkdir_unless_present(&self, path: &str) -> Result<()> {
        match self.sftp.create_dir(path).await {
            Ok(()) => {
                debug!("Created remote directory {}", path);
                Ok(())
            }
            // The SFTP status for "already exists" is server-dependent;
            // a stat settles whether the failure matters.
            Err(err) => match self.sftp.metadata(path).await {
                Ok(attrs) if attrs.is_dir() => Ok(()),
                _ => Err(Error::RemoteDir {
                    path: path.to_string(),
                    reason: err.to_string(),
                }),
            },
        }
    }

    /// Copy a local file's bytes to `remote_path`, overwriting any
    /// existing remote file. The remote parent directory must already
    /// exist.
    pub async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        debug!(
            "Uploading {} to {}:{}",
            local_path.display(),
            self.host,
            remote_path
        );

        let contents = tokio::fs::read(local_path).await.map_err(|e| Error::Transfer {
            path: remote_path.to_string(),
            reason: format!("cannot read {}: {}", local_path.display(), e),
        })?;

        let mut remote_file = self
            .sftp
            .open_with_flags(
                remote_path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .map_err(|e| Error::Transfer {
                path: remote_path.to_string(),
                reason: e.to_string(),
            })?;

        remote_file
            .write_all(&contents)
            .await
            .map_err(|e| Error::Transfer {
                path: remote_path.to_string(),
                reason: e.to_string(),
            })?;
        remote_file.flush().await.map_err(|e| Error::Transfer {
            path: remote_path.to_string(),
            reason: e.to_string(),
        })?;
        remote_file.shutdown().await.map_err(|e| Error::Transfer {
            path: remote_path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Close the connection. Safe to call more than once and after a
    /// failed operation; errors from an already-closed connection are
    /// ignored.
    pub async fn disconnect(&self) {
        debug!("Closing SSH session to {}:{}", self.host, self.port);
        let _ = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await;
    }
}

#[async_trait]
impl Transport for SshSession {
    async fn ensure_dir(&self, path: &str) -> Result<()> {
        SshSession::ensure_dir(self, path).await
    }

    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        SshSession::upload_file(self, local_path, remote_path).await
    }

    async fn disconnect(&self) {
        SshSession::disconnect(self).await;
    }
}
