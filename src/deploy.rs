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

//! Entry point for one upload operation.

use std::path::Path;

use tracing::info;

use crate::config::DeployConfig;
use crate::error::Result;
use crate::mirror::{mirror, Transport};
use crate::sftp::SshSession;

/// Upload the configured local directory tree to the remote host.
///
/// Invoked once per build, after the local tree is finalized. The
/// configuration is validated before any network call; the session is
/// released on every exit path. The first error encountered aborts the
/// upload and propagates to the caller.
pub async fn deploy(config: &DeployConfig) -> Result<()> {
    config.validate()?;

    let local_root = config.local_root();
    let session = SshSession::connect(config).await?;
    info!("Connected to {}:{}", config.host, config.port);

    mirror_and_disconnect(&session, &local_root, &config.remote_dir).await
}

/// Run the mirror walk and release the transport afterwards, on success
/// and on failure alike. This is the operation's single finalization
/// point; [`Transport::disconnect`] is infallible, so the walk's
/// outcome is returned unchanged.
pub async fn mirror_and_disconnect<T: Transport + ?Sized>(
    transport: &T,
    local_root: &Path,
    remote_root: &str,
) -> Result<()> {
    let outcome = mirror(transport, local_root, remote_root).await;
    transport.disconnect().await;
    outcome
}
