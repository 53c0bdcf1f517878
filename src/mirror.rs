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

//! Tree mirroring: replicate a local directory tree onto the remote
//! host through a live transport session.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Primitives a mirror walk needs from a remote session.
///
/// [`crate::SshSession`] is the SFTP-backed implementation; tests drive
/// the walk with an in-memory recording fake.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Create `path` and any missing ancestors. Must not fail if the
    /// directory already exists.
    async fn ensure_dir(&self, path: &str) -> Result<()>;

    /// Copy the local file's bytes to `remote_path`, overwriting any
    /// existing remote file. The remote parent directory must already
    /// exist; that is the caller's contract.
    async fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    /// Idempotent teardown. Never fails; safe to call on an already
    /// closed connection.
    async fn disconnect(&self);
}

enum EntryKind {
    Directory,
    File,
}

struct WalkEntry {
    local: PathBuf,
    remote: String,
    kind: EntryKind,
}

/// Join a remote path and an entry name with `/`, independent of the
/// host platform's native separator.
fn join_remote(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

fn traversal(path: &Path, source: io::Error) -> Error {
    Error::Traversal {
        path: path.to_path_buf(),
        source,
    }
}

/// List the entries directly under `dir`, in the order the filesystem
/// returns them, paired with their remote counterpart paths.
///
/// Entry types are read without following symlinks, so anything that is
/// neither a directory nor a regular file (symlink, fifo, socket,
/// device) is dropped here and never reaches the transport.
async fn list_dir(dir: &Path, remote: &str) -> Result<Vec<WalkEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| traversal(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(|e| traversal(dir, e))? {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| traversal(&entry.path(), e))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            debug!("Skipping special entry {:?}", entry.path());
            continue;
        };

        entries.push(WalkEntry {
            local: entry.path(),
            remote: join_remote(remote, &name),
            kind,
        });
    }

    Ok(entries)
}

/// Replicate the tree under `local_root` onto the remote host at
/// `remote_root`.
///
/// The walk is strict pre-order, depth-first, left-to-right: a
/// directory's remote counterpart is created before any of its
/// descendants are uploaded and its whole subtree is finished before a
/// later sibling is touched. Within one directory, entries are
/// processed in listing order; no sort is imposed.
///
/// The first failing call aborts the walk. The transport is not
/// released here; [`crate::deploy::mirror_and_disconnect`] owns that.
pub async fn mirror<T: Transport + ?Sized>(
    transport: &T,
    local_root: &Path,
    remote_root: &str,
) -> Result<()> {
    let metadata = tokio::fs::metadata(local_root)
        .await
        .map_err(|e| traversal(local_root, e))?;
    if !metadata.is_dir() {
        return Err(traversal(
            local_root,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "local root is not a directory",
            ),
        ));
    }

    info!(
        "Mirroring {} to remote {}",
        local_root.display(),
        remote_root
    );

    // The remote root itself may not exist yet; everything below it is
    // created as the walk encounters it.
    transport.ensure_dir(remote_root).await?;

    // Explicit stack of per-directory entry iterators; each frame is a
    // directory whose remote counterpart already exists.
    let mut stack = vec![list_dir(local_root, remote_root).await?.into_iter()];

    while let Some(frame) = stack.last_mut() {
        let next = frame.next();
        match next {
            None => {
                stack.pop();
            }
            Some(entry) => match entry.kind {
                EntryKind::Directory => {
                    transport.ensure_dir(&entry.remote).await?;
                    stack.push(list_dir(&entry.local, &entry.remote).await?.into_iter());
                }
                EntryKind::File => {
                    debug!("Uploading {} -> {}", entry.local.display(), entry.remote);
                    transport.upload_file(&entry.local, &entry.remote).await?;
                }
            },
        }
    }

    info!("Mirror of {} complete", local_root.display());
    Ok(())
}
