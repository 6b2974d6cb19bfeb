use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::Result;
use crate::registry::peer::{Peer, Role};

/// File-backed registry snapshot.
///
/// Each operation is one read-modify-write cycle over the whole file, run
/// under a process-local lock. Nothing coordinates writers living in other
/// processes.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot in insertion order. A missing file is an empty registry.
    pub async fn list(&self) -> Result<Vec<Peer>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// First entry holding the server role, if any.
    pub async fn find_server(&self) -> Result<Option<Peer>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|peer| peer.role == Role::Server))
    }

    /// Append an entry. Callers check port uniqueness beforehand.
    pub async fn append(&self, peer: Peer) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut peers = self.read().await?;
        peers.push(peer);
        self.write(&peers).await
    }

    /// Remove the entry with `id`. Returns `false` (and leaves the file
    /// untouched) when no such entry exists.
    pub async fn remove_by_id(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut peers = self.read().await?;
        let Some(index) = peers.iter().position(|peer| peer.id == id) else {
            return Ok(false);
        };
        peers.remove(index);
        self.write(&peers).await?;
        Ok(true)
    }

    /// Overwrite the entry with `id` in place, keeping its position.
    /// Returns `false` when no such entry exists.
    pub async fn replace(&self, id: &str, peer: Peer) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut peers = self.read().await?;
        let Some(slot) = peers.iter_mut().find(|entry| entry.id == id) else {
            return Ok(false);
        };
        *slot = peer;
        self.write(&peers).await?;
        Ok(true)
    }

    async fn read(&self) -> Result<Vec<Peer>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    // Written to a sibling file and renamed so readers in other processes
    // never see a partial snapshot.
    async fn write(&self, peers: &[Peer]) -> Result<()> {
        let json = serde_json::to_vec_pretty(peers)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::trace!(path = %self.path.display(), entries = peers.len(), "Registry written");
        Ok(())
    }
}
