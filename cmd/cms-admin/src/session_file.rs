//! The signed-in session, kept on disk between runs.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use domains::Session;

pub async fn load(path: &Path) -> anyhow::Result<Option<Session>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable session file");
                Ok(None)
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

/// Writes the session, or removes the file when there is none.
pub async fn store(path: &Path, session: Option<&Session>) -> anyhow::Result<()> {
    match session {
        Some(session) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            let bytes = serde_json::to_vec_pretty(session)?;
            tokio::fs::write(path, bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))
        }
        None => match tokio::fs::remove_file(path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                Err(err).with_context(|| format!("removing {}", path.display()))
            }
            _ => Ok(()),
        },
    }
}
