/*!
 * Beekeeper Filesystem - Main Entry Point
 *
 * Brings up a storage root on the in-memory filesystem backed by a host
 * directory, records one run in it and flushes it back.
 */

use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use beekeeper_fs::{
    init_tracing, DirectoryStore, HostEnvironment, MemFS, StorageConfig, StorageManager,
    VfsError,
};

const STATE_DIR_ENV: &str = "BEEKEEPER_STATE_DIR";
const RUN_MARKER: &str = "runs";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = StorageConfig::from_env()?;
    let state_dir = std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("beekeeper-state"));

    let store = Arc::new(DirectoryStore::new(state_dir));
    info!(
        root = %config.root,
        environment = %config.environment,
        backend = %config.backend,
        state_dir = %store.root().display(),
        "Beekeeper filesystem starting"
    );

    let fs = match config.environment {
        HostEnvironment::Web => MemFS::new().with_store(config.backend, store),
        HostEnvironment::Native => MemFS::new().with_persistent_root(config.backend, store),
    };

    let manager = StorageManager::with_config(Arc::new(fs.clone()), config.clone());
    manager.init(&config.root).await?;

    let root = manager.root().unwrap_or_else(|| config.root.clone());
    let marker = format!("{}/{}", root, RUN_MARKER);

    let previous = match fs.read_file(&marker) {
        Ok(bytes) => parse_run_count(&bytes),
        Err(VfsError::NotFound(_)) => 0,
        Err(e) => return Err(e.into()),
    };
    if previous > 0 {
        info!(runs = previous, "restored previous state");
    } else {
        info!("no previous state, starting fresh");
    }

    fs.write_file(&marker, (previous + 1).to_string().as_bytes())?;
    manager.sync(false).await?;

    info!(root = %root, runs = previous + 1, "state flushed");
    Ok(())
}

/// Run count stored in the marker; an unreadable marker counts as zero
fn parse_run_count(bytes: &[u8]) -> u64 {
    let text = String::from_utf8_lossy(bytes);
    match text.trim().parse::<u64>() {
        Ok(count) => count,
        Err(e) => {
            warn!(marker = RUN_MARKER, contents = %text.trim(), error = %e, "run marker is corrupt, counting from zero");
            0
        }
    }
}
