use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::application::RuntimeConfig;
use crate::fs::SharedFs;
use crate::fs::TreeEngine;
use crate::shell::Session;
use crate::snapshot::SnapshotError;
use crate::snapshot::SnapshotStore;
use crate::snapshot::codec;

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        let store = SnapshotStore::new(config.state_file);

        let engine = match store.load().await {
            Ok(Some(engine)) => {
                info!("State loaded from {}", store.path().display());
                engine
            }
            Ok(None) => {
                debug!("Starting with an empty tree");
                TreeEngine::new()
            }
            Err(e) => {
                // Matches the original behavior: an unreadable snapshot is
                // reported and the session starts fresh.
                warn!(
                    "Ignoring unreadable snapshot at {}: {e}",
                    store.path().display()
                );
                TreeEngine::new()
            }
        };

        let fs = SharedFs::new(engine);
        Session::new(fs.clone(), store.clone()).run().await;

        let blob = fs.with_engine(codec::encode).context(FinalSaveSnafu)?;
        store.save(blob).await.context(FinalSaveSnafu)?;
        info!("State saved to {}", store.path().display());

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Failed to persist the file system on shutdown"))]
    FinalSaveError { source: SnapshotError },
}
