use anyhow::{Context, Result, bail};
use rand::Rng;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::FragmentWorkerConfig;
use crate::scoring::similarity::mean_rating;
use crate::wire::codec::{read_message, write_message};
use crate::wire::types::WireMessage;

/// Pull-mode worker: fetches fragments from the coordinator and returns their mean rating.
pub struct FragmentWorker {
    config: FragmentWorkerConfig,
}

impl FragmentWorker {
    pub fn new(config: FragmentWorkerConfig) -> Self {
        Self { config }
    }

    /// Runs sessions forever, pausing `retry` (plus jitter) between them.
    pub async fn run(&self) {
        loop {
            match self.run_session().await {
                Ok(processed) => {
                    tracing::info!("Session finished after {} fragments", processed)
                }
                Err(e) => {
                    tracing::warn!("Session with {} failed: {:#}", self.config.coordinator, e)
                }
            }
            tokio::time::sleep(self.backoff()).await;
        }
    }

    /// One connection: pull fragments until the coordinator sends `Fin`.
    pub async fn run_session(&self) -> Result<usize> {
        let coordinator = &self.config.coordinator;
        let connect = TcpStream::connect(coordinator);
        let mut stream = tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .with_context(|| format!("connecting to {} timed out", coordinator))?
            .with_context(|| format!("failed to connect to {}", coordinator))?;
        tracing::info!("Connected to coordinator {}", coordinator);

        let mut processed = 0;
        loop {
            write_message(&mut stream, &WireMessage::Pull).await?;

            let message = tokio::time::timeout(self.config.idle_timeout, read_message(&mut stream))
                .await
                .context("timed out waiting for work")??;

            match message {
                WireMessage::Fragment(fragment) => {
                    let value = mean_rating(&fragment.records);
                    tracing::debug!(
                        "Fragment {}: {} records, mean {:.4}",
                        fragment.id,
                        fragment.records.len(),
                        value
                    );
                    write_message(
                        &mut stream,
                        &WireMessage::FragmentResult {
                            fragment_id: fragment.id,
                            value,
                        },
                    )
                    .await?;
                    processed += 1;
                }
                WireMessage::Fin => return Ok(processed),
                other => bail!("unexpected {} from coordinator", other.kind()),
            }
        }
    }

    fn backoff(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..250);
        self.config.retry + Duration::from_millis(jitter)
    }
}
