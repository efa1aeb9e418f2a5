use super::{AdminLink, InstanceConnector};
use crate::core::{AdminError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Talks to real Redis instances over RESP
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

#[async_trait]
impl InstanceConnector for RedisConnector {
    async fn connect(&self, endpoint: &str, timeout: Duration) -> Result<Box<dyn AdminLink>> {
        let unreachable = |reason: String| AdminError::Unreachable {
            endpoint: endpoint.to_string(),
            reason,
        };

        let client = redis::Client::open(format!("redis://{}/", endpoint))
            .map_err(|e| unreachable(e.to_string()))?;
        let conn = bounded(timeout, client.get_multiplexed_tokio_connection())
            .await
            .map_err(unreachable)?;

        debug!(endpoint, "connected");
        Ok(Box::new(RedisLink {
            endpoint: endpoint.to_string(),
            conn,
            timeout,
        }))
    }
}

struct RedisLink {
    endpoint: String,
    conn: MultiplexedConnection,
    timeout: Duration,
}

#[async_trait]
impl AdminLink for RedisLink {
    async fn authenticate(&mut self, credential: &str) -> Result<()> {
        let mut cmd = redis::cmd("AUTH");
        cmd.arg(credential);
        bounded(self.timeout, cmd.query_async::<_, ()>(&mut self.conn))
            .await
            .map_err(|reason| AdminError::AuthFailed {
                endpoint: self.endpoint.clone(),
                reason,
            })
    }

    async fn require_password(&mut self, credential: &str) -> Result<()> {
        let mut cmd = redis::cmd("CONFIG");
        cmd.arg("SET").arg("requirepass").arg(credential);
        bounded(self.timeout, cmd.query_async::<_, ()>(&mut self.conn))
            .await
            .map_err(|reason| AdminError::ConfigRejected {
                endpoint: self.endpoint.clone(),
                reason,
            })
    }
}

/// Run a redis future under `timeout`, flattening both failure kinds to text
async fn bounded<T, F>(timeout: Duration, fut: F) -> std::result::Result<T, String>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", timeout.as_secs_f64())),
    }
}
