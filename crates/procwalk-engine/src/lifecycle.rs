//! Cancel and delete flows built on the poller

use crate::error::{Error, Result};
use crate::poller::wait_for_state;
use procwalk_client::{ClientError, ResourceClient};
use procwalk_core::{BackoffConfig, CallContext, ChangeStatus, ResourceKey, State};
use tracing::info;

/// Cancel `key` and wait until the engine reports it as canceled.
pub async fn cancel_and_wait(
    client: &dyn ResourceClient,
    ctx: &CallContext,
    key: ResourceKey,
    backoff: &BackoffConfig,
) -> Result<()> {
    client
        .cancel(ctx, key)
        .await
        .map_err(|source| Error::Cancel { key, source })?;
    info!("waiting for process instance with key {key} to be cancelled by workflow engine...");
    wait_for_state(client, ctx, key, &State::Canceled, backoff)
        .await
        .map_err(|e| Error::AwaitState {
            key,
            state: State::Canceled,
            source: Box::new(e),
        })
}

/// Delete `key`; an instance that is still running is cancelled first and
/// the delete retried once it has converged to canceled.
pub async fn delete_with_cancel(
    client: &dyn ResourceClient,
    ctx: &CallContext,
    key: ResourceKey,
    backoff: &BackoffConfig,
) -> Result<ChangeStatus> {
    match client.delete(ctx, key).await {
        Ok(status) => Ok(status),
        Err(ClientError::WrongState { .. }) => {
            info!("process instance with key {key} not in state COMPLETED or CANCELED, cancelling it first...");
            cancel_and_wait(client, ctx, key, backoff).await?;
            client
                .delete(ctx, key)
                .await
                .map_err(|source| Error::Delete { key, source })
        }
        Err(source) => Err(Error::Delete { key, source }),
    }
}
