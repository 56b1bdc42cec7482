//! Convergence polling: re-fetch one instance until it reports a state.

use crate::error::{Error, Result};
use procwalk_client::{ClientError, ResourceClient};
use procwalk_core::{BackoffConfig, CallContext, ResourceKey, State};
use tracing::{debug, info, warn};

/// Block until `key` reports `desired`, the attempt budget runs out, or the
/// context (narrowed by `backoff.timeout_ms`) ends.
///
/// Individual fetch failures are logged and retried; only the budget, the
/// deadline or cancellation end the wait with an error.
pub async fn wait_for_state(
    client: &dyn ResourceClient,
    ctx: &CallContext,
    key: ResourceKey,
    desired: &State,
    backoff: &BackoffConfig,
) -> Result<()> {
    let ctx = match backoff.timeout() {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx.clone(),
    };
    let policy = backoff.policy();
    let mut delay = backoff.initial_delay();
    let mut attempts: u32 = 0;

    loop {
        ctx.check()?;
        attempts += 1;

        match client.fetch_by_key(&ctx, key).await {
            Ok(instance) if instance.state.matches(desired) => {
                info!("process instance {key} reached desired state {desired}");
                return Ok(());
            }
            Ok(instance) => {
                info!("process instance {key} currently in state {}; waiting...", instance.state);
            }
            Err(ClientError::Interrupted(e)) => return Err(e.into()),
            Err(e) => {
                warn!("fetching state for {key} failed: {e} (will retry)");
            }
        }

        if backoff.max_retries > 0 && attempts >= backoff.max_retries {
            return Err(Error::RetryBudgetExhausted {
                max_retries: backoff.max_retries,
                state: desired.clone(),
                attempts,
            });
        }

        debug!("attempt {attempts} for {key}; next poll in {delay:?}");
        ctx.sleep(delay).await?;
        delay = policy.next(delay);
    }
}
