//! Orphan-parent detection

use crate::error::{Error, Result};
use procwalk_client::ResourceClient;
use procwalk_core::{CallContext, ProcessInstance};
use tracing::debug;

/// Children whose parent key no longer resolves. Roots are never orphans;
/// any failure other than "not found" aborts the filter.
pub async fn filter_orphan_parents(
    client: &dyn ResourceClient,
    ctx: &CallContext,
    items: Vec<ProcessInstance>,
) -> Result<Vec<ProcessInstance>> {
    let mut orphans = Vec::new();
    for item in items {
        ctx.check()?;
        let Some(parent) = item.parent() else { continue };
        match client.fetch_by_key(ctx, parent).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!("{} has missing parent {parent}", item.key);
                orphans.push(item);
            }
            Err(source) => return Err(Error::Fetch { key: parent, source }),
        }
    }
    Ok(orphans)
}
