use async_trait::async_trait;
use tracing::trace;

use crate::crd::service_ca::ServiceCA;

use super::{ReconcileErr, into_internal, try_once::TryOnce};

/// One idempotent sync step per managed resource. Each step returns whether
/// it changed live state so the sequencer can thread the redeploy cascade.
/// Implementations must be safe to re-invoke with the same desired state.
#[async_trait]
pub trait ResourceSync {
    /// Sync the controller namespace and its static supporting resources.
    async fn sync_namespace(&self) -> Result<bool, ReconcileErr>;

    /// Remove resources left behind by earlier releases. Gated by [`TryOnce`]
    /// in the sequencer; missing resources are not an error.
    async fn cleanup_deprecated(&self) -> Result<(), ReconcileErr>;

    /// Sync the remaining controller-managed resources. Must apply
    /// unconditionally when `force` is set.
    async fn sync_controller_resources(
        &self,
        force: bool,
    ) -> Result<bool, ReconcileErr>;

    /// Regenerate the signing CA when it is missing or when the opaque
    /// override payload requests it.
    async fn sync_signing_ca(
        &self,
        overrides: &[u8],
    ) -> Result<bool, ReconcileErr>;

    /// Refresh the published CA bundle. Must refresh when `ca_modified` or
    /// when the published copy no longer matches the signing certificate.
    async fn sync_ca_bundle(
        &self,
        ca_modified: bool,
    ) -> Result<bool, ReconcileErr>;

    /// Sync the controller deployment. Must re-apply unconditionally when
    /// `force` is set, even if the rendered spec is byte-identical.
    async fn sync_deployment(
        &self,
        config: &ServiceCA,
        force: bool,
    ) -> Result<bool, ReconcileErr>;
}

/// Run the fixed chain of resource-sync steps once.
///
/// Any modification upstream trickles down and force-redeploys everything
/// after it, even when a later resource looks unchanged in isolation. The
/// first error aborts the chain and is returned unchanged; the next
/// reconcile starts over from the top.
pub async fn sync_managed_resources<S: ResourceSync>(
    syncer: &S,
    cleanup_once: &TryOnce,
    config: &ServiceCA,
) -> Result<(), ReconcileErr> {
    // The override payload stays opaque here; only the signer step reads it.
    let overrides = config.spec.override_bytes().map_err(into_internal)?;

    // Sync the controller namespace and the static supporting resources.
    // These should be mostly static.
    let ns_modified = syncer.sync_namespace().await?;

    // Remove resources from previous releases at most once per process.
    // The guard only latches on success, so a transient failure here is
    // retried on the next reconcile.
    cleanup_once
        .run_once(|| syncer.cleanup_deprecated())
        .await?;

    let resources_modified =
        syncer.sync_controller_resources(ns_modified).await?;
    let needs_redeploy = ns_modified || resources_modified;

    // Sync the CA (regenerate if missing or requested via overrides). This
    // runs on its own trigger, independent of the cascade above.
    let ca_modified = syncer.sync_signing_ca(&overrides).await?;

    // Sync the CA bundle. This will be updated if the CA has changed.
    let _ = syncer.sync_ca_bundle(ca_modified).await?;

    // Sync the controller deployment.
    let _ = syncer
        .sync_deployment(config, needs_redeploy || ca_modified)
        .await?;

    trace!("synced all controller resources");
    Ok(())
}
