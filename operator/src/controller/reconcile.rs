use std::sync::Arc;

use chrono::Utc;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use serde_json::json;
use tokio::time::Duration;
use tracing::{debug, instrument, trace};

use crate::crd::service_ca::{
    Condition, ConditionStatus, ConditionType, ServiceCA, ServiceCAStatus,
};
use crate::resources::KubeResourceSync;

use super::events::{REASON_SYNCED, emit_event};
use super::sync::sync_managed_resources;
use super::{ControllerContext, ReconcileErr, build_obj_ref};

#[instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn reconcile(
    obj: Arc<ServiceCA>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    let name = obj.name_any();
    let uid = obj.meta().uid.clone();

    if obj.meta().deletion_timestamp.is_some() {
        // Managed resources are left for the uninstall flow to tear down.
        return Ok(Action::await_change());
    }

    if is_unmanaged(&obj) {
        debug!(%name, "reconcile: managementState is not Managed; skipping");
        return Ok(Action::await_change());
    }

    let obj_ref = build_obj_ref(&name, uid.as_deref());
    let syncer = KubeResourceSync::new(
        ctx.client.clone(),
        ctx.recorder.clone(),
        ctx.cfg.clone(),
        obj_ref.clone(),
    );
    sync_managed_resources(&syncer, &ctx.cleanup_once, &obj).await?;

    emit_event(
        &ctx.recorder,
        &obj_ref,
        REASON_SYNCED,
        "Sync",
        Some(format!("Synced all managed resources for {}", name)),
    )
    .await;

    // Update status (observedGeneration, phase); skip timestamp-only churn.
    let now = Utc::now().to_rfc3339();
    let desired = ServiceCAStatus {
        phase: Some("available".into()),
        message: Some("Managed resources synced".into()),
        observed_generation: obj.meta().generation,
        last_updated: Some(now.clone()),
        conditions: Some(vec![Condition {
            type_: ConditionType::Available,
            status: ConditionStatus::True,
            reason: Some("SyncSuccessful".into()),
            message: Some("All managed resources synced".into()),
            last_transition_time: Some(now),
        }]),
    };
    if should_patch_status(obj.status.as_ref(), &desired) {
        let api: Api<ServiceCA> = Api::all(ctx.client.clone());
        let status = json!({ "status": desired });
        let _ = api
            .patch_status(
                &name,
                &PatchParams::default(),
                &Patch::Merge(&status),
            )
            .await?;
    } else {
        trace!(%name, "reconcile: status unchanged; skipping patch");
    }

    Ok(Action::requeue(Duration::from_secs(
        ctx.cfg.resync_interval_secs,
    )))
}

fn is_unmanaged(obj: &ServiceCA) -> bool {
    obj.spec
        .management_state
        .as_deref()
        .map(|s| !s.eq_ignore_ascii_case("managed"))
        .unwrap_or(false)
}

/// Compare statuses ignoring fields that change on every pass
/// (lastUpdated, lastTransitionTime) to avoid infinite reconcile loops.
fn should_patch_status(
    current: Option<&ServiceCAStatus>,
    desired: &ServiceCAStatus,
) -> bool {
    match current {
        None => true,
        Some(cur) => normalize_status(cur) != normalize_status(desired),
    }
}

fn normalize_status(s: &ServiceCAStatus) -> ServiceCAStatus {
    let mut v = s.clone();
    v.last_updated = None;
    if let Some(ref mut conds) = v.conditions {
        for c in conds.iter_mut() {
            c.last_transition_time = None;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(phase: &str, ts: &str) -> ServiceCAStatus {
        ServiceCAStatus {
            phase: Some(phase.into()),
            message: Some("Managed resources synced".into()),
            observed_generation: Some(2),
            last_updated: Some(ts.into()),
            conditions: Some(vec![Condition {
                type_: ConditionType::Available,
                status: ConditionStatus::True,
                reason: Some("SyncSuccessful".into()),
                message: None,
                last_transition_time: Some(ts.into()),
            }]),
        }
    }

    #[test]
    fn timestamp_only_changes_do_not_patch() {
        let cur = status("available", "2026-01-01T00:00:00Z");
        let des = status("available", "2026-01-02T00:00:00Z");
        assert!(!should_patch_status(Some(&cur), &des));
    }

    #[test]
    fn phase_change_patches() {
        let cur = status("progressing", "2026-01-01T00:00:00Z");
        let des = status("available", "2026-01-01T00:00:00Z");
        assert!(should_patch_status(Some(&cur), &des));
    }

    #[test]
    fn missing_status_patches() {
        let des = status("available", "2026-01-01T00:00:00Z");
        assert!(should_patch_status(None, &des));
    }
}
