pub mod events;
pub mod reconcile;
pub mod sync;
pub mod try_once;

#[cfg(test)]
mod try_once_tests;

use std::sync::Arc;

use futures_util::StreamExt;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{
    Client,
    api::Api,
    runtime::{
        Controller,
        controller::Action,
        events::{Recorder, Reporter},
        watcher::Config,
    },
};
use tokio::time::Duration;
use tracing::{error, info};

use crate::config::OperatorConfig;
use crate::crd::service_ca::ServiceCA;

use self::try_once::TryOnce;

/// Field manager for server-side apply and the Event reporter name.
pub const FIELD_MANAGER: &str = "svcca-operator";

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("kube api error: {0}")]
    Kube(#[from] kube::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub(crate) fn into_internal<E: std::fmt::Display>(e: E) -> ReconcileErr {
    ReconcileErr::Internal(e.to_string())
}

#[derive(Clone)]
pub struct ControllerContext {
    pub client: Client,
    pub cfg: OperatorConfig,
    pub recorder: Recorder,
    /// Deprecated-resource cleanup runs at most once per process. The guard
    /// lives here so every reconcile shares the same instance.
    pub cleanup_once: Arc<TryOnce>,
}

pub fn build_obj_ref(name: &str, uid: Option<&str>) -> ObjectReference {
    ObjectReference {
        api_version: Some("operator.svcca.dev/v1alpha1".into()),
        kind: Some("ServiceCA".into()),
        name: Some(name.to_string()),
        uid: uid.map(|u| u.to_string()),
        ..Default::default()
    }
}

pub async fn run_controller(
    client: Client,
    cfg: OperatorConfig,
) -> anyhow::Result<()> {
    let api: Api<ServiceCA> = Api::all(client.clone());
    let reporter = Reporter {
        controller: FIELD_MANAGER.into(),
        instance: None,
    };
    let recorder = Recorder::new(client.clone(), reporter);
    let ctx = Arc::new(ControllerContext {
        client,
        cfg,
        recorder,
        cleanup_once: Arc::new(TryOnce::new()),
    });

    Controller::new(api, Config::default())
        .run(reconcile::reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((_obj_ref, action)) => {
                    info!("reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    Ok(())
}

fn error_policy(
    _obj: Arc<ServiceCA>,
    _error: &ReconcileErr,
    ctx: Arc<ControllerContext>,
) -> Action {
    Action::requeue(Duration::from_secs(ctx.cfg.retry_interval_secs))
}
