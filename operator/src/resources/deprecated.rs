use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, ServiceAccount};
use kube::api::{Api, DeleteParams};
use tracing::{info, instrument};

use crate::controller::ReconcileErr;

use super::KubeResourceSync;

/// Workloads from the release where signing, API-service injection and
/// ConfigMap injection ran as separate controllers. Superseded by the single
/// combined controller deployment.
const DEPRECATED_DEPLOYMENTS: &[&str] = &[
    "service-serving-cert-signer",
    "apiservice-cabundle-injector",
    "configmap-cabundle-injector",
];

const DEPRECATED_SERVICE_ACCOUNTS: &[&str] = &[
    "service-serving-cert-signer-sa",
    "apiservice-cabundle-injector-sa",
    "configmap-cabundle-injector-sa",
];

const DEPRECATED_CONFIGMAPS: &[&str] = &[
    "service-serving-cert-signer-config",
    "apiservice-cabundle-injector-config",
    "configmap-cabundle-injector-config",
];

const DEPRECATED_SECRETS: &[&str] = &["service-serving-cert-signer-signing-key"];

/// Delete resources owned by deprecated controllers. Missing resources are
/// fine; any other failure propagates so the guard retries next reconcile.
#[instrument(skip_all, fields(ns = %s.cfg.namespace))]
pub(crate) async fn cleanup(s: &KubeResourceSync) -> Result<(), ReconcileErr> {
    let dep_api: Api<Deployment> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    for name in DEPRECATED_DEPLOYMENTS {
        delete_ignoring_missing(&dep_api, name).await?;
    }

    let sa_api: Api<ServiceAccount> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    for name in DEPRECATED_SERVICE_ACCOUNTS {
        delete_ignoring_missing(&sa_api, name).await?;
    }

    let cm_api: Api<ConfigMap> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    for name in DEPRECATED_CONFIGMAPS {
        delete_ignoring_missing(&cm_api, name).await?;
    }

    let secret_api: Api<Secret> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    for name in DEPRECATED_SECRETS {
        delete_ignoring_missing(&secret_api, name).await?;
    }

    info!("deprecated: cleanup complete");
    Ok(())
}

async fn delete_ignoring_missing<K>(
    api: &Api<K>,
    name: &str,
) -> Result<(), ReconcileErr>
where
    K: kube::Resource
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(%name, "deprecated: deleted");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}
