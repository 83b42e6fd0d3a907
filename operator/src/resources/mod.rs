pub mod ca_bundle;
pub mod controller_resources;
pub mod deployment;
pub mod deprecated;
pub mod namespace;
pub mod pki;
pub mod signer;

#[cfg(test)]
mod ca_bundle_tests;
#[cfg(test)]
mod pki_tests;

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::events::Recorder;
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::OperatorConfig;
use crate::controller::sync::ResourceSync;
use crate::controller::{FIELD_MANAGER, ReconcileErr, into_internal};
use crate::crd::service_ca::ServiceCA;

/// Name shared by the controller ServiceAccount, Service and Deployment.
pub const CONTROLLER_NAME: &str = "service-ca";
/// Secret holding the signing CA key pair.
pub const SIGNING_SECRET_NAME: &str = "signing-key";
/// ConfigMap publishing the CA bundle to consumers.
pub const CA_BUNDLE_CONFIGMAP: &str = "signing-cabundle";
/// ConfigMap carrying the controller configuration.
pub const CONTROLLER_CONFIGMAP: &str = "service-ca-config";

/// Production implementation of the resource-sync steps, backed by the
/// cluster API via server-side apply.
#[derive(Clone)]
pub struct KubeResourceSync {
    pub(crate) client: Client,
    pub(crate) recorder: Recorder,
    pub(crate) cfg: OperatorConfig,
    /// The ServiceCA being reconciled; Events are recorded against it.
    pub(crate) obj_ref: ObjectReference,
}

impl KubeResourceSync {
    pub fn new(
        client: Client,
        recorder: Recorder,
        cfg: OperatorConfig,
        obj_ref: ObjectReference,
    ) -> Self {
        Self {
            client,
            recorder,
            cfg,
            obj_ref,
        }
    }
}

#[async_trait]
impl ResourceSync for KubeResourceSync {
    async fn sync_namespace(&self) -> Result<bool, ReconcileErr> {
        namespace::sync(self).await
    }

    async fn cleanup_deprecated(&self) -> Result<(), ReconcileErr> {
        deprecated::cleanup(self).await
    }

    async fn sync_controller_resources(
        &self,
        force: bool,
    ) -> Result<bool, ReconcileErr> {
        controller_resources::sync(self, force).await
    }

    async fn sync_signing_ca(
        &self,
        overrides: &[u8],
    ) -> Result<bool, ReconcileErr> {
        signer::sync(self, overrides).await
    }

    async fn sync_ca_bundle(
        &self,
        ca_modified: bool,
    ) -> Result<bool, ReconcileErr> {
        ca_bundle::sync(self, ca_modified).await
    }

    async fn sync_deployment(
        &self,
        config: &ServiceCA,
        force: bool,
    ) -> Result<bool, ReconcileErr> {
        deployment::sync(self, config, force).await
    }
}

/// Labels stamped on every managed resource.
pub(crate) fn managed_labels() -> BTreeMap<String, String> {
    [
        ("app".to_string(), CONTROLLER_NAME.to_string()),
        (
            "app.kubernetes.io/managed-by".to_string(),
            FIELD_MANAGER.to_string(),
        ),
    ]
    .into_iter()
    .collect()
}

/// Server-side apply that reports whether the live object changed. The API
/// server leaves the resourceVersion untouched for a no-op apply, so a
/// version bump (or a create) is the modification signal.
pub(crate) async fn apply_detecting_change<K>(
    api: &Api<K>,
    name: &str,
    obj: &K,
) -> Result<bool, ReconcileErr>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    let before = api
        .get_opt(name)
        .await?
        .and_then(|o| o.resource_version());
    let pp = PatchParams::apply(FIELD_MANAGER).force();
    let value = serde_json::to_value(obj).map_err(into_internal)?;
    let applied = api.patch(name, &pp, &Patch::Apply(&value)).await?;
    Ok(before != applied.resource_version())
}
