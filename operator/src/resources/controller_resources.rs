use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::Api;
use tracing::{debug, info, instrument};

use crate::controller::ReconcileErr;

use super::{
    CONTROLLER_CONFIGMAP, CONTROLLER_NAME, KubeResourceSync,
    apply_detecting_change, managed_labels,
};

const CLUSTER_ROLE_NAME: &str = "system:service-ca:controller";

/// Sync the remaining controller-managed resources: the controller config
/// ConfigMap and the RBAC the controller runs with. Applies are server-side
/// and unconditional, so a forced pass re-asserts ownership of every field
/// even when nothing looks changed locally.
#[instrument(skip_all, fields(ns = %s.cfg.namespace, force))]
pub(crate) async fn sync(
    s: &KubeResourceSync,
    force: bool,
) -> Result<bool, ReconcileErr> {
    if force {
        debug!("controller_resources: upstream change; re-applying all");
    }
    let mut modified = false;

    let cm_api: Api<ConfigMap> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    let cm = ConfigMap {
        metadata: ObjectMeta {
            name: Some(CONTROLLER_CONFIGMAP.to_string()),
            namespace: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(controller_config_data()),
        ..Default::default()
    };
    modified |=
        apply_detecting_change(&cm_api, CONTROLLER_CONFIGMAP, &cm).await?;

    let role_api: Api<ClusterRole> = Api::all(s.client.clone());
    let role = ClusterRole {
        metadata: ObjectMeta {
            name: Some(CLUSTER_ROLE_NAME.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        rules: Some(vec![
            PolicyRule {
                api_groups: Some(vec!["".into()]),
                resources: Some(vec![
                    "services".into(),
                    "secrets".into(),
                    "configmaps".into(),
                ]),
                verbs: vec![
                    "get".into(),
                    "list".into(),
                    "watch".into(),
                    "create".into(),
                    "update".into(),
                    "patch".into(),
                ],
                ..Default::default()
            },
            PolicyRule {
                api_groups: Some(vec!["".into()]),
                resources: Some(vec!["events".into()]),
                verbs: vec!["create".into(), "patch".into()],
                ..Default::default()
            },
        ]),
        ..Default::default()
    };
    modified |=
        apply_detecting_change(&role_api, CLUSTER_ROLE_NAME, &role).await?;

    let binding_api: Api<ClusterRoleBinding> = Api::all(s.client.clone());
    let binding = ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(CLUSTER_ROLE_NAME.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".into(),
            kind: "ClusterRole".into(),
            name: CLUSTER_ROLE_NAME.into(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".into(),
            name: CONTROLLER_NAME.into(),
            namespace: Some(s.cfg.namespace.clone()),
            ..Default::default()
        }]),
    };
    modified |=
        apply_detecting_change(&binding_api, CLUSTER_ROLE_NAME, &binding)
            .await?;

    if modified {
        info!("controller_resources: changed");
    }
    Ok(modified)
}

fn controller_config_data() -> BTreeMap<String, String> {
    [(
        "controller-config.yaml".to_string(),
        concat!(
            "apiVersion: svcca.dev/v1alpha1\n",
            "kind: ServiceCAControllerConfig\n",
            "leaderElection:\n",
            "  leaderElect: true\n",
        )
        .to_string(),
    )]
    .into_iter()
    .collect()
}
