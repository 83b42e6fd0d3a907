use std::collections::BTreeMap;

use chrono::Utc;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, PodSpec, PodTemplateSpec,
    SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, ObjectMeta,
};
use kube::ResourceExt;
use kube::api::Api;
use tracing::{info, instrument};

use crate::config::OperatorConfig;
use crate::controller::ReconcileErr;
use crate::crd::service_ca::ServiceCA;

use super::{
    CA_BUNDLE_CONFIGMAP, CONTROLLER_CONFIGMAP, CONTROLLER_NAME,
    KubeResourceSync, SIGNING_SECRET_NAME, apply_detecting_change,
    managed_labels,
};

const FORCED_AT_ANNOTATION: &str = "svcca.dev/forced-at";

/// Sync the signing controller Deployment. When `force` is set the pod
/// template is stamped with a fresh annotation so the rollout happens even
/// if the rendered spec is byte-identical to the live one.
#[instrument(skip_all, fields(ns = %s.cfg.namespace, force))]
pub(crate) async fn sync(
    s: &KubeResourceSync,
    config: &ServiceCA,
    force: bool,
) -> Result<bool, ReconcileErr> {
    let api: Api<Deployment> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);

    let mut dep = render(&s.cfg, config);
    if force {
        info!("deployment: forcing redeploy");
        stamp_forced_rollout(&mut dep, &Utc::now().to_rfc3339());
    } else if let Some(prev) = api
        .get_opt(CONTROLLER_NAME)
        .await?
        .as_ref()
        .and_then(forced_rollout_stamp)
    {
        // Carry the previous stamp so an unforced apply does not churn the
        // pod template.
        stamp_forced_rollout(&mut dep, &prev);
    }

    let modified = apply_detecting_change(&api, CONTROLLER_NAME, &dep).await?;

    Ok(modified || force)
}

pub(crate) fn render(cfg: &OperatorConfig, config: &ServiceCA) -> Deployment {
    let mut labels = managed_labels();
    labels.insert("svcca.dev/owner".to_string(), config.name_any());

    let container = Container {
        name: CONTROLLER_NAME.to_string(),
        image: Some(cfg.controller_image.clone()),
        args: Some(vec![
            "--config=/var/run/configmaps/config/controller-config.yaml"
                .to_string(),
        ]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: "signing-key".into(),
                mount_path: "/var/run/secrets/signing-key".into(),
                read_only: Some(true),
                ..Default::default()
            },
            VolumeMount {
                name: "signing-cabundle".into(),
                mount_path: "/var/run/configmaps/signing-cabundle".into(),
                read_only: Some(true),
                ..Default::default()
            },
            VolumeMount {
                name: "config".into(),
                mount_path: "/var/run/configmaps/config".into(),
                read_only: Some(true),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(CONTROLLER_NAME.to_string()),
            namespace: Some(cfg.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(cfg.controller_replicas),
            selector: LabelSelector {
                match_labels: Some(managed_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(CONTROLLER_NAME.to_string()),
                    containers: vec![container],
                    volumes: Some(vec![
                        Volume {
                            name: "signing-key".into(),
                            secret: Some(SecretVolumeSource {
                                secret_name: Some(
                                    SIGNING_SECRET_NAME.to_string(),
                                ),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: "signing-cabundle".into(),
                            config_map: Some(ConfigMapVolumeSource {
                                name: CA_BUNDLE_CONFIGMAP.to_string(),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: "config".into(),
                            config_map: Some(ConfigMapVolumeSource {
                                name: CONTROLLER_CONFIGMAP.to_string(),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    ]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn forced_rollout_stamp(dep: &Deployment) -> Option<String> {
    dep.spec
        .as_ref()?
        .template
        .metadata
        .as_ref()?
        .annotations
        .as_ref()?
        .get(FORCED_AT_ANNOTATION)
        .cloned()
}

pub(crate) fn stamp_forced_rollout(dep: &mut Deployment, stamp: &str) {
    if let Some(spec) = dep.spec.as_mut() {
        let meta = spec
            .template
            .metadata
            .get_or_insert_with(ObjectMeta::default);
        meta.annotations
            .get_or_insert_with(BTreeMap::default)
            .insert(FORCED_AT_ANNOTATION.to_string(), stamp.to_string());
    }
}
