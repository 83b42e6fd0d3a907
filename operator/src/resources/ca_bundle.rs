use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::Api;
use tracing::{info, instrument};

use crate::controller::events::{REASON_BUNDLE_REFRESHED, emit_event};
use crate::controller::ReconcileErr;

use super::{
    CA_BUNDLE_CONFIGMAP, KubeResourceSync, SIGNING_SECRET_NAME,
    apply_detecting_change, managed_labels,
};

const BUNDLE_KEY: &str = "ca-bundle.crt";

/// Sync the published CA bundle ConfigMap. Rewritten when the signing CA
/// changed this pass or when the published copy is missing or diverges
/// from the signing certificate.
#[instrument(skip_all, fields(ns = %s.cfg.namespace, ca_modified))]
pub(crate) async fn sync(
    s: &KubeResourceSync,
    ca_modified: bool,
) -> Result<bool, ReconcileErr> {
    let secret_api: Api<Secret> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    let secret = secret_api
        .get_opt(SIGNING_SECRET_NAME)
        .await?
        .ok_or_else(|| {
            ReconcileErr::Internal(
                "signing secret missing while refreshing CA bundle".into(),
            )
        })?;
    let cert_pem = cert_pem_from(&secret).ok_or_else(|| {
        ReconcileErr::Internal(
            "signing secret has no usable certificate".into(),
        )
    })?;

    let cm_api: Api<ConfigMap> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    if !ca_modified {
        let published = cm_api.get_opt(CA_BUNDLE_CONFIGMAP).await?;
        if bundle_current(published.as_ref(), &cert_pem) {
            return Ok(false);
        }
    }

    let cm = ConfigMap {
        metadata: ObjectMeta {
            name: Some(CA_BUNDLE_CONFIGMAP.to_string()),
            namespace: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(
            [(BUNDLE_KEY.to_string(), cert_pem)]
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    };
    let modified =
        apply_detecting_change(&cm_api, CA_BUNDLE_CONFIGMAP, &cm).await?;

    if modified {
        info!("ca_bundle: refreshed published CA bundle");
        emit_event(
            &s.recorder,
            &s.obj_ref,
            REASON_BUNDLE_REFRESHED,
            "RefreshCABundle",
            Some("Published CA bundle refreshed".to_string()),
        )
        .await;
    }
    Ok(modified)
}

/// True when the published copy exists and already carries exactly the
/// signing certificate. An empty or edited bundle counts as divergent.
pub(crate) fn bundle_current(cm: Option<&ConfigMap>, cert_pem: &str) -> bool {
    cm.and_then(|cm| cm.data.as_ref())
        .and_then(|d| d.get(BUNDLE_KEY))
        .map(|v| v == cert_pem)
        .unwrap_or(false)
}

pub(crate) fn cert_pem_from(secret: &Secret) -> Option<String> {
    if let Some(data) = secret.data.as_ref() {
        if let Some(v) = data.get("tls.crt") {
            return String::from_utf8(v.0.clone())
                .ok()
                .filter(|s| !s.is_empty());
        }
    }
    secret
        .string_data
        .as_ref()
        .and_then(|d| d.get("tls.crt"))
        .filter(|s| !s.is_empty())
        .cloned()
}
