use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams};
use tracing::{info, instrument};

use crate::controller::events::{REASON_CA_ROTATED, emit_event};
use crate::controller::{FIELD_MANAGER, ReconcileErr, into_internal};

use super::{
    KubeResourceSync, SIGNING_SECRET_NAME, managed_labels, pki,
};

/// Sync the signing CA Secret. A new CA is minted when the Secret is missing
/// or incomplete, or when the override payload requests regeneration. The
/// payload is opaque to the sequencer; this step understands exactly one
/// field, `forceRegeneration`.
#[instrument(skip_all, fields(ns = %s.cfg.namespace))]
pub(crate) async fn sync(
    s: &KubeResourceSync,
    overrides: &[u8],
) -> Result<bool, ReconcileErr> {
    let api: Api<Secret> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);

    let existing = api.get_opt(SIGNING_SECRET_NAME).await?;
    let forced = force_regeneration_requested(overrides);
    if existing.as_ref().map(has_key_material).unwrap_or(false) && !forced {
        return Ok(false);
    }

    let ca = pki::mint_signing_ca(
        &pki::signer_common_name(),
        s.cfg.ca_validity_days,
    )
    .map_err(into_internal)?;

    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(SIGNING_SECRET_NAME.to_string()),
            namespace: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        type_: Some("kubernetes.io/tls".into()),
        string_data: Some(
            [
                ("tls.crt".to_string(), ca.cert_pem),
                ("tls.key".to_string(), ca.key_pem),
            ]
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    };
    let pp = PatchParams::apply(FIELD_MANAGER).force();
    let value = serde_json::to_value(&secret).map_err(into_internal)?;
    let _ = api
        .patch(SIGNING_SECRET_NAME, &pp, &Patch::Apply(&value))
        .await?;

    info!(forced, "signer: minted new signing CA");
    emit_event(
        &s.recorder,
        &s.obj_ref,
        REASON_CA_ROTATED,
        "RotateSigningCA",
        Some(if forced {
            "Signing CA regenerated on request".to_string()
        } else {
            "Signing CA created".to_string()
        }),
    )
    .await;

    Ok(true)
}

pub(crate) fn force_regeneration_requested(overrides: &[u8]) -> bool {
    if overrides.is_empty() {
        return false;
    }
    serde_json::from_slice::<serde_json::Value>(overrides)
        .ok()
        .and_then(|v| {
            v.get("forceRegeneration").and_then(|b| b.as_bool())
        })
        .unwrap_or(false)
}

pub(crate) fn has_key_material(secret: &Secret) -> bool {
    let present = |key: &str| {
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(|v| !v.0.is_empty())
            .unwrap_or(false)
            || secret
                .string_data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| !v.is_empty())
                .unwrap_or(false)
    };
    present("tls.crt") && present("tls.key")
}
