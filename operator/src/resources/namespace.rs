use k8s_openapi::api::core::v1::{
    Namespace, Service, ServiceAccount, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::Api;
use tracing::{info, instrument};

use crate::controller::ReconcileErr;

use super::{
    CONTROLLER_NAME, KubeResourceSync, apply_detecting_change, managed_labels,
};

/// Sync the controller namespace and the static supporting resources
/// (ServiceAccount and the signing Service).
#[instrument(skip_all, fields(ns = %s.cfg.namespace))]
pub(crate) async fn sync(s: &KubeResourceSync) -> Result<bool, ReconcileErr> {
    let mut modified = false;

    let ns_api: Api<Namespace> = Api::all(s.client.clone());
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        ..Default::default()
    };
    modified |= apply_detecting_change(&ns_api, &s.cfg.namespace, &ns).await?;

    let sa_api: Api<ServiceAccount> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    let sa = ServiceAccount {
        metadata: ObjectMeta {
            name: Some(CONTROLLER_NAME.to_string()),
            namespace: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        ..Default::default()
    };
    modified |= apply_detecting_change(&sa_api, CONTROLLER_NAME, &sa).await?;

    let svc_api: Api<Service> =
        Api::namespaced(s.client.clone(), &s.cfg.namespace);
    let svc = Service {
        metadata: ObjectMeta {
            name: Some(CONTROLLER_NAME.to_string()),
            namespace: Some(s.cfg.namespace.clone()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(managed_labels()),
            ports: Some(vec![ServicePort {
                name: Some("https".into()),
                port: 443,
                target_port: Some(IntOrString::Int(8443)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };
    modified |= apply_detecting_change(&svc_api, CONTROLLER_NAME, &svc).await?;

    if modified {
        info!("namespace: static resources changed");
    }
    Ok(modified)
}
