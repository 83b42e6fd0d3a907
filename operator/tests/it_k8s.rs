// Integration tests require a running Kubernetes cluster with the ServiceCA
// CRD applied. These tests are ignored by default.

use std::collections::HashMap;
use std::time::Duration;

use envconfig::Envconfig;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::{
    Client,
    api::{Api, DeleteParams, PostParams},
};
use svcca_operator::config::OperatorConfig;
use svcca_operator::controller::run_controller;
use svcca_operator::crd::service_ca::{ServiceCA, ServiceCASpec};
use svcca_operator::resources::{
    CA_BUNDLE_CONFIGMAP, CONTROLLER_NAME, SIGNING_SECRET_NAME,
};

const DIGITS: [char; 10] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

async fn exists<K>(api: &Api<K>, name: &str) -> bool
where
    K: kube::Resource
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
{
    api.get_opt(name).await.ok().flatten().is_some()
}

#[test_log::test(tokio::test)]
#[ignore]
async fn operator_creates_signing_stack() {
    let ns = format!("svcca-it-{}", nanoid::nanoid!(6, &DIGITS));
    let name = format!("cluster-it-{}", nanoid::nanoid!(6, &DIGITS));

    let client = Client::try_default().await.expect("kube client");
    let mut env = HashMap::new();
    env.insert("SVCCA_NAMESPACE".to_string(), ns.clone());
    let cfg = OperatorConfig::init_from_hashmap(&env).expect("config");

    let ca_api: Api<ServiceCA> = Api::all(client.clone());
    let _ = ca_api
        .create(
            &PostParams::default(),
            &ServiceCA::new(&name, ServiceCASpec::default()),
        )
        .await
        .expect("create ServiceCA");

    let client_for_ctrl = client.clone();
    let ctrl = tokio::spawn(async move {
        let _ = run_controller(client_for_ctrl, cfg).await;
    });

    let secret_api: Api<Secret> = Api::namespaced(client.clone(), &ns);
    let cm_api: Api<ConfigMap> = Api::namespaced(client.clone(), &ns);
    let dep_api: Api<Deployment> = Api::namespaced(client.clone(), &ns);

    let mut ready = false;
    for _ in 0..30 {
        // up to ~30s
        if exists(&secret_api, SIGNING_SECRET_NAME).await
            && exists(&cm_api, CA_BUNDLE_CONFIGMAP).await
            && exists(&dep_api, CONTROLLER_NAME).await
        {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;
    }

    ctrl.abort();
    let _ = ca_api.delete(&name, &DeleteParams::default()).await;
    let ns_api: Api<Namespace> = Api::all(client.clone());
    let _ = ns_api.delete(&ns, &DeleteParams::default()).await;

    assert!(
        ready,
        "expected signing secret, CA bundle and deployment to appear"
    );
}
