use kube::core::CustomResourceExt;
use svcca_operator::crd::service_ca::ServiceCA;

fn main() {
    let crd = ServiceCA::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
    println!("{}", yaml);
}
