use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cluster-scoped desired state for the service CA stack. A single instance
/// (conventionally named `cluster`) drives the whole reconciliation chain.
#[derive(
    CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Default,
)]
#[kube(
    group = "operator.svcca.dev",
    version = "v1alpha1",
    kind = "ServiceCA",
    plural = "servicecas",
    status = "ServiceCAStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCASpec {
    /// Mirrors the operator ManagementState convention; anything other than
    /// "Managed" (or unset) skips reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_state: Option<String>,
    /// Opaque override payload forwarded verbatim to the signing-CA step.
    /// The sequencer never inspects it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported_config_overrides: Option<Value>,
}

impl ServiceCASpec {
    /// Raw override bytes handed to the signing-CA step; empty when unset.
    pub fn override_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match &self.unsupported_config_overrides {
            Some(v) => serde_json::to_vec(v),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
pub struct ServiceCAStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "lastTransitionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub enum ConditionType {
    Available,
    Progressing,
    Degraded,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}
