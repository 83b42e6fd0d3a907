use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder};

pub const REASON_SYNCED: &str = "Synced";
pub const REASON_CA_ROTATED: &str = "SigningCARotated";
pub const REASON_BUNDLE_REFRESHED: &str = "CABundleRefreshed";

pub async fn emit_event(
    recorder: &Recorder,
    obj_ref: &ObjectReference,
    reason: &str,
    action: &str,
    note: Option<String>,
) {
    let _ = recorder
        .publish(
            &Event {
                type_: EventType::Normal,
                reason: reason.into(),
                note,
                action: action.into(),
                secondary: None,
            },
            obj_ref,
        )
        .await;
}
