//! Resource payloads of the v1beta1 API.
//!
//! # Design
//! Only the fields the client needs to route requests and filter lists are
//! typed. Container manifests and observed state stay as `serde_json::Value`,
//! and any other key lands in the flattened `extra` map, so objects survive a
//! get/update round trip without losing anything the server filled in. `id`
//! is also accepted as `ID` on input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource kind addressable under the API prefix.
pub trait Resource {
    /// Collection path segment, e.g. `pods`.
    const PLURAL: &'static str;

    fn id(&self) -> &str;

    fn labels(&self) -> &BTreeMap<String, String>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    #[serde(default, alias = "ID")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub desired_state: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub current_state: Value,
    /// Keys not modelled above, e.g. `kind` or `creationTimestamp`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationControllerState {
    #[serde(default)]
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replica_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub pod_template: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationController {
    #[serde(default, alias = "ID")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub desired_state: ReplicationControllerState,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub current_state: Value,
    /// Keys not modelled above, e.g. `kind` or `creationTimestamp`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default, alias = "ID")]
    pub id: String,
    #[serde(default)]
    pub port: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Labels of the pods this service routes to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    /// Keys not modelled above, e.g. `kind` or `creationTimestamp`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_resource {
    ($ty:ty, $plural:literal) => {
        impl Resource for $ty {
            const PLURAL: &'static str = $plural;

            fn id(&self) -> &str {
                &self.id
            }

            fn labels(&self) -> &BTreeMap<String, String> {
                &self.labels
            }
        }
    };
}

impl_resource!(Pod, "pods");
impl_resource!(ReplicationController, "replicationControllers");
impl_resource!(Service, "services");
