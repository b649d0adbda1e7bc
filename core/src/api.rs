//! Typed per-resource operations.
//!
//! `ClusterApi` is the surface callers program against. `Client` implements
//! it over HTTP; `FakeClient` implements it in memory for tests.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Client;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::selector::{encode_selector, Selector};
use crate::types::{Pod, PodList, ReplicationController, Resource, Service};

pub trait ClusterApi {
    /// Pods matching every label in `selector`. An empty selector lists all pods.
    fn list_pods(&self, selector: &Selector) -> Result<PodList, ApiError>;
    fn get_pod(&self, name: &str) -> Result<Pod, ApiError>;
    fn delete_pod(&self, name: &str) -> Result<(), ApiError>;
    fn create_pod(&self, pod: &Pod) -> Result<Pod, ApiError>;
    fn update_pod(&self, pod: &Pod) -> Result<Pod, ApiError>;

    fn get_replication_controller(&self, name: &str) -> Result<ReplicationController, ApiError>;
    fn create_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError>;
    fn update_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError>;
    fn delete_replication_controller(&self, name: &str) -> Result<(), ApiError>;

    fn get_service(&self, name: &str) -> Result<Service, ApiError>;
    fn create_service(&self, service: &Service) -> Result<Service, ApiError>;
    fn update_service(&self, service: &Service) -> Result<Service, ApiError>;
    fn delete_service(&self, name: &str) -> Result<(), ApiError>;
}

/// Path for listing pods, with a `labels` query when `selector` is non-empty.
pub fn list_pods_path(selector: &Selector) -> String {
    if selector.is_empty() {
        Pod::PLURAL.to_string()
    } else {
        format!("{}?labels={}", Pod::PLURAL, encode_selector(selector))
    }
}

impl Client {
    fn get_resource<R: Resource + DeserializeOwned>(&self, name: &str) -> Result<R, ApiError> {
        let path = format!("{}/{name}", R::PLURAL);
        self.execute_into(HttpMethod::Get, &path, None)
            .map(|(value, _)| value)
    }

    fn delete_resource<R: Resource>(&self, name: &str) -> Result<(), ApiError> {
        let path = format!("{}/{name}", R::PLURAL);
        self.execute(HttpMethod::Delete, &path, None).map(|_| ())
    }

    fn create_resource<R: Resource + Serialize + DeserializeOwned>(&self, object: &R) -> Result<R, ApiError> {
        self.send_json(HttpMethod::Post, R::PLURAL, object)
    }

    fn update_resource<R: Resource + Serialize + DeserializeOwned>(&self, object: &R) -> Result<R, ApiError> {
        let path = format!("{}/{}", R::PLURAL, object.id());
        self.send_json(HttpMethod::Put, &path, object)
    }

    /// Encode `payload` and send it. Nothing is sent if encoding fails.
    fn send_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_vec(payload).map_err(ApiError::Encode)?;
        self.execute_into(method, path, Some(body))
            .map(|(value, _)| value)
    }
}

impl ClusterApi for Client {
    fn list_pods(&self, selector: &Selector) -> Result<PodList, ApiError> {
        self.execute_into(HttpMethod::Get, &list_pods_path(selector), None)
            .map(|(list, _)| list)
    }

    fn get_pod(&self, name: &str) -> Result<Pod, ApiError> {
        self.get_resource(name)
    }

    fn delete_pod(&self, name: &str) -> Result<(), ApiError> {
        self.delete_resource::<Pod>(name)
    }

    fn create_pod(&self, pod: &Pod) -> Result<Pod, ApiError> {
        self.create_resource(pod)
    }

    fn update_pod(&self, pod: &Pod) -> Result<Pod, ApiError> {
        self.update_resource(pod)
    }

    fn get_replication_controller(&self, name: &str) -> Result<ReplicationController, ApiError> {
        self.get_resource(name)
    }

    fn create_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError> {
        self.create_resource(controller)
    }

    fn update_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError> {
        self.update_resource(controller)
    }

    fn delete_replication_controller(&self, name: &str) -> Result<(), ApiError> {
        self.delete_resource::<ReplicationController>(name)
    }

    fn get_service(&self, name: &str) -> Result<Service, ApiError> {
        self.get_resource(name)
    }

    fn create_service(&self, service: &Service) -> Result<Service, ApiError> {
        self.create_resource(service)
    }

    fn update_service(&self, service: &Service) -> Result<Service, ApiError> {
        self.update_resource(service)
    }

    fn delete_service(&self, name: &str) -> Result<(), ApiError> {
        self.delete_resource::<Service>(name)
    }
}
