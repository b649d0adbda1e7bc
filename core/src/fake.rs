//! In-memory `ClusterApi` for testing code that drives a cluster.
//!
//! `FakeClient` stores objects in maps, records every call as an `Action`,
//! and answers missing objects the way the server does: a 404
//! `ApiError::Status`. `fail_next` injects an error into the next call.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::api::{list_pods_path, ClusterApi};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::selector::Selector;
use crate::types::{Pod, PodList, ReplicationController, Resource, Service};

/// One call made against a `FakeClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub method: HttpMethod,
    /// Path relative to the API prefix, as `Client` would have requested it.
    pub path: String,
}

impl Action {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

#[derive(Default)]
struct State {
    pods: BTreeMap<String, Pod>,
    controllers: BTreeMap<String, ReplicationController>,
    services: BTreeMap<String, Service>,
    actions: Vec<Action>,
    next_error: Option<ApiError>,
}

#[derive(Default)]
pub struct FakeClient {
    state: Mutex<State>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pods(self, pods: impl IntoIterator<Item = Pod>) -> Self {
        {
            let mut state = self.state.lock();
            for pod in pods {
                state.pods.insert(pod.id.clone(), pod);
            }
        }
        self
    }

    /// Calls made so far, oldest first.
    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    /// Make the next call fail with `error`. The call is still recorded.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().next_error = Some(error);
    }
}

/// Record the call, then hand out any injected error.
fn record(state: &mut State, method: HttpMethod, path: String) -> Result<(), ApiError> {
    state.actions.push(Action::new(method, path));
    match state.next_error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn status_error(method: HttpMethod, path: &str, status: u16, reason: &str, message: String) -> ApiError {
    ApiError::Status {
        method,
        path: path.to_string(),
        status,
        reason: reason.to_string(),
        body: message.into_bytes(),
    }
}

fn matches_selector<R: Resource>(object: &R, selector: &Selector) -> bool {
    let labels = object.labels();
    selector
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}

fn get<R: Resource + Clone>(store: &BTreeMap<String, R>, name: &str, path: &str) -> Result<R, ApiError> {
    store.get(name).cloned().ok_or_else(|| {
        status_error(HttpMethod::Get, path, 404, "Not Found", format!("{} {name:?} not found", R::PLURAL))
    })
}

fn create<R: Resource + Clone>(store: &mut BTreeMap<String, R>, object: &R, path: &str) -> Result<R, ApiError> {
    if store.contains_key(object.id()) {
        return Err(status_error(
            HttpMethod::Post,
            path,
            409,
            "Conflict",
            format!("{} {:?} already exists", R::PLURAL, object.id()),
        ));
    }
    store.insert(object.id().to_string(), object.clone());
    Ok(object.clone())
}

fn update<R: Resource + Clone>(store: &mut BTreeMap<String, R>, object: &R, path: &str) -> Result<R, ApiError> {
    match store.get_mut(object.id()) {
        Some(existing) => {
            *existing = object.clone();
            Ok(object.clone())
        }
        None => Err(status_error(
            HttpMethod::Put,
            path,
            404,
            "Not Found",
            format!("{} {:?} not found", R::PLURAL, object.id()),
        )),
    }
}

fn delete<R: Resource>(store: &mut BTreeMap<String, R>, name: &str, path: &str) -> Result<(), ApiError> {
    store.remove(name).map(|_| ()).ok_or_else(|| {
        status_error(HttpMethod::Delete, path, 404, "Not Found", format!("{} {name:?} not found", R::PLURAL))
    })
}

impl ClusterApi for FakeClient {
    fn list_pods(&self, selector: &Selector) -> Result<PodList, ApiError> {
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Get, list_pods_path(selector))?;
        let items = state
            .pods
            .values()
            .filter(|pod| matches_selector(*pod, selector))
            .cloned()
            .collect();
        Ok(PodList { items })
    }

    fn get_pod(&self, name: &str) -> Result<Pod, ApiError> {
        let path = format!("{}/{name}", Pod::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Get, path.clone())?;
        get(&state.pods, name, &path)
    }

    fn delete_pod(&self, name: &str) -> Result<(), ApiError> {
        let path = format!("{}/{name}", Pod::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Delete, path.clone())?;
        delete(&mut state.pods, name, &path)
    }

    fn create_pod(&self, pod: &Pod) -> Result<Pod, ApiError> {
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Post, Pod::PLURAL.to_string())?;
        create(&mut state.pods, pod, Pod::PLURAL)
    }

    fn update_pod(&self, pod: &Pod) -> Result<Pod, ApiError> {
        let path = format!("{}/{}", Pod::PLURAL, pod.id);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Put, path.clone())?;
        update(&mut state.pods, pod, &path)
    }

    fn get_replication_controller(&self, name: &str) -> Result<ReplicationController, ApiError> {
        let path = format!("{}/{name}", ReplicationController::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Get, path.clone())?;
        get(&state.controllers, name, &path)
    }

    fn create_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError> {
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Post, ReplicationController::PLURAL.to_string())?;
        create(&mut state.controllers, controller, ReplicationController::PLURAL)
    }

    fn update_replication_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController, ApiError> {
        let path = format!("{}/{}", ReplicationController::PLURAL, controller.id);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Put, path.clone())?;
        update(&mut state.controllers, controller, &path)
    }

    fn delete_replication_controller(&self, name: &str) -> Result<(), ApiError> {
        let path = format!("{}/{name}", ReplicationController::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Delete, path.clone())?;
        delete(&mut state.controllers, name, &path)
    }

    fn get_service(&self, name: &str) -> Result<Service, ApiError> {
        let path = format!("{}/{name}", Service::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Get, path.clone())?;
        get(&state.services, name, &path)
    }

    fn create_service(&self, service: &Service) -> Result<Service, ApiError> {
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Post, Service::PLURAL.to_string())?;
        create(&mut state.services, service, Service::PLURAL)
    }

    fn update_service(&self, service: &Service) -> Result<Service, ApiError> {
        let path = format!("{}/{}", Service::PLURAL, service.id);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Put, path.clone())?;
        update(&mut state.services, service, &path)
    }

    fn delete_service(&self, name: &str) -> Result<(), ApiError> {
        let path = format!("{}/{name}", Service::PLURAL);
        let mut state = self.state.lock();
        record(&mut state, HttpMethod::Delete, path.clone())?;
        delete(&mut state.services, name, &path)
    }
}
