//! Scripted compute backend for testing.
//!
//! Serves pre-configured catalog pages, records every call in order, and
//! lets tests script the outcome of each instance insert per zone.

use async_trait::async_trait;
use gpufinder_cloud::{
    AcceleratorType, CloudError, ComputeApi, InstanceResource, MachineAccelerator, MachineType,
    Operation, OperationStatus, Page, Zone,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A call made against the mock, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones(Option<String>),
    ListMachineTypes(String),
    ListAcceleratorTypes(String),
    Insert {
        zone: String,
        name: String,
        machine_type: String,
    },
    Delete {
        zone: String,
        name: String,
    },
    GetOperation(String),
}

/// Scripted result of one insert in a zone
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Success,
    QuotaExceeded,
    HttpError(u16, String),
    OperationError(String),
}

#[derive(Debug)]
struct PendingOperation {
    polls_until_done: u32,
    error: Option<serde_json::Value>,
}

#[derive(Default)]
pub struct MockCompute {
    zone_pages: Vec<Page<Zone>>,
    machine_types: HashMap<String, Vec<Page<MachineType>>>,
    accelerator_types: HashMap<String, Vec<Page<AcceleratorType>>>,
    delete_failures: HashMap<String, String>,
    insert_script: Mutex<HashMap<String, VecDeque<InsertOutcome>>>,
    operations: Mutex<HashMap<String, PendingOperation>>,
    calls: Mutex<Vec<Call>>,
    insert_bodies: Mutex<Vec<InstanceResource>>,
}

impl MockCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these zones as a single page
    pub fn with_zones(self, zones: Vec<Zone>) -> Self {
        self.with_zone_pages(vec![Page::last(zones)])
    }

    pub fn with_zone_pages(mut self, pages: Vec<Page<Zone>>) -> Self {
        self.zone_pages = pages;
        self
    }

    pub fn with_machine_types(mut self, zone: &str, machines: Vec<MachineType>) -> Self {
        self.machine_types
            .insert(zone.to_string(), vec![Page::last(machines)]);
        self
    }

    pub fn with_machine_type_pages(mut self, zone: &str, pages: Vec<Page<MachineType>>) -> Self {
        self.machine_types.insert(zone.to_string(), pages);
        self
    }

    pub fn with_accelerators(mut self, zone: &str, accelerators: Vec<AcceleratorType>) -> Self {
        self.accelerator_types
            .insert(zone.to_string(), vec![Page::last(accelerators)]);
        self
    }

    /// Outcomes for successive inserts in `zone`; unscripted inserts succeed
    pub fn script_inserts(self, zone: &str, outcomes: Vec<InsertOutcome>) -> Self {
        self.insert_script
            .lock()
            .unwrap()
            .insert(zone.to_string(), outcomes.into());
        self
    }

    /// Make the delete operation for `instance` finish with an error
    pub fn fail_delete(mut self, instance: &str, error: &str) -> Self {
        self.delete_failures
            .insert(instance.to_string(), error.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Names passed to every insert, successful or not
    pub fn insert_attempts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Insert { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Full request bodies of every insert, in order
    pub fn insert_bodies(&self) -> Vec<InstanceResource> {
        self.insert_bodies.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn start_operation(&self, name: String, error: Option<serde_json::Value>) -> Operation {
        self.operations.lock().unwrap().insert(
            name.clone(),
            PendingOperation {
                polls_until_done: 1,
                error,
            },
        );
        Operation {
            name,
            status: OperationStatus::Running,
            operation_type: None,
            target_link: None,
            error: None,
        }
    }
}

/// Page addressed by `token` ("page-N"); tokens point at the next index
fn page_at<T: Clone>(pages: &[Page<T>], token: Option<&str>) -> Page<T> {
    let idx = token
        .and_then(|t| t.strip_prefix("page-"))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);

    match pages.get(idx) {
        Some(page) => {
            let mut page = page.clone();
            page.next_page_token = (idx + 1 < pages.len()).then(|| format!("page-{}", idx + 1));
            page
        }
        None => Page::last(Vec::new()),
    }
}

#[async_trait]
impl ComputeApi for MockCompute {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_zones(
        &self,
        _project: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<Zone>> {
        self.record(Call::ListZones(page_token.map(str::to_string)));
        Ok(page_at(&self.zone_pages, page_token))
    }

    async fn list_machine_types(
        &self,
        _project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<MachineType>> {
        self.record(Call::ListMachineTypes(zone.to_string()));
        let pages = self.machine_types.get(zone).cloned().unwrap_or_default();
        Ok(page_at(&pages, page_token))
    }

    async fn list_accelerator_types(
        &self,
        _project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> gpufinder_cloud::Result<Page<AcceleratorType>> {
        self.record(Call::ListAcceleratorTypes(zone.to_string()));
        let pages = self.accelerator_types.get(zone).cloned().unwrap_or_default();
        Ok(page_at(&pages, page_token))
    }

    async fn insert_instance(
        &self,
        _project: &str,
        zone: &str,
        instance: &InstanceResource,
    ) -> gpufinder_cloud::Result<Operation> {
        self.record(Call::Insert {
            zone: zone.to_string(),
            name: instance.name.clone(),
            machine_type: instance.machine_type.clone(),
        });
        self.insert_bodies.lock().unwrap().push(instance.clone());

        let outcome = self
            .insert_script
            .lock()
            .unwrap()
            .get_mut(zone)
            .and_then(VecDeque::pop_front)
            .unwrap_or(InsertOutcome::Success);

        let op_name = format!("op-insert-{}", instance.name);
        match outcome {
            InsertOutcome::Success => Ok(self.start_operation(op_name, None)),
            InsertOutcome::QuotaExceeded => Err(CloudError::Http {
                status: 403,
                message: format!(
                    "Quota exceeded for quota metric 'GPUs (all regions)' in zone {zone}"
                ),
                reasons: vec!["quotaExceeded".to_string()],
            }),
            InsertOutcome::HttpError(status, message) => Err(CloudError::http(status, message)),
            InsertOutcome::OperationError(code) => Ok(self.start_operation(
                op_name,
                Some(serde_json::json!({"errors": [{"code": code}]})),
            )),
        }
    }

    async fn delete_instance(
        &self,
        _project: &str,
        zone: &str,
        instance: &str,
    ) -> gpufinder_cloud::Result<Operation> {
        self.record(Call::Delete {
            zone: zone.to_string(),
            name: instance.to_string(),
        });

        let error = self
            .delete_failures
            .get(instance)
            .map(|code| serde_json::json!({"errors": [{"code": code}]}));
        Ok(self.start_operation(format!("op-delete-{instance}"), error))
    }

    async fn get_zone_operation(
        &self,
        _project: &str,
        _zone: &str,
        operation: &str,
    ) -> gpufinder_cloud::Result<Operation> {
        self.record(Call::GetOperation(operation.to_string()));

        let mut operations = self.operations.lock().unwrap();
        let pending = operations
            .get_mut(operation)
            .ok_or_else(|| CloudError::http(404, format!("operation {operation} not found")))?;

        let status = if pending.polls_until_done == 0 {
            OperationStatus::Done
        } else {
            pending.polls_until_done -= 1;
            OperationStatus::Running
        };

        Ok(Operation {
            name: operation.to_string(),
            status,
            operation_type: None,
            target_link: None,
            error: if status == OperationStatus::Done {
                pending.error.clone()
            } else {
                None
            },
        })
    }
}

// ============ Fixtures ============

pub fn zone(name: &str, status: &str) -> Zone {
    Zone {
        name: name.to_string(),
        status: status.to_string(),
        region: None,
        description: String::new(),
    }
}

pub fn machine(name: &str, guest_cpus: u32, accelerator: Option<(&str, u32)>) -> MachineType {
    MachineType {
        name: name.to_string(),
        guest_cpus,
        description: format!("{name} test machine"),
        accelerators: accelerator.map(|(kind, count)| {
            vec![MachineAccelerator {
                guest_accelerator_type: kind.to_string(),
                guest_accelerator_count: count,
            }]
        }),
    }
}

pub fn accelerator(name: &str, maximum_cards_per_instance: u32) -> AcceleratorType {
    AcceleratorType {
        name: name.to_string(),
        description: format!("NVIDIA {name}"),
        maximum_cards_per_instance,
        zone: None,
    }
}

pub fn test_instance(name: &str) -> InstanceResource {
    InstanceResource {
        name: name.to_string(),
        machine_type: "zones/us-central1-a/machineTypes/n1-standard-4".to_string(),
        disks: Vec::new(),
        network_interfaces: Vec::new(),
        guest_accelerators: Vec::new(),
        scheduling: gpufinder_cloud::Scheduling::gpu(),
    }
}
