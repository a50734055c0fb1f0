//! Local store: every operation is a synchronous read-modify-write of the
//! single dataset record.

use super::record::{DatasetRecord, StoredRecord};
use crate::schedule::{
    domain::{
        Dataset, Department, DepartmentId, DepartmentPatch, Employee, EmployeeId, EntityKind,
        NewEmployee, NewTask, Project, ProjectId, ProjectPatch, Task, TaskId, TaskPatch,
        apply_order,
    },
    ports::{KeyValueStorage, ScheduleStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Storage key of the dataset record.
pub const DATASET_KEY: &str = "planboard.dataset";

/// Storage key of the shared settings map.
pub const SETTINGS_KEY: &str = "planboard.settings";

/// Store keeping the whole dataset as one JSON record.
///
/// Reads never fail: a missing, unreadable or structurally malformed record
/// is replaced by the seed dataset. Invalid entries inside a well-formed
/// record are dropped individually.
pub struct LocalStore<S, C>
where
    S: KeyValueStorage,
    C: Clock + Send + Sync,
{
    storage: Arc<S>,
    clock: Arc<C>,
    write_guard: Mutex<()>,
}

impl<S, C> LocalStore<S, C>
where
    S: KeyValueStorage,
    C: Clock + Send + Sync,
{
    /// Creates a store over the given storage.
    #[must_use]
    pub const fn new(storage: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            storage,
            clock,
            write_guard: Mutex::new(()),
        }
    }

    /// Reads the dataset, seeding storage on first use or after corruption.
    #[must_use]
    pub fn read(&self) -> Dataset {
        let stored = match self.storage.load(DATASET_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "local dataset unreadable, serving seed data");
                return seed_dataset();
            }
        };

        if let Some(text) = stored {
            match decode(&text) {
                Ok(dataset) => return dataset,
                Err(err) => {
                    warn!(error = %err, "discarding malformed local dataset record");
                }
            }
        }

        let seed = seed_dataset();
        if let Err(err) = self.write(&seed) {
            warn!(error = %err, "failed to persist seed dataset");
        }
        seed
    }

    /// Replaces the stored dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the record cannot be encoded or
    /// written.
    pub fn write(&self, dataset: &Dataset) -> StoreResult<()> {
        let text = serde_json::to_string(&DatasetRecord::from_dataset(dataset))
            .map_err(StoreError::storage)?;
        self.storage
            .save(DATASET_KEY, &text)
            .map_err(StoreError::storage)
    }

    fn modify<T>(&self, change: impl FnOnce(&mut Dataset) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|err| StoreError::storage(std::io::Error::other(err.to_string())))?;
        let mut dataset = self.read();
        let outcome = change(&mut dataset)?;
        self.write(&dataset)?;
        Ok(outcome)
    }

    fn read_settings(&self) -> Map<String, Value> {
        match self.storage.load(SETTINGS_KEY) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(error = %err, "discarding malformed local settings record");
                Map::new()
            }),
            Ok(None) => Map::new(),
            Err(err) => {
                warn!(error = %err, "local settings unreadable");
                Map::new()
            }
        }
    }
}

fn decode(text: &str) -> Result<Dataset, serde_json::Error> {
    serde_json::from_str::<StoredRecord>(text).map(StoredRecord::into_dataset)
}

fn seed_dataset() -> Dataset {
    Dataset::seed().unwrap_or_default()
}

fn find_task_mut<'a>(dataset: &'a mut Dataset, id: &TaskId) -> StoreResult<&'a mut Task> {
    dataset
        .projects_mut()
        .iter_mut()
        .find_map(|project| project.task_mut(id))
        .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))
}

#[async_trait]
impl<S, C> ScheduleStore for LocalStore<S, C>
where
    S: KeyValueStorage,
    C: Clock + Send + Sync,
{
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self.read().into_parts().0)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(self.read().into_parts().1)
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.read().into_parts().2)
    }

    async fn add_project(&self, name: &str) -> StoreResult<Project> {
        let project = Project::create(ProjectId::generate(&*self.clock), name)?;
        self.modify(|dataset| {
            dataset.projects_mut().push(project.clone());
            Ok(project)
        })
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> StoreResult<()> {
        self.modify(|dataset| {
            let project = dataset
                .project_mut(id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))?;
            Ok(project.apply(patch)?)
        })
    }

    async fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        self.modify(|dataset| {
            let projects = dataset.projects_mut();
            let index = projects
                .iter()
                .position(|project| project.id() == id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))?;
            projects.remove(index);
            Ok(())
        })
    }

    async fn add_task(&self, project_id: &ProjectId, task: NewTask) -> StoreResult<Task> {
        let created = Task::create(TaskId::generate(&*self.clock), project_id.clone(), task)?;
        self.modify(|dataset| {
            let project = dataset
                .project_mut(project_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Project, project_id))?;
            project.push_task(created.clone());
            Ok(created)
        })
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<()> {
        self.modify(|dataset| Ok(find_task_mut(dataset, id)?.apply(patch)?))
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        self.modify(|dataset| {
            dataset
                .projects_mut()
                .iter_mut()
                .find_map(|project| project.remove_task(id))
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))
        })
    }

    async fn add_department(&self, name: &str) -> StoreResult<Department> {
        let department = Department::create(DepartmentId::generate(&*self.clock), name)?;
        self.modify(|dataset| {
            dataset.push_department(department.clone());
            Ok(department)
        })
    }

    async fn update_department(
        &self,
        id: &DepartmentId,
        patch: &DepartmentPatch,
    ) -> StoreResult<()> {
        self.modify(|dataset| {
            let department = dataset
                .department_mut(id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Department, id))?;
            Ok(department.apply(patch)?)
        })
    }

    async fn delete_department(&self, id: &DepartmentId) -> StoreResult<()> {
        self.modify(|dataset| {
            dataset
                .remove_department(id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(EntityKind::Department, id))
        })
    }

    async fn add_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let NewEmployee {
            name,
            department_id,
        } = employee;
        let created = Employee::create(EmployeeId::generate(&*self.clock), name, department_id)?;
        self.modify(|dataset| {
            let department_exists = dataset
                .departments()
                .iter()
                .any(|department| department.id() == created.department_id());
            if !department_exists {
                return Err(StoreError::not_found(
                    EntityKind::Department,
                    created.department_id(),
                ));
            }
            dataset.push_employee(created.clone());
            Ok(created)
        })
    }

    async fn delete_employee(&self, id: &EmployeeId) -> StoreResult<()> {
        self.modify(|dataset| {
            dataset
                .remove_employee(id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(EntityKind::Employee, id))
        })
    }

    async fn reorder_projects(&self, order: &[ProjectId]) -> StoreResult<()> {
        self.modify(|dataset| {
            let projects = std::mem::take(dataset.projects_mut());
            *dataset.projects_mut() = apply_order(projects, order, Project::id);
            Ok(())
        })
    }

    async fn reorder_tasks(&self, project_id: &ProjectId, order: &[TaskId]) -> StoreResult<()> {
        self.modify(|dataset| {
            let project = dataset
                .project_mut(project_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Project, project_id))?;
            project.reorder_tasks(order);
            Ok(())
        })
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.read_settings().remove(key))
    }

    async fn put_setting(&self, key: &str, value: &Value) -> StoreResult<()> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|err| StoreError::storage(std::io::Error::other(err.to_string())))?;
        let mut settings = self.read_settings();
        settings.insert(key.to_owned(), value.clone());
        let text = serde_json::to_string(&settings).map_err(StoreError::storage)?;
        self.storage
            .save(SETTINGS_KEY, &text)
            .map_err(StoreError::storage)
    }
}
