//! Project entity owning an ordered list of tasks.

use super::{EntityKind, ProjectId, ScheduleDomainError, Task, TaskId, task::validated_name};

/// Partial project update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// Replacement display name.
    pub name: Option<String>,
}

impl ProjectPatch {
    /// Creates a patch renaming the project.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Returns the trimmed replacement name, if one was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the supplied name is
    /// blank.
    pub fn validated_name(&self) -> Result<Option<String>, ScheduleDomainError> {
        self.name
            .as_ref()
            .map(|name| validated_name(EntityKind::Project, name.as_str()))
            .transpose()
    }
}

/// A project and its tasks in user-controlled display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    name: String,
    tasks: Vec<Task>,
}

impl Project {
    /// Creates an empty project.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the name is blank.
    pub fn create(id: ProjectId, name: impl Into<String>) -> Result<Self, ScheduleDomainError> {
        Ok(Self {
            id,
            name: validated_name(EntityKind::Project, name)?,
            tasks: Vec::new(),
        })
    }

    /// Reconstructs a project from storage. Tasks keep the given order.
    #[must_use]
    pub const fn from_persisted(id: ProjectId, name: String, tasks: Vec<Task>) -> Self {
        Self { id, name, tasks }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task owned by this project.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the new name is blank.
    pub fn apply(&mut self, patch: &ProjectPatch) -> Result<(), ScheduleDomainError> {
        if let Some(name) = patch.validated_name()? {
            self.name = name;
        }
        Ok(())
    }

    pub(crate) fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub(crate) fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == id)
    }

    pub(crate) fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id() == id)?;
        Some(self.tasks.remove(index))
    }

    /// Reorders tasks to follow `order`. Tasks missing from `order` keep
    /// their relative order after the listed ones; unknown identifiers are
    /// ignored.
    pub(crate) fn reorder_tasks(&mut self, order: &[TaskId]) {
        self.tasks = apply_order(std::mem::take(&mut self.tasks), order, Task::id);
    }
}

/// Arranges `items` to follow `order`, appending unlisted items in their
/// original order.
pub(crate) fn apply_order<T, K, F>(items: Vec<T>, order: &[K], key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> &K,
{
    let mut remaining: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for wanted in order {
        let slot = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|item| key(item) == wanted));
        if let Some(item) = slot.and_then(Option::take) {
            ordered.push(item);
        }
    }
    ordered.extend(remaining.into_iter().flatten());
    ordered
}
