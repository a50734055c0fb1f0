//! Departments and the employees assigned to them.

use super::{DepartmentId, EmployeeId, EntityKind, ScheduleDomainError, task::validated_name};

/// An employee belonging to exactly one department.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    department_id: DepartmentId,
}

impl Employee {
    /// Creates an employee.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the name is blank.
    pub fn create(
        id: EmployeeId,
        name: impl Into<String>,
        department_id: DepartmentId,
    ) -> Result<Self, ScheduleDomainError> {
        Ok(Self {
            id,
            name: validated_name(EntityKind::Employee, name)?,
            department_id,
        })
    }

    /// Returns the employee identifier.
    #[must_use]
    pub const fn id(&self) -> &EmployeeId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning department.
    #[must_use]
    pub const fn department_id(&self) -> &DepartmentId {
        &self.department_id
    }
}

/// Request payload for creating an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    /// Display name.
    pub name: String,
    /// Owning department.
    pub department_id: DepartmentId,
}

impl NewEmployee {
    /// Creates a request.
    #[must_use]
    pub fn new(name: impl Into<String>, department_id: DepartmentId) -> Self {
        Self {
            name: name.into(),
            department_id,
        }
    }
}

/// Partial department update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentPatch {
    /// Replacement display name.
    pub name: Option<String>,
}

impl DepartmentPatch {
    /// Creates a patch renaming the department.
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
            .map(|name| validated_name(EntityKind::Department, name.as_str()))
            .transpose()
    }
}

/// A department with its member list.
///
/// Members are derived: they are recomputed from each employee's
/// `department_id` whenever a department is read and are never stored as
/// the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    id: DepartmentId,
    name: String,
    employees: Vec<Employee>,
}

impl Department {
    /// Creates a department without members.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the name is blank.
    pub fn create(id: DepartmentId, name: impl Into<String>) -> Result<Self, ScheduleDomainError> {
        Ok(Self {
            id,
            name: validated_name(EntityKind::Department, name)?,
            employees: Vec::new(),
        })
    }

    /// Builds a department whose members are every employee referencing it.
    #[must_use]
    pub fn with_members(id: DepartmentId, name: String, all_employees: &[Employee]) -> Self {
        let employees = all_employees
            .iter()
            .filter(|employee| employee.department_id() == &id)
            .cloned()
            .collect();
        Self {
            id,
            name,
            employees,
        }
    }

    /// Returns the department identifier.
    #[must_use]
    pub const fn id(&self) -> &DepartmentId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the members.
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the new name is blank.
    pub fn apply(&mut self, patch: &DepartmentPatch) -> Result<(), ScheduleDomainError> {
        if let Some(name) = patch.validated_name()? {
            self.name = name;
        }
        Ok(())
    }

    pub(crate) fn rebuild_members(&mut self, all_employees: &[Employee]) {
        self.employees = all_employees
            .iter()
            .filter(|employee| employee.department_id() == &self.id)
            .cloned()
            .collect();
    }
}
