//! The full snapshot of projects, departments and employees.

use super::{
    ColorToken, DateSpan, Department, DepartmentId, Employee, EmployeeId, PersistedTaskData,
    Progress, Project, ProjectId, ScheduleDomainError, Task, TaskId,
};
use chrono::NaiveDate;

/// Snapshot of every project, department and employee.
///
/// This is the unit of persistence for the local backend. Department member
/// lists are rebuilt from `employees` whenever a dataset is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    projects: Vec<Project>,
    departments: Vec<Department>,
    employees: Vec<Employee>,
}

impl Dataset {
    /// Assembles a dataset, recomputing department membership.
    #[must_use]
    pub fn new(
        projects: Vec<Project>,
        mut departments: Vec<Department>,
        employees: Vec<Employee>,
    ) -> Self {
        for department in &mut departments {
            department.rebuild_members(&employees);
        }
        Self {
            projects,
            departments,
            employees,
        }
    }

    /// Returns the projects in display order.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Returns the departments with derived members.
    #[must_use]
    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    /// Returns every employee.
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Looks up a project.
    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id() == id)
    }

    /// Looks up a task in any project.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.projects.iter().find_map(|project| project.task(id))
    }

    /// Splits the dataset into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Project>, Vec<Department>, Vec<Employee>) {
        (self.projects, self.departments, self.employees)
    }

    pub(crate) const fn projects_mut(&mut self) -> &mut Vec<Project> {
        &mut self.projects
    }

    pub(crate) fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| project.id() == id)
    }

    pub(crate) fn department_mut(&mut self, id: &DepartmentId) -> Option<&mut Department> {
        self.departments
            .iter_mut()
            .find(|department| department.id() == id)
    }

    pub(crate) fn push_department(&mut self, department: Department) {
        self.departments.push(department);
        self.refresh_members();
    }

    /// Removes a department and every employee referencing it.
    pub(crate) fn remove_department(&mut self, id: &DepartmentId) -> Option<Department> {
        let index = self
            .departments
            .iter()
            .position(|department| department.id() == id)?;
        let removed = self.departments.remove(index);
        self.employees
            .retain(|employee| employee.department_id() != id);
        self.refresh_members();
        Some(removed)
    }

    pub(crate) fn push_employee(&mut self, employee: Employee) {
        self.employees.push(employee);
        self.refresh_members();
    }

    pub(crate) fn remove_employee(&mut self, id: &EmployeeId) -> Option<Employee> {
        let index = self
            .employees
            .iter()
            .position(|employee| employee.id() == id)?;
        let removed = self.employees.remove(index);
        self.refresh_members();
        Some(removed)
    }

    fn refresh_members(&mut self) {
        for department in &mut self.departments {
            department.rebuild_members(&self.employees);
        }
    }

    /// Builds the sample dataset shown on first run.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError`] only if the built-in sample data is
    /// itself invalid.
    pub fn seed() -> Result<Self, ScheduleDomainError> {
        let engineering = DepartmentId::new("d1")?;
        let design = DepartmentId::new("d2")?;
        let employees = vec![
            Employee::create(EmployeeId::new("e1")?, "Alice Martin", engineering.clone())?,
            Employee::create(EmployeeId::new("e2")?, "Bruno Costa", engineering.clone())?,
            Employee::create(EmployeeId::new("e3")?, "Chloe Tanaka", design.clone())?,
        ];
        let departments = vec![
            Department::create(engineering, "Engineering")?,
            Department::create(design, "Design")?,
        ];

        let project_id = ProjectId::new("p1")?;
        let tasks = vec![
            seed_task(
                SeedTask {
                    id: "t1",
                    name: "Wireframes",
                    start: (2024, 1, 8),
                    end: (2024, 1, 12),
                    employee: "e3",
                    progress: 100,
                    color: "#8b5cf6",
                },
                &project_id,
            )?,
            seed_task(
                SeedTask {
                    id: "t2",
                    name: "API design",
                    start: (2024, 1, 10),
                    end: (2024, 1, 19),
                    employee: "e1",
                    progress: 60,
                    color: "#3b82f6",
                },
                &project_id,
            )?,
            seed_task(
                SeedTask {
                    id: "t3",
                    name: "Frontend build",
                    start: (2024, 1, 15),
                    end: (2024, 1, 31),
                    employee: "e2",
                    progress: 20,
                    color: "#10b981",
                },
                &project_id,
            )?,
        ];
        let projects = vec![Project::from_persisted(
            project_id,
            "Website Relaunch".to_owned(),
            tasks,
        )];

        Ok(Self::new(projects, departments, employees))
    }
}

struct SeedTask {
    id: &'static str,
    name: &'static str,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    employee: &'static str,
    progress: i64,
    color: &'static str,
}

fn seed_task(seed: SeedTask, project_id: &ProjectId) -> Result<Task, ScheduleDomainError> {
    let span = DateSpan::new(calendar_date(seed.start)?, calendar_date(seed.end)?)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(seed.id)?,
        project_id: project_id.clone(),
        name: seed.name.to_owned(),
        span,
        employee_id: EmployeeId::new(seed.employee)?,
        progress: Progress::new(seed.progress)?,
        color: ColorToken::new(seed.color)?,
        description: None,
    }))
}

fn calendar_date((year, month, day): (i32, u32, u32)) -> Result<NaiveDate, ScheduleDomainError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ScheduleDomainError::InvalidDate(format!("{year}-{month}-{day}")))
}
