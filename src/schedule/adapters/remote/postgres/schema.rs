//! Diesel schema for the board tables.
//!
//! `position` is declared for the update path only; listing queries are
//! written in SQL so they can run against tables that lack it.

diesel::table! {
    /// Projects in display order.
    projects (id) {
        /// Project identifier.
        id -> Text,
        /// Display name.
        name -> Nullable<Text>,
        /// Insertion timestamp.
        created_at -> Nullable<Timestamptz>,
        /// Explicit display position.
        position -> Nullable<Int4>,
    }
}

diesel::table! {
    /// Tasks owned by projects.
    tasks (id) {
        /// Task identifier.
        id -> Text,
        /// Owning project.
        project_id -> Nullable<Text>,
        /// Display name.
        name -> Nullable<Text>,
        /// First day as `YYYY-MM-DD`.
        start_date -> Nullable<Text>,
        /// Last day as `YYYY-MM-DD`.
        end_date -> Nullable<Text>,
        /// Presentation color.
        color -> Nullable<Text>,
        /// Assignee.
        employee_id -> Nullable<Text>,
        /// Completion percentage.
        progress -> Nullable<Int4>,
        /// Free-text description.
        description -> Nullable<Text>,
        /// Explicit display position within the project.
        position -> Nullable<Int4>,
    }
}

diesel::table! {
    /// Departments.
    departments (id) {
        /// Department identifier.
        id -> Text,
        /// Display name.
        name -> Nullable<Text>,
    }
}

diesel::table! {
    /// Employees.
    employees (id) {
        /// Employee identifier.
        id -> Text,
        /// Display name.
        name -> Nullable<Text>,
        /// Owning department.
        department_id -> Nullable<Text>,
    }
}

diesel::table! {
    /// Shared key/value settings.
    system_settings (key) {
        /// Setting name.
        key -> Text,
        /// Setting value.
        value -> Nullable<Jsonb>,
    }
}
