//! SQL scripts that provision or migrate the remote schema.
//!
//! Callers receiving [`StoreError::NotProvisioned`] can show
//! [`provisioning_script`] to whoever administers the database.
//!
//! [`StoreError::NotProvisioned`]: crate::schedule::ports::StoreError::NotProvisioned

use minijinja::{Environment, context};

/// `LISTEN`/`NOTIFY` channel fed by the change triggers.
pub const CHANGE_CHANNEL: &str = "planboard_changes";

/// Tables whose row changes are broadcast on [`CHANGE_CHANNEL`].
pub const WATCHED_TABLES: [&str; 5] = [
    "projects",
    "tasks",
    "departments",
    "employees",
    "system_settings",
];

const POSITIONED_TABLES: [&str; 2] = ["projects", "tasks"];

const PROVISIONING_TEMPLATE: &str = r"-- Board tables
CREATE TABLE IF NOT EXISTS projects (
    id text PRIMARY KEY,
    name text,
    created_at timestamptz DEFAULT now(),
    position integer
);

CREATE TABLE IF NOT EXISTS tasks (
    id text PRIMARY KEY,
    project_id text REFERENCES projects(id) ON DELETE CASCADE,
    name text,
    start_date text,
    end_date text,
    color text,
    employee_id text,
    progress integer,
    description text,
    position integer
);

CREATE TABLE IF NOT EXISTS departments (
    id text PRIMARY KEY,
    name text
);

CREATE TABLE IF NOT EXISTS employees (
    id text PRIMARY KEY,
    name text,
    department_id text
);

CREATE TABLE IF NOT EXISTS system_settings (
    key text PRIMARY KEY,
    value jsonb
);

-- Change notifications
CREATE OR REPLACE FUNCTION {{ channel }}_notify() RETURNS trigger AS $$
BEGIN
    PERFORM pg_notify('{{ channel }}', TG_TABLE_NAME);
    RETURN NULL;
END;
$$ LANGUAGE plpgsql;
{% for table in tables %}
DROP TRIGGER IF EXISTS {{ table }}_{{ channel }} ON {{ table }};
CREATE TRIGGER {{ table }}_{{ channel }}
    AFTER INSERT OR UPDATE OR DELETE ON {{ table }}
    FOR EACH STATEMENT EXECUTE FUNCTION {{ channel }}_notify();
{% endfor %}";

const POSITION_MIGRATION_TEMPLATE: &str = r"-- Explicit display order
{% for table in tables -%}
ALTER TABLE {{ table }} ADD COLUMN IF NOT EXISTS position integer;
{% endfor %}";

/// Renders the script creating every board table, the cascade rule, the
/// optional `position` columns and the change-notification triggers.
///
/// # Errors
///
/// Returns a [`minijinja::Error`] if the built-in template fails to render.
pub fn provisioning_script() -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        PROVISIONING_TEMPLATE,
        context! { channel => CHANGE_CHANNEL, tables => WATCHED_TABLES },
    )
}

/// Renders the script adding the `position` columns to tables created
/// before explicit ordering existed.
///
/// # Errors
///
/// Returns a [`minijinja::Error`] if the built-in template fails to render.
pub fn position_migration_script() -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        POSITION_MIGRATION_TEMPLATE,
        context! { tables => POSITIONED_TABLES },
    )
}
