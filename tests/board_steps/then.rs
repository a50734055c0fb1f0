//! Then steps for board persistence BDD scenarios.

use super::world::{BoardWorld, names, run_async};
use planboard::connection::persisted::load_remote_config;
use planboard::schedule::{
    domain::{Progress, TASK_PALETTE},
    ports::ScheduleStore,
    services::StorageMode,
};
use rstest_bdd_macros::then;

#[then("the board lists {count:usize} projects")]
fn the_board_lists_projects(world: &BoardWorld, count: usize) -> Result<(), eyre::Report> {
    let projects = run_async(world.facade.list_projects())
        .map_err(|err| eyre::eyre!("list_projects failed: {err}"))?;
    if projects.len() != count {
        return Err(eyre::eyre!(
            "expected {count} projects, found {}",
            projects.len()
        ));
    }
    Ok(())
}

#[then(r#"project "{name}" has {count:usize} tasks"#)]
fn project_has_tasks(world: &BoardWorld, name: String, count: usize) -> Result<(), eyre::Report> {
    let projects = run_async(world.facade.list_projects())
        .map_err(|err| eyre::eyre!("list_projects failed: {err}"))?;
    let project = projects
        .iter()
        .find(|project| project.name() == name)
        .ok_or_else(|| eyre::eyre!("project '{name}' not listed"))?;
    if project.tasks().len() != count {
        return Err(eyre::eyre!(
            "expected {count} tasks in '{name}', found {}",
            project.tasks().len()
        ));
    }
    Ok(())
}

#[then(r#"task "{name}" starts with no progress and a palette color"#)]
fn task_starts_with_defaults(world: &BoardWorld, name: String) -> Result<(), eyre::Report> {
    let projects = run_async(world.facade.list_projects())
        .map_err(|err| eyre::eyre!("list_projects failed: {err}"))?;
    let task = projects
        .iter()
        .flat_map(|project| project.tasks())
        .find(|task| task.name() == name)
        .ok_or_else(|| eyre::eyre!("task '{name}' not listed"))?;
    if task.progress() != Progress::NONE {
        return Err(eyre::eyre!("expected no progress, found {:?}", task.progress()));
    }
    if !TASK_PALETTE.contains(&task.color().as_str()) {
        return Err(eyre::eyre!("unexpected color {:?}", task.color()));
    }
    Ok(())
}

#[then(r#"the project order is "{order}""#)]
fn the_project_order_is(world: &BoardWorld, order: String) -> Result<(), eyre::Report> {
    let projects = run_async(world.facade.list_projects())
        .map_err(|err| eyre::eyre!("list_projects failed: {err}"))?;
    let listed: Vec<String> = projects
        .iter()
        .map(|project| project.name().to_owned())
        .collect();
    let expected = names(&order);
    if listed != expected {
        return Err(eyre::eyre!("expected order {expected:?}, found {listed:?}"));
    }
    Ok(())
}

#[then("the board is in remote mode")]
fn the_board_is_remote(world: &BoardWorld) -> Result<(), eyre::Report> {
    expect_mode(world, StorageMode::Remote)
}

#[then("the board is in local mode")]
fn the_board_is_local(world: &BoardWorld) -> Result<(), eyre::Report> {
    expect_mode(world, StorageMode::Local)
}

#[then("the remote backend holds {count:usize} projects")]
fn the_remote_backend_holds(world: &BoardWorld, count: usize) -> Result<(), eyre::Report> {
    let rows = world.backend.project_rows();
    if rows.len() != count {
        return Err(eyre::eyre!(
            "expected {count} remote project rows, found {}",
            rows.len()
        ));
    }
    Ok(())
}

#[then("no remote configuration is saved")]
fn no_remote_configuration_is_saved(world: &BoardWorld) -> Result<(), eyre::Report> {
    let saved = load_remote_config(&world.storage)
        .map_err(|err| eyre::eyre!("reading saved configuration failed: {err}"))?;
    if let Some(config) = saved {
        return Err(eyre::eyre!("expected no saved configuration, found {config:?}"));
    }
    Ok(())
}

#[then("connecting fails")]
fn connecting_fails(world: &BoardWorld) -> Result<(), eyre::Report> {
    match &world.last_connect {
        Some(Err(_)) => Ok(()),
        Some(Ok(mode)) => Err(eyre::eyre!("expected connection failure, entered {mode} mode")),
        None => Err(eyre::eyre!("no connection attempt in scenario world")),
    }
}

fn expect_mode(world: &BoardWorld, expected: StorageMode) -> Result<(), eyre::Report> {
    let mode = world.facade.mode();
    if mode != expected {
        return Err(eyre::eyre!("expected {expected} mode, found {mode}"));
    }
    Ok(())
}
