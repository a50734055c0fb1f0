//! When steps for board persistence BDD scenarios.

use super::world::{BoardWorld, REMOTE_KEY, REMOTE_URL, names, run_async};
use chrono::NaiveDate;
use eyre::WrapErr;
use planboard::schedule::{
    domain::{EmployeeId, NewTask},
    ports::ScheduleStore,
};
use rstest_bdd_macros::when;

#[when(r#"a project named "{name}" is added"#)]
fn a_project_is_added(world: &mut BoardWorld, name: String) -> Result<(), eyre::Report> {
    let project = run_async(world.facade.add_project(&name)).wrap_err("add project")?;
    world.projects.insert(name, project.id().clone());
    Ok(())
}

#[when(r#"a task named "{task}" is added to project "{project}""#)]
fn a_task_is_added(
    world: &mut BoardWorld,
    task: String,
    project: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project_id(&project)?;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or_else(|| eyre::eyre!("invalid date"))?;
    let end = NaiveDate::from_ymd_opt(2024, 1, 5).ok_or_else(|| eyre::eyre!("invalid date"))?;
    let employee = EmployeeId::new("e1").wrap_err("employee id")?;
    run_async(
        world
            .facade
            .add_task(&project_id, NewTask::new(task, start, end, employee)),
    )
    .wrap_err("add task")?;
    Ok(())
}

#[when(r#"the projects are reordered as "{order}""#)]
fn the_projects_are_reordered(world: &mut BoardWorld, order: String) -> Result<(), eyre::Report> {
    let ids = names(&order)
        .iter()
        .map(|name| world.project_id(name))
        .collect::<Result<Vec<_>, _>>()?;
    run_async(world.facade.reorder_projects(&ids)).wrap_err("reorder projects")?;
    Ok(())
}

#[when("the board connects to the remote backend")]
fn the_board_connects(world: &mut BoardWorld) {
    world.last_connect = Some(run_async(world.facade.init_remote(REMOTE_URL, REMOTE_KEY)));
}

#[when("the board is reconfigured with blank settings")]
fn the_board_is_reconfigured_blank(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    run_async(world.facade.init_remote("", "")).wrap_err("blank reconfiguration")?;
    Ok(())
}
