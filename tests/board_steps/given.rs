//! Given steps for board persistence BDD scenarios.

use super::world::{BoardWorld, run_async};
use eyre::WrapErr;
use planboard::schedule::ports::{BackendError, ScheduleStore};
use rstest_bdd_macros::given;

#[given("an empty local board")]
fn an_empty_local_board(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    world.clear_local()
}

#[given("a reachable remote backend")]
fn a_reachable_remote_backend(world: &mut BoardWorld) {
    world.connector.accept();
}

#[given("an unreachable remote backend")]
fn an_unreachable_remote_backend(world: &mut BoardWorld) {
    world
        .connector
        .refuse_with(BackendError::new("connection refused"));
}

#[given(r#"a local project named "{name}""#)]
fn a_local_project_named(world: &mut BoardWorld, name: String) -> Result<(), eyre::Report> {
    let project = run_async(world.facade.add_project(&name)).wrap_err("add local project")?;
    world.projects.insert(name, project.id().clone());
    Ok(())
}
