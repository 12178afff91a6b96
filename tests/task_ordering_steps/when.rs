//! When steps for task ordering BDD scenarios.

use super::world::{OrderingWorld, run_async};
use eyre::WrapErr;
use noda::task::domain::{OwnerId, TaskCreation};
use rstest_bdd_macros::when;

#[when(r#"task "{title}" is reordered to position {position:u64}"#)]
fn reorder_task(
    world: &mut OrderingWorld,
    title: String,
    position: u64,
) -> Result<(), eyre::Report> {
    let (list_id, task_id) = world.task(&title)?;
    run_async(
        world
            .service
            .reorder(world.owner_id, list_id, task_id, position),
    )
    .wrap_err("reorder task")?;
    Ok(())
}

#[when(r#"task "{title}" is trashed"#)]
fn trash_task(world: &mut OrderingWorld, title: String) -> Result<(), eyre::Report> {
    let (list_id, task_id) = world.task(&title)?;
    run_async(world.service.trash(world.owner_id, list_id, task_id)).wrap_err("trash task")?;
    Ok(())
}

#[when(r#"task "{title}" is restored"#)]
fn restore_task(world: &mut OrderingWorld, title: String) -> Result<(), eyre::Report> {
    let (list_id, task_id) = world.task(&title)?;
    run_async(
        world
            .service
            .restore_from_trash(world.owner_id, list_id, task_id),
    )
    .wrap_err("restore task")?;
    Ok(())
}

#[when(r#"task "{title}" is deleted"#)]
fn delete_task(world: &mut OrderingWorld, title: String) -> Result<(), eyre::Report> {
    let (list_id, task_id) = world.task(&title)?;
    run_async(world.service.delete(world.owner_id, list_id, task_id)).wrap_err("delete task")?;
    world.tasks.remove(&title);
    Ok(())
}

#[when(r#"task "{title}" is moved to list "{target}""#)]
fn move_task(world: &mut OrderingWorld, title: String, target: String) -> Result<(), eyre::Report> {
    let (_, task_id) = world.task(&title)?;
    let target_id = world.list(&target)?;
    run_async(world.service.move_task(world.owner_id, task_id, target_id))
        .wrap_err("move task")?;
    world.tasks.insert(title, (target_id, task_id));
    Ok(())
}

#[when(r#"a task is saved into list "{name}" without an owner"#)]
fn save_without_owner(world: &mut OrderingWorld, name: String) -> Result<(), eyre::Report> {
    let list_id = world.list(&name)?;
    let result = run_async(world.service.save(
        OwnerId::nil(),
        list_id,
        &mut TaskCreation::titled("orphan"),
    ));
    world.last_error = result.err();
    Ok(())
}
