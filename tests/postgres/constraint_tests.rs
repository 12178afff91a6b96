//! Duplicate and ownership enforcement against `PostgreSQL`.

use super::helpers::{BoxError, PgContext, pg_context};
use chrono::{TimeDelta, Utc};
use noda::task::{
    domain::{ListId, OwnerId, TaskChange, TaskCreation, TaskId},
    ports::{TaskRepository, TaskRepositoryError},
    services::{MissingEntity, TaskServiceError},
};
use rstest::rstest;
use std::sync::Arc;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_rejects_duplicate_task_identifier(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let id = ctx.save(ctx.list_id, "Original").await?;
    let existing = ctx
        .service
        .fetch_by_id(ctx.owner_id, ctx.list_id, id)
        .await?;

    let result = ctx.repository.insert(&existing).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::DuplicateTask(dup)) if dup == id
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_scopes_lookups_by_owner(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let id = ctx.save(ctx.list_id, "Private").await?;
    let stranger = OwnerId::new();

    let read = ctx.service.fetch_by_id(stranger, ctx.list_id, id).await;
    assert!(matches!(
        read,
        Err(TaskServiceError::NotFound(MissingEntity::Task(missing))) if missing == id
    ));

    let save = ctx
        .service
        .save(stranger, ctx.list_id, &mut TaskCreation::titled("intrusion"))
        .await;
    assert!(matches!(
        save,
        Err(TaskServiceError::NotFound(MissingEntity::List(list))) if list == ctx.list_id
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_structural_misses_are_not_found(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let missing = TaskId::new();

    for result in [
        ctx.service.reorder(ctx.owner_id, ctx.list_id, missing, 0).await,
        ctx.service.trash(ctx.owner_id, ctx.list_id, missing).await,
        ctx.service
            .restore_from_trash(ctx.owner_id, ctx.list_id, missing)
            .await,
    ] {
        let err = result.err().ok_or("expected a not-found error")?;
        assert!(err.is_not_found(), "unexpected error: {err:?}");
    }

    let moved = ctx
        .service
        .move_task(ctx.owner_id, missing, ListId::new())
        .await;
    assert!(matches!(
        moved,
        Err(TaskServiceError::NotFound(MissingEntity::List(_)))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_update_round_trips_attributes(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let (owner, list) = (ctx.owner_id, ctx.list_id);
    let id = ctx.save(list, "Draft").await?;

    assert!(ctx.service.complete(owner, list, id).await?);
    assert!(ctx.service.pin(owner, list, id).await?);
    let copy = ctx.service.duplicate(owner, id).await?;

    let original = ctx.service.fetch_by_id(owner, list, id).await?;
    let replica = ctx.service.fetch_by_id(owner, list, copy).await?;
    assert!(original.completed_at().is_some());
    assert_eq!(replica.status(), original.status());
    assert!(replica.is_pinned());
    assert_eq!(replica.position(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_completions_racing_defer_keep_the_cleared_due_date(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let special = ctx.provision_special_lists()?;
    let (owner, list) = (ctx.owner_id, ctx.list_id);
    let due = Utc::now() + TimeDelta::days(30);
    let id = ctx
        .service
        .save(owner, list, &mut TaskCreation::titled("Errand").with_due_date(due))
        .await?;

    let shared = Arc::new(ctx);
    let mut writers = JoinSet::new();
    let deferrer = Arc::clone(&shared);
    writers.spawn(async move { deferrer.service.defer(owner, id).await });
    for _ in 0..8 {
        let worker = Arc::clone(&shared);
        writers.spawn(async move {
            match worker.service.complete(owner, list, id).await {
                Err(err) if err.is_not_found() => Ok(false),
                other => other,
            }
        });
    }
    while let Some(joined) = writers.join_next().await {
        joined??;
    }

    let stored = shared.service.fetch_by_id(owner, special.deferred, id).await?;
    assert_eq!(stored.due_date(), None);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_modify_applies_change_under_row_lock(
    pg_context: Result<Option<PgContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = pg_context? else {
        return Ok(());
    };
    let (owner, list) = (ctx.owner_id, ctx.list_id);
    let id = ctx.save(list, "Draft").await?;
    let now = Utc::now();

    assert!(ctx.repository.modify(owner, list, id, &TaskChange::Pin, now).await?);
    assert!(!ctx.repository.modify(owner, list, id, &TaskChange::Pin, now).await?);
    let missing = ctx
        .repository
        .modify(owner, ListId::new(), id, &TaskChange::Unpin, now)
        .await;
    assert!(matches!(missing, Err(TaskRepositoryError::NotFound(task)) if task == id));
    Ok(())
}
