//! Ordering integration tests: append, reorder, trash, delete and move.

use super::helpers::{Harness, dense, harness};
use noda::task::ports::TaskRepositoryError;
use noda::task::services::TaskServiceError;
use rstest::rstest;
use std::sync::Arc;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn saves_append_dense_positions(harness: Harness) -> Result<(), eyre::Report> {
    for title in ["A", "B", "C"] {
        harness.save(harness.list_id, title).await?;
    }

    eyre::ensure!(harness.layout(harness.list_id).await? == dense(&["A", "B", "C"]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_trash_delete_scenario(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    let owner = harness.owner_id;
    let a = harness.save(list, "A").await?;
    let b = harness.save(list, "B").await?;
    let c = harness.save(list, "C").await?;

    eyre::ensure!(harness.service.reorder(owner, list, b, 0).await?);
    eyre::ensure!(harness.layout(list).await? == dense(&["B", "A", "C"]));

    eyre::ensure!(harness.service.trash(owner, list, a).await?);
    eyre::ensure!(
        harness.layout(list).await? == vec![("B".to_owned(), 0), ("C".to_owned(), 2)],
        "trash must not repack siblings"
    );

    harness.service.delete(owner, list, c).await?;
    eyre::ensure!(harness.layout(list).await? == dense(&["B"]));
    Ok(())
}

#[rstest]
#[case(0, &["C", "A", "B"])]
#[case(1, &["A", "C", "B"])]
#[case(2, &["A", "B", "C"])]
#[case(40, &["A", "B", "C"])]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_clamps_and_repacks(
    harness: Harness,
    #[case] target: u64,
    #[case] expected: &[&str],
) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    harness.save(list, "A").await?;
    harness.save(list, "B").await?;
    let c = harness.save(list, "C").await?;

    harness
        .service
        .reorder(harness.owner_id, list, c, target)
        .await?;

    eyre::ensure!(harness.layout(list).await? == dense(expected));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_is_idempotent(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    harness.save(list, "A").await?;
    let b = harness.save(list, "B").await?;

    eyre::ensure!(harness.service.reorder(harness.owner_id, list, b, 0).await?);
    eyre::ensure!(!harness.service.reorder(harness.owner_id, list, b, 0).await?);
    eyre::ensure!(harness.layout(list).await? == dense(&["B", "A"]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_of_trashed_task_is_not_found(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    let a = harness.save(list, "A").await?;
    harness.service.trash(harness.owner_id, list, a).await?;

    let result = harness.service.reorder(harness.owner_id, list, a, 0).await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::Repository(TaskRepositoryError::NotFound(id))) if id == a
        ),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restore_appends_after_surviving_tail(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    let owner = harness.owner_id;
    let a = harness.save(list, "A").await?;
    harness.save(list, "B").await?;
    harness.save(list, "C").await?;

    harness.service.trash(owner, list, a).await?;
    eyre::ensure!(!harness.service.trash(owner, list, a).await?);
    eyre::ensure!(harness.service.restore_from_trash(owner, list, a).await?);
    eyre::ensure!(!harness.service.restore_from_trash(owner, list, a).await?);

    eyre::ensure!(
        harness.layout(list).await?
            == vec![
                ("B".to_owned(), 1),
                ("C".to_owned(), 2),
                ("A".to_owned(), 3),
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn save_after_trash_avoids_the_surviving_tail(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    harness.save(list, "A").await?;
    let b = harness.save(list, "B").await?;
    harness.save(list, "C").await?;
    harness.service.trash(harness.owner_id, list, b).await?;

    harness.save(list, "D").await?;

    eyre::ensure!(
        harness.layout(list).await?
            == vec![
                ("A".to_owned(), 0),
                ("C".to_owned(), 2),
                ("D".to_owned(), 3),
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_repacks_source_and_appends_to_target(harness: Harness) -> Result<(), eyre::Report> {
    let source = harness.list_id;
    let target = harness.new_list()?;
    harness.save(source, "X").await?;
    let t = harness.save(source, "T").await?;
    harness.save(source, "Y").await?;
    harness.save(target, "P").await?;

    eyre::ensure!(harness.service.move_task(harness.owner_id, t, target).await?);

    eyre::ensure!(harness.layout(source).await? == dense(&["X", "Y"]));
    eyre::ensure!(harness.layout(target).await? == dense(&["P", "T"]));
    let moved = harness
        .service
        .fetch_by_id(harness.owner_id, target, t)
        .await?;
    eyre::ensure!(moved.list_id() == target);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn move_into_current_list_is_a_no_op(harness: Harness) -> Result<(), eyre::Report> {
    let list = harness.list_id;
    let a = harness.save(list, "A").await?;

    eyre::ensure!(!harness.service.move_task(harness.owner_id, a, list).await?);
    eyre::ensure!(harness.layout(list).await? == dense(&["A"]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_of_unknown_task_is_not_found(harness: Harness) -> Result<(), eyre::Report> {
    let result = harness
        .service
        .delete(
            harness.owner_id,
            harness.list_id,
            noda::task::domain::TaskId::new(),
        )
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("delete should fail"))?;
    eyre::ensure!(err.is_not_found());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_saves_keep_positions_unique(harness: Harness) -> Result<(), eyre::Report> {
    let shared = Arc::new(harness);
    let mut saves = JoinSet::new();
    for n in 0..16 {
        let worker = Arc::clone(&shared);
        saves.spawn(async move { worker.save(worker.list_id, &format!("task-{n}")).await });
    }
    while let Some(joined) = saves.join_next().await {
        joined??;
    }

    let positions: Vec<u64> = shared
        .layout(shared.list_id)
        .await?
        .into_iter()
        .map(|(_, position)| position)
        .collect();
    eyre::ensure!(positions == (0..16).collect::<Vec<u64>>());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reorders_keep_positions_dense(harness: Harness) -> Result<(), eyre::Report> {
    let mut ids = Vec::new();
    for n in 0..12 {
        ids.push(harness.save(harness.list_id, &format!("task-{n}")).await?);
    }

    let shared = Arc::new(harness);
    let mut reorders = JoinSet::new();
    for (id, target) in ids.iter().copied().zip((0_u64..5).cycle()) {
        let worker = Arc::clone(&shared);
        reorders.spawn(async move {
            worker
                .service
                .reorder(worker.owner_id, worker.list_id, id, target)
                .await
        });
    }
    while let Some(joined) = reorders.join_next().await {
        joined??;
    }

    let layout = shared.layout(shared.list_id).await?;
    let positions: Vec<u64> = layout.iter().map(|(_, position)| *position).collect();
    eyre::ensure!(positions == (0..12).collect::<Vec<u64>>());
    let mut titles: Vec<String> = layout.into_iter().map(|(title, _)| title).collect();
    titles.sort();
    let mut expected: Vec<String> = (0..12).map(|n| format!("task-{n}")).collect();
    expected.sort();
    eyre::ensure!(titles == expected, "every task keeps exactly one slot");
    Ok(())
}
