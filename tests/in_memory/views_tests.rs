//! Read-side integration tests: list paging, search, sort and virtual views.

use super::helpers::{Harness, harness};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use noda::pagination::Pagination;
use noda::task::{
    domain::{Task, TaskCreation, TaskId},
    services::{MissingEntity, TaskServiceError},
};
use rstest::rstest;

fn noon_in(days: i64) -> DateTime<Utc> {
    (Utc::now().date_naive() + TimeDelta::days(days))
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc()
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(Task::title).collect()
}

async fn save_due(
    harness: &Harness,
    title: &str,
    due: DateTime<Utc>,
) -> Result<TaskId, eyre::Report> {
    let id = harness
        .service
        .save(
            harness.owner_id,
            harness.list_id,
            &mut TaskCreation::titled(title).with_due_date(due),
        )
        .await?;
    Ok(id)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_reads_search_sort_and_page(harness: Harness) -> Result<(), eyre::Report> {
    for title in ["Buy milk", "Call mum", "Buy bread", "Book flights", "Buy eggs"] {
        harness.save(harness.list_id, title).await?;
    }

    let searched = harness
        .service
        .fetch(harness.owner_id, harness.list_id, Pagination::default(), " BUY ", "-title")
        .await?;
    eyre::ensure!(titles(&searched.payload) == vec!["Buy milk", "Buy eggs", "Buy bread"]);
    eyre::ensure!(searched.retrieved == 3);

    let second = harness
        .service
        .fetch(harness.owner_id, harness.list_id, Pagination::new(2, 2), "", "")
        .await?;
    eyre::ensure!((second.page, second.rows_per_page) == (2, 2));
    eyre::ensure!(titles(&second.payload) == vec!["Buy bread", "Book flights"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pinned_tasks_lead_the_default_order(harness: Harness) -> Result<(), eyre::Report> {
    harness.save(harness.list_id, "First").await?;
    let pinned = harness.save(harness.list_id, "Second").await?;
    harness
        .service
        .pin(harness.owner_id, harness.list_id, pinned)
        .await?;

    let page = harness
        .service
        .fetch(harness.owner_id, harness.list_id, Pagination::default(), "", "")
        .await?;
    eyre::ensure!(titles(&page.payload) == vec!["Second", "First"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fetch_from_foreign_list_is_not_found(harness: Harness) -> Result<(), eyre::Report> {
    let foreign = noda::task::domain::ListId::new();
    let result = harness
        .service
        .fetch(harness.owner_id, foreign, Pagination::default(), "", "")
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskServiceError::NotFound(MissingEntity::List(list))) if list == foreign
        ),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn virtual_views_partition_by_due_date(harness: Harness) -> Result<(), eyre::Report> {
    let special = harness.directory.provision_special_lists(harness.owner_id)?;
    save_due(&harness, "due today", noon_in(0)).await?;
    save_due(&harness, "due tomorrow", noon_in(1)).await?;
    save_due(&harness, "due next week", noon_in(7)).await?;
    harness.save(harness.list_id, "someday").await?;
    harness.save(special.today, "pinned to today").await?;
    let owner = harness.owner_id;
    let svc = &harness.service;

    let today = svc.fetch_today(owner, Pagination::default(), "", "title").await?;
    eyre::ensure!(titles(&today.payload) == vec!["due today", "pinned to today"]);

    let tomorrow = svc
        .fetch_tomorrow(owner, Pagination::default(), "", "")
        .await?;
    eyre::ensure!(titles(&tomorrow.payload) == vec!["due tomorrow"]);

    let deferred = svc
        .fetch_deferred(owner, Pagination::default(), "", "")
        .await?;
    eyre::ensure!(titles(&deferred.payload) == vec!["someday"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn views_require_a_known_user(harness: Harness) -> Result<(), eyre::Report> {
    let stranger = noda::task::domain::OwnerId::new();
    let err = harness
        .service
        .fetch_deferred(stranger, Pagination::default(), "", "")
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("unknown user should fail"))?;
    eyre::ensure!(err.is_not_found());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn view_commands_move_between_materialised_lists(
    harness: Harness,
) -> Result<(), eyre::Report> {
    let special = harness.directory.provision_special_lists(harness.owner_id)?;
    let owner = harness.owner_id;
    let svc = &harness.service;
    let id = save_due(&harness, "Errand", noon_in(3)).await?;

    eyre::ensure!(svc.today(owner, id).await?);
    eyre::ensure!(!svc.today(owner, id).await?);
    let in_today = svc.fetch_by_id(owner, special.today, id).await?;
    eyre::ensure!(in_today.position() == 0);

    eyre::ensure!(svc.tomorrow(owner, id).await?);
    let deferred = svc.fetch_by_id(owner, special.deferred, id).await?;
    let expected_due = (Utc::now().date_naive() + TimeDelta::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    eyre::ensure!(deferred.due_date() == Some(expected_due));

    eyre::ensure!(svc.defer(owner, id).await?);
    let cleared = svc.fetch_by_id(owner, special.deferred, id).await?;
    eyre::ensure!(cleared.due_date().is_none());
    eyre::ensure!(harness.layout(special.today).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tomorrow_keeps_tasks_outside_today_in_place(harness: Harness) -> Result<(), eyre::Report> {
    harness.directory.provision_special_lists(harness.owner_id)?;
    let id = harness.save(harness.list_id, "Stay put").await?;

    eyre::ensure!(harness.service.tomorrow(harness.owner_id, id).await?);

    let stored = harness
        .service
        .fetch_by_id(harness.owner_id, harness.list_id, id)
        .await?;
    eyre::ensure!(stored.due_date().is_some());
    Ok(())
}
