//! Listing reads: one list and the today, tomorrow and deferred views.

use super::{error::TaskServiceResult, guards::require_identifier, task_service::TaskService};
use crate::pagination::{Page, Pagination};
use crate::task::{
    domain::{
        DayWindow, ListId, Needle, OwnerId, SortExpression, Task, TaskDomainError, TaskQuery,
        TaskSelection,
    },
    ports::{OwnershipDirectory, TaskRepository},
};
use mockable::Clock;

impl<R, D, C> TaskService<R, D, C>
where
    R: TaskRepository,
    D: OwnershipDirectory,
    C: Clock + Send + Sync,
{
    /// Lists the active tasks of one list.
    ///
    /// `needle` filters title, headline and description case-insensitively;
    /// `sort` is a field name optionally prefixed with `-`.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::NotFound`] when the list does not
    /// belong to the owner.
    pub async fn fetch(
        &self,
        owner_id: OwnerId,
        list_id: ListId,
        pagination: Pagination,
        needle: &str,
        sort: &str,
    ) -> TaskServiceResult<Page<Task>> {
        require_identifier("Fetch", "ownerID", owner_id)?;
        require_identifier("Fetch", "listID", list_id)?;
        self.ensure_list(owner_id, list_id).await?;
        self.read_page(owner_id, TaskSelection::List(list_id), pagination, needle, sort)
            .await
    }

    /// Lists tasks due today (UTC) together with the members of the owner's
    /// today list.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::NotFound`] for an unknown user.
    pub async fn fetch_today(
        &self,
        owner_id: OwnerId,
        pagination: Pagination,
        needle: &str,
        sort: &str,
    ) -> TaskServiceResult<Page<Task>> {
        require_identifier("FetchFromToday", "ownerID", owner_id)?;
        self.ensure_user(owner_id).await?;
        let window = DayWindow::of(self.clock.utc().date_naive())
            .ok_or(TaskDomainError::DateOutOfRange("today"))?;
        let special = self.directory.special_lists(owner_id).await?;
        let selection = TaskSelection::DueWithin {
            window,
            including_list: special.map(|lists| lists.today),
        };
        self.read_page(owner_id, selection, pagination, needle, sort)
            .await
    }

    /// Lists tasks due tomorrow (UTC).
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::NotFound`] for an unknown user.
    pub async fn fetch_tomorrow(
        &self,
        owner_id: OwnerId,
        pagination: Pagination,
        needle: &str,
        sort: &str,
    ) -> TaskServiceResult<Page<Task>> {
        require_identifier("FetchFromTomorrow", "ownerID", owner_id)?;
        self.ensure_user(owner_id).await?;
        let window = DayWindow::after(self.clock.utc().date_naive())
            .ok_or(TaskDomainError::DateOutOfRange("tomorrow"))?;
        let selection = TaskSelection::DueWithin {
            window,
            including_list: None,
        };
        self.read_page(owner_id, selection, pagination, needle, sort)
            .await
    }

    /// Lists tasks without a due date, leaving out the owner's today list.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::NotFound`] for an unknown user.
    pub async fn fetch_deferred(
        &self,
        owner_id: OwnerId,
        pagination: Pagination,
        needle: &str,
        sort: &str,
    ) -> TaskServiceResult<Page<Task>> {
        require_identifier("FetchFromDeferred", "ownerID", owner_id)?;
        self.ensure_user(owner_id).await?;
        let special = self.directory.special_lists(owner_id).await?;
        let selection = TaskSelection::Unscheduled {
            excluding_list: special.map(|lists| lists.today),
        };
        self.read_page(owner_id, selection, pagination, needle, sort)
            .await
    }

    async fn read_page(
        &self,
        owner_id: OwnerId,
        selection: TaskSelection,
        pagination: Pagination,
        needle: &str,
        sort: &str,
    ) -> TaskServiceResult<Page<Task>> {
        let normalized = pagination.normalize_with(self.default_rows_per_page);
        let query = TaskQuery::new(
            selection,
            Needle::new(needle),
            SortExpression::parse(sort),
            normalized,
        );
        let tasks = self.repository.fetch(owner_id, &query).await?;
        tracing::debug!(
            owner_id = %owner_id,
            page = normalized.clamped_page(),
            retrieved = tasks.len(),
            "task page read"
        );
        Ok(Page::wrap(normalized, tasks))
    }
}
