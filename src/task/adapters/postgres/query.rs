//! Listing queries translated into boxed Diesel statements.

use super::{models::TaskRow, schema::tasks};
use crate::task::domain::{
    Needle, OwnerId, SortDirection, SortExpression, SortField, TaskQuery, TaskSelection,
};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::Error as DieselError;

type BoxedTasks<'a> = tasks::BoxedQuery<'a, Pg>;

/// Loads one page of the owner's active tasks matching `query`.
pub fn load_page(
    connection: &mut PgConnection,
    owner_id: OwnerId,
    query: &TaskQuery,
) -> Result<Vec<TaskRow>, DieselError> {
    let scoped = tasks::table
        .filter(tasks::owner_id.eq(owner_id.into_inner()))
        .filter(tasks::trashed_at.is_null())
        .into_boxed();
    let selected = select(scoped, query.selection);
    let searched = search(selected, &query.needle);
    order(searched, query.sort)
        .offset(query.pagination.offset())
        .limit(query.pagination.limit())
        .load::<TaskRow>(connection)
}

fn select(statement: BoxedTasks<'_>, selection: TaskSelection) -> BoxedTasks<'_> {
    match selection {
        TaskSelection::List(list_id) => statement.filter(tasks::list_id.eq(list_id.into_inner())),
        TaskSelection::DueWithin {
            window,
            including_list: None,
        } => statement
            .filter(tasks::due_date.ge(window.start()))
            .filter(tasks::due_date.lt(window.end())),
        TaskSelection::DueWithin {
            window,
            including_list: Some(list_id),
        } => statement.filter(
            tasks::due_date
                .ge(window.start())
                .and(tasks::due_date.lt(window.end()))
                .or(tasks::list_id.eq(list_id.into_inner()).nullable()),
        ),
        TaskSelection::Unscheduled {
            excluding_list: None,
        } => statement.filter(tasks::due_date.is_null()),
        TaskSelection::Unscheduled {
            excluding_list: Some(list_id),
        } => statement
            .filter(tasks::due_date.is_null())
            .filter(tasks::list_id.ne(list_id.into_inner())),
    }
}

fn search<'a>(statement: BoxedTasks<'a>, needle: &Needle) -> BoxedTasks<'a> {
    if needle.is_empty() {
        return statement;
    }
    let pattern = format!("%{}%", escape_like(needle.as_str()));
    statement.filter(
        tasks::title
            .ilike(pattern.clone())
            .or(tasks::headline.ilike(pattern.clone()))
            .or(tasks::description.ilike(pattern)),
    )
}

/// Escapes `LIKE` metacharacters so the needle matches literally.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

fn order(statement: BoxedTasks<'_>, sort: SortExpression) -> BoxedTasks<'_> {
    let Some(field) = sort.field() else {
        return statement.order_by((
            tasks::is_pinned.desc(),
            tasks::position_in_list.asc(),
            tasks::created_at.asc(),
            tasks::id.asc(),
        ));
    };
    let ascending = sort.direction() == SortDirection::Ascending;
    let primary = match (field, ascending) {
        (SortField::Position, true) => statement.order_by(tasks::position_in_list.asc()),
        (SortField::Position, false) => statement.order_by(tasks::position_in_list.desc()),
        (SortField::Title, true) => statement.order_by(tasks::title.asc()),
        (SortField::Title, false) => statement.order_by(tasks::title.desc()),
        (SortField::Headline, true) => statement.order_by(tasks::headline.asc()),
        (SortField::Headline, false) => statement.order_by(tasks::headline.desc()),
        (SortField::Description, true) => statement.order_by(tasks::description.asc()),
        (SortField::Description, false) => statement.order_by(tasks::description.desc()),
        (SortField::Priority, true) => statement.order_by(tasks::priority.asc()),
        (SortField::Priority, false) => statement.order_by(tasks::priority.desc()),
        // 'incomplete' sorts after 'complete' as text, the reverse of the
        // enum order.
        (SortField::Status, true) => statement.order_by(tasks::status.desc()),
        (SortField::Status, false) => statement.order_by(tasks::status.asc()),
        (SortField::DueDate, true) => statement.order_by(tasks::due_date.asc()),
        (SortField::DueDate, false) => statement.order_by(tasks::due_date.desc()),
        (SortField::RemindAt, true) => statement.order_by(tasks::remind_at.asc()),
        (SortField::RemindAt, false) => statement.order_by(tasks::remind_at.desc()),
        (SortField::CompletedAt, true) => statement.order_by(tasks::completed_at.asc()),
        (SortField::CompletedAt, false) => statement.order_by(tasks::completed_at.desc()),
        (SortField::CreatedAt, true) => statement.order_by(tasks::created_at.asc()),
        (SortField::CreatedAt, false) => statement.order_by(tasks::created_at.desc()),
        (SortField::UpdatedAt, true) => statement.order_by(tasks::updated_at.asc()),
        (SortField::UpdatedAt, false) => statement.order_by(tasks::updated_at.desc()),
    };
    primary.then_order_by((
        tasks::position_in_list.asc(),
        tasks::created_at.asc(),
        tasks::id.asc(),
    ))
}
