//! Diesel schema for task persistence.

diesel::table! {
    /// Users known to the task engine.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lists owned by users, including the materialised today and deferred
    /// lists.
    lists (id) {
        /// List identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// `regular`, `today` or `deferred`.
        #[max_length = 16]
        kind -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Containing list.
        list_id -> Uuid,
        /// Position among the active tasks of the list.
        position_in_list -> Int8,
        /// Title.
        title -> Text,
        /// Headline.
        headline -> Text,
        /// Description.
        description -> Text,
        /// Priority rank: 0 low, 1 medium, 2 high.
        priority -> Int2,
        /// Completion status.
        #[max_length = 16]
        status -> Varchar,
        /// Pin flag.
        is_pinned -> Bool,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Optional reminder instant.
        remind_at -> Nullable<Timestamptz>,
        /// Completion timestamp, set iff complete.
        completed_at -> Nullable<Timestamptz>,
        /// Trash timestamp, set iff trashed.
        trashed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(lists -> users (owner_id));
diesel::joinable!(tasks -> lists (list_id));
diesel::allow_tables_to_appear_in_same_query!(users, lists, tasks);
