use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Where a task stands. Maps to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet. New tasks begin here.
    #[default]
    Planned,
    WorkingOn,
    Completed,
    Canceled,
}

/// Maps to the `priority_level` SQL enum. Declaration order is sort order.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Medium,
    High,
}

fn validate_not_in_past(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Utc::now().date_naive() {
        let mut err = ValidationError::new("due_date_in_past");
        err.message = Some("Due date cannot be in the past".into());
        return Err(err);
    }
    Ok(())
}

/// Fields a user may set when creating a task or replacing one.
///
/// `task_status`, `created_by` and the timestamps are not part of the form:
/// status changes go through `TaskStatusInput`, the rest is set by the server.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub task_name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Checked by `validate_schedule`, not by the derived rules.
    pub due_date: Option<NaiveDate>,

    /// Defaults to `medium` when omitted.
    pub priority_level: Option<PriorityLevel>,

    pub project_id: Option<Uuid>,

    pub assigned_to: Option<i32>,
}

/// The status-only update form. Every other field is read-only here.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusInput {
    pub task_status: TaskStatus,
}

/// A task as stored and as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub task_name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub task_status: TaskStatus,
    pub priority_level: PriorityLevel,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<i32>,
    /// Null only for rows whose creator predates ownership tracking.
    pub created_by: Option<i32>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Column list matching `Task`, for SELECT and RETURNING clauses.
pub const TASK_COLUMNS: &str = "id, task_name, description, due_date, task_status, priority_level, \
     project_id, assigned_to, created_by, created_on, updated_on";

/// Filters accepted by the task list endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub task_status: Option<TaskStatus>,
    pub priority_level: Option<PriorityLevel>,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<i32>,
    pub created_by: Option<i32>,
    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    DueDate,
    CreatedOn,
    PriorityLevel,
    TaskName,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::DueDate => "due_date",
            SortField::CreatedOn => "created_on",
            SortField::PriorityLevel => "priority_level",
            SortField::TaskName => "task_name",
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Ordering for `GET /api/tasks/sort`. Defaults to earliest due date first.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    #[serde(default)]
    pub by: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl TaskSort {
    /// The ORDER BY clause. Tasks without a due date always come last; ties
    /// fall back to creation time so the ordering is stable.
    pub fn order_by_clause(&self) -> String {
        let direction = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!(
            " ORDER BY {} {} NULLS LAST, created_on ASC",
            self.by.column(),
            direction
        )
    }
}

/// Name and status of a task, for lookups by name.
#[derive(Debug, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct TaskStatusSummary {
    pub id: Uuid,
    pub task_name: String,
    pub task_status: TaskStatus,
}

impl TaskInput {
    /// Field rules, plus: a due date being set or changed may not be in the past.
    ///
    /// `previous_due` is the stored date on update (`None` on create). An
    /// unchanged date is accepted even when it has already passed, so overdue
    /// tasks can still be edited.
    pub fn validate_schedule(&self, previous_due: Option<NaiveDate>) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Some(due_date) = self.due_date.filter(|date| Some(*date) != previous_due) {
            if let Err(err) = validate_not_in_past(&due_date) {
                errors.add("due_date", err);
            }
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Task {
    /// Builds a new `Planned` task owned by `user_id`.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_name: input.task_name,
            description: input.description,
            due_date: input.due_date,
            task_status: TaskStatus::default(),
            priority_level: input.priority_level.unwrap_or_default(),
            project_id: input.project_id,
            assigned_to: input.assigned_to,
            created_by: Some(user_id),
            created_on: now,
            updated_on: now,
        }
    }
}
