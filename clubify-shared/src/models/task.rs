/// Task model and database operations
///
/// Leads and board members assign tasks to users. The assignee and the
/// assigner may both update a task: change its status and append notes.
///
/// # Status
///
/// ```text
/// pending → in_progress → completed
///         ↘ cancelled
/// ```
///
/// Transitions are not restricted; setting `completed` stamps `completed_at`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     assigned_by UUID NOT NULL REFERENCES users(id),
///     assigned_to UUID NOT NULL REFERENCES users(id),
///     club_id UUID NOT NULL REFERENCES clubs(id),
///     deadline TIMESTAMPTZ,
///     priority priority_level NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'pending',
///     completed_at TIMESTAMPTZ,
///     ...
/// );
///
/// CREATE TABLE task_notes (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{user::UserRole, user_columns, ClubSummary, Priority, UserSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Which tasks a user may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Tasks assigned to this user
    AssignedTo(Uuid),

    /// Tasks this user assigned
    AssignedBy(Uuid),

    All,
}

impl TaskScope {
    /// Members see their own work, leads what they handed out, board everything
    pub fn for_role(role: UserRole, user_id: Uuid) -> Self {
        match role {
            UserRole::Member => TaskScope::AssignedTo(user_id),
            UserRole::Lead => TaskScope::AssignedBy(user_id),
            UserRole::Board => TaskScope::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNote {
    pub user: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Task with its people, club and notes populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_by: UserSummary,
    pub assigned_to: UserSummary,
    pub club: ClubSummary,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Vec<TaskNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_by: Uuid,
    pub assigned_to: Uuid,
    pub club_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
}

/// Changes requested by an assignee or assigner
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub status: Option<TaskStatus>,

    /// Appended as a note when non-blank
    pub note: Option<String>,

    /// Author of the note
    pub author: Uuid,
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    deadline: Option<DateTime<Utc>>,
    priority: Priority,
    status: TaskStatus,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    club_id: Uuid,
    club_name: String,
    by_id: Uuid,
    by_name: String,
    by_email: String,
    by_role: UserRole,
    to_id: Uuid,
    to_name: String,
    to_email: String,
    to_role: UserRole,
}

impl TaskRow {
    fn into_task(self, notes: Vec<TaskNote>) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            assigned_by: UserSummary {
                id: self.by_id,
                name: self.by_name,
                email: self.by_email,
                role: self.by_role,
            },
            assigned_to: UserSummary {
                id: self.to_id,
                name: self.to_name,
                email: self.to_email,
                role: self.to_role,
            },
            club: ClubSummary {
                id: self.club_id,
                name: self.club_name,
            },
            deadline: self.deadline,
            priority: self.priority,
            status: self.status,
            completed_at: self.completed_at,
            notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    task_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    user_role: UserRole,
}

fn task_select() -> String {
    format!(
        "SELECT t.id, t.title, t.description, t.deadline, t.priority, t.status, \
                t.completed_at, t.created_at, t.updated_at, \
                c.id AS club_id, c.name AS club_name, {}, {} \
         FROM tasks t \
         JOIN clubs c ON c.id = t.club_id \
         JOIN users b ON b.id = t.assigned_by \
         JOIN users a ON a.id = t.assigned_to",
        user_columns("b", "by"),
        user_columns("a", "to")
    )
}

impl Task {
    /// Whether `user_id` assigned this task or is assigned to it
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.assigned_to.id == user_id || self.assigned_by.id == user_id
    }

    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO tasks (title, description, assigned_by, assigned_to, club_id, deadline, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(data.title.trim())
        .bind(data.description)
        .bind(data.assigned_by)
        .bind(data.assigned_to)
        .bind(data.club_id)
        .bind(data.deadline)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE t.id = $1", task_select());

        let Some(row) = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let mut notes = Self::notes_of(pool, &[id]).await?;
        Ok(Some(row.into_task(notes.remove(&id).unwrap_or_default())))
    }

    /// Tasks visible in `scope`, soonest deadline first, undated last
    pub async fn list(pool: &PgPool, scope: TaskScope) -> Result<Vec<Self>, sqlx::Error> {
        let (filter, user_id) = match scope {
            TaskScope::AssignedTo(id) => ("WHERE t.assigned_to = $1", Some(id)),
            TaskScope::AssignedBy(id) => ("WHERE t.assigned_by = $1", Some(id)),
            TaskScope::All => ("", None),
        };

        let query = format!(
            "{} {filter} ORDER BY t.deadline ASC NULLS LAST, t.created_at ASC",
            task_select()
        );

        let mut rows = sqlx::query_as::<_, TaskRow>(&query);
        if let Some(id) = user_id {
            rows = rows.bind(id);
        }
        let rows = rows.fetch_all(pool).await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut notes = Self::notes_of(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let task_notes = notes.remove(&row.id).unwrap_or_default();
                row.into_task(task_notes)
            })
            .collect())
    }

    async fn notes_of(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TaskNote>>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT n.task_id, n.content, n.created_at, {} \
             FROM task_notes n JOIN users u ON u.id = n.user_id \
             WHERE n.task_id = ANY($1) \
             ORDER BY n.created_at ASC",
            user_columns("u", "user")
        );

        let rows = sqlx::query_as::<_, NoteRow>(&query)
            .bind(task_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<TaskNote>> = HashMap::new();
        for row in rows {
            grouped.entry(row.task_id).or_default().push(TaskNote {
                user: UserSummary {
                    id: row.user_id,
                    name: row.user_name,
                    email: row.user_email,
                    role: row.user_role,
                },
                content: row.content,
                created_at: row.created_at,
            });
        }

        Ok(grouped)
    }

    /// Applies a status change and/or appends a note in one transaction
    ///
    /// Returns `None` if the task does not exist. Participation is checked by
    /// the caller.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE tasks \
             SET status = COALESCE($2, status), \
                 completed_at = CASE WHEN $2::task_status = 'completed' THEN NOW() ELSE completed_at END, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(data.status)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(note) = data.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            sqlx::query("INSERT INTO task_notes (task_id, user_id, content) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(data.author)
                .bind(note)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(role: UserRole) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            name: format!("{role} user"),
            email: format!("{role}@example.com"),
            role,
        }
    }

    fn sample_task(assigned_by: UserSummary, assigned_to: UserSummary) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Book the hall".to_string(),
            description: None,
            assigned_by,
            assigned_to,
            club: ClubSummary {
                id: Uuid::new_v4(),
                name: "Chess".to_string(),
            },
            deadline: None,
            priority: Priority::High,
            status: TaskStatus::InProgress,
            completed_at: None,
            notes: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_scope_for_role() {
        let id = Uuid::new_v4();
        assert_eq!(TaskScope::for_role(UserRole::Member, id), TaskScope::AssignedTo(id));
        assert_eq!(TaskScope::for_role(UserRole::Lead, id), TaskScope::AssignedBy(id));
        assert_eq!(TaskScope::for_role(UserRole::Board, id), TaskScope::All);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        let parsed: TaskStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, TaskStatus::Cancelled);
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_is_participant() {
        let lead = person(UserRole::Lead);
        let member = person(UserRole::Member);
        let task = sample_task(lead.clone(), member.clone());

        assert!(task.is_participant(lead.id));
        assert!(task.is_participant(member.id));
        assert!(!task.is_participant(Uuid::new_v4()));
    }

    #[test]
    fn test_task_serializes_populated_refs() {
        let task = sample_task(person(UserRole::Lead), person(UserRole::Member));
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["assignedBy"]["role"], "lead");
        assert_eq!(json["assignedTo"]["role"], "member");
        assert_eq!(json["club"]["name"], "Chess");
        assert_eq!(json["status"], "in_progress");
        assert!(json["deadline"].is_null());
        assert!(json["notes"].as_array().unwrap().is_empty());
    }
}
