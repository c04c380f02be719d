use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{entities::task, types::TaskStatus};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: i64,
    pub assigned_by: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: i64,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i32>,
}

impl Task {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            assigned_to: model.assigned_to,
            assigned_by: model.assigned_by,
            deadline: model.deadline.map(Into::into),
            status: model.status,
            progress: model.progress,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        assigned_by: i64,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = task::ActiveModel {
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            assigned_to: Set(data.assigned_to),
            assigned_by: Set(assigned_by),
            deadline: Set(data.deadline.map(Into::into)),
            status: Set(TaskStatus::Pending),
            progress: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let model = task::Entity::find_by_id(id).one(db).await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_assignee<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::AssignedTo.eq(user_id))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_assignees<C: ConnectionTrait>(
        db: &C,
        user_ids: &[i64],
    ) -> Result<Vec<Self>, DbErr> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = task::Entity::find()
            .filter(task::Column::AssignedTo.is_in(user_ids.to_vec()))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        data: &UpdateTask,
    ) -> Result<Self, TaskError> {
        let model = task::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        let mut active: task::ActiveModel = model.into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(assigned_to) = data.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(deadline) = data.deadline {
            active.deadline = Set(Some(deadline.into()));
        }
        if let Some(status) = &data.status {
            active.status = Set(status.clone());
        }
        if let Some(progress) = data.progress {
            active.progress = Set(progress.clamp(0, 100));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = task::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }

    pub async fn count_all<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        task::Entity::find().count(db).await
    }

    pub async fn count_by_status<C: ConnectionTrait>(
        db: &C,
        assigned_to: Option<i64>,
        status: TaskStatus,
    ) -> Result<u64, DbErr> {
        let mut query = task::Entity::find().filter(task::Column::Status.eq(status));
        if let Some(id) = assigned_to {
            query = query.filter(task::Column::AssignedTo.eq(id));
        }
        query.count(db).await
    }

    pub async fn count_for_assignee<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<u64, DbErr> {
        task::Entity::find()
            .filter(task::Column::AssignedTo.eq(user_id))
            .count(db)
            .await
    }

    /// Deadline in the past and still not completed. The stored status is
    /// left alone; this is a point-in-time count.
    pub async fn count_overdue_by_deadline<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        task::Entity::find()
            .filter(task::Column::AssignedTo.eq(user_id))
            .filter(task::Column::Deadline.is_not_null())
            .filter(task::Column::Deadline.lt(now))
            .filter(task::Column::Status.ne(TaskStatus::Completed))
            .count(db)
            .await
    }

    pub async fn count_completed_between<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        task::Entity::find()
            .filter(task::Column::AssignedTo.eq(user_id))
            .filter(task::Column::Status.eq(TaskStatus::Completed))
            .filter(task::Column::UpdatedAt.gte(start))
            .filter(task::Column::UpdatedAt.lt(end))
            .count(db)
            .await
    }

    pub async fn average_progress<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Option<f64>, DbErr> {
        let progresses: Vec<i32> = task::Entity::find()
            .select_only()
            .column(task::Column::Progress)
            .filter(task::Column::AssignedTo.eq(user_id))
            .into_tuple()
            .all(db)
            .await?;
        if progresses.is_empty() {
            return Ok(None);
        }
        let sum: i64 = progresses.iter().map(|p| i64::from(*p)).sum();
        Ok(Some(sum as f64 / progresses.len() as f64))
    }

    pub async fn recent_active<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::AssignedTo.eq(user_id))
            .filter(task::Column::Status.ne(TaskStatus::Completed))
            .order_by_desc(task::Column::UpdatedAt)
            .limit(limit)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::user::tests::seed_user;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn new_tasks_start_pending_at_zero_progress() {
        let db = setup_db().await;
        let admin = seed_user(&db, "A", "a1", "admin").await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let task = Task::create(
            &db,
            &CreateTask {
                title: "Follow up".to_string(),
                description: None,
                assigned_to: caller.id,
                deadline: None,
            },
            admin.id,
        )
        .await
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.assigned_by, admin.id);
    }

    #[tokio::test]
    async fn update_clamps_progress_and_keeps_other_fields() {
        let db = setup_db().await;
        let admin = seed_user(&db, "A", "a1", "admin").await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let task = Task::create(
            &db,
            &CreateTask {
                title: "Follow up".to_string(),
                description: Some("call list".to_string()),
                assigned_to: caller.id,
                deadline: None,
            },
            admin.id,
        )
        .await
        .unwrap();

        let updated = Task::update(
            &db,
            task.id,
            &UpdateTask {
                progress: Some(250),
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.progress, 100);
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, "Follow up");
        assert_eq!(updated.description.as_deref(), Some("call list"));
    }

    #[tokio::test]
    async fn overdue_count_uses_deadline_not_status() {
        let db = setup_db().await;
        let admin = seed_user(&db, "A", "a1", "admin").await;
        let desk = seed_user(&db, "D", "d1", "front_desk").await;
        let now = Utc::now();

        let late = Task::create(
            &db,
            &CreateTask {
                title: "Late".to_string(),
                description: None,
                assigned_to: desk.id,
                deadline: Some(now - Duration::days(1)),
            },
            admin.id,
        )
        .await
        .unwrap();
        Task::create(
            &db,
            &CreateTask {
                title: "Future".to_string(),
                description: None,
                assigned_to: desk.id,
                deadline: Some(now + Duration::days(1)),
            },
            admin.id,
        )
        .await
        .unwrap();

        assert_eq!(
            Task::count_overdue_by_deadline(&db, desk.id, now).await.unwrap(),
            1
        );

        Task::update(
            &db,
            late.id,
            &UpdateTask {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(
            Task::count_overdue_by_deadline(&db, desk.id, now).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn missing_task_update_reports_not_found() {
        let db = setup_db().await;
        let err = Task::update(&db, 999, &UpdateTask::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::TaskNotFound));
    }
}
