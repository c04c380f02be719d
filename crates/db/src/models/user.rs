use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{entities::user, types::Role};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("User not found")]
    UserNotFound,
    #[error("Username already exists")]
    UsernameTaken,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            username: model.username,
            role: Role::from(model.role),
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Login lookup: the only path that exposes the stored hash.
    pub async fn find_credentials_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<(Self, String)>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let hash = model.password_hash.clone();
            (Self::from_model(model), hash)
        }))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Active callers in id order. Distribution order depends on this being
    /// stable across calls.
    pub async fn find_callers<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .filter(user::Column::Role.eq("caller"))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Users with neither of the privileged roles.
    pub async fn find_custom_users<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .filter(user::Column::Role.is_not_in(["admin", "caller"]))
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn distinct_roles<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
        user::Entity::find()
            .select_only()
            .column(user::Column::Role)
            .distinct()
            .into_tuple()
            .all(db)
            .await
    }

    pub async fn role_exists<C: ConnectionTrait>(db: &C, role: &str) -> Result<bool, DbErr> {
        let found = user::Entity::find()
            .filter(user::Column::Role.eq(role))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn names_by_ids<C: ConnectionTrait>(
        db: &C,
        ids: &[i64],
    ) -> Result<HashMap<i64, String>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, String)> = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .column(user::Column::Name)
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .into_tuple()
            .all(db)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateUser) -> Result<Self, UserError> {
        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(data.username.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(UserError::UsernameTaken);
        }

        let active = user::ActiveModel {
            name: Set(data.name.clone()),
            username: Set(data.username.clone()),
            password_hash: Set(data.password_hash.clone()),
            role: Set(String::from(data.role.clone())),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Rotates the acting admin's own login; rejects usernames held by others.
    pub async fn update_credentials<C: ConnectionTrait>(
        db: &C,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<Self, UserError> {
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Id.ne(id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(UserError::UsernameTaken);
        }

        let record = user::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(UserError::UserNotFound)?;
        let mut active: user::ActiveModel = record.into();
        active.username = Set(username.to_string());
        active.password_hash = Set(password_hash.to_string());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = user::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    pub(crate) async fn seed_user<C: ConnectionTrait>(
        db: &C,
        name: &str,
        username: &str,
        role: &str,
    ) -> User {
        User::create(
            db,
            &CreateUser {
                name: name.to_string(),
                username: username.to_string(),
                password_hash: "x".to_string(),
                role: Role::from(role.to_string()),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let db = setup_db().await;
        seed_user(&db, "A", "alpha", "caller").await;
        let err = User::create(
            &db,
            &CreateUser {
                name: "B".to_string(),
                username: "alpha".to_string(),
                password_hash: "y".to_string(),
                role: Role::Caller,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    #[tokio::test]
    async fn find_callers_orders_by_id_and_filters_role() {
        let db = setup_db().await;
        seed_user(&db, "Admin", "admin", "admin").await;
        let c1 = seed_user(&db, "C1", "caller1", "caller").await;
        let c2 = seed_user(&db, "C2", "caller2", "caller").await;
        seed_user(&db, "Desk", "desk", "front_desk").await;

        let callers = User::find_callers(&db).await.unwrap();
        assert_eq!(
            callers.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![c1.id, c2.id]
        );
    }

    #[tokio::test]
    async fn custom_users_excludes_privileged_roles() {
        let db = setup_db().await;
        seed_user(&db, "Admin", "admin", "admin").await;
        seed_user(&db, "C1", "caller1", "caller").await;
        let desk = seed_user(&db, "Desk", "desk", "front_desk").await;

        let custom = User::find_custom_users(&db).await.unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].id, desk.id);
        assert_eq!(custom[0].role, Role::Custom("front_desk".to_string()));
    }

    #[tokio::test]
    async fn credentials_lookup_returns_hash() {
        let db = setup_db().await;
        seed_user(&db, "A", "alpha", "caller").await;
        let (user, hash) = User::find_credentials_by_username(&db, "alpha")
            .await
            .unwrap()
            .expect("user");
        assert_eq!(user.username, "alpha");
        assert_eq!(hash, "x");
        assert!(
            User::find_credentials_by_username(&db, "missing")
                .await
                .unwrap()
                .is_none()
        );
    }
}
