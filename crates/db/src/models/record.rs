use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{entities::record, types::VisitStatus};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Record not found")]
    RecordNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub caller_id: Option<i64>,
    pub phone_number: String,
    pub name: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub visit: VisitStatus,
    pub visit_by: Option<i64>,
    pub hidden_from_caller: bool,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecord {
    pub name: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub hidden_from_caller: Option<bool>,
}

/// One page of records plus the unpaged totals.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
}

impl Record {
    fn from_model(model: record::Model) -> Self {
        Self {
            id: model.id,
            caller_id: model.caller_id,
            phone_number: model.phone_number,
            name: model.name,
            response: model.response,
            notes: model.notes,
            visit: model.visit,
            visit_by: model.visit_by,
            hidden_from_caller: model.hidden_from_caller,
            assigned_at: model.assigned_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    /// Rows that carry a caller response. Empty strings do not count.
    fn responded_condition() -> Condition {
        Condition::all()
            .add(record::Column::Response.is_not_null())
            .add(record::Column::Response.ne(""))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        caller_id: Option<i64>,
        phone_number: &str,
        name: Option<&str>,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = record::ActiveModel {
            caller_id: Set(caller_id),
            phone_number: Set(phone_number.to_string()),
            name: Set(name.map(str::to_string)),
            visit: Set(VisitStatus::Pending),
            hidden_from_caller: Set(false),
            assigned_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let model = record::Entity::find_by_id(id).one(db).await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn find_by_ids<C: ConnectionTrait>(
        db: &C,
        ids: &[i64],
    ) -> Result<Vec<Self>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = record::Entity::find()
            .filter(record::Column::Id.is_in(ids.to_vec()))
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn exists_by_phone<C: ConnectionTrait>(
        db: &C,
        phone_number: &str,
    ) -> Result<bool, DbErr> {
        let found = record::Entity::find()
            .filter(record::Column::PhoneNumber.eq(phone_number))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn count_all<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        record::Entity::find().count(db).await
    }

    pub async fn count_by_caller<C: ConnectionTrait>(db: &C, caller_id: i64) -> Result<u64, DbErr> {
        record::Entity::find()
            .filter(record::Column::CallerId.eq(caller_id))
            .count(db)
            .await
    }

    /// Caller workspace page: own, non-hidden rows, newest assignment first.
    /// `search` matches phone or name as a substring.
    pub async fn page_for_caller<C: ConnectionTrait>(
        db: &C,
        caller_id: i64,
        page: u64,
        per_page: u64,
        search: Option<&str>,
    ) -> Result<RecordPage, DbErr> {
        let mut query = record::Entity::find()
            .filter(record::Column::CallerId.eq(caller_id))
            .filter(record::Column::HiddenFromCaller.eq(false));
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(record::Column::PhoneNumber.contains(term))
                    .add(record::Column::Name.contains(term)),
            );
        }
        let paginator = query
            .order_by_desc(record::Column::AssignedAt)
            .order_by_desc(record::Column::Id)
            .paginate(db, per_page);
        let totals = paginator.num_items_and_pages().await?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await?
            .into_iter()
            .map(Self::from_model)
            .collect();
        Ok(RecordPage {
            records,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
            page,
        })
    }

    /// Admin funnel page: responded rows in the given visit state, most
    /// recently touched first.
    pub async fn funnel_page<C: ConnectionTrait>(
        db: &C,
        visit: VisitStatus,
        page: u64,
        per_page: u64,
        search_name: Option<&str>,
        search_phone: Option<&str>,
    ) -> Result<RecordPage, DbErr> {
        let mut query = record::Entity::find()
            .filter(Self::responded_condition())
            .filter(record::Column::Visit.eq(visit));
        if let Some(term) = search_name.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(record::Column::Name.contains(term));
        }
        if let Some(term) = search_phone.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(record::Column::PhoneNumber.contains(term));
        }
        let paginator = query
            .order_by_desc(record::Column::UpdatedAt)
            .order_by_desc(record::Column::Id)
            .paginate(db, per_page);
        let totals = paginator.num_items_and_pages().await?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await?
            .into_iter()
            .map(Self::from_model)
            .collect();
        Ok(RecordPage {
            records,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
            page,
        })
    }

    pub async fn update_fields<C: ConnectionTrait>(
        db: &C,
        id: i64,
        data: &UpdateRecord,
    ) -> Result<Self, RecordError> {
        let model = record::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(RecordError::RecordNotFound)?;
        let mut active: record::ActiveModel = model.into();
        if let Some(name) = &data.name {
            active.name = Set(Some(name.clone()));
        }
        if let Some(response) = &data.response {
            active.response = Set(Some(response.clone()));
        }
        if let Some(notes) = &data.notes {
            active.notes = Set(Some(notes.clone()));
        }
        if let Some(hidden) = data.hidden_from_caller {
            active.hidden_from_caller = Set(hidden);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn set_visit<C: ConnectionTrait>(
        db: &C,
        id: i64,
        visit: VisitStatus,
        visit_by: i64,
    ) -> Result<Self, RecordError> {
        let model = record::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(RecordError::RecordNotFound)?;
        let mut active: record::ActiveModel = model.into();
        active.visit = Set(visit);
        active.visit_by = Set(Some(visit_by));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn count_responded<C: ConnectionTrait>(
        db: &C,
        caller_id: Option<i64>,
    ) -> Result<u64, DbErr> {
        let mut query = record::Entity::find().filter(Self::responded_condition());
        if let Some(id) = caller_id {
            query = query.filter(record::Column::CallerId.eq(id));
        }
        query.count(db).await
    }

    pub async fn count_visit<C: ConnectionTrait>(
        db: &C,
        caller_id: Option<i64>,
        visit: VisitStatus,
    ) -> Result<u64, DbErr> {
        let mut query = record::Entity::find().filter(record::Column::Visit.eq(visit));
        if let Some(id) = caller_id {
            query = query.filter(record::Column::CallerId.eq(id));
        }
        query.count(db).await
    }

    /// Responded but not yet acted on; the admin visit queue size.
    pub async fn count_pending_responded<C: ConnectionTrait>(
        db: &C,
        caller_id: Option<i64>,
    ) -> Result<u64, DbErr> {
        let mut query = record::Entity::find()
            .filter(Self::responded_condition())
            .filter(record::Column::Visit.eq(VisitStatus::Pending));
        if let Some(id) = caller_id {
            query = query.filter(record::Column::CallerId.eq(id));
        }
        query.count(db).await
    }

    /// Responses whose last touch falls in `[start, end)`.
    pub async fn count_responded_between<C: ConnectionTrait>(
        db: &C,
        caller_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        record::Entity::find()
            .filter(record::Column::CallerId.eq(caller_id))
            .filter(Self::responded_condition())
            .filter(record::Column::UpdatedAt.gte(start))
            .filter(record::Column::UpdatedAt.lt(end))
            .count(db)
            .await
    }

    pub async fn recent_by_visit<C: ConnectionTrait>(
        db: &C,
        caller_id: i64,
        visits: &[VisitStatus],
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = record::Entity::find()
            .filter(record::Column::CallerId.eq(caller_id))
            .filter(record::Column::Visit.is_in(visits.to_vec()))
            .order_by_desc(record::Column::UpdatedAt)
            .limit(limit)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn delete_all<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        let result = record::Entity::delete_many().exec(db).await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
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
    async fn new_records_start_pending_and_visible() {
        let db = setup_db().await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let record = Record::create(&db, Some(caller.id), "5550001", Some("Ana"))
            .await
            .unwrap();
        assert_eq!(record.visit, VisitStatus::Pending);
        assert!(!record.hidden_from_caller);
        assert!(Record::exists_by_phone(&db, "5550001").await.unwrap());
        assert!(!Record::exists_by_phone(&db, "5550002").await.unwrap());
    }

    #[tokio::test]
    async fn caller_page_excludes_hidden_and_matches_search() {
        let db = setup_db().await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let visible = Record::create(&db, Some(caller.id), "5550001", Some("Ana"))
            .await
            .unwrap();
        let hidden = Record::create(&db, Some(caller.id), "5550002", Some("Bob"))
            .await
            .unwrap();
        Record::update_fields(
            &db,
            hidden.id,
            &UpdateRecord {
                hidden_from_caller: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = Record::page_for_caller(&db, caller.id, 1, 50, None)
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.records[0].id, visible.id);

        let searched = Record::page_for_caller(&db, caller.id, 1, 50, Some("ana"))
            .await
            .unwrap();
        assert_eq!(searched.total_items, 1);
        let missed = Record::page_for_caller(&db, caller.id, 1, 50, Some("zzz"))
            .await
            .unwrap();
        assert_eq!(missed.total_items, 0);
    }

    #[tokio::test]
    async fn responded_counts_ignore_empty_strings() {
        let db = setup_db().await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let r1 = Record::create(&db, Some(caller.id), "5550001", None)
            .await
            .unwrap();
        let r2 = Record::create(&db, Some(caller.id), "5550002", None)
            .await
            .unwrap();
        Record::create(&db, Some(caller.id), "5550003", None)
            .await
            .unwrap();
        Record::update_fields(
            &db,
            r1.id,
            &UpdateRecord {
                response: Some("interested".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Record::update_fields(
            &db,
            r2.id,
            &UpdateRecord {
                response: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(Record::count_responded(&db, None).await.unwrap(), 1);
        assert_eq!(
            Record::count_pending_responded(&db, Some(caller.id))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn funnel_page_only_lists_responded_rows_in_state() {
        let db = setup_db().await;
        let caller = seed_user(&db, "C", "c1", "caller").await;
        let admin = seed_user(&db, "A", "a1", "admin").await;
        let responded = Record::create(&db, Some(caller.id), "5550001", Some("Ana"))
            .await
            .unwrap();
        Record::create(&db, Some(caller.id), "5550002", Some("Bob"))
            .await
            .unwrap();
        Record::update_fields(
            &db,
            responded.id,
            &UpdateRecord {
                response: Some("call back".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let pending = Record::funnel_page(&db, VisitStatus::Pending, 1, 15, None, None)
            .await
            .unwrap();
        assert_eq!(pending.total_items, 1);
        assert_eq!(pending.records[0].id, responded.id);

        Record::set_visit(&db, responded.id, VisitStatus::Visited, admin.id)
            .await
            .unwrap();
        let pending = Record::funnel_page(&db, VisitStatus::Pending, 1, 15, None, None)
            .await
            .unwrap();
        assert_eq!(pending.total_items, 0);
        let visited = Record::funnel_page(&db, VisitStatus::Visited, 1, 15, None, None)
            .await
            .unwrap();
        assert_eq!(visited.total_items, 1);
        assert_eq!(visited.records[0].visit_by, Some(admin.id));
    }
}
