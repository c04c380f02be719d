use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};
use serde::Serialize;

use crate::entities::certified_admission;

/// Confirmed-visit log entry. Snapshot fields are copied from the record at
/// confirmation time and never updated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CertifiedAdmission {
    pub id: i64,
    pub record_id: i64,
    pub phone_number: String,
    pub name: String,
    pub caller_name: String,
    pub response: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCertifiedAdmission {
    pub record_id: i64,
    pub phone_number: String,
    pub name: String,
    pub caller_name: String,
    pub response: Option<String>,
    pub processed_by: i64,
}

impl CertifiedAdmission {
    fn from_model(model: certified_admission::Model) -> Self {
        Self {
            id: model.id,
            record_id: model.record_id,
            phone_number: model.phone_number,
            name: model.name,
            caller_name: model.caller_name,
            response: model.response,
            processed_by: model.processed_by,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateCertifiedAdmission,
    ) -> Result<Self, DbErr> {
        let active = certified_admission::ActiveModel {
            record_id: Set(data.record_id),
            phone_number: Set(data.phone_number.clone()),
            name: Set(data.name.clone()),
            caller_name: Set(data.caller_name.clone()),
            response: Set(data.response.clone()),
            processed_by: Set(data.processed_by),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_all_desc<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = certified_admission::Entity::find()
            .order_by_desc(certified_admission::Column::CreatedAt)
            .order_by_desc(certified_admission::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }
}
