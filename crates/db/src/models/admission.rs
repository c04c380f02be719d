use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};
use serde::Serialize;

use crate::{entities::admission, types::AdmissionType};

/// Append-only admission marker kept alongside the detailed logs. One row per
/// confirmation or enrollment, in either path.
#[derive(Debug, Clone, Serialize)]
pub struct Admission {
    pub id: i64,
    pub record_id: i64,
    pub admission_type: AdmissionType,
    pub discount_rate: Option<f64>,
    pub total_fees: Option<f64>,
    pub enrolled_course: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAdmission {
    pub record_id: i64,
    pub admission_type: AdmissionType,
    pub discount_rate: Option<f64>,
    pub total_fees: Option<f64>,
    pub enrolled_course: Option<String>,
    pub processed_by: i64,
}

impl Admission {
    fn from_model(model: admission::Model) -> Self {
        Self {
            id: model.id,
            record_id: model.record_id,
            admission_type: model.admission_type,
            discount_rate: model.discount_rate,
            total_fees: model.total_fees,
            enrolled_course: model.enrolled_course,
            processed_by: model.processed_by,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateAdmission,
    ) -> Result<Self, DbErr> {
        let active = admission::ActiveModel {
            record_id: Set(data.record_id),
            admission_type: Set(data.admission_type.clone()),
            discount_rate: Set(data.discount_rate),
            total_fees: Set(data.total_fees),
            enrolled_course: Set(data.enrolled_course.clone()),
            processed_by: Set(data.processed_by),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_all_desc<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = admission::Entity::find()
            .order_by_desc(admission::Column::CreatedAt)
            .order_by_desc(admission::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn delete_all<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        let result = admission::Entity::delete_many().exec(db).await?;
        Ok(result.rows_affected)
    }
}
