use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::other_admission;

#[derive(Debug, Error)]
pub enum OtherAdmissionError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Admission not found")]
    AdmissionNotFound,
}

/// Enrollment detail row. Identity fields are a snapshot of the record at
/// enrollment time; the financial fields stay editable.
#[derive(Debug, Clone, Serialize)]
pub struct OtherAdmission {
    pub id: i64,
    pub record_id: i64,
    pub phone_number: String,
    pub name: String,
    pub caller_name: String,
    pub response: Option<String>,
    pub discount_rate: Option<f64>,
    pub total_fees: Option<f64>,
    pub enrolled_course: Option<String>,
    pub fees_paid: Option<i64>,
    pub course_total_fees: Option<i64>,
    pub course_start_date: Option<DateTime<Utc>>,
    pub course_end_date: Option<DateTime<Utc>>,
    pub payment_mode: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Editable financial and course-schedule fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentFields {
    pub discount_rate: Option<f64>,
    pub total_fees: Option<f64>,
    pub enrolled_course: Option<String>,
    pub fees_paid: Option<i64>,
    pub course_total_fees: Option<i64>,
    pub course_start_date: Option<DateTime<Utc>>,
    pub course_end_date: Option<DateTime<Utc>>,
    pub payment_mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOtherAdmission {
    pub record_id: i64,
    pub phone_number: String,
    pub name: String,
    pub caller_name: String,
    pub response: Option<String>,
    pub fields: EnrollmentFields,
    pub processed_by: i64,
}

impl OtherAdmission {
    fn from_model(model: other_admission::Model) -> Self {
        Self {
            id: model.id,
            record_id: model.record_id,
            phone_number: model.phone_number,
            name: model.name,
            caller_name: model.caller_name,
            response: model.response,
            discount_rate: model.discount_rate,
            total_fees: model.total_fees,
            enrolled_course: model.enrolled_course,
            fees_paid: model.fees_paid,
            course_total_fees: model.course_total_fees,
            course_start_date: model.course_start_date.map(Into::into),
            course_end_date: model.course_end_date.map(Into::into),
            payment_mode: model.payment_mode,
            processed_by: model.processed_by,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateOtherAdmission,
    ) -> Result<Self, DbErr> {
        let f = &data.fields;
        let active = other_admission::ActiveModel {
            record_id: Set(data.record_id),
            phone_number: Set(data.phone_number.clone()),
            name: Set(data.name.clone()),
            caller_name: Set(data.caller_name.clone()),
            response: Set(data.response.clone()),
            discount_rate: Set(f.discount_rate),
            total_fees: Set(f.total_fees),
            enrolled_course: Set(f.enrolled_course.clone()),
            fees_paid: Set(f.fees_paid),
            course_total_fees: Set(f.course_total_fees),
            course_start_date: Set(f.course_start_date.map(Into::into)),
            course_end_date: Set(f.course_end_date.map(Into::into)),
            payment_mode: Set(f.payment_mode.clone()),
            processed_by: Set(data.processed_by),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_all_desc<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = other_admission::Entity::find()
            .order_by_desc(other_admission::Column::CreatedAt)
            .order_by_desc(other_admission::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    /// Replaces the editable fields wholesale; snapshot fields are untouched.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        fields: &EnrollmentFields,
    ) -> Result<Self, OtherAdmissionError> {
        let model = other_admission::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(OtherAdmissionError::AdmissionNotFound)?;
        let mut active: other_admission::ActiveModel = model.into();
        active.discount_rate = Set(fields.discount_rate);
        active.total_fees = Set(fields.total_fees);
        active.enrolled_course = Set(fields.enrolled_course.clone());
        active.fees_paid = Set(fields.fees_paid);
        active.course_total_fees = Set(fields.course_total_fees);
        active.course_start_date = Set(fields.course_start_date.map(Into::into));
        active.course_end_date = Set(fields.course_end_date.map(Into::into));
        active.payment_mode = Set(fields.payment_mode.clone());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = other_admission::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
