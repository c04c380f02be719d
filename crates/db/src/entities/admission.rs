use sea_orm::entity::prelude::*;

use crate::types::AdmissionType;

/// Legacy/compat admission marker. Append-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "admissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub record_id: i64,
    pub admission_type: AdmissionType,
    pub discount_rate: Option<f64>,
    pub total_fees: Option<f64>,
    pub enrolled_course: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
