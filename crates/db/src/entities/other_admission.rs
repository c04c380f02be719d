use sea_orm::entity::prelude::*;

/// Enrollment detail. Same denormalized snapshot as the certified log plus
/// the financial and course-schedule fields; mutable after creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "other_admissions")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub course_start_date: Option<DateTimeUtc>,
    pub course_end_date: Option<DateTimeUtc>,
    pub payment_mode: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
