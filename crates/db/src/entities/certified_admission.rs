use sea_orm::entity::prelude::*;

/// Confirmed-visit log. Denormalized snapshot of the record and caller at
/// confirmation time so later edits cannot rewrite history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "certified_admissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub record_id: i64,
    pub phone_number: String,
    pub name: String,
    pub caller_name: String,
    pub response: Option<String>,
    pub processed_by: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
