use sea_orm::entity::prelude::*;

use crate::types::VisitStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub caller_id: Option<i64>,
    pub phone_number: String,
    pub name: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub visit: VisitStatus,
    pub visit_by: Option<i64>,
    pub hidden_from_caller: bool,
    pub assigned_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
