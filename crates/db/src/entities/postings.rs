//! `SeaORM` Entity for postings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "postings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub direction: String,
    pub amount: Decimal,
    pub currency: String,
    pub effective_date: Date,
    pub category: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub reversed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_accounts::Entity",
        from = "Column::AccountId",
        to = "super::cash_accounts::Column::Id"
    )]
    CashAccounts,
}

impl Related<super::cash_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
