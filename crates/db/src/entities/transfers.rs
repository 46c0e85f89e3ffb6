//! `SeaORM` Entity for transfers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_account_id: Uuid,
    pub destination_account_id: Uuid,
    pub source_amount: Decimal,
    pub source_currency: String,
    pub rate: Decimal,
    pub rate_source: String,
    pub rate_effective_from: Date,
    pub destination_amount: Decimal,
    pub destination_currency: String,
    pub effective_date: Date,
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
        from = "Column::SourceAccountId",
        to = "super::cash_accounts::Column::Id"
    )]
    SourceAccount,
    #[sea_orm(
        belongs_to = "super::cash_accounts::Entity",
        from = "Column::DestinationAccountId",
        to = "super::cash_accounts::Column::Id"
    )]
    DestinationAccount,
}

impl ActiveModelBehavior for ActiveModel {}
