//! `SeaORM` Entity for tenants table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub home_currency: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_accounts::Entity")]
    CashAccounts,
    #[sea_orm(has_many = "super::exchange_rates::Entity")]
    ExchangeRates,
    #[sea_orm(has_many = "super::period_closings::Entity")]
    PeriodClosings,
}

impl Related<super::cash_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashAccounts.def()
    }
}

impl Related<super::exchange_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExchangeRates.def()
    }
}

impl Related<super::period_closings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodClosings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
