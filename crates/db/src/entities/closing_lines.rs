//! `SeaORM` Entity for closing_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "closing_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub closing_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: Uuid,
    pub line_no: i32,
    pub account_name: String,
    pub currency: String,
    pub active: bool,
    pub prior_carry_forward: Decimal,
    pub period_income: Decimal,
    pub period_expense: Decimal,
    pub net_transfer: Decimal,
    pub physical_balance: Decimal,
    pub accrued_amount: Decimal,
    pub free_balance: Decimal,
    pub new_carry_forward: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::period_closings::Entity",
        from = "Column::ClosingId",
        to = "super::period_closings::Column::Id"
    )]
    PeriodClosings,
}

impl Related<super::period_closings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodClosings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
