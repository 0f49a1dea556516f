use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Catalog entry: produce sold by weight.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 2,
        max = 255,
        message = "Product name must be between 2 and 255 characters"
    ))]
    pub name: String,

    /// Public URL or a served path like `/uploads/products/<file>`.
    #[sea_orm(nullable)]
    pub image: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub price_per_kg: Decimal,

    pub in_stock: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ordered_item::Entity")]
    OrderedItems,
}

impl Related<super::ordered_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderedItems.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.in_stock {
                active_model.in_stock = Set(true);
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }

        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
