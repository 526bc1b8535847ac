use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "zone_alert_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub zone_id: Uuid,
    pub camera_id: i32,
    #[sea_orm(column_type = "Double")]
    pub temperature: f64,
    #[sea_orm(column_type = "Double")]
    pub threshold: f64,
    pub alert_type: String, // "upper" or "lower"
    pub timestamp: DateTime,
    pub recipient: String,
    pub sent: bool,
    #[sea_orm(column_type = "Text")]
    pub error: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
