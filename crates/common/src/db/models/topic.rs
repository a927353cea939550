//! Topic reference entity
//!
//! Topics are created lazily by the detector and shared across papers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper_topic::Entity")]
    PaperTopics,
}

impl Related<super::paper_topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaperTopics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
