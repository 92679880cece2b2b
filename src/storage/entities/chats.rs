use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chat_turns::Entity")]
    ChatTurns,
}

impl Related<super::chat_turns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatTurns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
