use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_chat_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64,
    pub user_chats_id: String,
    pub chat_id: String,
    pub title: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_chats::Entity",
        from = "Column::UserChatsId",
        to = "super::user_chats::Column::Id",
        on_delete = "Cascade"
    )]
    UserChats,
}

impl Related<super::user_chats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserChats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
