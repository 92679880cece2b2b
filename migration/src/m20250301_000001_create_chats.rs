use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chats::Id).string_len(36).not_null().primary_key())
                    .col(ColumnDef::new(Chats::UserId).string().not_null())
                    .col(ColumnDef::new(Chats::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Chats::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Every read and append is scoped by (id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_chats_id_user")
                    .table(Chats::Table)
                    .col(Chats::Id)
                    .col(Chats::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Chats {
    Table,
    Id,
    UserId,
    CreatedAt,
    UpdatedAt,
}
