use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_chats::Chats;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatTurns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatTurns::Seq)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatTurns::ChatId).string_len(36).not_null())
                    .col(ColumnDef::new(ChatTurns::Role).string_len(8).not_null())
                    .col(ColumnDef::new(ChatTurns::Parts).json().not_null())
                    .col(ColumnDef::new(ChatTurns::Img).string().null())
                    .col(
                        ColumnDef::new(ChatTurns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_turns_chat")
                            .from(ChatTurns::Table, ChatTurns::ChatId)
                            .to(Chats::Table, Chats::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_turns_chat_seq")
                    .table(ChatTurns::Table)
                    .col(ChatTurns::ChatId)
                    .col(ChatTurns::Seq)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatTurns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ChatTurns {
    Table,
    Seq,
    ChatId,
    Role,
    Parts,
    Img,
    CreatedAt,
}
