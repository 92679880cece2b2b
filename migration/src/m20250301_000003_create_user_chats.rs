use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_chats::Chats;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One index document per user; the unique key is what makes
        // the upsert-and-push in the repository race free.
        manager
            .create_table(
                Table::create()
                    .table(UserChats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserChats::Id).string_len(36).not_null().primary_key())
                    .col(ColumnDef::new(UserChats::UserId).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(UserChats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserChats::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserChatEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserChatEntries::Seq)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserChatEntries::UserChatsId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserChatEntries::ChatId).string_len(36).not_null())
                    .col(ColumnDef::new(UserChatEntries::Title).string().not_null())
                    .col(
                        ColumnDef::new(UserChatEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_chat_entries_owner")
                            .from(UserChatEntries::Table, UserChatEntries::UserChatsId)
                            .to(UserChats::Table, UserChats::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_chat_entries_chat")
                            .from(UserChatEntries::Table, UserChatEntries::ChatId)
                            .to(Chats::Table, Chats::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_chat_entries_owner_seq")
                    .table(UserChatEntries::Table)
                    .col(UserChatEntries::UserChatsId)
                    .col(UserChatEntries::Seq)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserChatEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserChats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserChats {
    Table,
    Id,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserChatEntries {
    Table,
    Seq,
    UserChatsId,
    ChatId,
    Title,
    CreatedAt,
}
