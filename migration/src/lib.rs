pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_chats;
mod m20250301_000002_create_chat_turns;
mod m20250301_000003_create_user_chats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_chats::Migration),
            Box::new(m20250301_000002_create_chat_turns::Migration),
            Box::new(m20250301_000003_create_user_chats::Migration),
        ]
    }
}
