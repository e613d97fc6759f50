use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS notification_hub;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO notification_hub, public;")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE removes every table created by later migrations
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS notification_hub CASCADE;")
            .await?;

        Ok(())
    }
}
