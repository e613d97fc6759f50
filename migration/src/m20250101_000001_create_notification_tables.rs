use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS notification_hub.topics (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        domain VARCHAR NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS topics_domain_unique
        ON notification_hub.topics(domain)",
    "CREATE TABLE IF NOT EXISTS notification_hub.subscribers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        email VARCHAR NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS subscribers_email_unique
        ON notification_hub.subscribers(email)",
    "CREATE TABLE IF NOT EXISTS notification_hub.subscriber_topics (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        subscriber_id UUID NOT NULL,
        topic_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT fk_subscriber_topics_subscriber
            FOREIGN KEY (subscriber_id)
            REFERENCES notification_hub.subscribers(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE,
        CONSTRAINT fk_subscriber_topics_topic
            FOREIGN KEY (topic_id)
            REFERENCES notification_hub.topics(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE
    )",
    // At most one subscription row per (subscriber, topic) pair
    "CREATE UNIQUE INDEX IF NOT EXISTS subscriber_topics_pair_unique
        ON notification_hub.subscriber_topics(subscriber_id, topic_id)",
    "CREATE INDEX IF NOT EXISTS subscriber_topics_topic_id_idx
        ON notification_hub.subscriber_topics(topic_id)",
    "CREATE TABLE IF NOT EXISTS notification_hub.notifications (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        topic_id UUID NOT NULL,
        subject TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT fk_notifications_topic
            FOREIGN KEY (topic_id)
            REFERENCES notification_hub.topics(id)
            ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS notifications_topic_created_idx
        ON notification_hub.notifications(topic_id, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS notification_hub.subscriber_notifications (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        subscriber_id UUID NOT NULL,
        notification_id UUID NOT NULL,
        is_sent BOOLEAN NOT NULL DEFAULT false,
        sent_at TIMESTAMPTZ,
        is_read BOOLEAN NOT NULL DEFAULT false,
        read_at TIMESTAMPTZ,
        is_deleted BOOLEAN NOT NULL DEFAULT false,
        deleted_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT fk_subscriber_notifications_subscriber
            FOREIGN KEY (subscriber_id)
            REFERENCES notification_hub.subscribers(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE,
        CONSTRAINT fk_subscriber_notifications_notification
            FOREIGN KEY (notification_id)
            REFERENCES notification_hub.notifications(id)
            ON DELETE CASCADE
            ON UPDATE CASCADE
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS subscriber_notifications_pair_unique
        ON notification_hub.subscriber_notifications(subscriber_id, notification_id)",
    "CREATE INDEX IF NOT EXISTS subscriber_notifications_notification_id_idx
        ON notification_hub.subscriber_notifications(notification_id)",
];

const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS notification_hub.subscriber_notifications",
    "DROP TABLE IF EXISTS notification_hub.notifications",
    "DROP TABLE IF EXISTS notification_hub.subscriber_topics",
    "DROP TABLE IF EXISTS notification_hub.subscribers",
    "DROP TABLE IF EXISTS notification_hub.topics",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // execute_unprepared keeps the notification_hub schema qualification explicit
        for statement in CREATE_STATEMENTS {
            manager
                .get_connection()
                .execute_unprepared(statement)
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in DROP_STATEMENTS {
            manager
                .get_connection()
                .execute_unprepared(statement)
                .await?;
        }

        Ok(())
    }
}
