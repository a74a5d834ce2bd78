//! short_links 表迁移
//!
//! 短链接主表，`dedup_key` 上的唯一索引保证同一 (target, owner) 至多一行。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShortLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLinks::ShortCode)
                            .string_len(16)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortLinks::TargetUrl).text().not_null())
                    .col(ColumnDef::new(ShortLinks::OwnerId).big_integer().null())
                    .col(
                        ColumnDef::new(ShortLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ShortLinks::DedupKey).string_len(64).null())
                    .to_owned(),
            )
            .await?;

        // NULL 不参与唯一性比较，关闭去重时写入 NULL
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_short_links_dedup_key")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::DedupKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_owner")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::OwnerId)
                    .to_owned(),
            )
            .await?;

        // 过期清扫使用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_active_expires")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::IsActive)
                    .col(ShortLinks::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_short_links_active_expires")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_short_links_owner").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_short_links_dedup_key").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortLinks {
    #[sea_orm(iden = "short_links")]
    Table,
    ShortCode,
    TargetUrl,
    OwnerId,
    CreatedAt,
    ExpiresAt,
    IsActive,
    ClickCount,
    DedupKey,
}
