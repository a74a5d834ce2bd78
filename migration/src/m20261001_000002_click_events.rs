//! click_events 表迁移
//!
//! 每次点击一行，写入后不再修改。链接停用后事件仍然保留用于历史统计。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::ShortCode)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::IpHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::UserAgent).text().null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().null())
                    .col(
                        ColumnDef::new(ClickEvents::DeviceType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::Browser)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::OperatingSystem)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Country).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::City).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_code_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::ShortCode)
                    .col(ClickEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // 数据保留清理
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_occurred_at")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_click_events_occurred_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_click_events_code_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    ShortCode,
    OccurredAt,
    IpHash,
    UserAgent,
    Referrer,
    DeviceType,
    Browser,
    OperatingSystem,
    Country,
    City,
}
