use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatLogs::Name).string().not_null())
                    .col(ColumnDef::new(ChatLogs::ProviderModel).string().not_null())
                    .col(ColumnDef::new(ChatLogs::ProviderName).string().not_null())
                    .col(ColumnDef::new(ChatLogs::Status).string().not_null())
                    .col(ColumnDef::new(ChatLogs::Style).string().not_null())
                    .col(
                        ColumnDef::new(ChatLogs::Retry)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ChatLogs::Error).text().null())
                    .col(
                        ColumnDef::new(ChatLogs::ProxyTimeMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::FirstChunkTimeMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::TotalTimeMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::PromptTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::CompletionTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::TotalTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ChatLogs::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chat_logs_created_at")
                    .table(ChatLogs::Table)
                    .col(ChatLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ChatLogs {
    Table,
    Id,
    Name,
    ProviderModel,
    ProviderName,
    Status,
    Style,
    Retry,
    Error,
    ProxyTimeMs,
    FirstChunkTimeMs,
    TotalTimeMs,
    PromptTokens,
    CompletionTokens,
    TotalTokens,
    CreatedAt,
    DeletedAt,
}
