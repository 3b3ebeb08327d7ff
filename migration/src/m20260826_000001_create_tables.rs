use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create authors table
        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Authors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Authors::AuthorId).string().not_null())
                    .col(ColumnDef::new(Authors::AuthorType).string().not_null())
                    .col(ColumnDef::new(Authors::AuthorName).string())
                    .col(ColumnDef::new(Authors::AvatarUrl).string())
                    .col(
                        ColumnDef::new(Authors::IsOrg)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Authors::Status)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Authors::Weight)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Authors::Uid).big_integer().not_null())
                    .col(
                        ColumnDef::new(Authors::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Authors::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on authors.uid for owner-scoped listing
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_authors_uid")
                    .table(Authors::Table)
                    .col(Authors::Uid)
                    .to_owned(),
            )
            .await?;

        // Create questions table (red-packet watches)
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::QuestionId).string().not_null())
                    .col(ColumnDef::new(Questions::Title).string())
                    .col(ColumnDef::new(Questions::Description).text())
                    .col(ColumnDef::new(Questions::AuthorId).string())
                    .col(ColumnDef::new(Questions::AuthorName).string())
                    .col(
                        ColumnDef::new(Questions::QuestionCreated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::QuestionUpdated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::QuestionAmount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::QuestionRedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::NotifyStatus)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Questions::Status)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Questions::Weight)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Questions::Uid).big_integer().not_null())
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Questions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_questions_uid")
                    .table(Questions::Table)
                    .col(Questions::Uid)
                    .to_owned(),
            )
            .await?;

        // Create author_questions table (per-stream discovery records)
        manager
            .create_table(
                Table::create()
                    .table(AuthorQuestions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthorQuestions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthorQuestions::QuestionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthorQuestions::Title).string())
                    .col(ColumnDef::new(AuthorQuestions::Description).text())
                    .col(ColumnDef::new(AuthorQuestions::AuthorName).string())
                    .col(
                        ColumnDef::new(AuthorQuestions::QuestionCreated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AuthorQuestions::QuestionUpdated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AuthorQuestions::Kind)
                            .string()
                            .not_null()
                            .default("normal"),
                    )
                    .col(ColumnDef::new(AuthorQuestions::Stream).string().not_null())
                    .col(ColumnDef::new(AuthorQuestions::Aid).integer().not_null())
                    .col(
                        ColumnDef::new(AuthorQuestions::Uid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthorQuestions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_author_questions_author")
                            .from(AuthorQuestions::Table, AuthorQuestions::Aid)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index backing the idempotent re-discovery check
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_author_questions_unique")
                    .table(AuthorQuestions::Table)
                    .col(AuthorQuestions::QuestionId)
                    .col(AuthorQuestions::Aid)
                    .col(AuthorQuestions::Uid)
                    .col(AuthorQuestions::Stream)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create notify_receivers table
        manager
            .create_table(
                Table::create()
                    .table(NotifyReceivers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotifyReceivers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotifyReceivers::Email).string().not_null())
                    .col(ColumnDef::new(NotifyReceivers::Remark).string())
                    .col(
                        ColumnDef::new(NotifyReceivers::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(NotifyReceivers::Uid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotifyReceivers::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(NotifyReceivers::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notify_history table (append-only)
        manager
            .create_table(
                Table::create()
                    .table(NotifyHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotifyHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotifyHistory::SubjectId).string().not_null())
                    .col(ColumnDef::new(NotifyHistory::NotifyType).string().not_null())
                    .col(ColumnDef::new(NotifyHistory::Content).text())
                    .col(ColumnDef::new(NotifyHistory::Uid).big_integer().not_null())
                    .col(
                        ColumnDef::new(NotifyHistory::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notify_history_uid")
                    .table(NotifyHistory::Table)
                    .col(NotifyHistory::Uid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotifyHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NotifyReceivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthorQuestions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Authors::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    AuthorId,
    AuthorType,
    AuthorName,
    AvatarUrl,
    IsOrg,
    Status,
    Weight,
    Uid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    QuestionId,
    Title,
    Description,
    AuthorId,
    AuthorName,
    QuestionCreated,
    QuestionUpdated,
    QuestionAmount,
    QuestionRedCount,
    NotifyStatus,
    Status,
    Weight,
    Uid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuthorQuestions {
    Table,
    Id,
    QuestionId,
    Title,
    Description,
    AuthorName,
    QuestionCreated,
    QuestionUpdated,
    Kind,
    Stream,
    Aid,
    Uid,
    CreatedAt,
}

#[derive(DeriveIden)]
enum NotifyReceivers {
    Table,
    Id,
    Email,
    Remark,
    Active,
    Uid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NotifyHistory {
    Table,
    Id,
    SubjectId,
    NotifyType,
    Content,
    Uid,
    CreatedAt,
}
