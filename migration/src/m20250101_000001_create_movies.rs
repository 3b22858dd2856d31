use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Director))
                    .col(integer(Movies::Year))
                    .col(boolean(Movies::Watched).default(false))
                    .col(text_null(Movies::Review))
                    .col(double_null(Movies::Rating))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_created_at")
                    .table(Movies::Table)
                    .col(Movies::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Director,
    Year,
    Watched,
    Review,
    Rating,
    CreatedAt,
    UpdatedAt,
}
