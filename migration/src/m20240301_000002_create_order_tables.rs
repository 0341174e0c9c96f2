use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Status Table (fixed lookup set)
        manager
            .create_table(
                Table::create()
                    .table(Status::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Status::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Status::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        let seed_status = Query::insert()
            .into_table(Status::Table)
            .columns([Status::Id, Status::Name])
            .values_panic([1.into(), "NOT ACCEPTED".into()])
            .values_panic([2.into(), "ACCEPT".into()])
            .values_panic([3.into(), "ON TRANSIT".into()])
            .values_panic([4.into(), "DELIVERED".into()])
            .to_owned();
        manager.exec_stmt(seed_status).await?;

        // Orders Table
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::Info).text().not_null())
                    .col(ColumnDef::new(Orders::Weight).double().not_null())
                    .col(ColumnDef::new(Orders::Length).double().not_null())
                    .col(ColumnDef::new(Orders::Width).double().not_null())
                    .col(ColumnDef::new(Orders::Height).double().not_null())
                    .col(ColumnDef::new(Orders::From).string().not_null())
                    .col(ColumnDef::new(Orders::To).string().not_null())
                    .col(
                        ColumnDef::new(Orders::CreateAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::DateStart).date().not_null())
                    .col(ColumnDef::new(Orders::DateEnd).date().not_null())
                    .col(
                        ColumnDef::new(Orders::StatusId)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Orders::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_status")
                            .from(Orders::Table, Orders::StatusId)
                            .to(Status::Table, Status::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user")
                            .from(Orders::Table, Orders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        // Order Files Table (photo/document attachments)
        manager
            .create_table(
                Table::create()
                    .table(OrderFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderFiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderFiles::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderFiles::Name).string().not_null())
                    .col(ColumnDef::new(OrderFiles::MimeType).string().not_null())
                    .col(
                        ColumnDef::new(OrderFiles::Content)
                            .binary()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_files_order")
                            .from(OrderFiles::Table, OrderFiles::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_files_order_id")
                    .table(OrderFiles::Table)
                    .col(OrderFiles::OrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderFiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Status::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Status {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    Info,
    Weight,
    Length,
    Width,
    Height,
    From,
    To,
    CreateAt,
    DateStart,
    DateEnd,
    StatusId,
    UserId,
}

#[derive(DeriveIden)]
enum OrderFiles {
    Table,
    Id,
    OrderId,
    Name,
    MimeType,
    Content,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
