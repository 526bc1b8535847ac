use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ZoneAlerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ZoneAlerts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ZoneAlerts::ZoneId).uuid().not_null())
                    // NULL means no bound on that side
                    .col(ColumnDef::new(ZoneAlerts::UpperThresh).double())
                    .col(ColumnDef::new(ZoneAlerts::LowerThresh).double())
                    .col(ColumnDef::new(ZoneAlerts::Recipient).string().not_null())
                    .col(ColumnDef::new(ZoneAlerts::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(ZoneAlerts::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ZoneAlerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ZoneAlerts {
    Table,
    Id,
    ZoneId,
    UpperThresh,
    LowerThresh,
    Recipient,
    CreatedAt,
    UpdatedAt,
}
