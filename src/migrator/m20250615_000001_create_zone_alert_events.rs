use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ZoneAlertEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ZoneAlertEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ZoneAlertEvents::ZoneId).uuid().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::CameraId).integer().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::Temperature).double().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::Threshold).double().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::AlertType).string().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::Timestamp).date_time().not_null())
                    .col(ColumnDef::new(ZoneAlertEvents::Recipient).string().not_null())
                    .col(
                        ColumnDef::new(ZoneAlertEvents::Sent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ZoneAlertEvents::Error)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ZoneAlertEvents::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-zone_alert_events-zone_id")
                    .table(ZoneAlertEvents::Table)
                    .col(ZoneAlertEvents::ZoneId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ZoneAlertEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ZoneAlertEvents {
    Table,
    Id,
    ZoneId,
    CameraId,
    Temperature,
    Threshold,
    AlertType,
    Timestamp,
    Recipient,
    Sent,
    Error,
    CreatedAt,
}
