use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CameraReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CameraReadings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CameraReadings::CameraId).integer().not_null())
                    .col(ColumnDef::new(CameraReadings::ZoneId).uuid().not_null())
                    .col(ColumnDef::new(CameraReadings::ZoneNumber).integer())
                    .col(ColumnDef::new(CameraReadings::Temperature).double().not_null())
                    .col(ColumnDef::new(CameraReadings::Timestamp).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Latest-reading lookups scan this index backwards
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-camera_readings-zone_id-timestamp")
                    .table(CameraReadings::Table)
                    .col(CameraReadings::ZoneId)
                    .col(CameraReadings::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-camera_readings-camera_id")
                    .table(CameraReadings::Table)
                    .col(CameraReadings::CameraId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CameraReadings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CameraReadings {
    Table,
    Id,
    CameraId,
    ZoneId,
    ZoneNumber,
    Temperature,
    Timestamp,
}
