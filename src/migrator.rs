use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_agencies_table::Migration),
            Box::new(m20250101_000002_create_sales_reps_table::Migration),
            Box::new(m20250101_000003_create_inventory_bins_tables::Migration),
            Box::new(m20250101_000004_create_bin_history_table::Migration),
            Box::new(m20250101_000005_create_dashboard_snapshots_table::Migration),
            Box::new(m20250101_000006_create_contracts_table::Migration),
        ]
    }
}

mod m20250101_000001_create_agencies_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_agencies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Agencies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Agencies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Agencies::Name).string().not_null())
                        .col(
                            ColumnDef::new(Agencies::Allocation)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Agencies::ContactPerson).string().null())
                        .col(ColumnDef::new(Agencies::Email).string().null())
                        .col(ColumnDef::new(Agencies::Phone).string().null())
                        .col(ColumnDef::new(Agencies::Address).string().null())
                        .col(
                            ColumnDef::new(Agencies::Status)
                                .string_len(16)
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(Agencies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Agencies::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_agencies_name")
                        .table(Agencies::Table)
                        .col(Agencies::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Agencies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Agencies {
        Table,
        Id,
        Name,
        Allocation,
        ContactPerson,
        Email,
        Phone,
        Address,
        Status,
        CreatedAt,
        LastUpdated,
    }
}

mod m20250101_000002_create_sales_reps_table {
    use super::m20250101_000001_create_agencies_table::Agencies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_sales_reps_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesReps::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesReps::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SalesReps::Name).string().not_null())
                        .col(ColumnDef::new(SalesReps::Email).string().null())
                        .col(ColumnDef::new(SalesReps::Phone).string().null())
                        .col(ColumnDef::new(SalesReps::AgencyId).uuid().null())
                        .col(
                            ColumnDef::new(SalesReps::WithdrawalLimit)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesReps::Plan)
                                .string_len(16)
                                .not_null()
                                .default("basic"),
                        )
                        .col(
                            ColumnDef::new(SalesReps::Status)
                                .string_len(16)
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(SalesReps::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_reps_agency")
                                .from(SalesReps::Table, SalesReps::AgencyId)
                                .to(Agencies::Table, Agencies::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_reps_agency_id")
                        .table(SalesReps::Table)
                        .col(SalesReps::AgencyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesReps::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum SalesReps {
        Table,
        Id,
        Name,
        Email,
        Phone,
        AgencyId,
        WithdrawalLimit,
        Plan,
        Status,
        CreatedAt,
    }
}

mod m20250101_000003_create_inventory_bins_tables {
    use super::m20250101_000001_create_agencies_table::Agencies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_inventory_bins_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryBins::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryBins::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBins::BinCode)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(InventoryBins::Name).string().not_null())
                        .col(
                            ColumnDef::new(InventoryBins::Capacity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBins::CurrentStock)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryBins::SeedType).string().not_null())
                        .col(
                            ColumnDef::new(InventoryBins::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(
                            Expr::col(InventoryBins::CurrentStock).gte(0).and(
                                Expr::col(InventoryBins::CurrentStock)
                                    .lte(Expr::col(InventoryBins::Capacity)),
                            ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BinAgencies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BinAgencies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(BinAgencies::BinId).uuid().not_null())
                        .col(ColumnDef::new(BinAgencies::AgencyId).uuid().not_null())
                        .col(ColumnDef::new(BinAgencies::Role).string_len(16).not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_agencies_bin")
                                .from(BinAgencies::Table, BinAgencies::BinId)
                                .to(InventoryBins::Table, InventoryBins::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_agencies_agency")
                                .from(BinAgencies::Table, BinAgencies::AgencyId)
                                .to(Agencies::Table, Agencies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_bin_agencies_unique_role")
                        .table(BinAgencies::Table)
                        .col(BinAgencies::BinId)
                        .col(BinAgencies::AgencyId)
                        .col(BinAgencies::Role)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WithdrawalLimits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WithdrawalLimits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WithdrawalLimits::BinId).uuid().not_null())
                        .col(ColumnDef::new(WithdrawalLimits::AgencyId).uuid().not_null())
                        .col(
                            ColumnDef::new(WithdrawalLimits::MaxQuantity)
                                .big_integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_withdrawal_limits_bin")
                                .from(WithdrawalLimits::Table, WithdrawalLimits::BinId)
                                .to(InventoryBins::Table, InventoryBins::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_withdrawal_limits_agency")
                                .from(WithdrawalLimits::Table, WithdrawalLimits::AgencyId)
                                .to(Agencies::Table, Agencies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_withdrawal_limits_bin_agency")
                        .table(WithdrawalLimits::Table)
                        .col(WithdrawalLimits::BinId)
                        .col(WithdrawalLimits::AgencyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WithdrawalLimits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BinAgencies::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryBins::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum InventoryBins {
        Table,
        Id,
        BinCode,
        Name,
        Capacity,
        CurrentStock,
        SeedType,
        LastUpdated,
    }

    #[derive(DeriveIden)]
    enum BinAgencies {
        Table,
        Id,
        BinId,
        AgencyId,
        Role,
    }

    #[derive(DeriveIden)]
    enum WithdrawalLimits {
        Table,
        Id,
        BinId,
        AgencyId,
        MaxQuantity,
    }
}

mod m20250101_000004_create_bin_history_table {
    use super::m20250101_000003_create_inventory_bins_tables::InventoryBins;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_bin_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BinHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BinHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BinHistory::BinId).uuid().not_null())
                        .col(ColumnDef::new(BinHistory::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(BinHistory::AgencyId).uuid().null())
                        .col(ColumnDef::new(BinHistory::SalesRepId).uuid().null())
                        .col(ColumnDef::new(BinHistory::Quantity).big_integer().not_null())
                        .col(
                            ColumnDef::new(BinHistory::StockAfter)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinHistory::CounterpartBinId).uuid().null())
                        .col(
                            ColumnDef::new(BinHistory::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_history_bin")
                                .from(BinHistory::Table, BinHistory::BinId)
                                .to(InventoryBins::Table, InventoryBins::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bin_history_bin_id")
                        .table(BinHistory::Table)
                        .col(BinHistory::BinId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bin_history_sales_rep_recorded")
                        .table(BinHistory::Table)
                        .col(BinHistory::SalesRepId)
                        .col(BinHistory::RecordedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BinHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BinHistory {
        Table,
        Id,
        BinId,
        Kind,
        AgencyId,
        SalesRepId,
        Quantity,
        StockAfter,
        CounterpartBinId,
        RecordedAt,
    }
}

mod m20250101_000005_create_dashboard_snapshots_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_dashboard_snapshots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DashboardSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DashboardSnapshots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DashboardSnapshots::TotalCapacity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DashboardSnapshots::CurrentUsage)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DashboardSnapshots::Agencies).json().not_null())
                        .col(
                            ColumnDef::new(DashboardSnapshots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DashboardSnapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DashboardSnapshots {
        Table,
        Id,
        TotalCapacity,
        CurrentUsage,
        Agencies,
        CreatedAt,
    }
}

mod m20250101_000006_create_contracts_table {
    use super::m20250101_000002_create_sales_reps_table::SalesReps;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_contracts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Contracts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Contracts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Contracts::SalesRepId).uuid().not_null())
                        .col(
                            ColumnDef::new(Contracts::StartDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Contracts::EndDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Contracts::MonthlyLimit)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Contracts::Status)
                                .string_len(16)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Contracts::WithdrawalFrequency)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Contracts::ReturnPolicy).string().not_null())
                        .col(
                            ColumnDef::new(Contracts::MinimumOrder)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Contracts::MaximumOrder)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Contracts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Contracts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_contracts_sales_rep")
                                .from(Contracts::Table, Contracts::SalesRepId)
                                .to(SalesReps::Table, SalesReps::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_contracts_sales_rep_id")
                        .table(Contracts::Table)
                        .col(Contracts::SalesRepId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Contracts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Contracts {
        Table,
        Id,
        SalesRepId,
        StartDate,
        EndDate,
        MonthlyLimit,
        Status,
        WithdrawalFrequency,
        ReturnPolicy,
        MinimumOrder,
        MaximumOrder,
        CreatedAt,
        UpdatedAt,
    }
}
