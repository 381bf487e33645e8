use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240110_000001_create_products_table::Migration),
            Box::new(m20240110_000002_create_sales_tables::Migration),
            Box::new(m20240110_000003_create_purchasing_tables::Migration),
            Box::new(m20240110_000004_create_returns_tables::Migration),
            Box::new(m20240110_000005_create_expenses_table::Migration),
            Box::new(m20240110_000006_create_activity_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240110_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::BuyPrice)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::SellPrice)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CurrentStockQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::LowStockAlertLevel)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
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
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Sku,
        Name,
        Description,
        BuyPrice,
        SellPrice,
        CurrentStockQty,
        LowStockAlertLevel,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240110_000002_create_sales_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240110_000001_create_products_table::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000002_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::SellerCustomId).string().null())
                        .col(ColumnDef::new(Orders::Platform).string().null())
                        .col(
                            ColumnDef::new(Orders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
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
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            // Reporting filters on the (seller, platform) channel pair.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_channel")
                        .table(Orders::Table)
                        .col(Orders::SellerCustomId)
                        .col(Orders::Platform)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::PriceAtSale)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        EmployeeId,
        CustomerId,
        Status,
        TotalAmount,
        SellerCustomId,
        Platform,
        OrderDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        PriceAtSale,
    }
}

mod m20240110_000003_create_purchasing_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240110_000001_create_products_table::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000003_create_purchasing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Purchases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Purchases::SupplierId).uuid().null())
                        .col(ColumnDef::new(Purchases::InvoiceNumber).string().not_null())
                        .col(
                            ColumnDef::new(Purchases::TotalCost)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Purchases::PurchaseDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Purchases::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseItems::PurchaseId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseItems::CostPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_items_purchase_id")
                                .from(PurchaseItems::Table, PurchaseItems::PurchaseId)
                                .to(Purchases::Table, Purchases::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_items_product_id")
                                .from(PurchaseItems::Table, PurchaseItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_items_purchase_id")
                        .table(PurchaseItems::Table)
                        .col(PurchaseItems::PurchaseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Purchases {
        Table,
        Id,
        SupplierId,
        InvoiceNumber,
        TotalCost,
        PurchaseDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseItems {
        Table,
        Id,
        PurchaseId,
        ProductId,
        Quantity,
        CostPrice,
    }
}

mod m20240110_000004_create_returns_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240110_000001_create_products_table::Products;
    use super::m20240110_000002_create_sales_tables::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000004_create_returns_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Returns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Returns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Returns::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Returns::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(Returns::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Returns::Reason).string().null())
                        .col(ColumnDef::new(Returns::Disposition).string().not_null())
                        .col(ColumnDef::new(Returns::Condition).string().not_null())
                        .col(
                            ColumnDef::new(Returns::RefundAmount)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Returns::SellerId).string().null())
                        .col(ColumnDef::new(Returns::Platform).string().null())
                        .col(
                            ColumnDef::new(Returns::ReturnDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Returns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_returns_order_id")
                                .from(Returns::Table, Returns::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_returns_product_id")
                                .from(Returns::Table, Returns::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_returns_order_id")
                        .table(Returns::Table)
                        .col(Returns::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReturnAnalyses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReturnAnalyses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReturnAnalyses::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(ReturnAnalyses::PackagingLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::ShippingLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::ProductLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::ReplacementShippingLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::IsCompensated)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::CompensationAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::TotalLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::NetLoss)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::ClaimStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::AnalysisDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnAnalyses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One reconciliation record per order.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_return_analyses_order_id")
                        .table(ReturnAnalyses::Table)
                        .col(ReturnAnalyses::OrderId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReturnAnalyses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Returns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Returns {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        Reason,
        Disposition,
        Condition,
        RefundAmount,
        SellerId,
        Platform,
        ReturnDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ReturnAnalyses {
        Table,
        Id,
        OrderId,
        PackagingLoss,
        ShippingLoss,
        ProductLoss,
        ReplacementShippingLoss,
        IsCompensated,
        CompensationAmount,
        TotalLoss,
        NetLoss,
        ClaimStatus,
        AnalysisDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240110_000005_create_expenses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000005_create_expenses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MiscellaneousExpenses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MiscellaneousExpenses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MiscellaneousExpenses::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MiscellaneousExpenses::Amount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(MiscellaneousExpenses::Date).date().not_null())
                        .col(ColumnDef::new(MiscellaneousExpenses::AddedBy).uuid().null())
                        .col(
                            ColumnDef::new(MiscellaneousExpenses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MiscellaneousExpenses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MiscellaneousExpenses {
        Table,
        Id,
        Description,
        Amount,
        Date,
        AddedBy,
        CreatedAt,
    }
}

mod m20240110_000006_create_activity_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240110_000006_create_activity_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActivityLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ActivityLogs::UserId).uuid().not_null())
                        .col(ColumnDef::new(ActivityLogs::ActionType).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::Description).text().not_null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ActivityLogs {
        Table,
        Id,
        UserId,
        ActionType,
        Description,
        CreatedAt,
    }
}
