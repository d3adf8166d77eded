use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_master_tables::Migration),
            Box::new(m20240601_000002_create_order_tables::Migration),
            Box::new(m20240601_000003_create_inventory_tables::Migration),
            Box::new(m20240601_000004_create_counter_runtime_table::Migration),
            Box::new(m20240601_000005_create_transfer_lot_index::Migration),
        ]
    }
}

// Migration implementations

mod m20240601_000001_create_master_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_master_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockItems::ItemCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StockItems::Name).string().not_null())
                        .col(ColumnDef::new(StockItems::Uom).string().null())
                        .col(
                            ColumnDef::new(StockItems::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(StockItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Location::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Location::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Location::LocCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Location::Name).string().not_null())
                        .col(
                            ColumnDef::new(Location::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Location::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Counter::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Counter::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Counter::CounterCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Counter::LocId).integer().not_null())
                        .col(
                            ColumnDef::new(Counter::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Counter::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_m_counter_loc_id")
                                .from(Counter::Table, Counter::LocId)
                                .to(Location::Table, Location::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Counter::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Location::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockItems {
        #[sea_orm(iden = "m_stock_items")]
        Table,
        Id,
        ItemCode,
        Name,
        Uom,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Location {
        #[sea_orm(iden = "m_location")]
        Table,
        Id,
        LocCode,
        Name,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Counter {
        #[sea_orm(iden = "m_counter")]
        Table,
        Id,
        CounterCode,
        LocId,
        IsActive,
        CreatedAt,
    }
}

mod m20240601_000002_create_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_order_tables"
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
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::OrderNo).string().not_null())
                        .col(ColumnDef::new(Orders::OrderType).string().not_null())
                        .col(ColumnDef::new(Orders::ItemId).integer().null())
                        .col(ColumnDef::new(Orders::LocId).integer().null())
                        .col(ColumnDef::new(Orders::ActualQty).integer().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string()
                                .not_null()
                                .default("OPEN"),
                        )
                        .col(ColumnDef::new(Orders::CreatedBy).string().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_item_id")
                                .from(Orders::Table, Orders::ItemId)
                                .to(StockItems::Table, StockItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_loc_id")
                                .from(Orders::Table, Orders::LocId)
                                .to(Location::Table, Location::Id)
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
                        .name("idx_orders_order_type")
                        .table(Orders::Table)
                        .col(Orders::OrderType)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdersReceipt::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdersReceipt::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdersReceipt::OrderId).integer().not_null())
                        .col(
                            ColumnDef::new(OrdersReceipt::UnitCostHandled)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrdersReceipt::SupplierName).string().null())
                        .col(ColumnDef::new(OrdersReceipt::PoNo).string().null())
                        .col(
                            ColumnDef::new(OrdersReceipt::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_receipt_order_id")
                                .from(OrdersReceipt::Table, OrdersReceipt::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdersUsage::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdersUsage::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdersUsage::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrdersUsage::Requester).string().null())
                        .col(ColumnDef::new(OrdersUsage::Purpose).string().null())
                        .col(
                            ColumnDef::new(OrdersUsage::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_usage_order_id")
                                .from(OrdersUsage::Table, OrdersUsage::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdersReturn::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdersReturn::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdersReturn::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrdersReturn::UsageId).integer().not_null())
                        .col(ColumnDef::new(OrdersReturn::Reason).string().null())
                        .col(
                            ColumnDef::new(OrdersReturn::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_return_order_id")
                                .from(OrdersReturn::Table, OrdersReturn::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_return_usage_id")
                                .from(OrdersReturn::Table, OrdersReturn::UsageId)
                                .to(OrdersUsage::Table, OrdersUsage::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdersTransfer::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdersTransfer::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdersTransfer::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrdersTransfer::FromLocId).integer().not_null())
                        .col(
                            ColumnDef::new(OrdersTransfer::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_transfer_order_id")
                                .from(OrdersTransfer::Table, OrdersTransfer::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_transfer_from_loc_id")
                                .from(OrdersTransfer::Table, OrdersTransfer::FromLocId)
                                .to(Location::Table, Location::Id)
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
                        .name("idx_orders_receipt_order_id")
                        .table(OrdersReceipt::Table)
                        .col(OrdersReceipt::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_usage_order_id")
                        .table(OrdersUsage::Table)
                        .col(OrdersUsage::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_return_order_id")
                        .table(OrdersReturn::Table)
                        .col(OrdersReturn::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_transfer_order_id")
                        .table(OrdersTransfer::Table)
                        .col(OrdersTransfer::OrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrdersTransfer::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdersReturn::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdersUsage::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdersReceipt::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNo,
        OrderType,
        ItemId,
        LocId,
        ActualQty,
        Status,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrdersReceipt {
        Table,
        Id,
        OrderId,
        UnitCostHandled,
        SupplierName,
        PoNo,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrdersUsage {
        Table,
        Id,
        OrderId,
        Requester,
        Purpose,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrdersReturn {
        Table,
        Id,
        OrderId,
        UsageId,
        Reason,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrdersTransfer {
        Table,
        Id,
        OrderId,
        FromLocId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum StockItems {
        #[sea_orm(iden = "m_stock_items")]
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Location {
        #[sea_orm(iden = "m_location")]
        Table,
        Id,
    }
}

mod m20240601_000003_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Inventory::ItemId).integer().not_null())
                        .col(ColumnDef::new(Inventory::LocId).integer().not_null())
                        .col(ColumnDef::new(Inventory::ReceiptId).integer().null())
                        .col(
                            ColumnDef::new(Inventory::UnitCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::TotalCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventory::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Inventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Inventory::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_item_id")
                                .from(Inventory::Table, Inventory::ItemId)
                                .to(StockItems::Table, StockItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_loc_id")
                                .from(Inventory::Table, Inventory::LocId)
                                .to(Location::Table, Location::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_receipt_id")
                                .from(Inventory::Table, Inventory::ReceiptId)
                                .to(OrdersReceipt::Table, OrdersReceipt::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO scans walk (item, location) in creation order.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_item_loc_created")
                        .table(Inventory::Table)
                        .col(Inventory::ItemId)
                        .col(Inventory::LocId)
                        .col(Inventory::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTrx::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTrx::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryTrx::InvId).integer().not_null())
                        .col(ColumnDef::new(InventoryTrx::OrderId).integer().not_null())
                        .col(ColumnDef::new(InventoryTrx::OrderType).string().not_null())
                        .col(ColumnDef::new(InventoryTrx::ItemId).integer().not_null())
                        .col(ColumnDef::new(InventoryTrx::LocId).integer().not_null())
                        .col(ColumnDef::new(InventoryTrx::Qty).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryTrx::UnitCost)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTrx::TotalCost)
                                .decimal_len(15, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTrx::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_trx_inv_id")
                                .from(InventoryTrx::Table, InventoryTrx::InvId)
                                .to(Inventory::Table, Inventory::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_trx_order_id")
                                .from(InventoryTrx::Table, InventoryTrx::OrderId)
                                .to(Orders::Table, Orders::Id)
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
                        .name("idx_inventory_trx_order_id")
                        .table(InventoryTrx::Table)
                        .col(InventoryTrx::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_trx_item_loc")
                        .table(InventoryTrx::Table)
                        .col(InventoryTrx::ItemId)
                        .col(InventoryTrx::LocId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UsageInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UsageInventory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(UsageInventory::UsageId).integer().not_null())
                        .col(ColumnDef::new(UsageInventory::InvId).integer().not_null())
                        .col(ColumnDef::new(UsageInventory::UsageQty).integer().null())
                        .col(
                            ColumnDef::new(UsageInventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_usage_inventory_usage_id")
                                .from(UsageInventory::Table, UsageInventory::UsageId)
                                .to(OrdersUsage::Table, OrdersUsage::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_usage_inventory_inv_id")
                                .from(UsageInventory::Table, UsageInventory::InvId)
                                .to(Inventory::Table, Inventory::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // A usage draws from a given lot once.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_usage_inventory_usage_inv")
                        .table(UsageInventory::Table)
                        .col(UsageInventory::UsageId)
                        .col(UsageInventory::InvId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReturnInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReturnInventory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ReturnInventory::ReturnId).integer().not_null())
                        .col(
                            ColumnDef::new(ReturnInventory::UsageInventoryId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReturnInventory::InvId).integer().not_null())
                        .col(ColumnDef::new(ReturnInventory::ReturnQty).integer().not_null())
                        .col(
                            ColumnDef::new(ReturnInventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_return_inventory_return_id")
                                .from(ReturnInventory::Table, ReturnInventory::ReturnId)
                                .to(OrdersReturn::Table, OrdersReturn::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_return_inventory_usage_inventory_id")
                                .from(ReturnInventory::Table, ReturnInventory::UsageInventoryId)
                                .to(UsageInventory::Table, UsageInventory::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_return_inventory_inv_id")
                                .from(ReturnInventory::Table, ReturnInventory::InvId)
                                .to(Inventory::Table, Inventory::Id)
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
                        .name("idx_return_inventory_usage_inventory_id")
                        .table(ReturnInventory::Table)
                        .col(ReturnInventory::UsageInventoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventorySum::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventorySum::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventorySum::ItemId).integer().not_null())
                        .col(ColumnDef::new(InventorySum::LocId).integer().not_null())
                        .col(
                            ColumnDef::new(InventorySum::MaintenanceContractId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(InventorySum::OrgId).integer().null())
                        .col(ColumnDef::new(InventorySum::DeptId).integer().null())
                        .col(ColumnDef::new(InventorySum::Condition).string().null())
                        .col(
                            ColumnDef::new(InventorySum::Quantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySum::TotalCost)
                                .decimal_len(15, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySum::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_sum_item_id")
                                .from(InventorySum::Table, InventorySum::ItemId)
                                .to(StockItems::Table, StockItems::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_sum_loc_id")
                                .from(InventorySum::Table, InventorySum::LocId)
                                .to(Location::Table, Location::Id)
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
                        .name("idx_inventory_sum_item_loc")
                        .table(InventorySum::Table)
                        .col(InventorySum::ItemId)
                        .col(InventorySum::LocId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventorySum::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReturnInventory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UsageInventory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryTrx::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventory {
        Table,
        Id,
        ItemId,
        LocId,
        ReceiptId,
        UnitCost,
        Quantity,
        TotalCost,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryTrx {
        Table,
        Id,
        InvId,
        OrderId,
        OrderType,
        ItemId,
        LocId,
        Qty,
        UnitCost,
        TotalCost,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum UsageInventory {
        Table,
        Id,
        UsageId,
        InvId,
        UsageQty,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ReturnInventory {
        Table,
        Id,
        ReturnId,
        UsageInventoryId,
        InvId,
        ReturnQty,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventorySum {
        Table,
        Id,
        ItemId,
        LocId,
        MaintenanceContractId,
        OrgId,
        DeptId,
        Condition,
        Quantity,
        TotalCost,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockItems {
        #[sea_orm(iden = "m_stock_items")]
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Location {
        #[sea_orm(iden = "m_location")]
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum OrdersReceipt {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum OrdersUsage {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum OrdersReturn {
        Table,
        Id,
    }
}

mod m20240601_000004_create_counter_runtime_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_counter_runtime_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CounterRuntime::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CounterRuntime::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::CounterId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CounterRuntime::OrderId).integer().null())
                        .col(
                            ColumnDef::new(CounterRuntime::Status)
                                .string()
                                .not_null()
                                .default("IDLE"),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::ExpectedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::ScannedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::FinishedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CounterRuntime::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_counter_runtime_counter_id")
                                .from(CounterRuntime::Table, CounterRuntime::CounterId)
                                .to(Counter::Table, Counter::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_counter_runtime_order_id")
                                .from(CounterRuntime::Table, CounterRuntime::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CounterRuntime::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CounterRuntime {
        Table,
        Id,
        CounterId,
        OrderId,
        Status,
        ExpectedQty,
        ScannedQty,
        StartedAt,
        FinishedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Counter {
        #[sea_orm(iden = "m_counter")]
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
    }
}

mod m20240601_000005_create_transfer_lot_index {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_transfer_lot_index"
        }
    }

    /// At most one active transfer-created lot per (item, location, unit cost).
    /// Receipt lots are excluded since every receipt creates its own lot.
    const CREATE_TRANSFER_LOT_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
         ux_inventory_transfer_lot ON inventory (item_id, loc_id, unit_cost) \
         WHERE receipt_id IS NULL AND is_active";

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .get_connection()
                .execute_unprepared(CREATE_TRANSFER_LOT_INDEX)
                .await?;
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .get_connection()
                .execute_unprepared("DROP INDEX IF EXISTS ux_inventory_transfer_lot")
                .await?;
            Ok(())
        }
    }
}
