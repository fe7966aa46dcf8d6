use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000001_create_uoms_table::Migration),
            Box::new(m20240501_000002_create_product_templates_table::Migration),
            Box::new(m20240501_000003_create_products_tables::Migration),
            Box::new(m20240501_000004_create_production_templates_tables::Migration),
            Box::new(m20240501_000005_create_product_packagings_table::Migration),
            Box::new(m20240501_000006_create_bom_tables::Migration),
            Box::new(m20240501_000007_create_stock_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240501_000001_create_uoms_table {

    use rust_decimal::Decimal;
    use sea_orm_migration::prelude::*;
    use uuid::Uuid;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000001_create_uoms_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create uoms table aligned with entities::uom Model
            manager
                .create_table(
                    Table::create()
                        .table(Uoms::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Uoms::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Uoms::Name).string().not_null())
                        .col(ColumnDef::new(Uoms::Symbol).string().not_null())
                        .col(ColumnDef::new(Uoms::Category).string().not_null())
                        .col(ColumnDef::new(Uoms::Factor).decimal().not_null())
                        .col(ColumnDef::new(Uoms::Digits).integer().not_null().default(2))
                        .col(ColumnDef::new(Uoms::Active).boolean().not_null().default(true))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_uoms_symbol")
                        .table(Uoms::Table)
                        .col(Uoms::Symbol)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Seed the catalog the services resolve by symbol
            let units: [(&str, &str, &str, Decimal, i32); 6] = [
                ("Liter", "l", "volume", Decimal::ONE, 2),
                ("Milliliter", "ml", "volume", Decimal::new(1, 3), 0),
                ("Hectoliter", "hl", "volume", Decimal::new(100, 0), 2),
                ("Unit", "u", "unit", Decimal::ONE, 0),
                ("Kilogram", "kg", "weight", Decimal::ONE, 3),
                ("Gram", "g", "weight", Decimal::new(1, 3), 0),
            ];

            for (name, symbol, category, factor, digits) in units {
                let insert = Query::insert()
                    .into_table(Uoms::Table)
                    .columns([
                        Uoms::Id,
                        Uoms::Name,
                        Uoms::Symbol,
                        Uoms::Category,
                        Uoms::Factor,
                        Uoms::Digits,
                        Uoms::Active,
                    ])
                    .values_panic([
                        Uuid::new_v4().into(),
                        name.into(),
                        symbol.into(),
                        category.into(),
                        factor.into(),
                        digits.into(),
                        true.into(),
                    ])
                    .to_owned();
                manager.exec_stmt(insert).await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Uoms::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Uoms {
        Table,
        Id,
        Name,
        Symbol,
        Category,
        Factor,
        Digits,
        Active,
    }
}

mod m20240501_000002_create_product_templates_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000002_create_product_templates_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create product_templates table aligned with entities::product_template Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductTemplates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductTemplates::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductTemplates::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProductTemplates::DefaultUomId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTemplates::Bulk)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductTemplates::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductTemplates::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductTemplates::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_templates_bulk")
                        .table(ProductTemplates::Table)
                        .col(ProductTemplates::Bulk)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductTemplates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductTemplates {
        Table,
        Id,
        Name,
        DefaultUomId,
        Bulk,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240501_000003_create_products_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000003_create_products_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create products table aligned with entities::product Model
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::TemplateId).uuid().not_null())
                        .col(ColumnDef::new(Products::Code).string().null())
                        .col(ColumnDef::new(Products::Capacity).decimal().null())
                        .col(ColumnDef::new(Products::CapacityUomId).uuid().null())
                        .col(ColumnDef::new(Products::NetWeight).decimal().null())
                        .col(ColumnDef::new(Products::Weight).decimal().null())
                        .col(ColumnDef::new(Products::WeightUomId).uuid().null())
                        .col(ColumnDef::new(Products::BulkProductId).uuid().null())
                        .col(ColumnDef::new(Products::DenominationOfOrigin).string().null())
                        .col(
                            ColumnDef::new(Products::Ecological)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::Vintage).integer().null())
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_template_id")
                        .table(Products::Table)
                        .col(Products::TemplateId)
                        .to_owned(),
                )
                .await?;

            // Derivative lookups by bulk source drive the aggregation path
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_bulk_product_id")
                        .table(Products::Table)
                        .col(Products::BulkProductId)
                        .to_owned(),
                )
                .await?;

            // Create product_varieties table aligned with entities::product_variety Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductVarieties::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVarieties::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVarieties::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductVarieties::Variety).string().not_null())
                        .col(ColumnDef::new(ProductVarieties::Percent).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_varieties_product_id")
                        .table(ProductVarieties::Table)
                        .col(ProductVarieties::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductVarieties::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        TemplateId,
        Code,
        Capacity,
        CapacityUomId,
        NetWeight,
        Weight,
        WeightUomId,
        BulkProductId,
        DenominationOfOrigin,
        Ecological,
        Vintage,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductVarieties {
        Table,
        Id,
        ProductId,
        Variety,
        Percent,
    }
}

mod m20240501_000004_create_production_templates_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000004_create_production_templates_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create production_templates table aligned with entities::production_template Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductionTemplates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionTemplates::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionTemplates::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProductionTemplates::Packaging)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplates::Labeling)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplates::PackagingProductId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplates::OutputTemplateId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(ProductionTemplates::Quantity).decimal().null())
                        .col(ColumnDef::new(ProductionTemplates::UomId).uuid().null())
                        .col(
                            ColumnDef::new(ProductionTemplates::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplates::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplates::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Create production_template_inputs table aligned with
            // entities::production_template_input Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductionTemplateInputs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionTemplateInputs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplateInputs::ProductionTemplateId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplateInputs::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplateInputs::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionTemplateInputs::UomId)
                                .uuid()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_template_inputs_template_id")
                        .table(ProductionTemplateInputs::Table)
                        .col(ProductionTemplateInputs::ProductionTemplateId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_template_inputs_product_id")
                        .table(ProductionTemplateInputs::Table)
                        .col(ProductionTemplateInputs::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ProductionTemplateInputs::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(ProductionTemplates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionTemplates {
        Table,
        Id,
        Name,
        Packaging,
        Labeling,
        PackagingProductId,
        OutputTemplateId,
        Quantity,
        UomId,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionTemplateInputs {
        Table,
        Id,
        ProductionTemplateId,
        ProductId,
        Quantity,
        UomId,
    }
}

mod m20240501_000005_create_product_packagings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000005_create_product_packagings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create product_packagings table aligned with entities::product_packaging Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductPackagings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductPackagings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductPackagings::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductPackagings::ProductionTemplateId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductPackagings::PackagedProductId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductPackagings::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductPackagings::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_packagings_product_id")
                        .table(ProductPackagings::Table)
                        .col(ProductPackagings::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_packagings_packaged_product_id")
                        .table(ProductPackagings::Table)
                        .col(ProductPackagings::PackagedProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductPackagings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductPackagings {
        Table,
        Id,
        ProductId,
        ProductionTemplateId,
        PackagedProductId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240501_000006_create_bom_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000006_create_bom_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create boms table aligned with entities::bom Model
            manager
                .create_table(
                    Table::create()
                        .table(Boms::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Boms::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Boms::Name).string().not_null())
                        .col(
                            ColumnDef::new(Boms::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Boms::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Boms::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Create bom_inputs table aligned with entities::bom_input Model
            manager
                .create_table(
                    Table::create()
                        .table(BomInputs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BomInputs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(BomInputs::BomId).uuid().not_null())
                        .col(ColumnDef::new(BomInputs::ProductId).uuid().not_null())
                        .col(ColumnDef::new(BomInputs::Quantity).decimal().not_null())
                        .col(ColumnDef::new(BomInputs::UomId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bom_inputs_bom_id")
                        .table(BomInputs::Table)
                        .col(BomInputs::BomId)
                        .to_owned(),
                )
                .await?;

            // Create bom_outputs table aligned with entities::bom_output Model
            manager
                .create_table(
                    Table::create()
                        .table(BomOutputs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(BomOutputs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(BomOutputs::BomId).uuid().not_null())
                        .col(ColumnDef::new(BomOutputs::ProductId).uuid().not_null())
                        .col(ColumnDef::new(BomOutputs::Quantity).decimal().not_null())
                        .col(ColumnDef::new(BomOutputs::UomId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bom_outputs_bom_id")
                        .table(BomOutputs::Table)
                        .col(BomOutputs::BomId)
                        .to_owned(),
                )
                .await?;

            // Create product_boms table aligned with entities::product_bom Model
            manager
                .create_table(
                    Table::create()
                        .table(ProductBoms::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ProductBoms::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ProductBoms::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductBoms::BomId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductBoms::Sequence)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_boms_product_id")
                        .table(ProductBoms::Table)
                        .col(ProductBoms::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductBoms::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BomOutputs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BomInputs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Boms::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Boms {
        Table,
        Id,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum BomInputs {
        Table,
        Id,
        BomId,
        ProductId,
        Quantity,
        UomId,
    }

    #[derive(DeriveIden)]
    pub(super) enum BomOutputs {
        Table,
        Id,
        BomId,
        ProductId,
        Quantity,
        UomId,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductBoms {
        Table,
        Id,
        ProductId,
        BomId,
        Sequence,
    }
}

mod m20240501_000007_create_stock_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240501_000007_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create stock_locations table aligned with entities::stock_location Model
            manager
                .create_table(
                    Table::create()
                        .table(StockLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockLocations::Name).string().not_null())
                        .col(ColumnDef::new(StockLocations::Code).string().null())
                        .col(ColumnDef::new(StockLocations::Kind).string().not_null())
                        .col(ColumnDef::new(StockLocations::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(StockLocations::StorageLocationId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_locations_kind")
                        .table(StockLocations::Table)
                        .col(StockLocations::Kind)
                        .to_owned(),
                )
                .await?;

            // Create stock_moves table aligned with entities::stock_move Model
            manager
                .create_table(
                    Table::create()
                        .table(StockMoves::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StockMoves::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(StockMoves::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockMoves::FromLocationId).uuid().not_null())
                        .col(ColumnDef::new(StockMoves::ToLocationId).uuid().not_null())
                        .col(ColumnDef::new(StockMoves::Quantity).decimal().not_null())
                        .col(ColumnDef::new(StockMoves::UomId).uuid().not_null())
                        .col(ColumnDef::new(StockMoves::EffectiveDate).date().not_null())
                        .col(ColumnDef::new(StockMoves::State).string().not_null())
                        .col(ColumnDef::new(StockMoves::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockMoves::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // The guard's existence probe and the aggregation sums both hit
            // moves by product
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_moves_product_id")
                        .table(StockMoves::Table)
                        .col(StockMoves::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_moves_to_location_id")
                        .table(StockMoves::Table)
                        .col(StockMoves::ToLocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_moves_from_location_id")
                        .table(StockMoves::Table)
                        .col(StockMoves::FromLocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMoves::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockLocations {
        Table,
        Id,
        Name,
        Code,
        Kind,
        ParentId,
        StorageLocationId,
        Active,
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMoves {
        Table,
        Id,
        ProductId,
        FromLocationId,
        ToLocationId,
        Quantity,
        UomId,
        EffectiveDate,
        State,
        CreatedAt,
        UpdatedAt,
    }
}
