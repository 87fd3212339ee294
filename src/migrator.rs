use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_master_data_tables::Migration),
            Box::new(m20240301_000002_create_company_tables::Migration),
            Box::new(m20240301_000003_create_pipeline_tables::Migration),
            Box::new(m20240301_000004_create_finance_logistics_tables::Migration),
            Box::new(m20240301_000005_create_collaboration_tables::Migration),
        ]
    }
}

/// Table and column identifiers shared by the migrations below.
mod idens {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveIden)]
    pub enum Countries {
        Table,
        Id,
        Name,
        IsoCode,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum States {
        Table,
        Id,
        CountryId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Cities {
        Table,
        Id,
        StateId,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Users {
        Table,
        Id,
        Email,
        Name,
        Role,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Commodities {
        Table,
        Id,
        Name,
        HsCode,
        Unit,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Companies {
        Table,
        Id,
        Name,
        CompanyType,
        Email,
        CountryId,
        StateId,
        CityId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum CompanyCommodities {
        Table,
        Id,
        CompanyId,
        CommodityId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum ProcurementProjects {
        Table,
        Id,
        Name,
        CommodityId,
        CreatedById,
        Status,
        TargetQuantity,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum ProjectVendors {
        Table,
        Id,
        ProjectId,
        VendorId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum SampleRecords {
        Table,
        Id,
        ProjectId,
        VendorId,
        Reference,
        Status,
        ReceivedAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum SalesOpportunities {
        Table,
        Id,
        Title,
        ClientId,
        CommodityId,
        ProcurementProjectId,
        Status,
        Quantity,
        TargetPrice,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum SampleSubmissions {
        Table,
        Id,
        SampleId,
        OpportunityId,
        Status,
        SubmittedAt,
        DecidedAt,
        Feedback,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrders {
        Table,
        Id,
        PoNumber,
        ProjectId,
        VendorId,
        Status,
        Quantity,
        UnitPrice,
        Currency,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum SalesOrders {
        Table,
        Id,
        OrderNumber,
        OpportunityId,
        ClientId,
        Status,
        Quantity,
        UnitPrice,
        Currency,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        SalesOrderId,
        Amount,
        Currency,
        IsPaid,
        IssuedAt,
    }

    #[derive(DeriveIden)]
    pub enum Bills {
        Table,
        Id,
        BillNumber,
        PurchaseOrderId,
        Amount,
        Currency,
        IsPaid,
        ReceivedAt,
    }

    #[derive(DeriveIden)]
    pub enum Transactions {
        Table,
        Id,
        InvoiceId,
        BillId,
        Direction,
        Amount,
        Currency,
        OccurredAt,
    }

    #[derive(DeriveIden)]
    pub enum Shipments {
        Table,
        Id,
        PurchaseOrderId,
        Carrier,
        TrackingNumber,
        ShippedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Grns {
        Table,
        Id,
        GrnNumber,
        PurchaseOrderId,
        ReceivedQuantity,
        ReceivedAt,
    }

    #[derive(DeriveIden)]
    pub enum InteractionLogs {
        Table,
        Id,
        CompanyId,
        UserId,
        Channel,
        Summary,
        OccurredAt,
    }

    #[derive(DeriveIden)]
    pub enum ActivityLogs {
        Table,
        Id,
        UserId,
        CompanyId,
        Action,
        EntityKind,
        EntityId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Todos {
        Table,
        Id,
        AssigneeId,
        CompanyId,
        Title,
        Done,
        DueAt,
        CreatedAt,
    }
}

mod m20240301_000001_create_master_data_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_master_data_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Countries::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Countries::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Countries::Name).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Countries::IsoCode)
                                .string_len(3)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Countries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(States::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(States::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(States::CountryId).uuid().not_null())
                        .col(ColumnDef::new(States::Name).string().not_null())
                        .col(
                            ColumnDef::new(States::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_states_country_id")
                                .from(States::Table, States::CountryId)
                                .to(Countries::Table, Countries::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Cities::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Cities::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Cities::StateId).uuid().not_null())
                        .col(ColumnDef::new(Cities::Name).string().not_null())
                        .col(
                            ColumnDef::new(Cities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cities_state_id")
                                .from(Cities::Table, Cities::StateId)
                                .to(States::Table, States::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Commodities::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Commodities::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Commodities::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Commodities::HsCode).string().null())
                        .col(
                            ColumnDef::new(Commodities::Unit)
                                .string_len(8)
                                .not_null()
                                .default("MT"),
                        )
                        .col(
                            ColumnDef::new(Commodities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Commodities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Cities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(States::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Countries::Table).to_owned())
                .await
        }
    }
}

mod m20240301_000002_create_company_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_company_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Companies::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Companies::CompanyType).string_len(16).not_null())
                        .col(ColumnDef::new(Companies::Email).string().null())
                        .col(ColumnDef::new(Companies::CountryId).uuid().null())
                        .col(ColumnDef::new(Companies::StateId).uuid().null())
                        .col(ColumnDef::new(Companies::CityId).uuid().null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Companies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_companies_country_id")
                                .from(Companies::Table, Companies::CountryId)
                                .to(Countries::Table, Countries::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_companies_state_id")
                                .from(Companies::Table, Companies::StateId)
                                .to(States::Table, States::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_companies_city_id")
                                .from(Companies::Table, Companies::CityId)
                                .to(Cities::Table, Cities::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CompanyCommodities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CompanyCommodities::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CompanyCommodities::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(CompanyCommodities::CommodityId).uuid().not_null())
                        .col(
                            ColumnDef::new(CompanyCommodities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_company_commodities_company_id")
                                .from(CompanyCommodities::Table, CompanyCommodities::CompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_company_commodities_commodity_id")
                                .from(CompanyCommodities::Table, CompanyCommodities::CommodityId)
                                .to(Commodities::Table, Commodities::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One link per company/commodity pair
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_company_commodities_pair")
                        .table(CompanyCommodities::Table)
                        .col(CompanyCommodities::CompanyId)
                        .col(CompanyCommodities::CommodityId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CompanyCommodities::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }
}

mod m20240301_000003_create_pipeline_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_pipeline_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProcurementProjects::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcurementProjects::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcurementProjects::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProcurementProjects::CommodityId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcurementProjects::CreatedById).uuid().null())
                        .col(
                            ColumnDef::new(ProcurementProjects::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementProjects::TargetQuantity)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(ProcurementProjects::Notes).text().null())
                        .col(
                            ColumnDef::new(ProcurementProjects::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementProjects::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_procurement_projects_commodity_id")
                                .from(ProcurementProjects::Table, ProcurementProjects::CommodityId)
                                .to(Commodities::Table, Commodities::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_procurement_projects_created_by_id")
                                .from(ProcurementProjects::Table, ProcurementProjects::CreatedById)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProjectVendors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ProjectVendors::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ProjectVendors::ProjectId).uuid().not_null())
                        .col(ColumnDef::new(ProjectVendors::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProjectVendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_project_vendors_project_id")
                                .from(ProjectVendors::Table, ProjectVendors::ProjectId)
                                .to(ProcurementProjects::Table, ProcurementProjects::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_project_vendors_vendor_id")
                                .from(ProjectVendors::Table, ProjectVendors::VendorId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SampleRecords::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SampleRecords::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SampleRecords::ProjectId).uuid().not_null())
                        .col(ColumnDef::new(SampleRecords::VendorId).uuid().not_null())
                        .col(ColumnDef::new(SampleRecords::Reference).string().not_null())
                        .col(ColumnDef::new(SampleRecords::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(SampleRecords::ReceivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(SampleRecords::Notes).text().null())
                        .col(
                            ColumnDef::new(SampleRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SampleRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sample_records_project_id")
                                .from(SampleRecords::Table, SampleRecords::ProjectId)
                                .to(ProcurementProjects::Table, ProcurementProjects::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sample_records_vendor_id")
                                .from(SampleRecords::Table, SampleRecords::VendorId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOpportunities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOpportunities::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOpportunities::Title).string().not_null())
                        .col(ColumnDef::new(SalesOpportunities::ClientId).uuid().not_null())
                        .col(ColumnDef::new(SalesOpportunities::CommodityId).uuid().not_null())
                        .col(
                            ColumnDef::new(SalesOpportunities::ProcurementProjectId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SalesOpportunities::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOpportunities::Quantity).decimal().not_null())
                        .col(ColumnDef::new(SalesOpportunities::TargetPrice).decimal().null())
                        .col(
                            ColumnDef::new(SalesOpportunities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOpportunities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_opportunities_client_id")
                                .from(SalesOpportunities::Table, SalesOpportunities::ClientId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_opportunities_commodity_id")
                                .from(SalesOpportunities::Table, SalesOpportunities::CommodityId)
                                .to(Commodities::Table, Commodities::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_opportunities_procurement_project_id")
                                .from(
                                    SalesOpportunities::Table,
                                    SalesOpportunities::ProcurementProjectId,
                                )
                                .to(ProcurementProjects::Table, ProcurementProjects::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SampleSubmissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SampleSubmissions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SampleSubmissions::SampleId).uuid().not_null())
                        .col(ColumnDef::new(SampleSubmissions::OpportunityId).uuid().not_null())
                        .col(
                            ColumnDef::new(SampleSubmissions::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SampleSubmissions::SubmittedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SampleSubmissions::DecidedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(SampleSubmissions::Feedback).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sample_submissions_sample_id")
                                .from(SampleSubmissions::Table, SampleSubmissions::SampleId)
                                .to(SampleRecords::Table, SampleRecords::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sample_submissions_opportunity_id")
                                .from(SampleSubmissions::Table, SampleSubmissions::OpportunityId)
                                .to(SalesOpportunities::Table, SalesOpportunities::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PurchaseOrders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::PoNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ProjectId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::VendorId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string_len(16).not_null())
                        .col(ColumnDef::new(PurchaseOrders::Quantity).decimal().not_null())
                        .col(ColumnDef::new(PurchaseOrders::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_project_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::ProjectId)
                                .to(ProcurementProjects::Table, ProcurementProjects::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_vendor_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::VendorId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesOrders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::OpportunityId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::ClientId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::Status).string_len(16).not_null())
                        .col(ColumnDef::new(SalesOrders::Quantity).decimal().not_null())
                        .col(ColumnDef::new(SalesOrders::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(SalesOrders::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(SalesOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_orders_opportunity_id")
                                .from(SalesOrders::Table, SalesOrders::OpportunityId)
                                .to(SalesOpportunities::Table, SalesOpportunities::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_orders_client_id")
                                .from(SalesOrders::Table, SalesOrders::ClientId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sample_submissions_opportunity_status")
                        .table(SampleSubmissions::Table)
                        .col(SampleSubmissions::OpportunityId)
                        .col(SampleSubmissions::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(SalesOrders::Table)
                        .table(PurchaseOrders::Table)
                        .table(SampleSubmissions::Table)
                        .table(SalesOpportunities::Table)
                        .table(SampleRecords::Table)
                        .table(ProjectVendors::Table)
                        .table(ProcurementProjects::Table)
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20240301_000004_create_finance_logistics_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_finance_logistics_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::Amount).decimal().not_null())
                        .col(ColumnDef::new(Invoices::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Invoices::IsPaid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Invoices::IssuedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_sales_order_id")
                                .from(Invoices::Table, Invoices::SalesOrderId)
                                .to(SalesOrders::Table, SalesOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Bills::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bills::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bills::BillNumber).string().not_null().unique_key())
                        .col(ColumnDef::new(Bills::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(Bills::Amount).decimal().not_null())
                        .col(ColumnDef::new(Bills::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Bills::IsPaid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Bills::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bills_purchase_order_id")
                                .from(Bills::Table, Bills::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Transactions::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Transactions::InvoiceId).uuid().null())
                        .col(ColumnDef::new(Transactions::BillId).uuid().null())
                        .col(ColumnDef::new(Transactions::Direction).string_len(8).not_null())
                        .col(ColumnDef::new(Transactions::Amount).decimal().not_null())
                        .col(ColumnDef::new(Transactions::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Transactions::OccurredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_invoice_id")
                                .from(Transactions::Table, Transactions::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_bill_id")
                                .from(Transactions::Table, Transactions::BillId)
                                .to(Bills::Table, Bills::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shipments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shipments::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(Shipments::Carrier).string().null())
                        .col(ColumnDef::new(Shipments::TrackingNumber).string().null())
                        .col(
                            ColumnDef::new(Shipments::ShippedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipments_purchase_order_id")
                                .from(Shipments::Table, Shipments::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Grns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Grns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Grns::GrnNumber).string().not_null().unique_key())
                        .col(ColumnDef::new(Grns::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(Grns::ReceivedQuantity).decimal().not_null())
                        .col(
                            ColumnDef::new(Grns::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_grns_purchase_order_id")
                                .from(Grns::Table, Grns::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(Grns::Table)
                        .table(Shipments::Table)
                        .table(Transactions::Table)
                        .table(Bills::Table)
                        .table(Invoices::Table)
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20240301_000005_create_collaboration_tables {
    use super::idens::*;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_collaboration_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InteractionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InteractionLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InteractionLogs::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(InteractionLogs::UserId).uuid().not_null())
                        .col(ColumnDef::new(InteractionLogs::Channel).string().not_null())
                        .col(ColumnDef::new(InteractionLogs::Summary).text().not_null())
                        .col(
                            ColumnDef::new(InteractionLogs::OccurredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_interaction_logs_company_id")
                                .from(InteractionLogs::Table, InteractionLogs::CompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_interaction_logs_user_id")
                                .from(InteractionLogs::Table, InteractionLogs::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ActivityLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ActivityLogs::UserId).uuid().not_null())
                        .col(ColumnDef::new(ActivityLogs::CompanyId).uuid().null())
                        .col(ColumnDef::new(ActivityLogs::Action).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::EntityKind).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::EntityId).uuid().null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_activity_logs_user_id")
                                .from(ActivityLogs::Table, ActivityLogs::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_activity_logs_company_id")
                                .from(ActivityLogs::Table, ActivityLogs::CompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Todos::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Todos::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Todos::AssigneeId).uuid().not_null())
                        .col(ColumnDef::new(Todos::CompanyId).uuid().null())
                        .col(ColumnDef::new(Todos::Title).string().not_null())
                        .col(
                            ColumnDef::new(Todos::Done)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Todos::DueAt).timestamp_with_time_zone().null())
                        .col(
                            ColumnDef::new(Todos::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_todos_assignee_id")
                                .from(Todos::Table, Todos::AssigneeId)
                                .to(Users::Table, Users::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_todos_company_id")
                                .from(Todos::Table, Todos::CompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Todos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InteractionLogs::Table).to_owned())
                .await
        }
    }
}

/// Standalone migration runner used by the CLI `migrate` command.
pub async fn run_migration(db_url: &str) -> anyhow::Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
