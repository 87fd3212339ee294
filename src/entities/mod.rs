// Master data
pub mod city;
pub mod commodity;
pub mod country;
pub mod state;
pub mod user;

// Counterparties
pub mod company;
pub mod company_commodity;

// Procurement and sales pipeline
pub mod procurement_project;
pub mod project_vendor;
pub mod purchase_order;
pub mod sales_opportunity;
pub mod sales_order;
pub mod sample_record;
pub mod sample_submission;

// Finance and logistics
pub mod bill;
pub mod grn;
pub mod invoice;
pub mod shipment;
pub mod transaction;

// Collaboration
pub mod activity_log;
pub mod interaction_log;
pub mod todo;

pub use company::CompanyType;
pub use procurement_project::ProjectStatus;
pub use purchase_order::PurchaseOrderStatus;
pub use sales_opportunity::OpportunityStatus;
pub use sales_order::SalesOrderStatus;
pub use sample_record::SampleStatus;
pub use sample_submission::SubmissionStatus;
pub use transaction::TransactionDirection;
pub use user::UserRole;
