use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// Every persisted business entity the lifecycle engine knows about.
///
/// Variants are declared parent-first: no kind links to a kind declared
/// after it. The derived `Ord` follows declaration order and is used as the
/// deterministic tie-break wherever kinds are sorted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Country,
    State,
    City,
    User,
    Commodity,
    Company,
    CompanyCommodity,
    ProcurementProject,
    ProjectVendor,
    SampleRecord,
    SalesOpportunity,
    SampleSubmission,
    PurchaseOrder,
    SalesOrder,
    Invoice,
    Bill,
    Transaction,
    Shipment,
    Grn,
    InteractionLog,
    ActivityLog,
    Todo,
}

/// A foreign key from a child kind to the kind it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParentLink {
    pub parent: EntityKind,
    /// Column on the child table holding the parent id.
    pub column: &'static str,
    /// Nullable links can be detached instead of forcing the child's deletion.
    pub nullable: bool,
}

macro_rules! link {
    ($parent:ident, $column:literal) => {
        ParentLink {
            parent: EntityKind::$parent,
            column: $column,
            nullable: false,
        }
    };
    ($parent:ident, $column:literal, nullable) => {
        ParentLink {
            parent: EntityKind::$parent,
            column: $column,
            nullable: true,
        }
    };
}

impl EntityKind {
    pub fn all() -> impl Iterator<Item = EntityKind> {
        Self::iter()
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::State => "states",
            Self::City => "cities",
            Self::User => "users",
            Self::Commodity => "commodities",
            Self::Company => "companies",
            Self::CompanyCommodity => "company_commodities",
            Self::ProcurementProject => "procurement_projects",
            Self::ProjectVendor => "project_vendors",
            Self::SampleRecord => "sample_records",
            Self::SalesOpportunity => "sales_opportunities",
            Self::SampleSubmission => "sample_submissions",
            Self::PurchaseOrder => "purchase_orders",
            Self::SalesOrder => "sales_orders",
            Self::Invoice => "invoices",
            Self::Bill => "bills",
            Self::Transaction => "transactions",
            Self::Shipment => "shipments",
            Self::Grn => "grns",
            Self::InteractionLog => "interaction_logs",
            Self::ActivityLog => "activity_logs",
            Self::Todo => "todos",
        }
    }

    /// Foreign keys declared by this kind's table.
    pub fn parents(self) -> &'static [ParentLink] {
        match self {
            Self::Country | Self::User | Self::Commodity => &[],
            Self::State => &[link!(Country, "country_id")],
            Self::City => &[link!(State, "state_id")],
            Self::Company => &[
                link!(Country, "country_id", nullable),
                link!(State, "state_id", nullable),
                link!(City, "city_id", nullable),
            ],
            Self::CompanyCommodity => &[
                link!(Company, "company_id"),
                link!(Commodity, "commodity_id"),
            ],
            Self::ProcurementProject => &[
                link!(Commodity, "commodity_id"),
                link!(User, "created_by_id", nullable),
            ],
            Self::ProjectVendor => &[
                link!(ProcurementProject, "project_id"),
                link!(Company, "vendor_id"),
            ],
            Self::SampleRecord => &[
                link!(ProcurementProject, "project_id"),
                link!(Company, "vendor_id"),
            ],
            Self::SalesOpportunity => &[
                link!(Company, "client_id"),
                link!(Commodity, "commodity_id"),
                link!(ProcurementProject, "procurement_project_id", nullable),
            ],
            Self::SampleSubmission => &[
                link!(SampleRecord, "sample_id"),
                link!(SalesOpportunity, "opportunity_id"),
            ],
            Self::PurchaseOrder => &[
                link!(ProcurementProject, "project_id"),
                link!(Company, "vendor_id"),
            ],
            Self::SalesOrder => &[
                link!(SalesOpportunity, "opportunity_id"),
                link!(Company, "client_id"),
            ],
            Self::Invoice => &[link!(SalesOrder, "sales_order_id")],
            Self::Bill => &[link!(PurchaseOrder, "purchase_order_id")],
            Self::Transaction => &[
                link!(Invoice, "invoice_id", nullable),
                link!(Bill, "bill_id", nullable),
            ],
            Self::Shipment => &[link!(PurchaseOrder, "purchase_order_id")],
            Self::Grn => &[link!(PurchaseOrder, "purchase_order_id")],
            Self::InteractionLog => &[link!(Company, "company_id"), link!(User, "user_id")],
            Self::ActivityLog => &[
                link!(User, "user_id"),
                link!(Company, "company_id", nullable),
            ],
            Self::Todo => &[
                link!(User, "assignee_id"),
                link!(Company, "company_id", nullable),
            ],
        }
    }

    /// Master data survives every reset unless explicitly targeted.
    pub fn is_master_data(self) -> bool {
        matches!(
            self,
            Self::Country | Self::State | Self::City | Self::User | Self::Commodity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parents_are_declared_before_children() {
        for kind in EntityKind::all() {
            for link in kind.parents() {
                assert!(
                    link.parent < kind,
                    "{} links to {} which is declared after it",
                    kind,
                    link.parent
                );
            }
        }
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = EntityKind::all().map(EntityKind::table_name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        assert_eq!(EntityKind::SalesOrder.to_string(), "sales_order");
        assert_eq!(
            EntityKind::from_str("company_commodity").unwrap(),
            EntityKind::CompanyCommodity
        );
        assert!(EntityKind::from_str("warehouse").is_err());
    }

    #[test]
    fn transaction_links_are_nullable() {
        assert!(EntityKind::Transaction.parents().iter().all(|l| l.nullable));
    }
}
