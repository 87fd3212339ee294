use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    city, commodity, company, company_commodity, country, interaction_log, procurement_project,
    project_vendor, sales_opportunity, sample_record, sample_submission, state, todo, user,
    CompanyType, OpportunityStatus, ProjectStatus, SampleStatus, SubmissionStatus, UserRole,
};
use crate::errors::{is_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::lifecycle::EntityKind;
use crate::services::activity;

type Geography = &'static [(&'static str, &'static str, &'static [(&'static str, &'static [&'static str])])];

const GEOGRAPHY: Geography = &[
    ("India", "IND", &[("Kerala", &["Kochi", "Thrissur"]), ("Karnataka", &["Mangaluru"])]),
    ("Vietnam", "VNM", &[("Binh Phuoc", &["Dong Xoai"])]),
    ("Cote d'Ivoire", "CIV", &[("Abidjan", &["Abidjan"])]),
    ("United Arab Emirates", "ARE", &[("Dubai", &["Jebel Ali"])]),
];

const COMMODITIES: &[(&str, &str)] = &[
    ("Raw Cashew Nuts", "080131"),
    ("Cashew Kernels W320", "080132"),
    ("Black Pepper", "090411"),
    ("Robusta Coffee", "090111"),
    ("Turmeric", "091030"),
    ("Sesame Seeds", "120740"),
];

const DEMO_VENDOR: &str = "Malabar Agro Exports";
const DEMO_CLIENT: &str = "Gulf Nut Traders LLC";

/// Created and skipped row counts per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: BTreeMap<EntityKind, u64>,
    pub skipped: BTreeMap<EntityKind, u64>,
}

impl SeedReport {
    fn created(&mut self, kind: EntityKind) {
        *self.created.entry(kind).or_default() += 1;
    }

    fn skipped(&mut self, kind: EntityKind) {
        *self.skipped.entry(kind).or_default() += 1;
    }

    pub fn total_created(&self) -> u64 {
        self.created.values().sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }
}

/// Ids of the demo pipeline rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPipeline {
    pub vendor_id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub opportunity_id: Uuid,
    pub sample_ids: Vec<Uuid>,
    pub submission_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SeedOutcome {
    Seeded(DemoPipeline),
    AlreadyPresent,
    /// Seeding was skipped because required master data is missing.
    PreconditionNotMet(String),
}

#[derive(Clone)]
pub struct SeedingService {
    db: Arc<DatabaseConnection>,
    admin_email: String,
    event_sender: Option<EventSender>,
}

impl SeedingService {
    pub fn new(db: Arc<DatabaseConnection>, admin_email: impl Into<String>) -> Self {
        Self {
            db,
            admin_email: admin_email.into(),
            event_sender: None,
        }
    }

    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Inserts geography, commodities and the admin account. Rows that
    /// already exist are skipped one by one.
    #[instrument(skip(self))]
    pub async fn seed_master_data(&self) -> Result<SeedReport, ServiceError> {
        let db = &*self.db;
        let mut report = SeedReport::default();
        let now = Utc::now();

        for (name, iso_code, states) in GEOGRAPHY {
            let candidate = country::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                iso_code: Set(iso_code.to_string()),
                created_at: Set(now),
            };
            self.insert_or_skip(EntityKind::Country, name, candidate, &mut report)
                .await?;

            let Some(country) = country::Entity::find()
                .filter(country::Column::IsoCode.eq(*iso_code))
                .one(db)
                .await?
            else {
                warn!(iso_code, "Country missing after insert; skipping its states");
                continue;
            };

            for (state_name, cities) in *states {
                let state_id = self
                    .find_or_create_state(country.id, state_name, &mut report)
                    .await?;
                for city_name in *cities {
                    self.find_or_create_city(state_id, city_name, &mut report)
                        .await?;
                }
            }
        }

        for (name, hs_code) in COMMODITIES {
            let candidate = commodity::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                hs_code: Set(Some(hs_code.to_string())),
                unit: Set("MT".to_string()),
                created_at: Set(now),
            };
            self.insert_or_skip(EntityKind::Commodity, name, candidate, &mut report)
                .await?;
        }

        let admin = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(self.admin_email.clone()),
            name: Set("Administrator".to_string()),
            role: Set(UserRole::Admin),
            created_at: Set(now),
        };
        self.insert_or_skip(EntityKind::User, &self.admin_email, admin, &mut report)
            .await?;

        info!(
            created = report.total_created(),
            skipped = report.total_skipped(),
            "Master data seeded"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DataSeeded {
                    created: report.total_created(),
                    skipped: report.total_skipped(),
                })
                .await;
        }
        Ok(report)
    }

    async fn insert_or_skip<A>(
        &self,
        kind: EntityKind,
        label: &str,
        model: A,
        report: &mut SeedReport,
    ) -> Result<(), ServiceError>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        match model.insert(&*self.db).await {
            Ok(_) => {
                report.created(kind);
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                info!(%kind, label, "Already present, skipping");
                report.skipped(kind);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_or_create_state(
        &self,
        country_id: Uuid,
        name: &str,
        report: &mut SeedReport,
    ) -> Result<Uuid, ServiceError> {
        let db = &*self.db;
        if let Some(existing) = state::Entity::find()
            .filter(state::Column::CountryId.eq(country_id))
            .filter(state::Column::Name.eq(name))
            .one(db)
            .await?
        {
            report.skipped(EntityKind::State);
            return Ok(existing.id);
        }

        let created = state::ActiveModel {
            id: Set(Uuid::new_v4()),
            country_id: Set(country_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        report.created(EntityKind::State);
        Ok(created.id)
    }

    async fn find_or_create_city(
        &self,
        state_id: Uuid,
        name: &str,
        report: &mut SeedReport,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;
        let exists = city::Entity::find()
            .filter(city::Column::StateId.eq(state_id))
            .filter(city::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            report.skipped(EntityKind::City);
            return Ok(());
        }

        city::ActiveModel {
            id: Set(Uuid::new_v4()),
            state_id: Set(state_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        report.created(EntityKind::City);
        Ok(())
    }

    /// Creates a vendor, a client and a pipeline linking them: project,
    /// samples, a won opportunity and a pending client submission.
    #[instrument(skip(self))]
    pub async fn seed_demo_pipeline(&self) -> Result<SeedOutcome, ServiceError> {
        let db = &*self.db;

        let owner = match activity::find_admin(db).await? {
            Some(admin) => Some(admin),
            None => user::Entity::find()
                .order_by_asc(user::Column::CreatedAt)
                .one(db)
                .await?,
        };
        let Some(owner) = owner else {
            warn!("No user exists; run the master data seed first");
            return Ok(SeedOutcome::PreconditionNotMet(
                "at least one user is required".to_string(),
            ));
        };
        let Some(commodity) = commodity::Entity::find()
            .order_by_asc(commodity::Column::Name)
            .one(db)
            .await?
        else {
            warn!("No commodity exists; run the master data seed first");
            return Ok(SeedOutcome::PreconditionNotMet(
                "at least one commodity is required".to_string(),
            ));
        };

        let existing_client = company::Entity::find()
            .filter(company::Column::Name.eq(DEMO_CLIENT))
            .one(db)
            .await?;
        if existing_client.is_some() {
            info!("Demo pipeline already present");
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let india = country::Entity::find()
            .filter(country::Column::IsoCode.eq("IND"))
            .one(db)
            .await?;
        let uae = country::Entity::find()
            .filter(country::Column::IsoCode.eq("ARE"))
            .one(db)
            .await?;

        let txn = db.begin().await?;
        let now = Utc::now();

        let vendor = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(DEMO_VENDOR.to_string()),
            company_type: Set(CompanyType::Vendor),
            email: Set(Some("trade@malabar-agro.example".to_string())),
            country_id: Set(india.map(|c| c.id)),
            state_id: Set(None),
            city_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let client = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(DEMO_CLIENT.to_string()),
            company_type: Set(CompanyType::Client),
            email: Set(Some("buying@gulfnut.example".to_string())),
            country_id: Set(uae.map(|c| c.id)),
            state_id: Set(None),
            city_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for company_id in [vendor.id, client.id] {
            company_commodity::ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(company_id),
                commodity_id: Set(commodity.id),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        let project = procurement_project::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("{} sourcing", commodity.name)),
            commodity_id: Set(commodity.id),
            created_by_id: Set(Some(owner.id)),
            status: Set(ProjectStatus::Active),
            target_quantity: Set(Some(dec!(100))),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        project_vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project.id),
            vendor_id: Set(vendor.id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut sample_ids = Vec::new();
        for (reference, status) in [
            ("SMP-0001", SampleStatus::SentToClient),
            ("SMP-0002", SampleStatus::Received),
        ] {
            let sample = sample_record::ActiveModel {
                id: Set(Uuid::new_v4()),
                project_id: Set(project.id),
                vendor_id: Set(vendor.id),
                reference: Set(reference.to_string()),
                status: Set(status),
                received_at: Set(Some(now - Duration::days(2))),
                notes: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            sample_ids.push(sample.id);
        }

        let opportunity = sales_opportunity::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(format!("{} for {}", commodity.name, DEMO_CLIENT)),
            client_id: Set(client.id),
            commodity_id: Set(commodity.id),
            procurement_project_id: Set(None),
            status: Set(OpportunityStatus::ClosedWon),
            quantity: Set(dec!(50)),
            target_price: Set(Some(dec!(1450.00))),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let submission = sample_submission::ActiveModel {
            id: Set(Uuid::new_v4()),
            sample_id: Set(sample_ids[0]),
            opportunity_id: Set(opportunity.id),
            status: Set(SubmissionStatus::Pending),
            submitted_at: Set(now),
            decided_at: Set(None),
            feedback: Set(None),
        }
        .insert(&txn)
        .await?;

        interaction_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(client.id),
            user_id: Set(owner.id),
            channel: Set("email".to_string()),
            summary: Set("Shared lab results for the first sample".to_string()),
            occurred_at: Set(now),
        }
        .insert(&txn)
        .await?;

        todo::ActiveModel {
            id: Set(Uuid::new_v4()),
            assignee_id: Set(owner.id),
            company_id: Set(Some(client.id)),
            title: Set("Follow up on sample feedback".to_string()),
            done: Set(false),
            due_at: Set(Some(now + Duration::days(3))),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            vendor_id = %vendor.id,
            client_id = %client.id,
            project_id = %project.id,
            "Demo pipeline seeded"
        );

        Ok(SeedOutcome::Seeded(DemoPipeline {
            vendor_id: vendor.id,
            client_id: client.id,
            project_id: project.id,
            opportunity_id: opportunity.id,
            sample_ids,
            submission_id: submission.id,
        }))
    }
}
