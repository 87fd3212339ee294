use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::try_join_all;
use metrics::{counter, histogram};
use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::{ChildLink, DependencyGraph, EntityKind};

/// Which entity kinds survive a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    /// Everything except users and geography (and commodities, if configured).
    Full,
    /// Transactional pipeline data; master data and counterparties survive.
    OperationalData,
    /// Only financial transaction rows.
    TransactionsOnly,
    Custom(BTreeSet<EntityKind>),
}

impl ResetScope {
    pub fn preserved(&self, preserve_commodities: bool) -> BTreeSet<EntityKind> {
        use EntityKind::*;

        match self {
            Self::Full => {
                let mut keep = BTreeSet::from([User, Country, State, City]);
                if preserve_commodities {
                    keep.insert(Commodity);
                }
                keep
            }
            Self::OperationalData => BTreeSet::from([
                User,
                Country,
                State,
                City,
                Commodity,
                Company,
                CompanyCommodity,
            ]),
            Self::TransactionsOnly => EntityKind::all().filter(|k| *k != Transaction).collect(),
            Self::Custom(keep) => keep.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::OperationalData => "operational",
            Self::TransactionsOnly => "transactions",
            Self::Custom(_) => "custom",
        }
    }
}

/// How reset steps are grouped into database transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ResetMode {
    /// One transaction for the whole plan; any failure rolls everything back.
    #[default]
    Atomic,
    /// One transaction per kind; earlier steps stay applied on failure.
    Stepwise,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetStep {
    pub kind: EntityKind,
    /// Nullable links from preserved kinds cleared before the delete.
    pub detach: Vec<ChildLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetPlan {
    pub preserved: BTreeSet<EntityKind>,
    pub steps: Vec<ResetStep>,
}

impl ResetPlan {
    pub fn deleted_kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.steps.iter().map(|s| s.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetachedLink {
    pub child: EntityKind,
    pub column: &'static str,
    pub parent: EntityKind,
    pub rows: u64,
}

/// Outcome of a reset: rows deleted per kind and links detached on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub deleted: BTreeMap<EntityKind, u64>,
    pub detached: Vec<DetachedLink>,
}

impl ResetReport {
    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().sum()
    }

    fn record(&mut self, kind: EntityKind, outcome: StepOutcome) {
        self.deleted.insert(kind, outcome.deleted);
        self.detached.extend(outcome.detached);
    }
}

struct StepOutcome {
    deleted: u64,
    detached: Vec<DetachedLink>,
}

/// Deletes entity kinds in dependency order while leaving a preservation set
/// intact.
#[derive(Clone)]
pub struct CascadeResetService {
    db: Arc<DatabaseConnection>,
    graph: Arc<DependencyGraph>,
    event_sender: Option<EventSender>,
    mode: ResetMode,
    preserve_commodities: bool,
}

impl CascadeResetService {
    pub fn new(db: Arc<DatabaseConnection>, graph: Arc<DependencyGraph>) -> Self {
        Self {
            db,
            graph,
            event_sender: None,
            mode: ResetMode::default(),
            preserve_commodities: false,
        }
    }

    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn with_mode(mut self, mode: ResetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn preserve_commodities(mut self, preserve: bool) -> Self {
        self.preserve_commodities = preserve;
        self
    }

    /// Builds the deletion plan for `scope` without touching data.
    pub fn plan(&self, scope: &ResetScope) -> Result<ResetPlan, ServiceError> {
        let preserved = scope.preserved(self.preserve_commodities);
        self.graph.validate_preservation(&preserved)?;

        let steps = self
            .graph
            .deletion_order()
            .iter()
            .filter(|kind| !preserved.contains(kind))
            .map(|kind| ResetStep {
                kind: *kind,
                detach: self.graph.detachments(*kind, &preserved),
            })
            .collect();

        Ok(ResetPlan { preserved, steps })
    }

    /// Deletes every row of every kind outside the scope's preservation set.
    #[instrument(skip(self, scope), fields(scope = scope.label(), mode = ?self.mode))]
    pub async fn reset_scope(&self, scope: &ResetScope) -> Result<ResetReport, ServiceError> {
        let plan = self.plan(scope)?;
        let start = Instant::now();

        info!(
            steps = plan.steps.len(),
            preserved = ?plan.preserved,
            "Starting cascade reset"
        );

        let report = match self.mode {
            ResetMode::Atomic => self.run_atomic(&plan).await?,
            ResetMode::Stepwise => self.run_stepwise(&plan).await?,
        };

        histogram!("tradeflow_reset.duration", start.elapsed());
        for (kind, rows) in &report.deleted {
            counter!("tradeflow_reset.rows_deleted", *rows, "kind" => kind.to_string());
        }
        info!(
            rows = report.total_deleted(),
            elapsed = ?start.elapsed(),
            "Cascade reset completed"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ResetCompleted {
                    preserved: plan.preserved.iter().copied().collect(),
                    deleted: report.deleted.clone(),
                    finished_at: Utc::now(),
                })
                .await;
        }

        Ok(report)
    }

    async fn run_atomic(&self, plan: &ResetPlan) -> Result<ResetReport, ServiceError> {
        let txn = self.db.begin().await?;
        let mut report = ResetReport::default();

        for step in &plan.steps {
            match apply_step(&txn, step).await {
                Ok(outcome) => report.record(step.kind, outcome),
                Err(source) => {
                    error!(kind = %step.kind, "Reset step failed, rolling back: {}", source);
                    if let Err(e) = txn.rollback().await {
                        error!("Rollback after failed reset step also failed: {}", e);
                    }
                    counter!("tradeflow_reset.failures", 1);
                    return Err(ServiceError::ResetStepFailed {
                        kind: step.kind,
                        source,
                        completed: Box::new(report),
                    });
                }
            }
        }

        txn.commit().await?;
        Ok(report)
    }

    async fn run_stepwise(&self, plan: &ResetPlan) -> Result<ResetReport, ServiceError> {
        let mut report = ResetReport::default();

        for step in &plan.steps {
            let txn = self.db.begin().await?;
            let result = match apply_step(&txn, step).await {
                Ok(outcome) => txn.commit().await.map(|_| outcome),
                Err(e) => {
                    if let Err(rb) = txn.rollback().await {
                        error!("Rollback of reset step {} failed: {}", step.kind, rb);
                    }
                    Err(e)
                }
            };

            match result {
                Ok(outcome) => report.record(step.kind, outcome),
                Err(source) => {
                    error!(
                        kind = %step.kind,
                        completed = report.deleted.len(),
                        "Reset step failed; earlier steps stay applied: {}",
                        source
                    );
                    counter!("tradeflow_reset.failures", 1);
                    return Err(ServiceError::ResetStepFailed {
                        kind: step.kind,
                        source,
                        completed: Box::new(report),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Current row count of every kind. Read-only, so the counts run
    /// concurrently.
    pub async fn row_counts(&self) -> Result<BTreeMap<EntityKind, u64>, ServiceError> {
        let db = &*self.db;
        let counts = try_join_all(EntityKind::all().map(|kind| async move {
            count_rows(db, kind).await.map(|rows| (kind, rows))
        }))
        .await?;
        Ok(counts.into_iter().collect())
    }
}

/// Detaches preserved children, then deletes all rows of the step's kind.
async fn apply_step<C: ConnectionTrait>(conn: &C, step: &ResetStep) -> Result<StepOutcome, DbErr> {
    let backend = conn.get_database_backend();
    let mut detached = Vec::with_capacity(step.detach.len());

    for link in &step.detach {
        let update = Query::update()
            .table(Alias::new(link.child.table_name()))
            .value(Alias::new(link.column), Option::<Uuid>::None)
            .and_where(Expr::col(Alias::new(link.column)).is_not_null())
            .to_owned();
        let rows = conn.execute(backend.build(&update)).await?.rows_affected();
        if rows > 0 {
            warn!(
                child = %link.child,
                column = link.column,
                rows,
                "Detached preserved rows from {}", step.kind
            );
        }
        detached.push(DetachedLink {
            child: link.child,
            column: link.column,
            parent: step.kind,
            rows,
        });
    }

    let delete = Query::delete()
        .from_table(Alias::new(step.kind.table_name()))
        .to_owned();
    let deleted = conn.execute(backend.build(&delete)).await?.rows_affected();
    debug!(kind = %step.kind, rows = deleted, "Deleted rows");

    Ok(StepOutcome { deleted, detached })
}

async fn count_rows<C: ConnectionTrait>(conn: &C, kind: EntityKind) -> Result<u64, DbErr> {
    let select = Query::select()
        .expr_as(Expr::cust("COUNT(*)"), Alias::new("count"))
        .from(Alias::new(kind.table_name()))
        .to_owned();

    let count = match conn
        .query_one(conn.get_database_backend().build(&select))
        .await?
    {
        Some(row) => row.try_get::<i64>("", "count")?,
        None => 0,
    };
    Ok(u64::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_graph() -> DependencyGraph {
        DependencyGraph::declared().unwrap()
    }

    fn plan_for(scope: ResetScope, preserve_commodities: bool) -> Result<ResetPlan, ServiceError> {
        let graph = service_graph();
        let preserved = scope.preserved(preserve_commodities);
        graph.validate_preservation(&preserved)?;
        Ok(ResetPlan {
            steps: graph
                .deletion_order()
                .iter()
                .filter(|k| !preserved.contains(k))
                .map(|k| ResetStep {
                    kind: *k,
                    detach: graph.detachments(*k, &preserved),
                })
                .collect(),
            preserved,
        })
    }

    #[test]
    fn builtin_scopes_are_valid_preservation_sets() {
        let graph = service_graph();
        for scope in [
            ResetScope::Full,
            ResetScope::OperationalData,
            ResetScope::TransactionsOnly,
        ] {
            for flag in [false, true] {
                graph
                    .validate_preservation(&scope.preserved(flag))
                    .unwrap_or_else(|e| panic!("{} scope invalid: {}", scope.label(), e));
            }
        }
    }

    #[test]
    fn transactions_only_plan_has_single_step() {
        let plan = plan_for(ResetScope::TransactionsOnly, false).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].kind, EntityKind::Transaction);
        assert!(plan.steps[0].detach.is_empty());
    }

    #[test]
    fn full_scope_keeps_commodities_only_when_configured() {
        assert!(!ResetScope::Full.preserved(false).contains(&EntityKind::Commodity));
        assert!(ResetScope::Full.preserved(true).contains(&EntityKind::Commodity));
    }

    #[test]
    fn full_plan_needs_no_detachments() {
        // Users survive; projects referencing them are deleted, not detached
        let plan = plan_for(ResetScope::Full, false).unwrap();
        assert!(plan.steps.iter().all(|s| s.detach.is_empty()));
        assert!(plan.deleted_kinds().all(|k| !k.is_master_data() || k == EntityKind::Commodity));
    }

    #[test]
    fn keeping_companies_without_geography_detaches_locations() {
        let keep = BTreeSet::from([EntityKind::Company, EntityKind::User]);
        let plan = plan_for(ResetScope::Custom(keep), false).unwrap();
        let city = plan
            .steps
            .iter()
            .find(|s| s.kind == EntityKind::City)
            .unwrap();
        assert_eq!(city.detach.len(), 1);
        assert_eq!(city.detach[0].child, EntityKind::Company);
        assert_eq!(city.detach[0].column, "city_id");
    }
}
