use std::{collections::BTreeSet, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tradeflow::{
    commands::{
        maintenance::{ResetScopeCommand, RollbackSampleStatusCommand, SeedDataCommand},
        Command,
    },
    config::{self, AppConfig},
    db::{self, DbPool},
    events::{self, EventSender},
    lifecycle::{DependencyGraph, EntityKind},
    migrator, ops,
    services::{
        cascade_reset::{CascadeResetService, ResetMode, ResetPlan, ResetReport, ResetScope},
        seeding::SeedOutcome,
        stats::StatsService,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);
    let graph = Arc::new(DependencyGraph::declared().context("dependency graph is invalid")?);

    match cli.command {
        Commands::Graph => {
            handle_graph(&graph, cli.json)?;
            return Ok(());
        }
        Commands::Migrate => {
            migrator::run_migration(config.database_url()).await?;
            println!("Migrations applied");
            return Ok(());
        }
        _ => {}
    }

    let context = CliContext::initialize(config, graph).await?;
    let result = match cli.command {
        Commands::Plan(args) => handle_plan(&context, args, cli.json),
        Commands::Reset(args) => handle_reset(&context, args, cli.json).await,
        Commands::RollbackSamples => handle_rollback(&context, cli.json).await,
        Commands::Seed(args) => handle_seed(&context, args, cli.json).await,
        Commands::Stats => handle_stats(&context, cli.json).await,
        Commands::Counts => handle_counts(&context, cli.json).await,
        Commands::Graph | Commands::Migrate => Ok(()),
    };
    context.shutdown().await;
    result
}

#[derive(Parser)]
#[command(
    name = "tradeflow",
    about = "Tradeflow maintenance CLI for resets, seeding and lifecycle inspection",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dependency graph in deletion order
    Graph,
    /// Show what a reset would delete, without touching data
    Plan(ScopeArgs),
    /// Delete every row outside the preservation set
    Reset(ResetArgs),
    /// Revert client-facing sample outcomes to internal approval
    RollbackSamples,
    /// Insert master data, optionally with a demo pipeline
    Seed(SeedArgs),
    /// Dashboard aggregates
    Stats,
    /// Row count of every entity kind
    Counts,
    /// Apply pending database migrations
    Migrate,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Full,
    Operational,
    Transactions,
    Custom,
}

#[derive(Args)]
struct ScopeArgs {
    #[arg(long, value_enum)]
    scope: ScopeArg,
    /// Extra kinds to keep, comma separated (e.g. company,commodity)
    #[arg(long, value_delimiter = ',')]
    preserve: Vec<EntityKind>,
    /// Also keep the required parents of every preserved kind
    #[arg(long, action = ArgAction::SetTrue)]
    close: bool,
}

#[derive(Args)]
struct ResetArgs {
    #[command(flatten)]
    scope: ScopeArgs,
    /// Commit each kind separately instead of one transaction for the plan
    #[arg(long, action = ArgAction::SetTrue)]
    stepwise: bool,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, action = ArgAction::SetTrue)]
    demo: bool,
    /// Admin account email; defaults to the configured one
    #[arg(long)]
    admin_email: Option<String>,
}

struct CliContext {
    config: AppConfig,
    graph: Arc<DependencyGraph>,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    event_loop: tokio::task::JoinHandle<()>,
}

impl CliContext {
    async fn initialize(config: AppConfig, graph: Arc<DependencyGraph>) -> Result<Self> {
        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        if config.database.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to run migrations")?;
        }

        let (event_sender, event_rx) = EventSender::channel(32);
        let event_loop = tokio::spawn(events::process_events(event_rx));

        Ok(Self {
            config,
            graph,
            db: Arc::new(db_pool),
            event_sender: Arc::new(event_sender),
            event_loop,
        })
    }

    fn reset_service(&self) -> CascadeResetService {
        CascadeResetService::new(self.db.clone(), self.graph.clone())
            .preserve_commodities(self.config.reset.preserve_commodities)
    }

    fn resolve_scope(&self, args: &ScopeArgs) -> ResetScope {
        let base = match args.scope {
            ScopeArg::Full => ResetScope::Full,
            ScopeArg::Operational => ResetScope::OperationalData,
            ScopeArg::Transactions => ResetScope::TransactionsOnly,
            ScopeArg::Custom => ResetScope::Custom(BTreeSet::new()),
        };
        if args.preserve.is_empty() && !args.close {
            return base;
        }

        let mut keep = base.preserved(self.config.reset.preserve_commodities);
        keep.extend(args.preserve.iter().copied());
        if args.close {
            keep = self.graph.preservation_closure(&keep);
        }
        ResetScope::Custom(keep)
    }

    async fn shutdown(self) {
        let Self {
            db,
            event_sender,
            event_loop,
            ..
        } = self;
        ops::release(db, event_sender, event_loop).await;
    }
}

fn handle_graph(graph: &DependencyGraph, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Node {
        kind: EntityKind,
        height: usize,
        table: &'static str,
        parents: Vec<EntityKind>,
    }

    let nodes: Vec<Node> = graph
        .deletion_order()
        .iter()
        .map(|kind| Node {
            kind: *kind,
            height: graph.height(*kind),
            table: kind.table_name(),
            parents: graph.parents_of(*kind).iter().map(|l| l.parent).collect(),
        })
        .collect();

    if json {
        return print_json(&nodes);
    }
    for (idx, node) in nodes.iter().enumerate() {
        let parents: Vec<String> = node.parents.iter().map(ToString::to_string).collect();
        println!(
            "{:>2}. {:<20} height {} -> [{}]",
            idx + 1,
            node.kind,
            node.height,
            parents.join(", ")
        );
    }
    Ok(())
}

fn handle_plan(context: &CliContext, args: ScopeArgs, json: bool) -> Result<()> {
    let scope = context.resolve_scope(&args);
    let plan = context
        .reset_service()
        .plan(&scope)
        .context("scope cannot be reset")?;

    if json {
        print_json(&plan)
    } else {
        render_plan(&plan);
        Ok(())
    }
}

async fn handle_reset(context: &CliContext, args: ResetArgs, json: bool) -> Result<()> {
    let command = ResetScopeCommand {
        scope: context.resolve_scope(&args.scope),
        mode: if args.stepwise {
            ResetMode::Stepwise
        } else {
            context.config.reset.mode()
        },
        preserve_commodities: context.config.reset.preserve_commodities,
    };
    let report = command
        .execute(context.db.clone(), context.event_sender.clone())
        .await
        .context("reset failed")?;

    if json {
        print_json(&report)
    } else {
        render_report(&report);
        Ok(())
    }
}

async fn handle_rollback(context: &CliContext, json: bool) -> Result<()> {
    let report = RollbackSampleStatusCommand
        .execute(context.db.clone(), context.event_sender.clone())
        .await
        .context("sample status rollback failed")?;

    if json {
        print_json(&report)
    } else {
        println!(
            "Rolled back {} sample(s) and {} submission(s)",
            report.samples, report.submissions
        );
        Ok(())
    }
}

async fn handle_seed(context: &CliContext, args: SeedArgs, json: bool) -> Result<()> {
    let command = SeedDataCommand {
        admin_email: args
            .admin_email
            .unwrap_or_else(|| context.config.seed.admin_email.clone()),
        include_demo: args.demo,
    };
    let result = command
        .execute(context.db.clone(), context.event_sender.clone())
        .await
        .context("seeding failed")?;

    if json {
        return print_json(&result);
    }
    println!(
        "Master data: {} created, {} already present",
        result.master.total_created(),
        result.master.total_skipped()
    );
    match result.demo {
        Some(SeedOutcome::Seeded(pipeline)) => {
            println!("Demo pipeline created (project {})", pipeline.project_id)
        }
        Some(SeedOutcome::AlreadyPresent) => println!("Demo pipeline already present"),
        Some(SeedOutcome::PreconditionNotMet(reason)) => {
            println!("Demo pipeline skipped: {}", reason)
        }
        None => {}
    }
    Ok(())
}

async fn handle_stats(context: &CliContext, json: bool) -> Result<()> {
    let stats = StatsService::new(context.db.clone())
        .dashboard_stats()
        .await
        .context("failed to load dashboard stats")?;

    if json {
        return print_json(&stats);
    }
    println!("Companies:           {}", stats.companies);
    println!("  vendors:           {}", stats.vendors);
    println!("  clients:           {}", stats.clients);
    println!("Open opportunities:  {}", stats.open_opportunities);
    println!("Won opportunities:   {}", stats.won_opportunities);
    println!("Active projects:     {}", stats.active_projects);
    println!("Pending submissions: {}", stats.pending_submissions);
    println!("Open sales orders:   {}", stats.open_sales_orders);
    println!("Transactions:        {}", stats.transactions);
    Ok(())
}

async fn handle_counts(context: &CliContext, json: bool) -> Result<()> {
    let counts = context
        .reset_service()
        .row_counts()
        .await
        .context("failed to count rows")?;

    if json {
        return print_json(&counts);
    }
    for (kind, rows) in &counts {
        println!("{:<20} {}", kind, rows);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_plan(plan: &ResetPlan) {
    let preserved: Vec<String> = plan.preserved.iter().map(ToString::to_string).collect();
    println!("Preserved: {}", preserved.join(", "));
    for (idx, step) in plan.steps.iter().enumerate() {
        println!("{:>2}. delete {}", idx + 1, step.kind);
        for link in &step.detach {
            println!("      detach {}.{}", link.child, link.column);
        }
    }
}

fn render_report(report: &ResetReport) {
    for (kind, rows) in &report.deleted {
        println!("- {:<20} {} row(s) deleted", kind, rows);
    }
    for link in &report.detached {
        println!(
            "- {}.{} cleared on {} row(s) (parent {})",
            link.child, link.column, link.rows, link.parent
        );
    }
    println!("Total: {} row(s)", report.total_deleted());
}
