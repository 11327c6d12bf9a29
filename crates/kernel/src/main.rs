//! Maat registry command-line tool.
//!
//! Applies migrations and prints facets or listings for any entity as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use maat_kernel::config::Config;
use maat_kernel::db;
use maat_kernel::filter::facets::facets;
use maat_kernel::filter::{
    Entity, HouseChangeRequestCriteria, HouseCriteria, HousesCupPointsCriteria, PageRequest,
    StudentCriteria, UNPAGINATED, UserCriteria,
};
use maat_kernel::services::{
    HouseChangeRequestService, HouseService, HousesCupPointsService, PermissionsService,
    RoleService, StudentService, UserService,
};
use maat_kernel::store::{PgStore, Store};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the embedded schema migrations.
    Migrate,

    /// Print the distinct values of every filterable column.
    Filterables {
        /// houses, students, users, house-change-requests, houses-cup, roles or permissions.
        entity: Entity,
    },

    /// Print one page of an entity listing.
    List {
        entity: Entity,

        /// Zero-based page index.
        #[arg(long, default_value_t = 0)]
        page_num: i64,

        /// Rows per page; -1 returns every match.
        #[arg(long, default_value_t = UNPAGINATED, allow_hyphen_values = true)]
        page_size: i64,

        /// Client sort name, e.g. lastName.
        #[arg(long)]
        sort_on: Option<String>,

        /// Sort descending.
        #[arg(long)]
        desc: bool,

        /// Criteria as a camelCase JSON object.
        #[arg(long)]
        criteria: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;
    info!(
        max_connections = config.database_max_connections,
        "database pool ready"
    );

    match args.command {
        Command::Migrate => {
            db::run_migrations(&pool).await?;
            info!("migrations applied");
        }
        Command::Filterables { entity } => {
            let store = PgStore::new(pool);
            let catalog = entity.catalog();
            let result = facets(&store, catalog.table, catalog.excluded_columns)
                .await
                .with_context(|| format!("failed to extract {entity} facets"))?;
            print_json(&result)?;
        }
        Command::List {
            entity,
            page_num,
            page_size,
            sort_on,
            desc,
            criteria,
        } => {
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            let request = PageRequest {
                page_num,
                page_size,
                sort_on,
                asc: !desc,
            };
            let criteria = criteria.as_deref();
            list(&config, store, entity, criteria, &request)
                .await
                .with_context(|| format!("failed to list {entity}"))?;
        }
    }

    Ok(())
}

async fn list(
    config: &Config,
    store: Arc<dyn Store>,
    entity: Entity,
    criteria: Option<&str>,
    request: &PageRequest,
) -> Result<()> {
    match entity {
        Entity::House => {
            let criteria: HouseCriteria = parse_criteria(criteria)?;
            print_json(&HouseService::new(store).list(&criteria, request).await?)
        }
        Entity::Student => {
            let criteria: StudentCriteria = parse_criteria(criteria)?;
            let service = StudentService::new(store, config.validation_rules());
            print_json(&service.list(&criteria, request).await?)
        }
        Entity::User => {
            let criteria: UserCriteria = parse_criteria(criteria)?;
            let service = UserService::new(store, config.validation_rules());
            print_json(&service.list(&criteria, request).await?)
        }
        Entity::HouseChangeRequest => {
            let criteria: HouseChangeRequestCriteria = parse_criteria(criteria)?;
            let service = HouseChangeRequestService::new(store);
            print_json(&service.list(&criteria, request).await?)
        }
        Entity::HousesCupPoints => {
            let criteria: HousesCupPointsCriteria = parse_criteria(criteria)?;
            let calendar = config
                .academic_year_start
                .context("ACADEMIC_YEAR_START is required for houses cup points")?;
            let service = HousesCupPointsService::new(store, Arc::new(calendar));
            print_json(&service.list(&criteria, request).await?)
        }
        Entity::Role => print_json(&RoleService::new(store).list(request).await?),
        Entity::Permissions => print_json(&PermissionsService::new(store).list(request).await?),
    }
}

fn parse_criteria<C: DeserializeOwned + Default>(raw: Option<&str>) -> Result<C> {
    match raw {
        Some(json) => serde_json::from_str(json).context("criteria must be a JSON object"),
        None => Ok(C::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
