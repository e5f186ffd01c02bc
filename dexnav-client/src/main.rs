//! dexnav entry point.
//!
//! `dexnav list <generation>` prints one partition listing and
//! `dexnav show <item-id>` prints one record after its upgrade, both as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dexnav_client::config::ClientConfig;
use dexnav_client::error::{ClientError, ClientResult};
use dexnav_client::loader::LoadPhase;
use dexnav_client::rest::RestCatalogSource;
use dexnav_client::services::Services;
use dexnav_client::telemetry::init_tracing;
use dexnav_core::{
    select_shape, BuildMode, FetchKind, ItemId, PartitionId, SystemClock, TransportError,
};
use dexnav_storage::MemorySessionStore;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List(PartitionId),
    Show(ItemId),
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    config: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() -> ClientResult<()> {
    init_tracing()?;
    let args = parse_args(std::env::args().skip(1).collect())?;
    let config = ClientConfig::load(args.config.as_deref())?;
    let source = Arc::new(RestCatalogSource::new(&config)?);
    let services = Services::new(
        config,
        source,
        Arc::new(MemorySessionStore::new()),
        Arc::new(SystemClock),
    );

    match args.command {
        Command::List(partition) => list(&services, partition).await,
        Command::Show(id) => show(&services, id).await,
    }
}

const USAGE: &str = "dexnav [--config <path>] (list <generation> | show <item-id>)";

fn parse_args(args: Vec<String>) -> ClientResult<CliArgs> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args
                .next()
                .ok_or_else(|| ClientError::Usage("--config needs a path".to_string()))?;
            config = Some(PathBuf::from(path));
            continue;
        }
        positional.push(arg);
    }

    let command = match positional.as_slice() {
        [cmd, generation] if cmd == "list" => generation
            .parse::<PartitionId>()
            .map(Command::List)
            .map_err(|_| ClientError::Usage(format!("invalid generation: {}", generation))),
        [cmd, id] if cmd == "show" => Ok(Command::Show(ItemId::new(id.clone()))),
        _ => Err(ClientError::Usage(USAGE.to_string())),
    }?;
    Ok(CliArgs { config, command })
}

async fn list(services: &Services, partition: PartitionId) -> ClientResult<()> {
    let cache = services.partition_cache();
    let items = match cache.get(partition) {
        Some(entry) => entry.items,
        None => {
            let shape = select_shape(FetchKind::List, services.mode());
            let items = services.source().fetch_list(partition, shape).await?;
            cache.put(partition, items.clone());
            items
        }
    };
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

async fn show(services: &Services, id: ItemId) -> ClientResult<()> {
    let mut loader = services.loader();
    let mut rx = loader.subscribe();
    loader.load(id);

    let settled = rx
        .wait_for(|view| !view.loading)
        .await
        .map_err(|_| ClientError::LoaderClosed)?
        .clone();
    if let Some(err) = settled.error {
        return Err(err.into());
    }

    if services.mode() == BuildMode::Runtime && loader.upgrade_now() {
        let budget = services.config().request_timeout() + Duration::from_millis(250);
        let timed_out =
            tokio::time::timeout(budget, rx.wait_for(|view| view.phase == LoadPhase::Upgraded))
                .await
                .is_err();
        if timed_out {
            tracing::warn!("upgrade did not finish, printing partial record");
        }
    }

    let view = loader.view();
    let item = view
        .data
        .ok_or_else(|| TransportError::not_found("detail view has no data"))?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}
