use bank::{
    BranchSpec, BranchUnavailable, ClusterConfig, ClusterCreationError, CustomerDriver, CustomerError, CustomerEvent,
    CustomerOptions, QueryDelayPacer, Report,
};
use serde::Deserialize;
use slog::Drain;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::{env, fs, io};
use tokio::time::Duration;

/// One entry of the input file.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Process {
    Branch { id: u64, balance: i64 },
    Customer { id: u64, events: Vec<CustomerEvent> },
}

#[derive(Debug, thiserror::Error)]
enum BootstrapError {
    #[error("Usage: bank <input.json> [output.json]")]
    Usage,
    #[error("Failed to read {0}: {1}")]
    ReadInput(String, io::Error),
    #[error("Failed to parse input: {0}")]
    ParseInput(serde_json::Error),
    #[error(transparent)]
    Cluster(#[from] ClusterCreationError),
    #[error("Customer {0} has no branch to talk to")]
    NoBranchForCustomer(u64),
    #[error("Customer {0} failed: {1}")]
    Customer(u64, CustomerError),
    #[error("Customer task panicked: {0}")]
    CustomerTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Snapshot(#[from] BranchUnavailable),
    #[error("Failed to serialize report: {0}")]
    SerializeReport(serde_json::Error),
    #[error("Failed to write {0}: {1}")]
    WriteOutput(String, io::Error),
}

#[tokio::main]
async fn main() {
    let logger = create_root_logger_for_stdout();

    if let Err(e) = run(logger.clone()).await {
        slog::crit!(logger, "{}", e);
        // Let the async drain flush before exiting.
        drop(logger);
        std::process::exit(1);
    }
}

async fn run(logger: slog::Logger) -> Result<(), BootstrapError> {
    let mut args = env::args().skip(1);
    let input_path = args.next().ok_or(BootstrapError::Usage)?;
    let output_path = args.next();

    let input = fs::read_to_string(&input_path).map_err(|e| BootstrapError::ReadInput(input_path.clone(), e))?;
    let processes: Vec<Process> = serde_json::from_str(&input).map_err(BootstrapError::ParseInput)?;

    let mut branches = Vec::new();
    let mut customers = Vec::new();
    for process in processes.into_iter() {
        match process {
            Process::Branch { id, balance } => branches.push(BranchSpec {
                branch_id: id,
                initial_balance: balance,
                bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            }),
            Process::Customer { id, events } => customers.push((id, events)),
        }
    }

    let cluster = bank::try_create_cluster(ClusterConfig {
        branches,
        info_logger: logger.clone(),
        options: Default::default(),
    })
    .await?;

    let address_map: HashMap<u64, SocketAddr> = cluster
        .branches()
        .iter()
        .map(|branch| (branch.branch_id(), branch.addr()))
        .collect();

    let customer_options = CustomerOptions {
        query_delay: Some(Duration::from_secs(3)),
    };

    let mut tasks = Vec::with_capacity(customers.len());
    for (customer_id, events) in customers.into_iter() {
        // Customer i talks to branch i.
        let branch_addr = *address_map
            .get(&customer_id)
            .ok_or(BootstrapError::NoBranchForCustomer(customer_id))?;
        let pacer = QueryDelayPacer::new(customer_options.query_delay());
        let logger = logger.clone();

        tasks.push(tokio::spawn(async move {
            let driver = CustomerDriver::connect(logger, customer_id, events, branch_addr, pacer)
                .await
                .map_err(|e| BootstrapError::Customer(customer_id, e))?;
            driver
                .execute_events()
                .await
                .map_err(|e| BootstrapError::Customer(customer_id, e))
        }));
    }

    let mut outputs = Vec::with_capacity(tasks.len());
    for task in tasks.into_iter() {
        outputs.push(task.await??);
    }

    let snapshots = cluster.snapshots().await?;
    let report = Report::new(snapshots, outputs);
    let json = report.to_json().map_err(BootstrapError::SerializeReport)?;

    match output_path {
        Some(path) => {
            fs::write(&path, json).map_err(|e| BootstrapError::WriteOutput(path.clone(), e))?;
            slog::info!(logger, "Wrote report to {}", path);
        }
        None => println!("{}", json),
    }

    cluster.shutdown().await;
    Ok(())
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
