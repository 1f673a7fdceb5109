use bank::{
    BranchConfig, BranchHandle, BranchOptions, BranchSnapshot, BranchSpec, Cluster, ClusterConfig, CustomerDriver,
    CustomerEvent, CustomerOutput, Interface, NoDelay, OperationResult, PeerAddress, Report,
};
use slog::Drain;
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::time::Duration;

const TEST_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::test]
async fn deposit_propagates_to_every_branch() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41000, &[100, 100, 100]).await?;

    let output = run_customer(&cluster, 1, vec![deposit(1, 50)]).await?;

    assert_eq!(output.recv.len(), 1);
    assert_eq!(output.recv[0].interface, Interface::Deposit);
    assert_eq!(output.recv[0].result, OperationResult::Success);
    assert_eq!(output.recv[0].balance, None);
    assert_balances(&cluster, 150).await?;

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn concurrent_deposit_and_withdraw_converge() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41100, &[100, 100, 100]).await?;

    let (a, b) = tokio::join!(
        run_customer(&cluster, 1, vec![deposit(1, 50)]),
        run_customer(&cluster, 2, vec![withdraw(2, 30)]),
    );
    assert_eq!(a?.recv[0].result, OperationResult::Success);
    assert_eq!(b?.recv[0].result, OperationResult::Success);

    assert_balances(&cluster, 120).await?;

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn query_observes_a_valid_intermediate_balance() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41200, &[100, 100, 100]).await?;

    let (a, b, c) = tokio::join!(
        run_customer(&cluster, 1, vec![deposit(1, 50)]),
        run_customer(&cluster, 2, vec![withdraw(2, 30)]),
        run_customer(&cluster, 3, vec![query(3)]),
    );
    a?;
    b?;
    let c = c?;

    assert_eq!(c.recv[0].interface, Interface::Query);
    assert_eq!(c.recv[0].result, OperationResult::Success);
    let observed = c.recv[0].balance.expect("query replies carry a balance");
    assert!(
        [100, 150, 70, 120].contains(&observed),
        "query observed {} which was never a balance of branch 3",
        observed
    );

    // Once everything has settled, a query sees the converged balance.
    let settled = run_customer(&cluster, 3, vec![query(4)]).await?;
    assert_eq!(settled.recv[0].balance, Some(120));

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_peer_yields_partial_propagation() -> Result<(), Box<dyn Error>> {
    let options = BranchOptions {
        propagate_timeout: Some(Duration::from_millis(500)),
        propagate_max_attempts: Some(2),
        propagate_initial_backoff: Some(Duration::from_millis(20)),
        ..BranchOptions::default()
    };

    let mut branches = Vec::new();
    for i in 0..3u16 {
        let branch = bank::try_create_branch(BranchConfig {
            branch_id: i as u64 + 1,
            initial_balance: 100,
            bind_addr: local_addr(41300 + i),
            info_logger: create_root_logger_for_stdout(format!("branch-{}", i + 1)),
            options: options.clone(),
        })
        .await?;
        branches.push(branch);
    }

    // Nothing ever listens on D's address.
    let unreachable = PeerAddress {
        branch_id: 4,
        addr: local_addr(41399),
    };
    for branch in branches.iter() {
        let mut peers = peer_addresses(&branches, branch.branch_id());
        if branch.branch_id() == 1 {
            peers.push(unreachable);
        }
        branch.install_peers(peers).await?;
    }

    let driver = CustomerDriver::connect(
        create_root_logger_for_stdout("customer-1".into()),
        1,
        vec![deposit(1, 50)],
        branches[0].addr(),
        NoDelay,
    )
    .await?;
    let output = tokio::time::timeout(TEST_TIMEOUT, driver.execute_events()).await??;

    assert_eq!(output.recv[0].result, OperationResult::PartialPropagation);
    // Reachable peers still got the update and the local apply stands.
    for branch in branches.iter() {
        assert_eq!(branch.balance().await?, 150);
    }

    let origin = branches[0].snapshot().await?;
    assert_eq!(count_named(&origin, "deposit_propagate_response"), 2);

    for branch in branches.into_iter() {
        branch.shutdown().await;
    }
    Ok(())
}

#[tokio::test]
async fn many_concurrent_customers_commute() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41400, &[100, 100, 100]).await?;

    let (a, b, c) = tokio::join!(
        run_customer(
            &cluster,
            1,
            vec![deposit(10, 5), withdraw(11, 7), deposit(12, 40), query(13), withdraw(14, 1)],
        ),
        run_customer(
            &cluster,
            2,
            vec![withdraw(20, 20), deposit(21, 3), deposit(22, 3), withdraw(23, 100)],
        ),
        run_customer(&cluster, 3, vec![deposit(30, 1000), query(31), withdraw(32, 1)]),
    );
    a?;
    b?;
    c?;

    let expected = 100 + 5 - 7 + 40 - 1 - 20 + 3 + 3 - 100 + 1000 - 1;
    assert_balances(&cluster, expected).await?;

    let snapshots = cluster.snapshots().await?;
    for snapshot in snapshots.iter() {
        assert_clock_strictly_increasing(snapshot);
    }

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn logs_reconstruct_each_causal_chain() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41500, &[100, 100, 100]).await?;

    let (a, b) = tokio::join!(
        run_customer(&cluster, 1, vec![deposit(1, 50), query(2)]),
        run_customer(&cluster, 2, vec![withdraw(3, 30)]),
    );
    let outputs = vec![a?, b?];

    let snapshots = cluster.snapshots().await?;
    for snapshot in snapshots.iter() {
        assert_clock_strictly_increasing(snapshot);

        // Per branch, each originator's events are in the order they were stepped through.
        for (_, events) in snapshot.event_log.iter() {
            let clocks: Vec<u64> = events.iter().map(|e| e.clock).collect();
            assert!(clocks.windows(2).all(|w| w[0] < w[1]), "{:?}", clocks);
        }
    }

    // One-hop bound: a mutation on 3 branches causes exactly 2 propagate requests in total.
    for (originator_id, interface) in [(1, "deposit"), (3, "withdraw")].iter() {
        let propagate_requests: usize = snapshots
            .iter()
            .map(|s| count_for(s, *originator_id, &format!("{}_propagate_request", interface)))
            .sum();
        assert_eq!(propagate_requests, 2);
    }

    let origin = cluster.branch(1).expect("branch 1").snapshot().await?;
    let deposit_chain: Vec<&str> = origin
        .event_log
        .iter()
        .find(|(id, _)| *id == 1)
        .map(|(_, events)| events.iter().map(|e| e.name.as_str()).collect())
        .expect("originator 1 on branch 1");
    assert_eq!(
        deposit_chain,
        vec![
            "deposit_request",
            "deposit_execute",
            "deposit_propagate_response",
            "deposit_propagate_response",
            "deposit_response",
        ]
    );

    let report = Report::new(snapshots, outputs);
    let merged = report.events.iter().find(|o| o.id == 1).expect("originator 1 in report");
    assert_eq!(merged.data.first().map(|e| e.name.as_str()), Some("deposit_request"));
    assert_eq!(merged.data.last().map(|e| e.name.as_str()), Some("deposit_response"));
    assert!(merged.data.windows(2).all(|w| w[0].clock <= w[1].clock));

    let query_chain = report.events.iter().find(|o| o.id == 2).expect("originator 2 in report");
    assert_eq!(query_chain.data.len(), 1);
    assert_eq!(query_chain.data[0].name, "query_request");

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn negative_amount_is_rejected_without_state_change() -> Result<(), Box<dyn Error>> {
    let cluster = create_cluster(41600, &[100, 100]).await?;
    let branch = cluster.branch(1).expect("branch 1");
    let clock_before = branch.clock().await?;

    let output = run_customer(&cluster, 1, vec![deposit(1, -5)]).await?;
    assert_eq!(output.recv[0].result, OperationResult::InvalidAmount);
    assert_eq!(output.recv[0].clock, clock_before);

    assert_balances(&cluster, 100).await?;
    assert_eq!(branch.clock().await?, clock_before);
    assert!(branch.snapshot().await?.branch_log.is_empty());

    cluster.shutdown().await;
    Ok(())
}

// ------- Helpers --------

async fn create_cluster(port_base: u16, balances: &[i64]) -> Result<Cluster, Box<dyn Error>> {
    let branches = balances
        .iter()
        .enumerate()
        .map(|(i, balance)| BranchSpec {
            branch_id: i as u64 + 1,
            initial_balance: *balance,
            bind_addr: local_addr(port_base + i as u16),
        })
        .collect();

    let cluster = bank::try_create_cluster(ClusterConfig {
        branches,
        info_logger: create_root_logger_for_stdout(format!("cluster-{}", port_base)),
        options: BranchOptions::default(),
    })
    .await?;

    Ok(cluster)
}

// Customer i talks to branch i.
async fn run_customer(
    cluster: &Cluster,
    customer_id: u64,
    events: Vec<CustomerEvent>,
) -> Result<CustomerOutput, Box<dyn Error>> {
    let branch = cluster.branch(customer_id).ok_or("no branch for customer")?;
    let driver = CustomerDriver::connect(
        create_root_logger_for_stdout(format!("customer-{}", customer_id)),
        customer_id,
        events,
        branch.addr(),
        NoDelay,
    )
    .await?;

    let output = tokio::time::timeout(TEST_TIMEOUT, driver.execute_events()).await??;
    Ok(output)
}

async fn assert_balances(cluster: &Cluster, expected: i64) -> Result<(), Box<dyn Error>> {
    for branch in cluster.branches() {
        assert_eq!(
            branch.balance().await?,
            expected,
            "balance of branch {}",
            branch.branch_id()
        );
    }
    Ok(())
}

fn assert_clock_strictly_increasing(snapshot: &BranchSnapshot) {
    let clocks: Vec<u64> = snapshot.branch_log.iter().map(|r| r.clock).collect();
    assert!(
        clocks.windows(2).all(|w| w[0] < w[1]),
        "branch {} clocks not strictly increasing: {:?}",
        snapshot.branch_id,
        clocks
    );
    assert_eq!(clocks.last().copied().unwrap_or(0), snapshot.clock);
}

fn count_named(snapshot: &BranchSnapshot, name: &str) -> usize {
    snapshot.branch_log.iter().filter(|r| r.name == name).count()
}

fn count_for(snapshot: &BranchSnapshot, originator_id: u64, name: &str) -> usize {
    snapshot
        .branch_log
        .iter()
        .filter(|r| r.id == originator_id && r.name == name)
        .count()
}

fn peer_addresses(branches: &[BranchHandle], me: u64) -> Vec<PeerAddress> {
    branches
        .iter()
        .filter(|b| b.branch_id() != me)
        .map(|b| PeerAddress {
            branch_id: b.branch_id(),
            addr: b.addr(),
        })
        .collect()
}

fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

fn deposit(id: u64, money: i64) -> CustomerEvent {
    CustomerEvent {
        id,
        interface: Interface::Deposit,
        money,
    }
}

fn withdraw(id: u64, money: i64) -> CustomerEvent {
    CustomerEvent {
        id,
        interface: Interface::Withdraw,
        money,
    }
}

fn query(id: u64) -> CustomerEvent {
    CustomerEvent {
        id,
        interface: Interface::Query,
        money: 0,
    }
}

fn create_root_logger_for_stdout(name: String) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Name" => name))
}
