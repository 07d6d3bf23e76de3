//! Shopfloor gateway binary
//!
//! Wires the broker link, the shared state store, the cloud reporter and a
//! small line-oriented operator console together. The console is the only
//! interactive surface: everything else runs as long-lived tokio tasks.

use anyhow::Context;
use parking_lot::Mutex;
use shopfloor::{
    init_logging, run_direct_command, Axis, CloudReporter, CommandDispatcher, CommandIntent,
    GatewayConfig, MachineRecord, MqttLink, RegistryManager, StateStore,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!(version = shopfloor::VERSION, "shopfloor gateway starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "shopfloor.json".to_string());
    let config =
        GatewayConfig::load_from_file(Path::new(&config_path)).context("loading configuration")?;

    let store = Arc::new(StateStore::new());
    let registry = RegistryManager::open(config.registry_path(), store.slot_count())
        .context("opening machine registry")?;

    // Seed known addresses so the direct channel works before any machine
    // has announced itself on the bus.
    for entry in registry.entries() {
        store.apply_address(entry.id, &entry.address);
    }
    // Seeding is not live traffic; don't wake the consumer for it.
    store.consume_update();
    store.consume_roster_change();

    let registry = Arc::new(Mutex::new(registry));

    let (link, _link_task) = MqttLink::start(config.mqtt.clone(), store.clone());
    let dispatcher = CommandDispatcher::new(link.clone(), config.jog.feed_rate);

    let reporter = CloudReporter::new(store.clone(), config.cloud.clone());
    let report_trigger = reporter.trigger_handle();
    reporter.spawn();

    // Status consumer: wakes on every coalesced update, repaints the roster,
    // and forces a cloud report when the roster itself changed.
    let consumer_store = store.clone();
    tokio::spawn(async move {
        loop {
            let ticket = consumer_store.wait_for_update().await;
            if consumer_store.consume_roster_change() {
                report_trigger.notify_one();
            }
            render_roster(&consumer_store, ticket.last_updated_id);
        }
    });

    run_console(store, registry, dispatcher, config).await
}

/// Print the active-machine roster after an update
fn render_roster(store: &StateStore, updated_id: usize) {
    let roster = store.active_machines();
    tracing::debug!(machine = updated_id, "state table updated");
    for machine in roster {
        print_machine(&machine, machine.id == updated_id);
    }
}

fn print_machine(machine: &MachineRecord, changed: bool) {
    let marker = if changed { '*' } else { ' ' };
    println!(
        "{}[{}] {:<10} {}",
        marker, machine.id, machine.state_label, machine.position
    );
}

/// The line-oriented operator console
///
/// One command per line on stdin. `help` lists the verbs; unknown input is
/// answered with the help text rather than an error.
async fn run_console(
    store: Arc<StateStore>,
    registry: Arc<Mutex<RegistryManager>>,
    dispatcher: CommandDispatcher,
    config: GatewayConfig,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut selected: usize = 1;

    println!("shopfloor gateway ready; type 'help' for commands");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        match verb.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,
            "use" => match args.first().and_then(|a| a.parse::<usize>().ok()) {
                Some(id) if (1..=store.slot_count()).contains(&id) => {
                    selected = id;
                    println!("machine {selected} selected");
                }
                _ => println!("usage: use <1..{}>", store.slot_count()),
            },
            "list" => {
                for machine in store.active_machines() {
                    print_machine(&machine, machine.id == selected);
                }
            }
            "jog" => handle_jog(&dispatcher, &config, selected, &args).await,
            "home" => report_dispatch(dispatcher.dispatch(selected, CommandIntent::Home).await),
            "hold" => report_dispatch(dispatcher.dispatch(selected, CommandIntent::FeedHold).await),
            "estop" => {
                report_dispatch(dispatcher.dispatch(selected, CommandIntent::EmergencyStopAll).await)
            }
            "file" => match args.first() {
                Some(name) => report_dispatch(
                    dispatcher
                        .dispatch(selected, CommandIntent::SelectFile(name.to_string()))
                        .await,
                ),
                None => println!("usage: file <name>"),
            },
            "ask" => {
                if args.is_empty() {
                    println!("usage: ask <command...>");
                } else {
                    handle_ask(&store, &registry, &config, selected, &args.join(" ")).await;
                }
            }
            "reg" => handle_registry(&registry, &args),
            _ => {
                println!("unrecognized command: {verb}");
                print_help();
            }
        }
    }

    tracing::info!("console closed, shutting down");
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  use <id>          select the target machine");
    println!("  list              show the active-machine roster");
    println!("  jog <axis> [mm]   incremental move, signed distance");
    println!("  home              run the homing cycle");
    println!("  hold              feed hold (pause motion)");
    println!("  estop             emergency stop, whole fleet");
    println!("  file <name>       assign a job file");
    println!("  ask <command>     send over the direct channel, print the reply");
    println!("  reg list|add <id> <addr>|set <id> <addr>|rm <id>");
    println!("  quit              exit");
}

async fn handle_jog(
    dispatcher: &CommandDispatcher,
    config: &GatewayConfig,
    selected: usize,
    args: &[&str],
) {
    let Some(axis) = args.first().and_then(|a| a.parse::<Axis>().ok()) else {
        println!("usage: jog <x|y|z> [signed mm]");
        return;
    };
    let default_step = match axis {
        Axis::Z => config.jog.z_step_mm,
        _ => config.jog.xy_step_mm,
    };
    let distance_mm = match args.get(1) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(d) => d,
            Err(_) => {
                println!("not a distance: {raw}");
                return;
            }
        },
        None => default_step,
    };
    report_dispatch(
        dispatcher
            .dispatch(selected, CommandIntent::Jog { axis, distance_mm })
            .await,
    );
}

fn report_dispatch(result: shopfloor::Result<String>) {
    match result {
        Ok(command) => println!("sent: {command}"),
        Err(e) => println!("not sent: {e}"),
    }
}

/// Resolve the selected machine's control endpoint and run a direct command
///
/// A live address announced on the bus wins over the registry entry; the
/// registry is the fallback for machines that have not reported yet.
async fn handle_ask(
    store: &StateStore,
    registry: &Mutex<RegistryManager>,
    config: &GatewayConfig,
    selected: usize,
    command: &str,
) {
    let live = store
        .snapshot(selected)
        .and_then(|m| m.network_address);
    let addr = match live.or_else(|| {
        registry
            .lock()
            .address_of(selected)
            .map(|a| a.to_string())
    }) {
        Some(addr) => addr,
        None => {
            println!("no known address for machine {selected}");
            return;
        }
    };

    match run_direct_command(&addr, command, config.direct_channel(), |line| {
        println!("< {line}");
    })
    .await
    {
        Ok(reply) => println!("terminated by '{}'", reply.terminator),
        Err(e) => println!("direct command failed: {e}"),
    }
}

fn handle_registry(registry: &Mutex<RegistryManager>, args: &[&str]) {
    let mut registry = registry.lock();
    match args {
        ["list"] | [] => {
            for entry in registry.entries() {
                println!("  [{}] {}", entry.id, entry.address);
            }
        }
        ["add", id, addr] => match id.parse::<usize>() {
            Ok(id) => match registry.add(id, addr) {
                Ok(()) => println!("registered machine {id}"),
                Err(e) => println!("not registered: {e}"),
            },
            Err(_) => println!("not an id: {id}"),
        },
        ["set", id, addr] => match id.parse::<usize>() {
            Ok(id) => match registry.update_address(id, addr) {
                Ok(()) => println!("address updated"),
                Err(e) => println!("not updated: {e}"),
            },
            Err(_) => println!("not an id: {id}"),
        },
        ["rm", id] => match id.parse::<usize>() {
            Ok(id) => match registry.remove(id) {
                Ok(()) => println!("machine {id} removed"),
                Err(e) => println!("not removed: {e}"),
            },
            Err(_) => println!("not an id: {id}"),
        },
        _ => println!("usage: reg list | reg add <id> <addr> | reg set <id> <addr> | reg rm <id>"),
    }
}
