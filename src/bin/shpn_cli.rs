//! Batch simulation runner.
//!
//! Loads a model document, drives the controller for a fixed number of
//! ticks (or until nothing fires), and prints each step event to stdout.

use clap::Parser;
use clap::ValueEnum;

use shpn_core::sim::ConflictPolicy;
use shpn_core::sim::Controller;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a model document (the JSON model contract).
    model: std::path::PathBuf,

    /// Fixed tick size.
    #[arg(long, default_value_t = 0.01)]
    dt: f64,

    /// Maximum number of ticks to run; omit to run until nothing fires.
    #[arg(long)]
    steps: Option<u64>,

    /// Conflict resolution policy applied when several discrete transitions
    /// are firable in the same tick.
    #[arg(long, value_enum, default_value_t = Policy::Random)]
    policy: Policy,

    /// RNG seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Suppress per-tick event output; print only the final state.
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Random,
    Earliest,
    Latest,
    Priority,
    Race,
    Age,
    PreemptivePriority,
}

impl From<Policy> for ConflictPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Random => ConflictPolicy::Random,
            Policy::Earliest => ConflictPolicy::Earliest,
            Policy::Latest => ConflictPolicy::Latest,
            Policy::Priority => ConflictPolicy::Priority,
            Policy::Race => ConflictPolicy::Race,
            Policy::Age => ConflictPolicy::Age,
            Policy::PreemptivePriority => ConflictPolicy::PreemptivePriority,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&cli.model)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", cli.model.display()))?;
    let net = shpn_core::model::loader::load(&text)?;
    let mut controller = Controller::new(net, cli.dt, cli.seed)?;
    controller.set_conflict_policy(cli.policy.into());

    if !cli.quiet {
        controller.add_step_listener(|event| {
            println!(
                "t={:.6} {} ({:?}) consumed={:?} produced={:?}",
                event.time,
                event.transition_id,
                event.kind,
                event.consumed.iter().collect::<Vec<_>>(),
                event.produced.iter().collect::<Vec<_>>(),
            );
        });
    }

    // `Controller::run` drives ticks until `stop()` or a step cap per its
    // contract, with no built-in notion of "nothing left to do" — this
    // binary has no signal handler wired to `stop()`, so an unbounded run
    // would never return. When `--steps` is omitted we instead step
    // directly and stop at the first tick that fires no discrete
    // transition, matching the flag's documented behavior.
    let executed = match cli.steps {
        Some(steps) => controller.run(cli.dt, Some(steps))?,
        None => {
            let mut executed = 0u64;
            while controller.step()? {
                executed += 1;
            }
            executed
        }
    };
    log::info!("ran {executed} ticks, final time {:.6}", controller.time());

    let state = controller.get_state();
    println!("final time: {:.6}", state.time);
    for (place, amount) in state.marking.iter() {
        println!("{place} = {amount}");
    }

    Ok(())
}
