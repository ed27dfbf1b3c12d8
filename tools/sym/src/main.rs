use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;

use symck_ldd::Storage;
use symck_symbolic::read_symbolic_lts;
use symck_symbolic::reachability;
use symck_tools::Version;
use symck_tools::VersionFlag;
use symck_tools::verbosity::VerbosityFlag;
use symck_unsafety::print_allocator_metrics;
use symck_utilities::LargeFormatter;
use symck_utilities::SymckError;
use symck_utilities::Timing;
use symck_vpg::random_parity_game;
use symck_vpg::solve_zielonka;

#[derive(clap::Parser, Debug)]
#[command(
    about = "A command line tool for labelled transition systems",
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    version: VersionFlag,

    #[command(flatten)]
    verbosity: VerbosityFlag,

    #[command(subcommand)]
    commands: Option<Commands>,

    #[arg(long, global = true)]
    timings: bool,
}

/// Defines the subcommands for this tool.
#[derive(Debug, Subcommand)]
enum Commands {
    Info(InfoArgs),
    Reachability(ReachabilityArgs),
    Solve(SolveArgs),
}

#[derive(clap::Args, Debug)]
#[command(about = "Prints information related to the given LTS")]
struct InfoArgs {
    filename: String,
}

#[derive(clap::Args, Debug)]
#[command(about = "Computes the reachable state space of the given symbolic LTS")]
struct ReachabilityArgs {
    filename: String,

    /// Also compute the set of deadlock states reached during the search.
    #[arg(long)]
    deadlocks: bool,
}

#[derive(clap::Args, Debug)]
#[command(about = "Solves a randomly generated explicit parity game and prints its truth value")]
struct SolveArgs {
    /// Number of vertices in the generated game.
    #[arg(long, default_value_t = 100)]
    vertices: usize,

    /// Number of distinct priorities in the generated game.
    #[arg(long, default_value_t = 5)]
    priorities: usize,

    /// Maximum out-degree of a vertex in the generated game.
    #[arg(long, default_value_t = 3)]
    outdegree: usize,
}

fn main() -> Result<ExitCode, SymckError> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    if cli.version.into() {
        eprintln!("{}", Version);
        return Ok(ExitCode::SUCCESS);
    }

    let mut timing = Timing::new();

    if let Some(command) = cli.commands {
        match command {
            Commands::Info(args) => handle_info(args, &mut timing)?,
            Commands::Reachability(args) => handle_reachability(args, &mut timing)?,
            Commands::Solve(args) => handle_solve(args, &mut timing),
        }
    }

    if cli.timings {
        timing.print();
    }

    print_allocator_metrics();
    Ok(ExitCode::SUCCESS)
}

/// Reads the given symbolic LTS and prints information about it.
fn handle_info(args: InfoArgs, timing: &mut Timing) -> Result<(), SymckError> {
    let path = Path::new(&args.filename);
    let mut storage = Storage::new();

    let mut time_read = timing.start("read_symbolic_lts");
    let lts = read_symbolic_lts(File::open(path)?, &mut storage)?;
    time_read.finish();

    println!("Symbolic LTS information:");
    println!("  Number of states: {}", LargeFormatter(symck_ldd::len(&mut storage, lts.states())));
    println!("  Number of summand groups: {}", lts.summand_groups().len());

    Ok(())
}

/// Reads the given symbolic LTS and runs the breadth-first reachability search over it.
fn handle_reachability(args: ReachabilityArgs, timing: &mut Timing) -> Result<(), SymckError> {
    let path = Path::new(&args.filename);
    let mut storage = Storage::new();

    let mut time_read = timing.start("read_symbolic_lts");
    let lts = read_symbolic_lts(File::open(path)?, &mut storage)?;
    time_read.finish();

    let mut time_reachability = timing.start("reachability");
    let result = reachability(&mut storage, &lts, args.deadlocks)?;
    time_reachability.finish();

    println!("Reachable states: {}", LargeFormatter(result.state_count()));
    if let Some(deadlocks) = result.deadlocks() {
        println!("Deadlock states: {}", LargeFormatter(symck_ldd::len(&mut storage, deadlocks)));
    }

    Ok(())
}

/// Generates a random explicit parity game and solves it with Zielonka's algorithm, printing
/// the winner of the initial vertex as `true` (Even) or `false` (Odd) on its own line.
fn handle_solve(args: SolveArgs, timing: &mut Timing) {
    let mut rng = rand::rng();

    let mut time_generate = timing.start("random_parity_game");
    let game = random_parity_game(&mut rng, args.vertices, args.priorities, args.outdegree);
    time_generate.finish();

    let mut time_solve = timing.start("solve_zielonka");
    let winner = solve_zielonka(&game);
    time_solve.finish();

    println!("{}", winner.solution());
}