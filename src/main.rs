//! Breadboard Simulator - CLI Entry Point
//!
//! Commands:
//! - `breadboard-sim run <script>` - Run a control-word script
//! - `breadboard-sim gates` - Print the gate truth tables
//! - `breadboard-sim demo` - Walk through an add and a subtract
//! - `breadboard-sim free-run` - Let the clock run for a number of cycles

use clap::{Parser, Subcommand};
use breadboard::{BoardConfig, Breadboard};

#[derive(Parser)]
#[command(name = "breadboard-sim")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A bit-level simulator of a breadboard TTL computer")]
struct Cli {
    /// Board configuration (JSON). Defaults to the reference wiring.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log wiring and clock activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a control-word script
    Run {
        /// Path to the script file
        script: String,
        /// Print the final board state as JSON
        #[arg(short, long)]
        json: bool,
        /// Print the board after every clocked line
        #[arg(short, long)]
        trace: bool,
    },
    /// Print the gate truth tables
    Gates,
    /// Walk through 3 + 5 and 5 - 3 on the board
    Demo,
    /// Free-run the clock in virtual time
    FreeRun {
        /// Number of full cycles to run
        #[arg(short = 'n', long, default_value = "8")]
        cycles: u64,
        /// Clock interval in milliseconds (2-5000)
        #[arg(short, long, default_value = "1000")]
        interval: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run { script, json, trace }) => {
            run_script(&script, config, json, trace);
        }
        Some(Commands::Gates) => {
            print_gates();
        }
        Some(Commands::Demo) => {
            run_demo(config);
        }
        Some(Commands::FreeRun { cycles, interval }) => {
            free_run(config, cycles, interval);
        }
        None => {
            println!("Breadboard Simulator v0.1.0");
            println!("A bit-level breadboard computer simulator");
            println!();
            println!("Use --help for available commands");
            println!();
            run_demo(config);
        }
    }
}

fn load_config(path: Option<&str>) -> BoardConfig {
    let Some(path) = path else {
        return BoardConfig::default();
    };

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("❌ Failed to read config: {}", e);
            std::process::exit(1);
        }
    };

    match BoardConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid config: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_board(config: BoardConfig) -> Breadboard {
    match Breadboard::new(config) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("❌ Failed to wire board: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_script(path: &str, config: BoardConfig, json: bool, trace: bool) {
    use breadboard::{load_script, run};

    let script = match load_script(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to load script: {}", e);
            std::process::exit(1);
        }
    };

    if !json {
        println!("🔧 Running: {} ({} commands)", path, script.len());
    }

    let mut board = build_board(config);
    let report = match run(&mut board, &script, trace) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ {}", e);
            if !json {
                eprintln!();
                eprintln!("{}", board.snapshot());
            }
            std::process::exit(1);
        }
    };

    if json {
        let output = serde_json::json!({
            "report": report,
            "board": board.snapshot(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to encode JSON: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if trace {
        println!();
        println!("━━━ Trace ━━━");
        for entry in &report.trace {
            println!("line {}:", entry.line);
            for text in entry.snapshot.to_string().lines() {
                println!("  {}", text);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}  Half steps: {}  Checks passed: {}", report.cycles, report.half_steps, report.checks);
    println!("{}", board.snapshot());
}

fn print_gates() {
    use breadboard::Gate;
    use breadboard::logic::gates::full_adder_rows;

    println!("━━━ Gate Truth Tables ━━━");
    println!();
    print!(" a b |");
    for gate in Gate::ALL {
        print!(" {:>4}", gate.name());
    }
    println!();
    println!("-----+{}", "-".repeat(5 * Gate::ALL.len()));
    for row in 0..4 {
        let (a, b, _) = Gate::And.truth_table()[row];
        print!(" {} {} |", a, b);
        for gate in Gate::ALL {
            print!(" {:>4}", gate.truth_table()[row].2.to_u32());
        }
        println!();
    }

    println!();
    println!("━━━ Full Adder ━━━");
    println!();
    println!(" cin a b | sum cout");
    println!("---------+---------");
    for (cin, a, b, sum, cout) in full_adder_rows() {
        println!("  {}  {} {} |  {}   {}", cin, a, b, sum, cout);
    }
}

fn run_demo(config: BoardConfig) {
    use breadboard::ControlLine::*;

    println!("━━━ Breadboard Demo ━━━");
    println!();

    let mut board = build_board(config);
    if let Err(e) = board.memory().load(0, &[3, 5]) {
        eprintln!("❌ Failed to load memory: {}", e);
        std::process::exit(1);
    }

    let steps: [(&str, Option<u32>, &[breadboard::ControlLine]); 6] = [
        ("Address cell 0", Some(0), &[Mai]),
        ("Memory -> A", None, &[Mr, Ai]),
        ("Address cell 1", Some(1), &[Mai]),
        ("Memory -> B", None, &[Mr, Bi]),
        ("Sum -> bus", None, &[Eo]),
        ("Bus -> register", None, &[Eo, Ri]),
    ];

    for (label, bus, lines) in steps {
        if let Some(value) = bus {
            board.set_data_bus(value);
        }
        board.assert_lines(lines);
        if let Err(e) = board.cycle() {
            eprintln!("❌ {}: {}", label, e);
            std::process::exit(1);
        }
        let snap = board.snapshot();
        println!("{:<16} bus={:<3} A={:<3} B={:<3} out={:<3} reg={}", label, snap.data_bus, snap.a, snap.b, snap.out, snap.register);
    }

    println!();
    println!("  3 + 5 = {}", board.register().value());

    board.assert_lines(&[Sub]);
    if let Err(e) = board.cycle() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    println!("  3 - 5 = {} (wraps at {} bits)", board.alu().output().value(), board.alu().width());

    board.alu().a().set_value(5);
    board.alu().b().set_value(3);
    if let Err(e) = board.cycle() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    println!("  5 - 3 = {}", board.alu().output().value());
    println!();
    println!("✓ Board working!");
}

fn free_run(config: BoardConfig, cycles: u64, interval: u32) {
    use breadboard::ControlLine;

    let mut board = build_board(config);
    board.set_line(ControlLine::Ce, Some(breadboard::Bit::High));

    let clock = board.clock_mut();
    clock.set_interval(interval);
    clock.start();
    let elapsed = cycles * clock.half_period_ms() * 2;

    match clock.advance(elapsed) {
        Ok(steps) => {
            println!("⏱  {} ms at {} ms/cycle: {} half steps", elapsed, clock.interval_ms(), steps);
        }
        Err(e) => {
            eprintln!("❌ Clock stopped: {}", e);
            std::process::exit(1);
        }
    }
    clock.stop();

    println!("{}", board.snapshot());
}
