use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use equirs::{dispatcher, PowError, PowResult, SolverOutcome, SolverVariant};

#[derive(Parser)]
#[command(name = "equirs", version, about = "Equihash proof-of-work: solve and validate headers")]
struct Cli {
    /// Hash digit-space width.
    #[arg(long, default_value_t = 96, global = true)]
    n: u32,
    /// Tree depth.
    #[arg(long, default_value_t = 5, global = true)]
    k: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SolverKind {
    Reference,
    Optimized,
}

impl From<SolverKind> for SolverVariant {
    fn from(s: SolverKind) -> Self {
        match s {
            SolverKind::Reference => SolverVariant::Reference,
            SolverKind::Optimized => SolverVariant::Optimized,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a solution at a fixed (header, nonce).
    Solve {
        #[arg(long)]
        header: String,
        #[arg(long, default_value_t = 0)]
        nonce: i64,
        #[arg(long, value_enum, default_value_t = SolverKind::Optimized)]
        solver: SolverKind,
        /// Treat `header` as hex instead of raw ASCII bytes.
        #[arg(long)]
        hex_header: bool,
        /// Print the result as a JSON object instead of bare hex.
        #[arg(long)]
        json: bool,
        /// Write the raw minimal solution bytes here instead of printing hex.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a minimal solution (given as hex) against a header and nonce.
    Validate {
        #[arg(long)]
        header: String,
        #[arg(long)]
        nonce: i64,
        #[arg(long)]
        solution: String,
        #[arg(long)]
        hex_header: bool,
    },
    /// Run both solvers' full, never-early-stopping search over a range of
    /// nonces and report throughput.
    Bench {
        #[arg(long)]
        header: String,
        /// First nonce to search; a random one is picked when omitted.
        #[arg(long)]
        start_nonce: Option<i64>,
        /// How many consecutive nonces, starting at `start_nonce`, to search.
        #[arg(long, default_value_t = 8)]
        nonces: u32,
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(long, value_enum, default_value_t = SolverKind::Optimized)]
        solver: SolverKind,
        #[arg(long)]
        hex_header: bool,
        #[arg(long)]
        json: bool,
    },
}

fn header_bytes(raw: &str, is_hex: bool) -> PowResult<Vec<u8>> {
    if is_hex {
        hex::decode(raw).map_err(|e| PowError::InvalidHex(e.to_string()))
    } else {
        Ok(raw.as_bytes().to_vec())
    }
}

/// Prints a `PowError` and exits with its mirrored wire-level code.
fn fail(e: PowError) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(e.return_code().as_i32());
}

fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\ninterrupted, stopping search...");
        handler_cancel.store(true, Ordering::SeqCst);
    })
    .expect("failed to install Ctrl-C handler");
    cancel
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("equirs=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { header, nonce, solver, hex_header, json, out } => {
            let header = header_bytes(&header, hex_header).unwrap_or_else(|e| fail(e));
            cmd_solve(cli.n, cli.k, &header, nonce, solver.into(), json, out);
        }
        Commands::Validate { header, nonce, solution, hex_header } => {
            let header = header_bytes(&header, hex_header).unwrap_or_else(|e| fail(e));
            cmd_validate(cli.n, cli.k, &header, nonce, &solution);
        }
        Commands::Bench { header, start_nonce, nonces, threads, solver, hex_header, json } => {
            let header = header_bytes(&header, hex_header).unwrap_or_else(|e| fail(e));
            let start_nonce = start_nonce.unwrap_or_else(|| (rand::random::<u32>() as i64) & 0x7FFF_FFFF);
            cmd_bench(cli.n, cli.k, &header, start_nonce, nonces, threads, solver.into(), json);
        }
    }
}

fn cmd_solve(n: u32, k: u32, header: &[u8], nonce: i64, variant: SolverVariant, json: bool, out: Option<PathBuf>) {
    let cancel = install_cancel_handler();
    let mut found: Option<Vec<u8>> = None;

    let outcome = dispatcher::solve(n, k, header, nonce, variant, &cancel, &mut |soln| {
        if let Some(bytes) = soln {
            found = Some(bytes.to_vec());
            return 1;
        }
        0
    });

    match outcome {
        Ok(SolverOutcome::Accepted) => {
            let soln = found.expect("accepted outcome always carries a solution");
            let code = dispatcher::validate(n, k, header, nonce, &soln);
            if code != equirs::ReturnCode::Ok {
                tracing::error!(?code, "solver emitted a solution that failed self-validation");
                std::process::exit(1);
            }
            if let Some(path) = out {
                std::fs::write(&path, &soln).unwrap_or_else(|e| fail(PowError::Io(e.to_string())));
            } else if json {
                println!(
                    "{}",
                    serde_json::json!({"n": n, "k": k, "nonce": nonce, "solution": hex::encode(&soln)})
                );
            } else {
                println!("{}", hex::encode(soln));
            }
        }
        Ok(SolverOutcome::Exhausted) => {
            println!("no solution found");
        }
        Ok(SolverOutcome::Cancelled) | Ok(SolverOutcome::Stopped) => {
            println!("search stopped before completion");
        }
        Err(e) => fail(e),
    }
}

fn cmd_validate(n: u32, k: u32, header: &[u8], nonce: i64, solution_hex: &str) {
    let soln = hex::decode(solution_hex)
        .map_err(|e| PowError::InvalidHex(e.to_string()))
        .unwrap_or_else(|e| fail(e));
    let code = dispatcher::validate(n, k, header, nonce, &soln);
    println!("{:?}", code);
    std::process::exit(code.as_i32());
}

/// Searches `nonces` consecutive nonces starting at `start_nonce`, spread
/// across `threads` OS threads, running each nonce's solve to full
/// completion (the callback always returns `0`) rather than stopping at the
/// first candidate. Reports elapsed time and the total solution count.
fn cmd_bench(
    n: u32,
    k: u32,
    header: &[u8],
    start_nonce: i64,
    nonces: u32,
    threads: usize,
    variant: SolverVariant,
    json: bool,
) {
    let threads = if threads == 0 { num_cpus::get().max(1) } else { threads };
    let cancel = install_cancel_handler();
    let next_nonce = Arc::new(AtomicI64::new(start_nonce));
    let end_nonce = start_nonce + nonces as i64;
    let solutions_found = Arc::new(AtomicUsize::new(0));

    tracing::info!(threads, nonces, ?variant, "starting bench run");
    let start = Instant::now();

    std::thread::scope(|scope| {
        for _ in 0..threads {
            let cancel = cancel.clone();
            let next_nonce = next_nonce.clone();
            let solutions_found = solutions_found.clone();
            scope.spawn(move || loop {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let nonce = next_nonce.fetch_add(1, Ordering::Relaxed);
                if nonce >= end_nonce {
                    return;
                }
                dispatcher::solve(n, k, header, nonce, variant, &cancel, &mut |soln| {
                    if soln.is_some() {
                        solutions_found.fetch_add(1, Ordering::Relaxed);
                    }
                    0
                })
                .ok();
            });
        }
    });

    let elapsed = start.elapsed();
    let found = solutions_found.load(Ordering::Relaxed);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "n": n, "k": k, "start_nonce": start_nonce, "nonces_searched": nonces,
                "solutions_found": found, "elapsed_secs": elapsed.as_secs_f64(),
            })
        );
    } else {
        println!(
            "searched {} nonce(s) from {} in {:.2}s, {} solution(s) found",
            nonces,
            start_nonce,
            elapsed.as_secs_f64(),
            found
        );
    }
}
