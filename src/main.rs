use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::Result;
use log::info;
use simplelog::LevelFilter;

use qcir_sym::detect_with;
use qcir_sym::graph::ColoredGraph;
use qcir_sym::partition::TargetCell;
use qcir_sym::qcir;
use qcir_sym::search::{RefinementSearch, SearchConfig};

#[derive(Parser)]
#[command(author, version, about = "Symmetry detection for QCIR circuits")]
struct Cli {
    /// Input file in QCIR-G14 format
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print search statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Also write the colored graph in DOT format
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Cell to individualize during the search
    #[arg(long, value_enum, default_value = "first")]
    target_cell: TargetCellArg,

    /// Raise the log level (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, ValueEnum)]
enum TargetCellArg {
    First,
    Smallest,
    Largest,
}

impl From<TargetCellArg> for TargetCell {
    fn from(arg: TargetCellArg) -> Self {
        match arg {
            TargetCellArg::First => TargetCell::First,
            TargetCellArg::Smallest => TargetCell::Smallest,
            TargetCellArg::Largest => TargetCell::Largest,
        }
    }
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        level_filter(cli.verbose),
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let circuit = qcir::parse_file(&cli.input)?;
    info!(
        "circuit: {} variables in {} blocks, {} gates",
        circuit.num_literals() / 2,
        circuit.num_colors(),
        circuit.num_gates()
    );
    let graph = ColoredGraph::from_circuit(circuit);

    if let Some(path) = &cli.dot {
        let dot = graph.to_dot()?;
        std::fs::write(path, dot)?;
        info!("DOT written to {}", path.display());
    }

    let config = SearchConfig {
        target_cell: cli.target_cell.into(),
    };
    let mut engine = RefinementSearch::new(config);
    let symmetries = detect_with(&graph, &mut engine);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in &symmetries.lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    if cli.stats {
        eprintln!("{}", symmetries.stats);
        eprintln!("lines = {}", symmetries.lines.len());
    }
    info!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());

    Ok(())
}
