use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bfamily::definition;
use bfamily::dialects;
use bfamily::{Dialect, EdgePolicy, Error, Machine, Result, convert};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bfamily", about = "Brainfuck-family interpreter and converter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program.
    Run(RunArgs),

    /// Rewrite a program from one dialect into another.
    Convert(ConvertArgs),

    /// List the built-in dialects.
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Built-in dialect to use.
    #[arg(long, default_value = "brainfuck", conflicts_with = "definition")]
    dialect: String,

    /// Load the dialect from a TOML definition file instead.
    #[arg(long)]
    definition: Option<PathBuf>,

    /// Wrap cell values instead of failing on overflow.
    #[arg(long)]
    wrap_cell: bool,

    /// What happens when the pointer leaves the tape.
    #[arg(long, value_enum)]
    edge: Option<Edge>,

    /// Number of tape cells.
    #[arg(long)]
    tape_size: Option<usize>,

    /// Abort after this many executed instructions.
    #[arg(long)]
    step_limit: Option<usize>,

    /// Source file, or `-` for stdin. Program input comes from stdin when
    /// the source is a file.
    file: PathBuf,
}

#[derive(Args)]
struct ConvertArgs {
    /// Built-in dialect the program is written in.
    #[arg(long, required_unless_present = "from_definition", conflicts_with = "from_definition")]
    from: Option<String>,

    /// Read the source dialect from a TOML definition file.
    #[arg(long)]
    from_definition: Option<PathBuf>,

    /// Built-in dialect to write.
    #[arg(long, required_unless_present = "to_definition", conflicts_with = "to_definition")]
    to: Option<String>,

    /// Read the target dialect from a TOML definition file.
    #[arg(long)]
    to_definition: Option<PathBuf>,

    /// Source file, or `-` for stdin.
    file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Edge {
    Error,
    Wrap,
    Grow,
}

impl From<Edge> for EdgePolicy {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Error => EdgePolicy::Error,
            Edge::Wrap => EdgePolicy::Wrap,
            Edge::Grow => EdgePolicy::Grow,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(&args),
        Command::Convert(args) => convert_file(&args),
        Command::List => {
            for name in dialects::names() {
                println!("{name}");
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_source(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// A definition file when given, otherwise the named built-in dialect.
fn load_dialect(name: Option<&str>, definition: Option<&Path>) -> Result<Dialect> {
    match (definition, name) {
        (Some(path), _) => definition::load(path),
        (None, Some(name)) => dialects::by_name(name),
        (None, None) => Err(Error::Config("no dialect given".to_string())),
    }
}

/// The selected dialect with command-line overrides applied.
fn select_dialect(args: &RunArgs) -> Result<Dialect> {
    let dialect = load_dialect(Some(&args.dialect), args.definition.as_deref())?;
    let mut config = dialect.config().clone();
    config.wrap_cell |= args.wrap_cell;
    if let Some(edge) = args.edge {
        config.edge = edge.into();
    }
    if let Some(size) = args.tape_size {
        config.tape_size = size;
    }
    if args.step_limit.is_some() {
        config.step_limit = args.step_limit;
    }
    if &config == dialect.config() {
        return Ok(dialect);
    }
    dialect.with_config(config)
}

fn run(args: &RunArgs) -> Result<()> {
    let dialect = select_dialect(args)?;
    let source = read_source(&args.file)?;
    let mut machine = Machine::new(Arc::new(dialect));
    let mut stdout = io::stdout().lock();
    let steps = if is_stdin(&args.file) {
        machine.run_source(&source, &mut io::empty(), &mut stdout)?
    } else {
        machine.run_source(&source, &mut io::stdin().lock(), &mut stdout)?
    };
    debug!(steps, "done");
    Ok(())
}

fn convert_file(args: &ConvertArgs) -> Result<()> {
    let from = load_dialect(args.from.as_deref(), args.from_definition.as_deref())?;
    let to = load_dialect(args.to.as_deref(), args.to_definition.as_deref())?;
    let source = read_source(&args.file)?;
    println!("{}", convert(&from, &to, &source)?);
    Ok(())
}
