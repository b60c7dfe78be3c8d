//! CLI entry point for `emlsift`.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use emlsift::config::Config;
use emlsift::error::ExtractError;
use emlsift::export::{files, manifest};
use emlsift::model::{Extraction, Role};

#[derive(Parser)]
#[command(
    name = "emlsift",
    version,
    about = "Extract bodies, attachments and inline resources from .eml messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write bodies, attachments and inline resources to a directory
    Extract {
        /// Message file (`-` for stdin)
        file: PathBuf,
        /// Output directory (defaults to `output.directory` from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite existing files instead of numbering new ones
        #[arg(long)]
        overwrite: bool,
    },
    /// List what would be extracted, without writing anything
    List {
        /// Message file (`-` for stdin)
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = emlsift::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Extract {
            file,
            output,
            overwrite,
        } => cmd_extract(&file, output.as_deref(), overwrite, &config),
        Commands::List { file, json } => cmd_list(&file, json, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = emlsift::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "emlsift.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Read the raw message from a file or stdin.
fn read_message(path: &Path) -> emlsift::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| ExtractError::io("<stdin>", e))?;
        return Ok(buf);
    }
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::FileNotFound(path.to_path_buf())
        } else {
            ExtractError::io(path, e)
        }
    })
}

fn load_extraction(path: &Path, config: &Config) -> anyhow::Result<Extraction> {
    let raw = read_message(path)?;
    let extraction = emlsift::extract_with(&raw, &config.limits.extract_options())?;
    Ok(extraction)
}

fn print_envelope(extraction: &Extraction) {
    println!("  {:<10} {}", "From:", extraction.envelope.from);
    println!("  {:<10} {}", "To:", extraction.envelope.to);
    println!("  {:<10} {}", "Subject:", extraction.envelope.subject);
}

/// Extract everything from one message into a directory.
fn cmd_extract(
    path: &Path,
    output: Option<&Path>,
    overwrite: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let extraction = load_extraction(path, config)?;

    let mut output_config = config.output.clone();
    output_config.overwrite |= overwrite;
    let output_dir = output.unwrap_or(config.output.directory.as_path());

    print_envelope(&extraction);
    println!();

    let report = files::write_extraction(&extraction, output_dir, &output_config)?;

    for item in &report.written {
        let kind = match item.role {
            Role::PrimaryBodyHtml => "HTML body",
            Role::PrimaryBodyText => "text body",
            Role::InlineResource => "inline",
            _ => "attachment",
        };
        let name = item
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  Saved {kind}: {name} ({})", item.content_type);
    }
    for failure in &report.failures {
        eprintln!("  Error: {failure}");
    }
    for warning in &extraction.warnings {
        tracing::info!(warning = %warning, "Recoverable MIME condition");
    }

    println!();
    println!(
        "  Extracted {} item(s) to {}",
        report.written.len(),
        output_dir.display()
    );

    Ok(())
}

/// List the results of one message.
fn cmd_list(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let extraction = load_extraction(path, config)?;
    let listing = manifest::manifest(&extraction);

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};

    print_envelope(&extraction);
    println!();
    println!(
        "  {} result(s), {} file(s)",
        listing.results.len(),
        extraction.files().count()
    );

    if !listing.results.is_empty() {
        println!();
        println!(
            "  {:<4} {:<11} {:<32} {:<30} {:>10}",
            "#", "Role", "Name", "Type", "Size"
        );
        println!("  {}", "-".repeat(91));
    }

    for entry in &listing.results {
        let name: String = entry.name.chars().take(31).collect();
        let ctype: String = entry
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .chars()
            .take(29)
            .collect();
        println!(
            "  {:<4} {:<11} {:<32} {:<30} {:>10}",
            entry.index + 1,
            entry.role.label(),
            name,
            ctype,
            format_size(entry.size as u64, BINARY)
        );
    }

    if !listing.warnings.is_empty() {
        println!();
        for warning in &listing.warnings {
            println!("  warning: {warning}");
        }
    }
    println!();

    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "emlsift", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
