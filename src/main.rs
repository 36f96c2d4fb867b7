//! Command-line interface for xfa2data

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xfa2data::{FormatKind, Packet, Xfa, XfaOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xfa2data")]
#[command(author, version, about = "Extract XFA form data from a PDF and convert it", long_about = None)]
struct Cli {
    /// Path to the PDF form
    #[arg(value_name = "PDF")]
    file: PathBuf,

    /// Output format: json, yaml, xml, csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, conflicts_with = "save")]
    output: Option<PathBuf>,

    /// Write the output next to the PDF as <PDF>.<format>
    #[arg(short, long)]
    save: bool,

    /// XFA packet to convert: full, datasets, template, or any packet name
    #[arg(short, long, default_value = "full")]
    packet: String,

    /// Password for encrypted PDFs
    #[arg(long)]
    password: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Reject unknown formats before touching the PDF
    let format: FormatKind = cli.format.parse()?;

    let mut options = XfaOptions::new().with_packet(Packet::from_name(&cli.packet));
    if let Some(password) = cli.password {
        options = options.with_password(password);
    }

    let xfa = Xfa::open_with(&cli.file, options)?;

    if cli.save {
        let path = xfa.save(format, None)?;
        println!("{}", path.display());
    } else if let Some(output) = cli.output {
        xfa.save(format, Some(&output))?;
    } else {
        let text = xfa.convert(format)?;
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
