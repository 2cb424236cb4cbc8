use clap::{Parser, Subcommand};
use msgchain::chain::Chain;
use msgchain::config::ChainConfig;
use msgchain::logging::init_logging;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "msgchain",
    version,
    about = "Tamper-evident, hash-linked message log"
)]
struct Cli {
    /// Chain file (overrides --config; default: ./blockchain.json)
    #[arg(long)]
    file: Option<PathBuf>,

    /// TOML config file with a `storage_path` key
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a message to the chain
    Add { message: String },
    /// Print every block
    Show,
    /// Check hashes and links
    Verify,
    /// Interactive menu (default)
    Menu,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = resolve_config(&cli).and_then(|config| {
        let mut chain = Chain::open(&config)?;
        match cli.command.unwrap_or(Commands::Menu) {
            Commands::Add { message } => cmd_add(&mut chain, &message),
            Commands::Show => cmd_show(&chain),
            Commands::Verify => cmd_verify(&chain),
            Commands::Menu => cmd_menu(&mut chain),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> Result<ChainConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::default(),
    };
    if let Some(file) = &cli.file {
        config.storage_path = file.clone();
    }
    Ok(config)
}

fn cmd_add(chain: &mut Chain, message: &str) -> CmdResult {
    let block = chain.append(message)?;
    println!("[{}] block {} added", &block.hash()[..8], block.index());
    Ok(())
}

fn cmd_show(chain: &Chain) -> CmdResult {
    print!("{}", chain.render());
    Ok(())
}

fn cmd_verify(chain: &Chain) -> CmdResult {
    match chain.first_fault() {
        None => println!("Chain valid ({} blocks)", chain.len()),
        Some(fault) => {
            println!("Chain INVALID: {}", fault);
            std::process::exit(2);
        }
    }
    Ok(())
}

fn cmd_menu(chain: &mut Chain) -> CmdResult {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!();
        println!("Options:");
        println!("1. Add new block");
        println!("2. Show blockchain");
        println!("3. Verify blockchain");
        println!("4. Exit");
        let Some(choice) = prompt(&mut lines, "Enter choice: ")? else {
            return Ok(());
        };
        match choice.trim() {
            "1" => {
                let Some(message) = prompt(&mut lines, "Enter message: ")? else {
                    return Ok(());
                };
                chain.append(message)?;
                println!("Block added!");
            }
            "2" => {
                println!();
                print!("{}", chain.render());
            }
            "3" => println!("Blockchain valid? {}", chain.validate()),
            "4" => return Ok(()),
            _ => println!("Invalid choice"),
        }
    }
}

/// Print `label` and read one line. `None` on end of input.
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    lines.next().transpose()
}
