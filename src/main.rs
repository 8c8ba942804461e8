use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use sysdef::commands::{SyncFlags, list_installed, providers, sync, update};

/// sysdef - declarative machine configuration
///
/// Reads modules from a root directory, links their dotfiles into place and
/// brings each configured package manager in line with what the modules ask for.
///
/// Examples:
///   sysdef sync              # Link files and install/remove packages
///   sysdef sync --dry-run    # Show what would change
///   sysdef sync --safe       # Never remove packages
#[derive(Parser, Debug)]
#[command(author, version = env!("SYSDEF_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory (defaults to ~/sysdef; also via SYSDEF_ROOT_DIR)
    #[arg(
        long = "root",
        short = 'r',
        env = "SYSDEF_ROOT_DIR",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Sync all packages, modules and files
    Sync(SyncArgs),

    /// Check that every configured provider is usable
    Providers,

    /// List installed packages per provider
    ListInstalled(ListInstalledArgs),

    /// Update packages and refresh the lockfile
    Update(UpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Print what would happen without changing anything
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Install missing packages but never remove any
    #[arg(short = 's', long)]
    pub safe: bool,

    /// Only sync files, skip packages
    #[arg(short = 'f', long)]
    pub files_only: bool,

    /// Ask before replacing an existing file
    #[arg(short = 'c', long)]
    pub confirm: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListInstalledArgs {
    /// Only list this provider
    #[arg(value_name = "PROVIDER")]
    pub provider: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Only update through this provider
    #[arg(value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Packages to update (default: everything the provider manages)
    #[arg(value_name = "PACKAGE", requires = "provider")]
    pub packages: Vec<String>,

    /// Print the commands without running them
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

impl From<&SyncArgs> for SyncFlags {
    fn from(args: &SyncArgs) -> Self {
        SyncFlags {
            dry_run: args.dry_run,
            safe: args.safe,
            files_only: args.files_only,
            confirm: args.confirm,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = sysdef::runtime::RealRuntime;

    match cli.command {
        Commands::Sync(args) => sync(runtime, cli.root, SyncFlags::from(&args)).await?,
        Commands::Providers => providers(runtime, cli.root).await?,
        Commands::ListInstalled(args) => list_installed(runtime, cli.root, args.provider).await?,
        Commands::Update(args) => {
            update(runtime, cli.root, args.provider, args.packages, args.dry_run).await?
        }
    }
    Ok(())
}
