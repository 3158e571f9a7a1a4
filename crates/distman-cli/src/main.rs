use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;

use distman_core::{Config, Locator, NameConstraint, Orchestrator};

mod logging;

#[derive(Parser)]
#[command(author, version, about = "Resolve, fetch, build, and deploy dists into a deployment directory.")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use verbose (debug-level) logging.
    #[arg(global = true, long, short)]
    verbose: bool,

    /// Deployment directory to operate on.
    #[arg(global = true, long, default_value = ".")]
    deployment: PathBuf,

    /// Override the host architecture tag used for arch filtering.
    #[arg(global = true, long)]
    host_arch: Option<String>,

    /// Override the host type tag used for type filtering.
    #[arg(global = true, long)]
    host_type: Option<String>,

    /// Keep scratch build/unpack directories instead of deleting them.
    #[arg(global = true, long)]
    debug: bool,

    /// Copy files into the deployment instead of symlinking into per-dist directories.
    #[arg(global = true, long)]
    copy_mode: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and deploy dists satisfying the given name constraints.
    Install {
        /// Constraint strings such as `widget` or `widget>=1.0<2.0`.
        #[arg(required(true))]
        names: Vec<String>,

        /// Repository locators to acquire candidates from (URLs or local paths).
        #[arg(long = "repo", required(true))]
        repos: Vec<String>,

        /// `KEY=VALUE` build variables passed through to the build driver.
        #[arg(long = "var")]
        vars: Vec<String>,
    },
    /// Delete installed dists matching the given name constraints.
    Remove {
        #[arg(required(true))]
        names: Vec<String>,
    },
    /// Archive installed dists matching the given name constraints.
    Pack {
        #[arg(required(true))]
        names: Vec<String>,

        /// Directory to write archives into.
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// List installed dists, including synthetic provides/host-provides records.
    List,
}

fn parse_requirements(names: &[String]) -> Result<Vec<NameConstraint>> {
    names
        .iter()
        .map(|n| NameConstraint::parse(n).with_context(|| format!("invalid constraint `{n}`")))
        .collect()
}

fn parse_vars(vars: &[String]) -> Result<IndexMap<String, String>> {
    let mut out = IndexMap::new();
    for raw in vars {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("expected `KEY=VALUE`, got `{raw}`"))?;
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

fn run(cli: Cli) -> Result<()> {
    let temp_root = std::env::temp_dir().join("distman-work");
    let mut config = Config::for_host(temp_root);
    if let Some(arch) = cli.host_arch {
        config.host_arch = arch;
    }
    if let Some(kind) = cli.host_type {
        config.host_type = kind;
    }
    config.debug = cli.debug;
    config.link_mode = !cli.copy_mode;

    let orchestrator = Orchestrator::new(config).context("failed to start up")?;

    match cli.command {
        Commands::Install { names, repos, vars } => {
            let locators: Vec<Locator> = repos.iter().map(|r| Locator::parse(r)).collect();
            let manifest = orchestrator.acquire_manifest(&locators)?;
            let requirements = parse_requirements(&names)?;
            let variables = parse_vars(&vars)?;
            let installed = orchestrator
                .install(&requirements, &cli.deployment, &manifest, &variables)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            for dist in installed {
                println!("installed {}-{}", dist.name, dist.version);
            }
        }
        Commands::Remove { names } => {
            let requirements = parse_requirements(&names)?;
            let removed = orchestrator.remove(&requirements, &cli.deployment)?;
            for dist in removed {
                println!("removed {}-{}", dist.name, dist.version);
            }
        }
        Commands::Pack { names, dest } => {
            let requirements = parse_requirements(&names)?;
            let archives = orchestrator.pack(&requirements, &cli.deployment, &dest)?;
            for archive in archives {
                println!("{}", archive.display());
            }
        }
        Commands::List => {
            let deployed = orchestrator.get_deployed(&cli.deployment)?;
            for dist in deployed {
                match &dist.provided {
                    Some(provider) => {
                        println!("{}-{} (provided by {}-{})", dist.name, dist.version, provider.name, provider.version);
                    }
                    None => println!("{}-{}", dist.name, dist.version),
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose) {
        eprintln!("failed to set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
