use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use r2d2::Pool;
use serde::Deserialize;
use structopt::StructOpt;

use cookbook::config::{self, EnvLogger, EnvOverrides};
use cookbook::recipes::ListRecipes;
use cookbook::services::Queryable;
use cookbook::units::ListUnits;
use cookbook::Cookbook;
use infra::persistence::Storage;

#[derive(Debug, StructOpt)]
#[structopt(name = "rb", about = "Cookbook CLI")]
struct Opt {
    /// Input file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
    #[structopt(subcommand)]
    command: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "setup", about = "Initialize the store")]
    Setup,
    #[structopt(name = "seed", about = "Load units, categories and sample recipes")]
    Seed,
    #[structopt(name = "show-recipes", about = "Show recipes")]
    ShowRecipes,
    #[structopt(name = "show-units", about = "Show units of measure")]
    ShowUnits,
}

#[derive(Deserialize, Debug)]
struct Config {
    #[serde(flatten)]
    cookbook: config::Config,
    #[serde(default)]
    env_logger: EnvLogger,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config_buf = String::new();
    File::open(&opt.config)
        .with_context(|| format!("open {:?}", opt.config))?
        .read_to_string(&mut config_buf)?;
    let mut config: Config = toml::from_str(&config_buf).context("parse config")?;

    config.env_logger.builder().init();
    config.cookbook.apply_env(&EnvOverrides::from_env()?);

    // Each run is a fresh process; a memory store would always be empty.
    let pg = config.cookbook.store.persistent()?;
    execute(pg.build()?, &opt.command)
}

fn execute<M, D>(pool: Pool<M>, command: &Commands) -> Result<()>
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let rb = Cookbook::new(pool);

    match command {
        Commands::Setup => {
            rb.setup()?;
        }
        Commands::Seed => {
            rb.setup()?;
            rb.seed()?;
        }
        Commands::ShowRecipes => {
            for recipe in rb.recipes().query(ListRecipes)? {
                println!(
                    "{}: {} ({} ingredients)",
                    recipe.id,
                    recipe.description,
                    recipe.ingredients.len()
                );
            }
        }
        Commands::ShowUnits => {
            for unit in rb.units().query(ListUnits)? {
                println!(
                    "{}: {}",
                    unit.id.unwrap_or_default(),
                    unit.description.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
