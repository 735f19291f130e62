use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use actix_web::{middleware, App, HttpServer};
use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;
use serde::Deserialize;
use structopt::StructOpt;

use cookbook::config::{self, EnvLogger, EnvOverrides, StoreConfig};
use cookbook::Cookbook;
use infra::persistence::Storage;

#[derive(Debug, StructOpt)]
#[structopt(name = "serve", about = "Serve the cookbook.")]
struct Opt {
    /// Input file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
}

#[derive(Deserialize, Debug)]
struct Config {
    #[serde(flatten)]
    cookbook: config::Config,
    listener: Listener,
    #[serde(default)]
    env_logger: EnvLogger,
}

#[derive(Deserialize, Debug)]
struct Listener {
    addr: std::net::SocketAddr,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config_buf = String::new();
    File::open(&opt.config)
        .with_context(|| format!("open {:?}", opt.config))?
        .read_to_string(&mut config_buf)?;
    let mut config: Config = toml::from_str(&config_buf).context("parse config")?;

    config.env_logger.builder().init();
    debug!("Options: {:?}", opt);

    let env = EnvOverrides::from_env()?;
    config.cookbook.apply_env(&env);
    let addr = env.listen_addr.unwrap_or(config.listener.addr);

    match &config.cookbook.store {
        StoreConfig::Postgres(pg) => run(pg.build()?, config.cookbook.seed, addr),
        StoreConfig::Memory => run(config::memory_pool()?, config.cookbook.seed, addr),
    }
}

// Store setup talks to the database synchronously, so it happens before
// the actix runtime starts.
fn run<M, D>(pool: Pool<M>, seed: bool, addr: std::net::SocketAddr) -> Result<()>
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let app = Cookbook::new(pool);
    app.setup()?;
    if seed {
        info!("Seeding store");
        app.seed()?;
    }

    actix_web::rt::System::new().block_on(async move {
        let srv = HttpServer::new(move || {
            let app = app.clone();
            App::new()
                .wrap(middleware::Logger::default())
                .configure(move |cfg| app.configure(cfg))
        })
        .bind(addr)
        .context("bind")?;
        info!("Listening on: {:?}", srv.addrs());
        srv.run().await?;
        Ok::<(), anyhow::Error>(())
    })
}
