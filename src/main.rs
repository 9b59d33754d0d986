use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use certissue::backend;
use certissue::cli::Args;
use certissue::config::Defaults;
use certissue::issue::Issuance;
use certissue::prompt::{ConsolePrompter, Interview};

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .format_timestamp(None)
        .init();

    if let Err(e) = real_main(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<()> {
    let partial = args.into_partial();

    let mut prompter = ConsolePrompter::stdio();
    let config = Interview::new(&mut prompter, Defaults::default())
        .complete(partial)
        .context("Failed to collect the certificate details")?;
    info!(
        "issuing CN={} for {} days with {} SAN entries",
        config.common_name(),
        config.duration_days(),
        config.sans().len()
    );

    let backend = backend::create(config.backend())
        .with_context(|| format!("Failed to set up the {} backend", config.backend()))?;
    let issued = Issuance::new(&config, backend.as_ref())
        .run()
        .with_context(|| format!("Failed to issue a certificate for {}", config.common_name()))?;

    println!("Private key: {}", issued.key_path.display());
    println!("Certificate: {}", issued.cert_path.display());
    Ok(())
}
