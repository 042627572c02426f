//! Command-line front end rewriting `url()` references in declaration values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;

use css_url_resolver::{FilesystemJoin, RewriteConfig, ValueTransformer};

#[derive(Parser, Debug)]
#[command(
  name = "css-url-resolver",
  version,
  about = "Rewrite url() references in stylesheet declaration values"
)]
struct Cli {
  /// Stylesheet the values belong to
  #[arg(long, value_name = "FILE")]
  file: PathBuf,

  /// Directory that root-relative urls resolve against (overrides the config file)
  #[arg(long, value_name = "DIR")]
  root: Option<String>,

  /// Configuration file (defaults to css-url-resolver.config.json next to the stylesheet)
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Candidate base directories for relative urls (repeatable)
  #[arg(long = "base", value_name = "DIR")]
  bases: Vec<PathBuf>,

  /// Drop query strings and fragments from rewritten urls
  #[arg(long, action = ArgAction::SetTrue)]
  drop_query: bool,

  /// Log how every url statement was handled
  #[arg(long, action = ArgAction::SetTrue)]
  debug: bool,

  /// Declaration values to rewrite
  #[arg(required = true, value_name = "VALUE")]
  values: Vec<String>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.debug);

  let mut config = load_config(&cli)?;
  apply_overrides(&mut config, &cli);

  let transformer = ValueTransformer::new(&cli.file, config.into_options(FilesystemJoin));
  let bases = if cli.bases.is_empty() {
    vec![transformer.directory().to_path_buf()]
  } else {
    cli.bases.clone()
  };
  let lookup = |_offset: usize| bases.clone();

  for value in &cli.values {
    let rewritten = transformer
      .transform_value(value, &lookup)
      .with_context(|| format!("failed to rewrite `{value}`"))?;
    println!("{rewritten}");
  }

  Ok(())
}

fn init_logging(debug: bool) {
  let mut builder = env_logger::Builder::from_default_env();
  if debug {
    builder.filter_level(LevelFilter::Debug);
  }
  builder.init();
}

/// Explicit command-line flags win over values from the configuration file.
fn apply_overrides(config: &mut RewriteConfig, cli: &Cli) {
  if let Some(root) = &cli.root {
    config.root = Some(root.clone());
  }
  if cli.drop_query {
    config.keep_query = false;
  }
  config.debug |= cli.debug;
}

fn load_config(cli: &Cli) -> Result<RewriteConfig> {
  match &cli.config {
    Some(path) => RewriteConfig::load_from_path(path)
      .with_context(|| format!("failed to load configuration from {}", path.display())),
    None => Ok(RewriteConfig::discover(
      cli.file.parent().unwrap_or_else(|| Path::new(".")),
    )),
  }
}
