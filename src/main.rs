//! tagq CLI application entry point
//!
//! Inspects how search queries compile: the structured query, the scanner
//! and hoisting passes, normalization, and the deleted-content default.
//!
//! # Usage
//!
//! ```bash
//! # Structured query as JSON
//! tagq parse 'cat -dog ~( rating:s score:>10 ) order:score'
//!
//! # Readable summary, with groups built into sub-queries
//! tagq --process-groups parse --summary 'a ( b -c )'
//!
//! # Recursive scan, keeping nesting
//! tagq scan -r --nested '-( a ~( b c ) )'
//!
//! # Global metatags lifted out of groups
//! tagq hoist '( a order:score )'
//!
//! # Manage aliases
//! tagq alias add kitty cat
//! tagq alias list
//! ```
//!
//! # Configuration
//!
//! Configuration is stored in the user's config directory
//! (`~/.config/tagq/config.toml` on Linux) and created with defaults on first
//! run. Set `RUST_LOG` or pass `--verbose` for diagnostic output.

use log::{LevelFilter, debug};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use tagq::cli::{AliasCommands, Cli, Commands};
use tagq::resolve::{AliasTable, CachedLookup, ReferenceIndex};
use tagq::scan::{self, NormalizedSearch};
use tagq::{QueryParser, Result, TagqConfig, output};

/// Capacity of each lookup cache
const CACHE_CAPACITY: u64 = 1000;

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn load_config(cli: &Cli) -> Result<TagqConfig> {
    let mut config = match &cli.config {
        Some(path) => TagqConfig::load_from(path)?,
        None => TagqConfig::load()?,
    };
    cli.apply_overrides(&mut config.query);
    debug!("Query settings: {:?}", config.query);
    Ok(config)
}

fn load_records(path: Option<&Path>) -> Result<ReferenceIndex> {
    Ok(match path {
        Some(path) => ReferenceIndex::load(path)?,
        None => ReferenceIndex::new(),
    })
}

fn handle_alias_command(config: &TagqConfig, command: &AliasCommands, quiet: bool) -> Result<()> {
    let mut aliases = AliasTable::load(&config.aliases_path()?)?;
    match command {
        AliasCommands::Add { alias, canonical } => {
            aliases.add_alias(alias, canonical)?;
            aliases.save()?;
            if !quiet {
                output::success(&format!("Added alias '{alias}' → '{canonical}'"));
            }
        }
        AliasCommands::Remove { alias } => {
            aliases.remove_alias(alias)?;
            aliases.save()?;
            if !quiet {
                output::success(&format!("Removed alias '{alias}'"));
            }
        }
        AliasCommands::List => {
            let list = aliases.list_aliases();
            if list.is_empty() && !quiet {
                println!("No aliases defined");
            }
            for (alias, canonical) in list {
                println!("{}", output::alias_line(&alias, &canonical, quiet));
            }
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if let Commands::Alias { command } = &cli.command {
        return handle_alias_command(&config, command, cli.quiet);
    }

    let aliases = AliasTable::load(&config.aliases_path()?)?;
    let records = CachedLookup::with_cache_config(
        load_records(config.reference_file.as_deref())?,
        Duration::from_secs(config.cache_ttl_secs),
        CACHE_CAPACITY,
    );
    let resolver = (aliases, records);

    match &cli.command {
        Commands::Parse {
            summary,
            pretty,
            query,
        } => {
            let parser = QueryParser::new(config.query.clone(), &resolver)?;
            match parser.parse(&query.text()) {
                Ok(built) if *summary => {
                    for line in output::query_summary(&built) {
                        println!("{line}");
                    }
                }
                Ok(built) => println!("{}", output::query_json(&built, *pretty)?),
                Err(e) => {
                    if let Some(partial) = e.partial() {
                        println!("{}", output::query_json(partial, *pretty)?);
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Scan { options, query } => {
            let text = query.text();
            if options.recursive {
                let scan_options = options.scan_options(config.query.effective_depth_limit());
                let items = scan::scan_recursive_with(&text, &scan_options, &resolver)?;
                println!("{}", output::scan_items(&items));
            } else {
                println!("{}", scan::scan(&text).join(" "));
            }
        }
        Commands::Hoist { query } => {
            let options = scan::hoist::HoistOptions {
                hoisted_metatags: config.query.hoisted_metatags.clone(),
                depth_limit: config.query.effective_depth_limit(),
                error_on_depth_exceeded: config.query.error_on_depth_exceeded,
            };
            println!("{}", scan::scan_search_with(&query.text(), &options)?.join(" "));
        }
        Commands::Normalize { grouped, query } => {
            let text = query.text();
            let normalized = if *grouped {
                match scan::normalize_search(&text, true, &resolver)? {
                    NormalizedSearch::Joined(joined) => joined,
                    nested @ NormalizedSearch::Nested(_) => nested.to_string(),
                }
            } else {
                scan::normalize(&text, &resolver)
            };
            println!("{normalized}");
        }
        Commands::HideDeleted { query } => {
            let hides = scan::should_hide_deleted_posts(&query.text(), config.always_show_deleted);
            println!("{hides}");
        }
        Commands::Alias { .. } => unreachable!(),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
