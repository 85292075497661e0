//! pgq — PostgREST query-string tool
//!
//! Render, merge and explain PostgREST query strings.
//!
//! # Usage
//!
//! ```bash
//! # Render params stored as JSON
//! pgq render params.json
//!
//! # Merge configured defaults with a caller query
//! pgq merge --resource films --query "limit=5"
//!
//! # Show how a query string is understood
//! pgq explain "select=id,actors(*)&actors.limit=10&age=gte.18"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use postgrest_query::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgq")]
#[command(version)]
#[command(about = "Render, merge and explain PostgREST query strings", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgq render params.json --resource films
    pgq merge --defaults 'limit=25&order=title.asc' --query 'limit=5'
    pgq explain 'or=(age.gte.14,age.lte.18)'")]
struct Cli {
    /// Config file (defaults to $PGQ_CONFIG or <config dir>/pgq/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON params file as a query string
    Render {
        /// JSON file holding an array of params
        file: PathBuf,

        /// Print a full URL for this resource using the configured base URL
        #[arg(short, long)]
        resource: Option<String>,
    },
    /// Merge defaults, overrides and mandatory params
    Merge {
        /// Default query string (falls back to the configured defaults)
        #[arg(short, long)]
        defaults: Option<String>,

        /// Override query string
        #[arg(short, long, default_value = "")]
        query: String,

        /// Params that win over everything else
        #[arg(short, long)]
        mandatory: Option<String>,

        /// Resource whose configured defaults apply
        #[arg(short, long)]
        resource: Option<String>,
    },
    /// Parse and explain a query string
    Explain {
        /// The query string to explain
        query: String,
    },
    /// Show the operator reference
    Operators,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "postgrest_query=debug"
    } else {
        "postgrest_query=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Render { file, resource } => render(cli, file, resource.as_deref()),
        Commands::Merge {
            defaults,
            query,
            mandatory,
            resource,
        } => merge(
            cli,
            defaults.as_deref(),
            query,
            mandatory.as_deref(),
            resource.as_deref(),
        ),
        Commands::Explain { query } => explain(query),
        Commands::Operators => {
            show_operators();
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<QueryConfig> {
    QueryConfig::load(cli.config.as_deref()).context("Failed to load config")
}

fn render(cli: &Cli, file: &Path, resource: Option<&str>) -> Result<()> {
    let params = load_params(file)
        .with_context(|| format!("Failed to load params from '{}'", file.display()))?;

    if cli.verbose {
        println!("{} {} param(s)", "Loaded:".dimmed(), params.len());
    }

    match resource {
        Some(resource) => {
            let config = load_config(cli)?;
            println!("{}", config.url_for(resource, &params)?);
        }
        None => println!("{}", to_query_string(&params)),
    }
    Ok(())
}

fn merge(
    cli: &Cli,
    defaults: Option<&str>,
    query: &str,
    mandatory: Option<&str>,
    resource: Option<&str>,
) -> Result<()> {
    let config = load_config(cli)?;

    let defaults = match (defaults, resource) {
        (Some(defaults), _) => parse(defaults).context("Invalid --defaults")?,
        (None, Some(resource)) => config.defaults_for(resource)?,
        (None, None) => Vec::new(),
    };
    let overrides = parse(query).context("Invalid --query")?;
    let mandatory = match mandatory {
        Some(m) => parse(m).context("Invalid --mandatory")?,
        None => Vec::new(),
    };

    let params = combine_with_mandatory(&defaults, &overrides, &mandatory);

    if cli.verbose {
        println!("{}", "Merged params:".green().bold());
        for (key, value) in normalize_params(&params) {
            println!("  {} = {}", key.cyan(), value.white());
        }
        println!();
    }

    match (resource, &config.base_url) {
        (Some(resource), Some(_)) => println!("{}", config.url_for(resource, &params)?),
        _ => println!("{}", to_query_string(&params)),
    }
    Ok(())
}

fn explain(query: &str) -> Result<()> {
    println!("{}", "PostgREST Query Explanation".cyan().bold());
    println!();
    println!("{} {}", "Query:".dimmed(), query.yellow());
    println!();

    let params = parse(query)?;

    println!("{}", "Parsed Structure:".green().bold());
    for p in &params {
        print_param(p, 1);
    }

    println!();
    println!("{}", "Pairs:".green().bold());
    for (key, value) in normalize_params(&params) {
        println!("  {} = {}", key.cyan(), value.white());
    }

    println!();
    println!("{}", "Rendered:".green().bold());
    println!("  {}", to_query_string(&params).white());
    Ok(())
}

fn print_param(param: &Param, depth: usize) {
    let indent = "  ".repeat(depth);
    match param {
        Param::Filter(column, op) => {
            println!("{}{} {} {}", indent, "Filter".cyan(), column.white(), op.to_string().yellow())
        }
        Param::NestedFilter(path, inner) => {
            println!("{}{} {}", indent, "Nested".cyan(), path.white());
            print_param(inner, depth + 1);
        }
        Param::Select(selectables) => {
            println!("{}{}", indent, "Select".cyan());
            for s in selectables {
                print_selectable(s, depth + 1);
            }
        }
        Param::Limit(n) => println!("{}{} {}", indent, "Limit".cyan(), n),
        Param::Offset(n) => println!("{}{} {}", indent, "Offset".cyan(), n),
        Param::Order(orders) => {
            println!("{}{}", indent, "Order".cyan());
            for o in orders {
                println!("{}  {}", indent, o.to_string().white());
            }
        }
        Param::Or(params) | Param::And(params) => {
            let label = if matches!(param, Param::Or(_)) { "Or" } else { "And" };
            println!("{}{}", indent, label.magenta());
            for p in params {
                print_param(p, depth + 1);
            }
        }
    }
}

fn print_selectable(selectable: &Selectable, depth: usize) {
    let indent = "  ".repeat(depth);
    match selectable {
        Selectable::Attribute(name) => println!("{}• {}", indent, name.white()),
        Selectable::Resource(name, params, children) => {
            println!("{}◦ {}", indent, name.white().bold());
            for p in params {
                print_param(p, depth + 1);
            }
            for child in children {
                print_selectable(child, depth + 1);
            }
        }
    }
}

fn show_operators() {
    println!("{}", "PostgREST Operator Reference".cyan().bold());
    println!();

    let operators = [
        ("eq", "Eq(v)", "Equals", "age=eq.18"),
        ("neq", "Neq(v)", "Not equal", "age=neq.18"),
        ("lt / lte", "Lt(v) / Lte(v)", "Less than (or equal)", "age=lt.18"),
        ("gt / gte", "Gt(v) / Gte(v)", "Greater than (or equal)", "age=gte.18"),
        ("in", "In([..])", "One of a list", "id=in.(1,2,3)"),
        ("like", "Like(s)", "Pattern match", "name=like.%22*son%22"),
        ("ilike", "Ilike(s)", "Case-insensitive pattern", "name=ilike.%22*son%22"),
        ("is", "Null / True / False", "Identity check", "deleted=is.null"),
        ("fts", "Fts(lang, s)", "Full-text search", "body=fts(english).cat"),
        ("plfts", "Plfts(lang, s)", "Plain full-text search", "body=plfts.fat%20cat"),
        ("phfts", "Phfts(lang, s)", "Phrase full-text search", "body=phfts.fat%20cat"),
        ("not", "Not(op)", "Negate an operator", "deleted=not.is.null"),
        ("or / and", "Or([..]) / And([..])", "Grouped conditions", "or=(a.eq.1,b.eq.2)"),
    ];

    println!(
        "{:10} {:22} {:26} {}",
        "Operator".white().bold(),
        "Variant".white().bold(),
        "Meaning".white().bold(),
        "Example".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for (op, variant, meaning, example) in operators {
        println!(
            "{:10} {:22} {:26} {}",
            op.cyan().bold(),
            variant.yellow(),
            meaning.white(),
            example.dimmed()
        );
    }
}
