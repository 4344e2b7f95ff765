//! Beckn Usecase CLI
//!
//! Command-line interface for compiling schemas and resolving usecases.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use beckn_usecase::{
    compile, load_schema_source, load_static_values, ClientOptions, DeeplinkError,
    DeeplinkResolver, HostMappingCache, Resolver, StaticValues, UsecaseEngine, ValidateError,
    DEFAULT_HOST_MAPPING_URL,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beckn-usecase")]
#[command(about = "Resolve and validate Beckn usecase documents")]
#[command(version)]
struct Cli {
    /// URL of the resolver host mapping
    #[arg(long, global = true, env = "BECKN_HOST_MAPPING_URL", default_value = DEFAULT_HOST_MAPPING_URL)]
    mapping_url: String,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, global = true, env = "BECKN_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the template compiled from a schema
    Template {
        /// Schema source: file path, URL or deeplink
        schema: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve a usecase: template, static values, dynamic resolvers, validation.
    ///
    /// Resolvers are registered in this order: --resolvers file entries,
    /// then --set, then --fetch. A later resolver for the same path wins.
    Resolve {
        /// Schema source: file path, URL or deeplink
        schema: String,

        /// YAML file of static values keyed by dot-path
        #[arg(long = "static", value_name = "FILE")]
        static_values: Option<PathBuf>,

        /// YAML file mapping dot-paths to resolvers ("text" or {uri: URL})
        #[arg(long, value_name = "FILE")]
        resolvers: Option<PathBuf>,

        /// Set a literal value: PATH=TEXT
        #[arg(long = "set", value_name = "PATH=TEXT")]
        set: Vec<String>,

        /// Fetch a value as text: PATH=URL
        #[arg(long = "fetch", value_name = "PATH=URL")]
        fetch: Vec<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Report validation results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Fetch the usecase document a deeplink points to
    Fetch {
        /// Deeplink, e.g. beckn://resolver.example.org/1234
        deeplink: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the host mapped to a resolver identifier
    Host {
        /// Resolver identifier, e.g. resolver.example.org
        resolver: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ClientOptions::new().timeout(Duration::from_secs(cli.timeout));
    let cache = HostMappingCache::with_options(cli.mapping_url, options.clone());
    let ctx = Context { options, cache };

    let result = match cli.command {
        Commands::Template {
            schema,
            output,
            pretty,
        } => run_template(&ctx, &schema, output, pretty).await,

        Commands::Resolve {
            schema,
            static_values,
            resolvers,
            set,
            fetch,
            output,
            pretty,
            json,
        } => {
            run_resolve(
                &ctx,
                ResolveArgs {
                    schema,
                    static_values,
                    resolvers,
                    set,
                    fetch,
                    output,
                    pretty,
                    json_output: json,
                },
            )
            .await
        }

        Commands::Fetch { deeplink, pretty } => run_fetch(&ctx, &deeplink, pretty).await,

        Commands::Host { resolver } => run_host(&ctx, &resolver).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct Context {
    options: ClientOptions,
    cache: HostMappingCache,
}

async fn load_schema_arg(ctx: &Context, source: &str) -> Result<Value, u8> {
    load_schema_source(source, &ctx.cache, &ctx.options)
        .await
        .map_err(|e| {
            eprintln!("Error loading schema: {}", e);
            e.exit_code() as u8
        })
}

async fn run_template(
    ctx: &Context,
    schema_source: &str,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_schema_arg(ctx, schema_source).await?;
    write_json(&compile(&schema), pretty, output.as_deref())
}

struct ResolveArgs {
    schema: String,
    static_values: Option<PathBuf>,
    resolvers: Option<PathBuf>,
    set: Vec<String>,
    fetch: Vec<String>,
    output: Option<PathBuf>,
    pretty: bool,
    json_output: bool,
}

async fn run_resolve(ctx: &Context, args: ResolveArgs) -> Result<(), u8> {
    let ResolveArgs {
        schema: schema_source,
        static_values,
        resolvers,
        set,
        fetch,
        output,
        pretty,
        json_output,
    } = args;

    let schema = load_schema_arg(ctx, &schema_source).await?;

    let static_values = match static_values {
        Some(path) => load_static_values(&path).map_err(|e| {
            eprintln!("Error loading static values: {}", e);
            e.exit_code() as u8
        })?,
        None => StaticValues::new(),
    };

    let mut engine = UsecaseEngine::new(&schema, static_values)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?
        .with_options(ctx.options.clone());

    // Resolver file entries share the static-value format: a mapping of
    // dot-paths, so the same loader reads them.
    if let Some(path) = resolvers {
        let entries = load_static_values(&path).map_err(|e| {
            eprintln!("Error loading resolvers: {}", e);
            e.exit_code() as u8
        })?;
        for (resolver_path, value) in &entries {
            engine
                .add_resolver_value(resolver_path, value)
                .map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?;
        }
    }

    for arg in &set {
        let (path, text) = split_assignment(arg, "--set")?;
        engine.add_resolver(path, Resolver::literal(text));
    }

    for arg in &fetch {
        let (path, url) = split_assignment(arg, "--fetch")?;
        let resolver = Resolver::uri(path, url).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        engine.add_resolver(path, resolver);
    }

    engine.static_resolve();
    engine.dynamic_resolve().await.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match engine.parsed_usecase() {
        Ok(usecase) => write_json(usecase, pretty, output.as_deref()),
        Err(ValidateError::Invalid { errors, document }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors,
                    "document": document,
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

async fn run_fetch(ctx: &Context, deeplink: &str, pretty: bool) -> Result<(), u8> {
    let usecase = DeeplinkResolver::new(deeplink)
        .options(ctx.options.clone())
        .fetch_usecase_with(&ctx.cache)
        .await
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    write_json(&usecase, pretty, None)
}

async fn run_host(ctx: &Context, resolver: &str) -> Result<(), u8> {
    let host = ctx.cache.get_resolver_host(resolver).await.map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })?;

    match host {
        Some(host) => {
            println!("{}", host);
            Ok(())
        }
        None => {
            let err = DeeplinkError::ResolverNotFound {
                resolver: resolver.to_string(),
            };
            eprintln!("Error: {}", err);
            Err(err.exit_code() as u8)
        }
    }
}

/// Split a `PATH=VALUE` argument.
fn split_assignment<'a>(arg: &'a str, flag: &str) -> Result<(&'a str, &'a str), u8> {
    match arg.split_once('=') {
        Some((path, value)) if !path.is_empty() => Ok((path, value)),
        _ => {
            eprintln!("Error: {} expects PATH=VALUE, got \"{}\"", flag, arg);
            Err(2)
        }
    }
}

fn write_json(value: &Value, pretty: bool, output: Option<&Path>) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
