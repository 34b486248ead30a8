use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tfog::config::Config;
use tfog::{
    CredentialScope, RawOptions, ServiceError, ServiceFactory, ServiceRegistry, WarningSink,
};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Resolve service options and construct real or mock cloud services
#[derive(Parser, Debug)]
#[command(name = "tfog", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known services and their options
    Services,
    /// Resolve options for a service and show the constructed instance
    Resolve(ResolveArgs),
    /// Show or update the saved configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Service name (see `tfog services`)
    service: String,

    /// Option as key=value (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Option as key=JSON, for nested values such as connection_options
    #[arg(short = 'j', long = "json", value_name = "KEY=JSON")]
    json_options: Vec<String>,

    /// Suppress an option, including its default credential (repeatable)
    #[arg(long = "null", value_name = "KEY")]
    nulls: Vec<String>,

    /// Construct the mock implementation
    #[arg(long)]
    mock: bool,

    /// Credentials file (defaults to FOG_RC or ~/.fog)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Credential group (defaults to FOG_CREDENTIAL or "default")
    #[arg(long)]
    credential: Option<String>,

    /// Which default credentials are merged
    #[arg(long, value_enum)]
    scope: Option<ScopeArg>,

    /// Print secret option values instead of masking them
    #[arg(long)]
    show_secrets: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Save the default credential group
    #[arg(long)]
    credential: Option<String>,

    /// Save the default mocking mode
    #[arg(long)]
    mock: Option<bool>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    All,
    Declared,
}

impl From<ScopeArg> for CredentialScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => CredentialScope::All,
            ScopeArg::Declared => CredentialScope::Declared,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    to_stderr: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let (non_blocking, guard) = if to_stderr {
        tracing_appender::non_blocking(std::io::stderr())
    } else {
        let log_path = get_log_path();
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {:?}", log_path))?;
        tracing_appender::non_blocking(file)
    };

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tfog started with log level: {:?}", level);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tfog").join("tfog.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tfog").join("tfog.log");
    }
    PathBuf::from("tfog.log")
}

/// Prints resolution warnings for the CLI user
struct StderrWarningSink;

impl WarningSink for StderrWarningSink {
    fn warn(&self, message: &str) -> Result<()> {
        tracing::warn!("{}", message);
        eprintln!("warning: {}", message);
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_level, cli.log_stderr) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Logging disabled: {err:#}");
            None
        }
    };

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Exit status for a failed command: 2 for caller mistakes, 1 otherwise
fn exit_code(err: &anyhow::Error) -> i32 {
    let invalid_argument = err
        .downcast_ref::<ServiceError>()
        .is_some_and(ServiceError::is_invalid_argument);
    if invalid_argument {
        2
    } else {
        1
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Services => list_services(),
        Command::Resolve(args) => resolve(args),
        Command::Config(args) => configure(args),
    }
}

fn list_services() -> Result<()> {
    let registry = ServiceRegistry::with_catalog();
    for definition in registry.definitions() {
        let schema = definition.schema();
        println!("{}  {}", definition.name(), definition.description());
        println!("  requires:   {}", join(schema.required().iter()));
        println!("  recognizes: {}", join(schema.recognized().iter()));
        if !schema.secrets().is_empty() {
            println!("  secrets:    {}", join(schema.secrets().iter()));
        }
    }
    Ok(())
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn resolve(args: ResolveArgs) -> Result<()> {
    let mut settings = Config::load().effective();
    if let Some(path) = args.credentials.clone() {
        settings.credentials_path = path;
    }
    if let Some(group) = args.credential.clone() {
        settings.credential = group;
    }
    if args.mock {
        settings.mock = true;
    }
    if let Some(scope) = args.scope {
        settings.credential_scope = scope.into();
    }

    let credentials = settings.credentials();
    tracing::info!(
        "Resolving {} with credentials {:?} [{}], scope {}",
        args.service,
        credentials.path(),
        credentials.group(),
        settings.credential_scope.as_str()
    );

    let factory = ServiceFactory::new(Arc::new(credentials), Arc::new(settings.mocking()))
        .with_warning_sink(Arc::new(StderrWarningSink))
        .with_scope(settings.credential_scope);

    let raw = raw_options(&args)?;
    let registry = ServiceRegistry::with_catalog();
    let service = factory.create_named(&registry, &args.service, raw)?;

    let options = if args.show_secrets {
        service.options().to_json()
    } else {
        let definition = registry
            .get(&args.service)
            .ok_or_else(|| ServiceError::unknown_service(&args.service))?;
        service.options().redacted(definition.schema())
    };

    let output = json!({
        "service": args.service,
        "variant": service.variant(),
        "options": options,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn raw_options(args: &ResolveArgs) -> Result<RawOptions> {
    let mut raw = RawOptions::new();
    for option in &args.options {
        let (key, value) = split_pair(option)?;
        raw = raw.with(key, value);
    }
    for option in &args.json_options {
        let (key, value) = split_pair(option)?;
        let value: Value = serde_json::from_str(value)
            .with_context(|| format!("Invalid JSON for option '{}'", key))?;
        raw = raw.with(key, value);
    }
    for key in &args.nulls {
        raw = raw.with_null(key.as_str());
    }
    Ok(raw)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", pair))
}

fn configure(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load();
    if let Some(group) = args.credential.as_deref() {
        config.set_credential(group)?;
    }
    if let Some(mock) = args.mock {
        config.set_mock(mock)?;
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
