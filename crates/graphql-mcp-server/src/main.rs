use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{ArgAction, Parser};
use graphql_mcp_server::server::Server;
use tracing::{Level, debug, info};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    disable_version_flag = true,
    styles = STYLES,
    about = "GraphQL MCP Server - query and introspect any GraphQL API from an AI agent",
)]
struct Args {
    /// The default GraphQL endpoint [env: ENDPOINT] [default: http://localhost:4000/graphql]
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    /// Default headers for every request, as a JSON object of strings
    #[arg(long, short = 'H')]
    headers: Option<String>,

    /// Default request timeout in milliseconds [env: TIMEOUT] [default: 30000]
    #[arg(long, short = 't')]
    timeout: Option<u64>,

    /// Maximum number of fields in a query [env: MAX_DEPTH] [default: 100]
    #[arg(long = "maxComplexity", short = 'm')]
    max_complexity: Option<usize>,

    /// The log level for the MCP Server
    #[arg(long = "log", short = 'l', default_value_t = Level::INFO)]
    log_level: Level,

    /// Print version
    #[arg(long, short = 'v', action = ArgAction::Version)]
    version: (),
}

impl Args {
    fn overrides(&self) -> runtime::Overrides {
        runtime::Overrides {
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
            max_complexity: self.max_complexity,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    runtime::setup_logging(args.log_level)?;
    let config = runtime::resolve_config(&args.overrides(), args.headers.as_deref())?;

    info!(
        "GraphQL MCP Server v{} // endpoint {} // timeout {}ms // max complexity {}",
        config.version,
        config.endpoint,
        config.timeout.as_millis(),
        config.max_complexity
    );
    if let Some(headers) = config.default_headers_json() {
        debug!("Using default headers: {headers}");
    }

    Ok(Server::new(config).start().await?)
}
