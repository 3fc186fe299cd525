//! Prediction server bootstrap.
//!
//! Resolves configuration (CLI over environment over defaults), initializes
//! tracing, loads the model artifacts, and starts the HTTP server. Artifact
//! loading failure is non-fatal: the server comes up degraded and reports
//! `model_loaded: false` until restarted with valid artifacts.

use anyhow::Result;
use clap::Parser;
use mathperf_api::{start_server, AppState};
use mathperf_model::artifacts::{DEFAULT_ENCODERS_PATH, DEFAULT_MODEL_PATH};
use mathperf_model::{Artifacts, PredictService};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug, Default)]
#[command(name = "mathperf-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve math-performance predictions over HTTP", long_about = None)]
struct Args {
    /// Listen port (env: PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (env: MATHPERF_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Model artifact path (env: MATHPERF_MODEL)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Encoder-set artifact path (env: MATHPERF_ENCODERS)
    #[arg(long)]
    encoders: Option<PathBuf>,

    /// Static report-page directory (env: MATHPERF_STATIC_DIR)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (env: MATHPERF_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Config {
    port: u16,
    host: String,
    model: PathBuf,
    encoders: PathBuf,
    static_dir: PathBuf,
    log_level: String,
}

impl Config {
    fn resolve(args: Args) -> Self {
        Self::resolve_with(args, |key| env::var(key).ok())
    }

    /// CLI flag > environment variable > default.
    fn resolve_with<F>(args: Args, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = args
            .port
            .or_else(|| lookup("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(5000);
        let host = args
            .host
            .or_else(|| lookup("MATHPERF_HOST"))
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let model = args
            .model
            .or_else(|| lookup("MATHPERF_MODEL").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        let encoders = args
            .encoders
            .or_else(|| lookup("MATHPERF_ENCODERS").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENCODERS_PATH));
        let static_dir = args
            .static_dir
            .or_else(|| lookup("MATHPERF_STATIC_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("static"));
        let log_level = args
            .log_level
            .or_else(|| lookup("MATHPERF_LOG"))
            .unwrap_or_else(|| "info".to_string());

        Self {
            port,
            host,
            model,
            encoders,
            static_dir,
            log_level,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::resolve(Args::parse());
    init_logging(&config);

    // Artifact loading happens before the listener binds; a failure leaves
    // the service degraded rather than killing the process.
    let artifacts = match Artifacts::load(&config.model, &config.encoders) {
        Ok(artifacts) => Some(artifacts),
        Err(err) => {
            warn!("failed to load model artifacts: {err}");
            warn!("serving in degraded mode; /predict will return 503");
            None
        }
    };

    let service = PredictService::new(artifacts);
    let state = AppState {
        service: service.clone(),
        static_dir: Some(config.static_dir.clone()),
    };

    let addr = config.addr();
    info!(
        "Starting prediction server on {addr} (model loaded: {})",
        service.is_ready()
    );

    start_server(state, &addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_map<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = Config::resolve_with(Args::default(), |_| None);
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.model, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.encoders, PathBuf::from(DEFAULT_ENCODERS_PATH));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn environment_overrides_defaults() {
        let lookup = env_map(&[("PORT", "8080"), ("MATHPERF_HOST", "127.0.0.1")]);
        let config = Config::resolve_with(Args::default(), lookup);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn flags_override_environment() {
        let args = Args {
            port: Some(9000),
            ..Args::default()
        };
        let lookup = env_map(&[("PORT", "8080")]);
        let config = Config::resolve_with(args, lookup);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn unparseable_port_env_falls_back_to_default() {
        let lookup = env_map(&[("PORT", "not-a-port")]);
        let config = Config::resolve_with(Args::default(), lookup);
        assert_eq!(config.port, 5000);
    }
}
