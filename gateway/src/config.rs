//! Gateway environment resolution and credentials.
//!
//! Resolution is a pure function over an explicit override, the configured
//! variables and the serving hostname. The resolved config is constructed
//! once and injected; nothing here memoizes global state.

use crate::error::GatewayError;
use std::env;

const DEFAULT_PROD_HOST: &str = "payment.cawl-solutions.fr";
const DEFAULT_PREPROD_HOST: &str = "payment.preprod.cawl-solutions.fr";

/// Provider environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    /// Live money.
    Production,
    /// Provider sandbox.
    Preprod,
}

impl Environment {
    /// Scoped variable prefix for this environment.
    #[must_use]
    const fn scope(self) -> &'static str {
        match self {
            Self::Production => "PAYMENT_PROD_",
            Self::Preprod => "PAYMENT_PREPROD_",
        }
    }

    /// Default provider API host for this environment.
    #[must_use]
    pub const fn default_host(self) -> &'static str {
        match self {
            Self::Production => DEFAULT_PROD_HOST,
            Self::Preprod => DEFAULT_PREPROD_HOST,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Production => "production",
            Self::Preprod => "preprod",
        })
    }
}

/// Resolves the provider environment.
///
/// Precedence: explicit override, then the `PAYMENT_ENV` setting, then a
/// hostname heuristic where loopback-like serving hostnames mean preprod.
/// Anything unrecognized resolves to preprod so a misconfigured deployment
/// never accidentally charges live money.
#[must_use]
pub fn resolve_environment(
    explicit: Option<Environment>,
    env_setting: Option<&str>,
    serving_hostname: &str,
) -> Environment {
    if let Some(environment) = explicit {
        return environment;
    }
    if let Some(setting) = env_setting {
        return match setting.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Environment::Production,
            _ => Environment::Preprod,
        };
    }
    if is_loopback_like(serving_hostname) {
        return Environment::Preprod;
    }
    Environment::Production
}

fn is_loopback_like(hostname: &str) -> bool {
    let host = hostname.trim().to_ascii_lowercase();
    host.is_empty()
        || host == "localhost"
        || host == "::1"
        || host.starts_with("127.")
        || host.ends_with(".local")
}

/// Resolved credentials and endpoint for one environment.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Resolved environment.
    pub environment: Environment,
    /// Provider API host.
    pub api_host: String,
    /// API key identifier.
    pub api_key_id: String,
    /// API key secret.
    pub api_secret: String,
    /// Merchant identifier at the provider.
    pub merchant_id: String,
    /// Integrator label sent with each session.
    pub integrator: String,
}

impl GatewayConfig {
    /// Loads credentials for `environment` through `lookup`.
    ///
    /// For each variable the environment-scoped name wins over the generic
    /// `PAYMENT_` name. `lookup` is injected so tests never touch the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] when the key id, secret or merchant
    /// id is absent for the resolved environment.
    pub fn load(
        environment: Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GatewayError> {
        let scoped = |name: &str| {
            lookup(&format!("{}{name}", environment.scope()))
                .or_else(|| lookup(&format!("PAYMENT_{name}")))
        };

        let require = |name: &str| {
            scoped(name).ok_or_else(|| {
                GatewayError::Config(format!(
                    "missing PAYMENT_{name} (or {}{name}) for the {environment} environment",
                    environment.scope()
                ))
            })
        };

        Ok(Self {
            environment,
            api_host: scoped("API_HOST").unwrap_or_else(|| environment.default_host().to_string()),
            api_key_id: require("API_KEY_ID")?,
            api_secret: require("API_SECRET")?,
            merchant_id: require("MERCHANT_ID")?,
            integrator: scoped("INTEGRATOR").unwrap_or_else(|| "conciergerie-by-isa".to_string()),
        })
    }

    /// Loads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] when required credentials are absent.
    pub fn from_env(serving_hostname: &str) -> Result<Self, GatewayError> {
        let environment = resolve_environment(
            None,
            env::var("PAYMENT_ENV").ok().as_deref(),
            serving_hostname,
        );
        Self::load(environment, |name| env::var(name).ok())
    }

    /// Base URL of the provider API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.api_host)
    }
}
