//! Configuration for the TrustCart client runtime.
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use uuid::Uuid;

/// TrustCart - session-gated marketplace client
#[derive(Parser, Debug, Clone)]
#[command(name = "trustcart")]
#[command(about = "Marketplace client runtime: identity, bank linking, view-state control")]
pub struct Args {
    /// Unique identifier for this client instance (correlates log lines)
    #[arg(long, env = "CLIENT_ID", default_value_t = Uuid::new_v4())]
    pub client_id: Uuid,

    /// Base URL of the application backend
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    pub api_base_url: String,

    /// Identity provider (Supabase) project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Identity provider publishable (anon) key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// Enable development mode (relaxes provider configuration requirements)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in milliseconds for backend and provider calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Email for the smoke binary's sign-in probe (optional)
    #[arg(long, env = "SMOKE_EMAIL")]
    pub smoke_email: Option<String>,

    /// Password for the smoke binary's sign-in probe (optional)
    #[arg(long, env = "SMOKE_PASSWORD")]
    pub smoke_password: Option<String>,
}

impl Args {
    /// Identity provider URL, required outside dev mode.
    pub fn provider_url(&self) -> Option<&str> {
        self.supabase_url.as_deref()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err("API_BASE_URL must be an http(s) URL".to_string());
        }

        if !self.dev_mode {
            if self.supabase_url.is_none() {
                return Err("SUPABASE_URL is required outside dev mode".to_string());
            }
            if self.supabase_anon_key.is_none() {
                return Err("SUPABASE_ANON_KEY is required outside dev mode".to_string());
            }
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            client_id: Uuid::new_v4(),
            api_base_url: "https://trust-cart-backend.onrender.com".to_string(),
            supabase_url: Some("https://project.supabase.co".to_string()),
            supabase_anon_key: Some("anon-key".to_string()),
            dev_mode: false,
            log_level: "info".to_string(),
            request_timeout_ms: 30_000,
            smoke_email: None,
            smoke_password: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn test_provider_required_outside_dev_mode() {
        let mut args = base_args();
        args.supabase_url = None;
        assert!(args.validate().is_err());

        args.dev_mode = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut args = base_args();
        args.api_base_url = "ftp://example.com".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut args = base_args();
        args.request_timeout_ms = 0;
        assert!(args.validate().is_err());
    }
}
