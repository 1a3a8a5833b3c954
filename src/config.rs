use rand::Rng;
use serde::Deserialize;
use tracing::warn;

const SECRET_KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GENERATED_SECRET_LEN: usize = 64;

/// Minimum secret length accepted; the cookie signing key is derived from it.
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub secret_key: String,
    pub cookie_secure: bool,
    pub csrf_token_ttl_secs: i64,
    pub session_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) => {
                if key.len() < MIN_SECRET_LEN {
                    anyhow::bail!("SECRET_KEY must be at least {} bytes", MIN_SECRET_LEN);
                }
                key
            }
            Err(_) => {
                warn!("SECRET_KEY not set; generated a per-process key, sessions will not survive a restart");
                generate_secret_key()
            }
        };

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v != "false")
            .unwrap_or(true);
        let csrf_token_ttl_secs = std::env::var("CSRF_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600);
        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1800);

        Ok(Self {
            database_url,
            secret_key,
            cookie_secure,
            csrf_token_ttl_secs,
            session_ttl_secs,
        })
    }
}

fn generate_secret_key() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_SECRET_LEN)
        .map(|_| SECRET_KEY_CHARS[rng.gen_range(0..SECRET_KEY_CHARS.len())] as char)
        .collect()
}
