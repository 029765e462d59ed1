// config.rs
use std::env;

/// How the webhook handler acknowledges Stripe relative to side effects.
///
/// `Sync` awaits the store append and notification before responding, so a
/// 200 means the transaction was recorded (or the append timed out, which
/// is logged). `Deferred` acknowledges immediately and runs the side
/// effects as a detached task, trading confirmed durability for response
/// latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    Sync,
    Deferred,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from_email: Option<String>,
    pub mongodb_uri: Option<String>,
    pub mongodb_user: Option<String>,
    pub mongodb_pass: Option<String>,
    pub mongodb_cluster: Option<String>,
    pub mongodb_db_name: String,
    pub transactions_file: Option<String>,
    pub ack_mode: AckMode,
    pub port: u16,
    pub host: String,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Reads every recognized variable. Nothing is required here: a missing
    /// credential disables the component that needs it, and the health
    /// endpoint reports the gap.
    pub fn from_env() -> Self {
        let ack_mode = match env::var("WEBHOOK_ACK_MODE").as_deref() {
            Ok("deferred") => AckMode::Deferred,
            _ => AckMode::Sync,
        };

        AppConfig {
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            stripe_publishable_key: optional("STRIPE_PUBLISHABLE_KEY"),
            sendgrid_api_key: optional("SENDGRID_API_KEY"),
            sendgrid_from_email: optional("SENDGRID_FROM_EMAIL"),
            mongodb_uri: optional("MONGODB_URI"),
            mongodb_user: optional("MONGODB_USER"),
            mongodb_pass: optional("MONGODB_PASS"),
            mongodb_cluster: optional("MONGODB_CLUSTER"),
            mongodb_db_name: env::var("MONGODB_DB_NAME")
                .unwrap_or_else(|_| "stripe-payments".to_string()),
            transactions_file: optional("TRANSACTIONS_FILE"),
            ack_mode,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }

    /// Connection string for MongoDB, either given directly or assembled
    /// from user/pass/cluster parameters.
    pub fn mongodb_connection_string(&self) -> Option<String> {
        if let Some(uri) = &self.mongodb_uri {
            return Some(uri.clone());
        }
        match (&self.mongodb_user, &self.mongodb_pass, &self.mongodb_cluster) {
            (Some(user), Some(pass), Some(cluster)) => Some(format!(
                "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
                user,
                urlencode(pass),
                cluster
            )),
            _ => None,
        }
    }

    pub fn email_configured(&self) -> bool {
        self.sendgrid_api_key.is_some() && self.sendgrid_from_email.is_some()
    }

    /// Credential-presence booleans for the health endpoint. Never exposes
    /// values, only whether they are set.
    pub fn env_check(&self) -> serde_json::Value {
        serde_json::json!({
            "stripe_secret": self.stripe_secret_key.is_some(),
            "stripe_webhook_secret": self.stripe_webhook_secret.is_some(),
            "stripe_publishable_key": self.stripe_publishable_key.is_some(),
            "sendgrid_api_key": self.sendgrid_api_key.is_some(),
            "sendgrid_from_email": self.sendgrid_from_email.is_some(),
            "mongodb": self.mongodb_connection_string().is_some(),
        })
    }
}

// Minimal percent-encoding for the password segment of the connection
// string; the driver rejects raw reserved characters there.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("p@ss/w:rd"), "p%40ss%2Fw%3Ard");
        assert_eq!(urlencode("plain-pass_123"), "plain-pass_123");
    }
}
