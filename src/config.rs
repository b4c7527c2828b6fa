use {
    crate::{
        adapters::cryptopay::{DEFAULT_BASE_URL, PAID_BUTTON_NAMES, PaidButton},
        domain::error::PipelineError,
        services::topup::DEFAULT_INVOICE_TTL_SECS,
    },
    std::{env, str::FromStr, time::Duration},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub crypto_pay_token: String,
    pub crypto_pay_base_url: String,
    pub sweep_interval: Duration,
    pub invoice_expires_in_secs: u32,
    pub provider_timeout: Duration,
    pub paid_button: Option<PaidButton>,
    pub bind_addr: String,
}

impl Config {
    /// Read settings from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::Config(format!("{key} must be set")))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            crypto_pay_token: required("CRYPTO_PAY_TOKEN")?,
            crypto_pay_base_url: lookup("CRYPTO_PAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            sweep_interval: Duration::from_secs(positive_or(&lookup, "SWEEP_INTERVAL_SECS", 30)?),
            invoice_expires_in_secs: positive_or(&lookup, "INVOICE_EXPIRES_IN_SECS", DEFAULT_INVOICE_TTL_SECS)?,
            provider_timeout: Duration::from_secs(positive_or(&lookup, "PROVIDER_TIMEOUT_SECS", 10)?),
            paid_button: paid_button(&lookup)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, PipelineError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PipelineError::Config(format!("{key} has invalid value: {raw}"))),
    }
}

/// Like `parse_or`, but zero is refused.
fn positive_or<T: FromStr + Default + PartialEq>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, PipelineError> {
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(PipelineError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

/// The button only exists when `CRYPTO_PAY_PAID_BTN_URL` is set.
fn paid_button(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<PaidButton>, PipelineError> {
    let Some(url) = lookup("CRYPTO_PAY_PAID_BTN_URL").filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let name = lookup("CRYPTO_PAY_PAID_BTN_NAME").unwrap_or_else(|| "openBot".to_string());
    if !PAID_BUTTON_NAMES.contains(&name.as_str()) {
        return Err(PipelineError::Config(format!(
            "CRYPTO_PAY_PAID_BTN_NAME must be one of {PAID_BUTTON_NAMES:?}, got: {name}"
        )));
    }
    Ok(Some(PaidButton {
        name,
        url: url.trim().to_string(),
    }))
}
