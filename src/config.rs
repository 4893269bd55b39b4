use std::{
    env::{self, VarError},
    str::FromStr,
    time::Duration,
};

use anyhow::{Context, bail};

/// The four routers this binary can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    User,
    Product,
    Cart,
    Order,
}

impl Service {
    pub const ALL: [Service; 4] = [Service::User, Service::Product, Service::Cart, Service::Order];

    pub fn path_prefix(&self) -> &'static str {
        match self {
            Service::User => "/users",
            Service::Product => "/products",
            Service::Cart => "/cart",
            Service::Order => "/orders",
        }
    }
}

impl FromStr for Service {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Service::User),
            "product" | "products" => Ok(Service::Product),
            "cart" => Ok(Service::Cart),
            "order" | "orders" => Ok(Service::Order),
            other => bail!("unknown service '{other}' in APP_SERVICES"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_max_retries: u32,
    pub connect_retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DbConfig,
    pub jwt_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub host: String,
    pub port: u16,
    pub services: Vec<Service>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000)?;

        let database = DbConfig {
            url: database_url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            connect_max_retries: parse_or("DB_CONNECT_MAX_RETRIES", 10)?,
            connect_retry_delay: Duration::from_secs(parse_or("DB_CONNECT_RETRY_SECS", 5)?),
        };
        let access_token_ttl = token_ttl(parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?)
            .context("invalid ACCESS_TOKEN_EXPIRE_MINUTES")?;

        let services = match env::var("APP_SERVICES") {
            Ok(raw) if !raw.trim().is_empty() => parse_services(&raw)?,
            _ => Service::ALL.to_vec(),
        };

        Ok(Self {
            database,
            jwt_secret,
            access_token_ttl,
            host,
            port,
            services,
        })
    }
}

const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Unset falls back to `default`; a set but unparsable value is an error.
fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("{key} is not valid unicode")),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

/// Access-token lifetime: between one minute and one year.
pub fn token_ttl(minutes: i64) -> anyhow::Result<chrono::Duration> {
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        bail!("token lifetime must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes, got {minutes}");
    }
    chrono::Duration::try_minutes(minutes).context("token lifetime is out of range")
}

pub fn parse_services(raw: &str) -> anyhow::Result<Vec<Service>> {
    let mut services = Vec::new();
    for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let service = name.parse::<Service>()?;
        if !services.contains(&service) {
            services.push(service);
        }
    }
    if services.is_empty() {
        bail!("APP_SERVICES does not name any service");
    }
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_list_and_dedups() {
        let services = parse_services("user, Orders,cart,user").unwrap();
        assert_eq!(services, vec![Service::User, Service::Order, Service::Cart]);
    }

    #[test]
    fn rejects_unknown_service() {
        let err = parse_services("user,billing").unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn rejects_empty_service_list() {
        assert!(parse_services(" , ").is_err());
    }

    #[test]
    fn malformed_numbers_are_errors_not_defaults() {
        let err = parse_value::<u16>("APP_PORT", "abc").unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
        assert!(parse_value::<u16>("APP_PORT", "70000").is_err());
        assert_eq!(parse_value::<u16>("APP_PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn token_ttl_is_bounded() {
        assert_eq!(token_ttl(30).unwrap(), chrono::Duration::minutes(30));
        assert!(token_ttl(0).is_err());
        assert!(token_ttl(-5).is_err());
        assert!(token_ttl(i64::MAX).is_err());
        assert!(token_ttl(MAX_TOKEN_TTL_MINUTES).is_ok());
    }

    #[test]
    fn prefixes_match_router_mounts() {
        let prefixes: Vec<_> = Service::ALL.iter().map(Service::path_prefix).collect();
        assert_eq!(prefixes, vec!["/users", "/products", "/cart", "/orders"]);
    }
}
