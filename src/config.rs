use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub currency: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub root_password: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let root_password = std::env::var("ROOT_PASSWORD").unwrap_or_else(|_| "admin123".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "resalex".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "resalex-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "resalex-uploads".into()),
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        let payment = PaymentConfig {
            secret_key: std::env::var("STRIPE_SECRET_KEY")?,
            currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".into()),
            timeout_secs: std::env::var("PAYMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            root_password,
            jwt,
            storage,
            payment,
        })
    }
}
