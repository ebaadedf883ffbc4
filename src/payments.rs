use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::PaymentConfig;

/// An in-progress payment authorization issued by the provider.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Payment capability. The only external-latency boundary in the core;
/// implementations must carry a bounded request timeout.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        order_id: Uuid,
    ) -> anyhow::Result<PaymentIntent>;
}

/// Converts a decimal amount into provider minor units (cents).
pub fn amount_minor_units(amount: Decimal) -> anyhow::Result<i64> {
    amount
        .checked_mul(Decimal::from(100))
        .map(|v| v.round())
        .and_then(|v| v.to_i64())
        .context("amount out of range for minor units")
}

pub struct StripeProvider {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeProvider {
    pub fn new(cfg: &PaymentConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build payment http client")?;
        Ok(Self {
            http,
            secret_key: cfg.secret_key.clone(),
            base_url: "https://api.stripe.com".into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        order_id: Uuid,
    ) -> anyhow::Result<PaymentIntent> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[order_id]", order_id.to_string()),
        ];
        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .context("payment intent request")?;

        if !resp.status().is_success() {
            anyhow::bail!("payment provider returned {}", resp.status());
        }

        let intent: IntentResponse = resp.json().await.context("decode payment intent")?;
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn whole_prices_convert_to_cents() {
        let amount = Decimal::from_str("180.00").unwrap();
        assert_eq!(amount_minor_units(amount).unwrap(), 18000);
    }

    #[test]
    fn sub_unit_prices_round() {
        assert_eq!(
            amount_minor_units(Decimal::from_str("0.99").unwrap()).unwrap(),
            99
        );
        assert_eq!(
            amount_minor_units(Decimal::from_str("1234.56").unwrap()).unwrap(),
            123456
        );
    }

    #[test]
    fn oversized_amount_is_an_error() {
        let huge = Decimal::MAX;
        assert!(amount_minor_units(huge).is_err());
    }
}
