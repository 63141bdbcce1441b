//! Typed key/value settings read at order-pricing time.

use std::collections::BTreeMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use galley_core::DomainError;
use galley_kitchen::PricingSettings;

use crate::error::{ServiceError, ServiceResult};

pub const TAX_RATE: &str = "tax_rate";
pub const DELIVERY_FEE: &str = "delivery_fee";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SettingValue {
    String(String),
    Number(Decimal),
    Boolean(bool),
    Json(JsonValue),
}

#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> ServiceResult<Option<SettingValue>> {
        let values = self.values.read().map_err(|_| ServiceError::poisoned("settings"))?;
        Ok(values.get(key).cloned())
    }

    pub fn set(&self, key: impl Into<String>, value: SettingValue) -> ServiceResult<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::validation("setting key cannot be empty").into());
        }
        if matches!(key.as_str(), TAX_RATE | DELIVERY_FEE) {
            match &value {
                SettingValue::Number(n) if *n >= Decimal::ZERO => {}
                _ => {
                    return Err(DomainError::validation(format!(
                        "{key} must be a non-negative number"
                    ))
                    .into());
                }
            }
        }
        let mut values = self.values.write().map_err(|_| ServiceError::poisoned("settings"))?;
        tracing::info!(key = %key, "setting updated");
        values.insert(key, value);
        Ok(())
    }

    /// Numeric setting. Missing keys read as `None`; other types are an error.
    pub fn number(&self, key: &str) -> ServiceResult<Option<Decimal>> {
        match self.get(key)? {
            None => Ok(None),
            Some(SettingValue::Number(n)) => Ok(Some(n)),
            Some(_) => Err(DomainError::validation(format!("setting {key} is not a number")).into()),
        }
    }

    pub fn list(&self) -> ServiceResult<Vec<(String, SettingValue)>> {
        let values = self.values.read().map_err(|_| ServiceError::poisoned("settings"))?;
        Ok(values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Current tax rate and delivery fee; unset keys count as zero.
    pub fn pricing(&self) -> ServiceResult<PricingSettings> {
        Ok(PricingSettings {
            tax_rate: self.number(TAX_RATE)?.unwrap_or_default(),
            delivery_fee: self.number(DELIVERY_FEE)?.unwrap_or_default(),
        })
    }
}
