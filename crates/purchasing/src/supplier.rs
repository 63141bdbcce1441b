use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galley_core::{AggregateRoot, DomainError, DomainResult, SupplierId};

/// Contact information for a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Fields accepted when registering a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

/// A supplier that purchases are placed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    contact: ContactInfo,
    is_active: bool,
    created_at: DateTime<Utc>,
    version: u64,
}

impl Supplier {
    pub fn register(id: SupplierId, fields: &NewSupplier, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = fields.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("supplier name cannot be empty"));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            contact: fields.contact.clone(),
            is_active: true,
            created_at: now,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl AggregateRoot for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
