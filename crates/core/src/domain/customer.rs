use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rendered in place of an absent phone number.
pub const PHONE_PLACEHOLDER: &str = "—";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    /// Storage-assigned identifier. Assigned once at insert and never
    /// rewritten afterwards.
    pub fn generate() -> Self {
        Self(format!("C-{}", &Uuid::new_v4().simple().to_string()[..12]))
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read projection of a stored customer.
///
/// The opaque `raw` payload stays in the storage layer; it has no field here,
/// so it cannot leak into a view or an API response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl Customer {
    /// Phone value for display. Absent or blank numbers render as the
    /// placeholder dash, never as an empty string.
    pub fn phone_display(&self) -> &str {
        self.phone.as_deref().filter(|phone| !phone.trim().is_empty()).unwrap_or(PHONE_PLACEHOLDER)
    }
}

/// Insert shape produced by the import feed mapper. `raw` is the full source
/// object, carried opaquely for later inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub raw: serde_json::Value,
}
