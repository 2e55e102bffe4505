use serde::{Deserialize, Serialize};

use super::short_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Resource name, `properties/{property_id}`
    pub name: String,
    pub parent: Option<String>,
    pub display_name: Option<String>,
    pub property_type: Option<String>,
    pub time_zone: Option<String>,
    pub currency_code: Option<String>,
    pub industry_category: Option<String>,
    pub create_time: Option<String>,
}

impl Property {
    pub fn id(&self) -> &str {
        short_id(&self.name)
    }
}

/// Request body for creating a GA4 property under an account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub parent: String,
    pub display_name: String,
    pub time_zone: String,
    pub currency_code: String,
    pub industry_category: String,
}

impl NewProperty {
    pub fn new(
        account_id: &str,
        display_name: impl Into<String>,
        time_zone: impl Into<String>,
        currency_code: impl Into<String>,
        industry_category: impl Into<String>,
    ) -> Self {
        Self {
            parent: format!("accounts/{}", account_id),
            display_name: display_name.into(),
            time_zone: time_zone.into(),
            currency_code: currency_code.into(),
            industry_category: industry_category.into(),
        }
    }
}
