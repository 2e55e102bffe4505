use serde::{Deserialize, Serialize};

use super::short_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Resource name, `accounts/{account_id}`
    pub name: String,
    pub display_name: Option<String>,
    pub region_code: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Account {
    pub fn id(&self) -> &str {
        short_id(&self.name)
    }
}
