use serde::{Deserialize, Serialize};

use crate::utils::units::WeightUnit;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub weight_unit: WeightUnit,
    /// IANA timezone used for day bucketing; system local time when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateInput {
    #[serde(default)]
    pub weight_unit: Option<WeightUnit>,
    /// `null` clears the stored timezone.
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub timezone: Option<Option<String>>,
}
