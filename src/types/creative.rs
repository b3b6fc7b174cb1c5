use serde::{Deserialize, Serialize};

use super::lenient;

/// 针对某个广告系列的新文案建议
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CreativeSuggestion {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub campaign_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub angle: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub headline: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub target_ctr: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub rationale: String,
}
