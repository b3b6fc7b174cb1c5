use serde::{Deserialize, Serialize};

/// 数据分析阶段的输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DataSummary {
    pub total_campaigns: usize,
    pub total_records: usize,
    pub date_range: DateRange,
    pub metrics: SummaryMetrics,
    /// 识别出的模式，每条是一句可读的描述
    pub patterns: Vec<String>,
    pub outliers: Outliers,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// 各指标的描述统计，数据中没有的指标为None并在序列化时省略
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SummaryMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<RoasStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<CtrStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend: Option<SpendStats>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoasStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CtrStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpendStats {
    pub total: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Outliers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<Vec<Outlier>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutlierKind {
    High,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Outlier {
    pub campaign: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: OutlierKind,
}

/// 单个广告系列的明细
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CampaignDetails {
    pub campaign_name: String,
    pub record_count: usize,
    pub avg_roas: Option<f64>,
    pub avg_ctr: Option<f64>,
    pub total_spend: f64,
    pub creative_samples: Vec<String>,
}
