use serde::{Deserialize, Serialize};

use super::lenient;

fn default_confidence() -> f64 {
    0.5
}

fn default_severity() -> String {
    "medium".to_string()
}

/// 对表现变化的一个候选解释
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Hypothesis {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    /// 置信度，归一化到[0,1]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_severity", deserialize_with = "lenient::string")]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub evidence: Vec<String>,
}

/// 洞察阶段的输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Insights {
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_cause: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub recommended_actions: Vec<String>,
}

/// 假设的验证强度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl Strength {
    pub const STRONG_THRESHOLD: f64 = 0.8;
    pub const MEDIUM_THRESHOLD: f64 = 0.6;

    /// 由验证分数推导强度与有效性，全局唯一的判定规则
    pub fn classify(score: f64) -> (Strength, bool) {
        if score >= Self::STRONG_THRESHOLD {
            (Strength::Strong, true)
        } else if score >= Self::MEDIUM_THRESHOLD {
            (Strength::Medium, true)
        } else {
            (Strength::Weak, false)
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Weak => write!(f, "weak"),
            Strength::Medium => write!(f, "medium"),
            Strength::Strong => write!(f, "strong"),
        }
    }
}

/// 不同检查项产出的固定结构指标
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ValidationMetrics {
    CreativeFatigue {
        correlation: f64,
        p_value: f64,
        sample_size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fatigue_indicator: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ctr_drop: Option<f64>,
    },
    AudienceTargeting {
        audience_overlap: f64,
        targeting_precision: f64,
    },
    BudgetAllocation {
        inefficient_campaigns: usize,
        potential_waste: f64,
    },
    Generic {
        sample_size: usize,
        data_quality: String,
    },
    Empty {},
}

/// 经过量化验证的假设
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValidatedHypothesis {
    #[serde(flatten)]
    pub hypothesis: Hypothesis,
    pub validation_score: f64,
    pub metrics: ValidationMetrics,
    pub is_valid: bool,
    pub strength: Strength,
}

impl ValidatedHypothesis {
    pub fn new(hypothesis: Hypothesis, validation_score: f64, metrics: ValidationMetrics) -> Self {
        let (strength, is_valid) = Strength::classify(validation_score);
        Self {
            hypothesis,
            validation_score,
            metrics,
            is_valid,
            strength,
        }
    }

    pub fn title(&self) -> &str {
        &self.hypothesis.title
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    pub action: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_impact: Option<String>,
}

/// 验证阶段的输出
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Validation {
    pub validated_hypotheses: Vec<ValidatedHypothesis>,
    pub validation_confidence: f64,
    pub recommendation: Recommendation,
}
