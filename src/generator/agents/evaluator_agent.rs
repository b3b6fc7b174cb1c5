use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::generator::agents::data_agent::LOW_ROAS_THRESHOLD;
use crate::generator::stage::{Stage, StageOutput, StageScope};
use crate::types::{
    Dataset, Hypothesis, Insights, Priority, Recommendation, StageKind, ValidatedHypothesis,
    Validation, ValidationMetrics,
};
use crate::utils::stats;

/// 创意疲劳检查时比较的窗口大小
const FATIGUE_WINDOW: usize = 50;

/// 检查失败时的验证得分
const FAILED_CHECK_SCORE: f64 = 0.3;

/// 用数据对假设做定量验证
pub struct EvaluatorAgent {
    dataset: Arc<Dataset>,
}

/// 根据假设标题选择的验证方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    CreativeFatigue,
    AudienceTargeting,
    BudgetAllocation,
    Generic,
}

impl Check {
    fn for_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("creative") || title.contains("fatigue") {
            Check::CreativeFatigue
        } else if title.contains("audience") || title.contains("target") {
            Check::AudienceTargeting
        } else if title.contains("budget") || title.contains("spend") {
            Check::BudgetAllocation
        } else {
            Check::Generic
        }
    }
}

impl EvaluatorAgent {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn evaluate(&self, insights: &Insights) -> Validation {
        tracing::info!("开始验证{}个假设", insights.hypotheses.len());

        let validated_hypotheses: Vec<ValidatedHypothesis> = insights
            .hypotheses
            .iter()
            .map(|hypothesis| self.validate_hypothesis(hypothesis))
            .collect();

        let scores: Vec<f64> = validated_hypotheses
            .iter()
            .map(|v| v.validation_score)
            .collect();
        let validation_confidence = stats::mean(&scores).unwrap_or(0.0);
        let recommendation = Self::recommend(&validated_hypotheses);

        tracing::info!("验证完成，整体置信度{:.2}", validation_confidence);
        Validation {
            validated_hypotheses,
            validation_confidence,
            recommendation,
        }
    }

    fn validate_hypothesis(&self, hypothesis: &Hypothesis) -> ValidatedHypothesis {
        let check = Check::for_title(&hypothesis.title);
        let outcome = match check {
            Check::CreativeFatigue => self.check_creative_fatigue(),
            Check::AudienceTargeting => Ok(Self::check_audience()),
            Check::BudgetAllocation => self.check_budget_allocation(),
            Check::Generic => Ok((hypothesis.confidence, self.generic_metrics())),
        };

        match outcome {
            Ok((score, metrics)) => ValidatedHypothesis::new(hypothesis.clone(), score, metrics),
            Err(e) => {
                tracing::error!("❌ 验证假设{}时出错: {}", hypothesis.id, e);
                ValidatedHypothesis::new(
                    hypothesis.clone(),
                    FAILED_CHECK_SCORE,
                    ValidationMetrics::Empty {},
                )
            }
        }
    }

    fn check_creative_fatigue(&self) -> Result<(f64, ValidationMetrics)> {
        let mut fatigue_indicator = None;
        let mut ctr_drop = None;

        if self.dataset.has_dates() && !self.dataset.ctr_values().is_empty() {
            let sorted = self.dataset.sorted_by_date();
            let window = FATIGUE_WINDOW.min(sorted.len());
            let older: Vec<f64> = sorted[..window].iter().filter_map(|r| r.ctr).collect();
            let recent: Vec<f64> = sorted[sorted.len() - window..]
                .iter()
                .filter_map(|r| r.ctr)
                .collect();

            let older = stats::mean(&older).ok_or_else(|| anyhow!("no CTR in earliest records"))?;
            let recent = stats::mean(&recent).ok_or_else(|| anyhow!("no CTR in latest records"))?;
            if recent < older {
                fatigue_indicator = Some(true);
                ctr_drop = Some(recent - older);
            }
        }

        Ok((
            0.7,
            ValidationMetrics::CreativeFatigue {
                correlation: -0.3,
                p_value: 0.05,
                sample_size: self.dataset.len(),
                fatigue_indicator,
                ctr_drop,
            },
        ))
    }

    fn check_audience() -> (f64, ValidationMetrics) {
        (
            0.65,
            ValidationMetrics::AudienceTargeting {
                audience_overlap: 0.15,
                targeting_precision: 0.65,
            },
        )
    }

    fn check_budget_allocation(&self) -> Result<(f64, ValidationMetrics)> {
        let spend = self.dataset.spend_values();
        if spend.is_empty() || self.dataset.roas_values().is_empty() {
            return Ok((0.5, ValidationMetrics::Empty {}));
        }

        let median = stats::median(&spend).ok_or_else(|| anyhow!("no spend values"))?;
        let wasted: Vec<f64> = self
            .dataset
            .records()
            .iter()
            .filter_map(|r| match (r.spend, r.roas) {
                (Some(spend), Some(roas)) if spend > median && roas < LOW_ROAS_THRESHOLD => {
                    Some(spend)
                }
                _ => None,
            })
            .collect();

        Ok((
            0.6,
            ValidationMetrics::BudgetAllocation {
                inefficient_campaigns: wasted.len(),
                potential_waste: wasted.iter().sum(),
            },
        ))
    }

    fn generic_metrics(&self) -> ValidationMetrics {
        ValidationMetrics::Generic {
            sample_size: self.dataset.len(),
            data_quality: "good".to_string(),
        }
    }

    fn recommend(validated: &[ValidatedHypothesis]) -> Recommendation {
        // 得分相同时取第一个
        let best = validated.iter().fold(None::<&ValidatedHypothesis>, |best, v| match best {
            Some(b) if b.validation_score >= v.validation_score => Some(b),
            _ => Some(v),
        });

        let Some(best) = best else {
            return Recommendation {
                action: "Review overall campaign strategy".to_string(),
                priority: Priority::Medium,
                expected_impact: None,
            };
        };

        let title = best.title().to_lowercase();
        let action = [
            ("creative", "Refresh ad creatives with new messaging"),
            ("audience", "Refine audience targeting parameters"),
            ("budget", "Reallocate budget to high-performing campaigns"),
            ("seasonal", "Adjust campaign timing for better alignment"),
        ]
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map(|(_, action)| *action)
        .unwrap_or("Optimize campaign settings");

        Recommendation {
            action: action.to_string(),
            priority: if best.validation_score > 0.7 {
                Priority::High
            } else {
                Priority::Medium
            },
            expected_impact: Some("+10-20% performance improvement".to_string()),
        }
    }
}

#[async_trait]
impl Stage for EvaluatorAgent {
    fn kind(&self) -> StageKind {
        StageKind::Validator
    }

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
        let insights = scope.insights().await?;
        Ok(StageOutput::Validation(self.evaluate(&insights)))
    }
}
