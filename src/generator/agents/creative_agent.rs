use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::generator::agents::DataAgent;
use crate::generator::context::GeneratorContext;
use crate::generator::stage::{Stage, StageOutput, StageScope};
use crate::types::summary::CampaignDetails;
use crate::types::{CreativeSuggestion, Dataset, Insights, StageKind, Validation};
use crate::utils::prompts::PromptKind;
use crate::utils::response_parser::parse_list;
use crate::utils::{stats, truncate_chars};

/// 兜底文案的切入角度，按顺序轮换
pub const FALLBACK_ANGLES: [&str; 5] = [
    "Value Proposition",
    "Urgency-Based",
    "Benefit-Focused",
    "Problem-Solution",
    "Social Proof",
];

/// 为低效广告系列生成新的文案建议
pub struct CreativeAgent {
    context: GeneratorContext,
    dataset: Arc<Dataset>,
}

impl CreativeAgent {
    pub fn new(context: GeneratorContext, dataset: Arc<Dataset>) -> Self {
        Self { context, dataset }
    }

    pub async fn generate_creatives(
        &self,
        insights: Option<&Insights>,
        validation: Option<&Validation>,
        num_suggestions: usize,
    ) -> Vec<CreativeSuggestion> {
        tracing::info!("开始生成文案建议");

        let targets = self.target_campaigns();
        if targets.is_empty() {
            tracing::info!("没有需要更新文案的广告系列");
            return Vec::new();
        }

        let mut creatives = Vec::new();
        for campaign in targets
            .iter()
            .take(self.context.config.creative.max_campaigns)
        {
            creatives.extend(
                self.generate_for_campaign(campaign, insights, validation, num_suggestions)
                    .await,
            );
        }

        tracing::info!("生成了{}条文案建议", creatives.len());
        creatives
    }

    /// 平均ROAS低于全部记录ROAS 25分位数的广告系列，按名称排序
    pub fn target_campaigns(&self) -> Vec<String> {
        let Some(threshold) = stats::quantile(&self.dataset.roas_values(), 0.25) else {
            return Vec::new();
        };

        self.dataset
            .group_by_campaign()
            .into_iter()
            .filter_map(|(name, records)| {
                let roas: Vec<f64> = records.iter().filter_map(|r| r.roas).collect();
                stats::mean(&roas)
                    .filter(|avg| *avg < threshold)
                    .map(|_| name.to_string())
            })
            .collect()
    }

    async fn generate_for_campaign(
        &self,
        campaign: &str,
        insights: Option<&Insights>,
        validation: Option<&Validation>,
        num_suggestions: usize,
    ) -> Vec<CreativeSuggestion> {
        let details = DataAgent::campaign_details(&self.dataset, campaign);
        let system_prompt = self.context.system_prompt(PromptKind::Creative);
        let user_prompt = Self::build_user_prompt(
            campaign,
            details.as_ref(),
            insights,
            validation,
            num_suggestions,
        );
        let response = self.context.generate(&system_prompt, &user_prompt).await;

        match Self::parse_creatives(&response, campaign) {
            Ok(creatives) => creatives,
            Err(e) => {
                tracing::warn!("⚠️ 无法解析{}的文案建议，使用默认文案: {}", campaign, e);
                self.fallback_creatives(campaign, num_suggestions)
            }
        }
    }

    fn build_user_prompt(
        campaign: &str,
        details: Option<&CampaignDetails>,
        insights: Option<&Insights>,
        validation: Option<&Validation>,
        num_suggestions: usize,
    ) -> String {
        let existing: &[String] = details.map(|d| d.creative_samples.as_slice()).unwrap_or_default();
        let existing_json =
            serde_json::to_string_pretty(existing).unwrap_or_else(|_| "[]".to_string());
        let performance = details
            .map(|d| {
                format!(
                    "{} records, average ROAS {}, average CTR {}, total spend {:.2}",
                    d.record_count,
                    d.avg_roas.map_or("n/a".to_string(), |v| format!("{:.2}", v)),
                    d.avg_ctr.map_or("n/a".to_string(), |v| format!("{:.4}", v)),
                    d.total_spend
                )
            })
            .unwrap_or_else(|| "No performance data".to_string());
        let hypotheses_json = insights
            .and_then(|i| serde_json::to_string_pretty(&i.hypotheses).ok())
            .unwrap_or_else(|| "[]".to_string());
        let issue = validation
            .map(|v| v.recommendation.action.as_str())
            .unwrap_or("General optimization");

        format!(
            r#"Generate {} new creative ideas for this campaign:

Campaign: {}

Performance: {}

Existing Creatives:
{}

Insights:
{}

Performance Issues: {}

Generate new headline and message combinations that address the issues.
Return JSON with a "creatives" array; each item has angle, headline, message, target_ctr and rationale."#,
            num_suggestions, campaign, performance, existing_json, hypotheses_json, issue
        )
    }

    fn parse_creatives(response: &str, campaign: &str) -> Result<Vec<CreativeSuggestion>> {
        let items = parse_list(response, "creatives")?;
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(anyhow!("creative item is not an object"));
                }
                let mut creative: CreativeSuggestion = serde_json::from_value(item)?;
                creative.campaign_name = campaign.to_string();
                if creative.id.trim().is_empty() {
                    creative.id = format!("{}_creative_{}", campaign, index + 1);
                }
                Ok(creative)
            })
            .collect()
    }

    /// 模型不可用时的固定角度文案
    pub fn fallback_creatives(&self, campaign: &str, num_suggestions: usize) -> Vec<CreativeSuggestion> {
        tracing::info!("为{}使用默认文案", campaign);
        let existing = self
            .dataset
            .campaign_records(campaign)
            .first()
            .and_then(|r| r.creative_message.clone())
            .unwrap_or_else(|| "No creative available".to_string());
        let excerpt = truncate_chars(&existing, 100);

        FALLBACK_ANGLES
            .iter()
            .take(num_suggestions)
            .enumerate()
            .map(|(index, angle)| CreativeSuggestion {
                id: format!("{}_creative_{}", campaign, index + 1),
                campaign_name: campaign.to_string(),
                angle: angle.to_string(),
                headline: format!("{} - Campaign Headline", angle),
                message: format!(
                    "Based on existing creative: {}... Our new angle: {}",
                    excerpt, angle
                ),
                target_ctr: "2.0-3.0%".to_string(),
                rationale: format!("Testing {} approach for better engagement", angle.to_lowercase()),
            })
            .collect()
    }
}

#[async_trait]
impl Stage for CreativeAgent {
    fn kind(&self) -> StageKind {
        StageKind::Creative
    }

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
        // 上游不可用时仍然生成文案，只是缺少对应的上下文
        let insights = scope
            .insights()
            .await
            .inspect_err(|e| tracing::warn!("⚠️ 无法获取洞察结果: {}", e))
            .ok();
        let validation = scope
            .validation()
            .await
            .inspect_err(|e| tracing::warn!("⚠️ 无法获取验证结果: {}", e))
            .ok();

        Ok(StageOutput::Creatives(
            self.generate_creatives(
                insights.as_ref(),
                validation.as_ref(),
                self.context.config.creative.num_suggestions,
            )
            .await,
        ))
    }
}
