use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::generator::results::RunResults;
use crate::generator::stage::StageOutput;
use crate::types::{
    CreativeSuggestion, DataSummary, Dataset, Insights, Priority, StageKind, Validation,
};

/// 一次分析的最终报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub query: String,
    pub timestamp: String,
    pub summary: ReportSummary,
    pub data_summary: Option<DataSummary>,
    pub insights: Option<Insights>,
    pub validated_insights: Option<Validation>,
    pub creative_suggestions: Vec<CreativeSuggestion>,
    pub recommendations: Vec<ReportRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_records: usize,
    pub total_campaigns: usize,
    pub analysis_status: String,
}

/// 报告中的行动建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportRecommendation {
    /// 来自验证阶段的优化建议
    Optimization {
        action: String,
        priority: Priority,
        expected_impact: String,
    },
    /// 来自洞察阶段的行动项
    Action {
        description: String,
        priority: Priority,
    },
}

impl ReportRecommendation {
    pub fn title(&self) -> &str {
        match self {
            ReportRecommendation::Optimization { action, .. } => action,
            ReportRecommendation::Action { description, .. } => description,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            ReportRecommendation::Optimization { priority, .. }
            | ReportRecommendation::Action { priority, .. } => *priority,
        }
    }

    pub fn expected_impact(&self) -> &str {
        match self {
            ReportRecommendation::Optimization {
                expected_impact, ..
            } => expected_impact,
            ReportRecommendation::Action { .. } => "Positive",
        }
    }
}

impl Report {
    pub fn hypothesis_count(&self) -> usize {
        self.insights
            .as_ref()
            .map(|i| i.hypotheses.len())
            .unwrap_or(0)
    }
}

/// 从结果表汇总报告：每个阶段取约定id上的输出，否则取最近一次的同类输出
pub fn assemble(query: &str, dataset: &Dataset, results: &RunResults) -> Report {
    let data_summary = match results.find(StageKind::Summarizer) {
        Some(StageOutput::Summary(summary)) => Some(summary.clone()),
        _ => None,
    };
    let insights = match results.find(StageKind::Hypothesizer) {
        Some(StageOutput::Insights(insights)) => Some(insights.clone()),
        _ => None,
    };
    let validated_insights = match results.find(StageKind::Validator) {
        Some(StageOutput::Validation(validation)) => Some(validation.clone()),
        _ => None,
    };
    let creative_suggestions = match results.find(StageKind::Creative) {
        Some(StageOutput::Creatives(creatives)) => creatives.clone(),
        _ => Vec::new(),
    };

    let recommendations = extract_recommendations(validated_insights.as_ref(), insights.as_ref());

    Report {
        query: query.to_string(),
        timestamp: Local::now().to_rfc3339(),
        summary: ReportSummary {
            total_records: dataset.len(),
            total_campaigns: dataset.campaign_count(),
            analysis_status: "completed".to_string(),
        },
        data_summary,
        insights,
        validated_insights,
        creative_suggestions,
        recommendations,
    }
}

fn extract_recommendations(
    validation: Option<&Validation>,
    insights: Option<&Insights>,
) -> Vec<ReportRecommendation> {
    let mut recommendations = Vec::new();

    if let Some(validation) = validation {
        let recommendation = &validation.recommendation;
        recommendations.push(ReportRecommendation::Optimization {
            action: recommendation.action.clone(),
            priority: recommendation.priority,
            expected_impact: recommendation
                .expected_impact
                .clone()
                .unwrap_or_else(|| "Positive".to_string()),
        });
    }

    if let Some(insights) = insights {
        recommendations.extend(insights.recommended_actions.iter().map(|action| {
            ReportRecommendation::Action {
                description: action.clone(),
                priority: Priority::Medium,
            }
        }));
    }

    recommendations
}
