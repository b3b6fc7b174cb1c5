use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};

use crate::generator::context::GeneratorContext;
use crate::generator::stage::{Stage, StageOutput, StageScope};
use crate::types::{DataSummary, Hypothesis, Insights, StageKind};
use crate::utils::prompts::PromptKind;
use crate::utils::response_parser::{ParseError, parse_object};
use crate::utils::truncate_chars;

static CONFIDENCE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("confidence pattern is valid"));

const DEFAULT_CONFIDENCE: f64 = 0.5;

/// 洞察生成：根据数据摘要提出性能变化的原因假设
pub struct InsightAgent {
    context: GeneratorContext,
}

impl InsightAgent {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }

    pub async fn generate_insights(&self, summary: &DataSummary, query: &str) -> Insights {
        tracing::info!("洞察生成开始");

        let system_prompt = self.context.system_prompt(PromptKind::Insight);
        let user_prompt = Self::build_user_prompt(summary, query);
        let response = self.context.generate(&system_prompt, &user_prompt).await;

        let insights = match parse_object(&response) {
            Ok(object) => {
                let mut object = Self::wrap_single_hypothesis(object);
                Self::normalize_confidences(&mut object);
                match serde_json::from_value::<Insights>(Value::Object(object)) {
                    Ok(insights) => Self::fill_missing_ids(insights),
                    Err(e) => {
                        tracing::warn!("⚠️ 洞察结构不符合预期，根据数据模式生成: {}", e);
                        Self::pattern_insights(summary)
                    }
                }
            }
            Err(e @ ParseError::UnexpectedShape { .. }) => {
                tracing::warn!("⚠️ 洞察结构不符合预期，根据数据模式生成: {}", e);
                Self::pattern_insights(summary)
            }
            Err(e) => {
                tracing::warn!("⚠️ 无法解析洞察JSON: {}", e);
                Self::unknown_issue(&response)
            }
        };

        tracing::info!("生成了{}个假设", insights.hypotheses.len());
        insights
    }

    fn build_user_prompt(summary: &DataSummary, query: &str) -> String {
        let summary_json =
            serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
        format!(
            r#"Analyze the following data and generate insights:

Query: {}

Data Summary:
{}

Generate structured hypotheses about what's causing performance issues.
Return JSON with hypotheses array, primary_cause, and recommended_actions."#,
            query, summary_json
        )
    }

    /// 把置信度统一为[0,1]区间的数字
    ///
    /// 字符串取第一个数字并按百分比换算，无法识别的取0.5。
    pub fn normalize_confidence(value: Option<&Value>) -> f64 {
        let confidence = match value {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
            Some(Value::String(text)) => CONFIDENCE_NUMBER
                .find(text)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|n| n / 100.0)
                .unwrap_or(DEFAULT_CONFIDENCE),
            _ => DEFAULT_CONFIDENCE,
        };
        confidence.clamp(0.0, 1.0)
    }

    /// 单个假设对象包装成只有一个元素的列表
    ///
    /// 覆盖`{"hypotheses": {...}}`以及直接返回单个假设对象两种情况。
    fn wrap_single_hypothesis(mut object: Map<String, Value>) -> Map<String, Value> {
        match object.remove("hypotheses") {
            Some(single @ Value::Object(_)) => {
                object.insert("hypotheses".to_string(), Value::Array(vec![single]));
                object
            }
            Some(other) => {
                object.insert("hypotheses".to_string(), other);
                object
            }
            None if object.contains_key("title") => {
                let mut wrapped = Map::new();
                wrapped.insert(
                    "hypotheses".to_string(),
                    Value::Array(vec![Value::Object(object)]),
                );
                wrapped
            }
            None => object,
        }
    }

    fn normalize_confidences(object: &mut Map<String, Value>) {
        let Some(Value::Array(hypotheses)) = object.get_mut("hypotheses") else {
            return;
        };
        for hypothesis in hypotheses.iter_mut() {
            if let Value::Object(fields) = hypothesis {
                let confidence = Self::normalize_confidence(fields.get("confidence"));
                fields.insert("confidence".to_string(), Value::from(confidence));
            }
        }
    }

    fn fill_missing_ids(mut insights: Insights) -> Insights {
        for (index, hypothesis) in insights.hypotheses.iter_mut().enumerate() {
            if hypothesis.id.trim().is_empty() {
                hypothesis.id = format!("hyp_{}", index + 1);
            }
        }
        insights
    }

    fn unknown_issue(response: &str) -> Insights {
        Insights {
            hypotheses: vec![Hypothesis {
                id: "hypothesis_1".to_string(),
                title: "Unknown Issue".to_string(),
                description: truncate_chars(response.trim(), 200),
                confidence: DEFAULT_CONFIDENCE,
                severity: "medium".to_string(),
                evidence: Vec::new(),
            }],
            ..Default::default()
        }
    }

    /// 模型路径完全不可用时，直接把数据模式转成假设
    pub fn pattern_insights(summary: &DataSummary) -> Insights {
        tracing::info!("使用数据模式生成默认洞察");
        let hypotheses = summary
            .patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| Hypothesis {
                id: format!("hyp_{}", index + 1),
                title: pattern.clone(),
                description: format!("Data shows: {}", pattern),
                confidence: 0.7,
                severity: "medium".to_string(),
                evidence: vec![pattern.clone()],
            })
            .collect();

        Insights {
            hypotheses,
            primary_cause: Some("data_insufficient".to_string()),
            recommended_actions: vec![
                "Review campaign settings".to_string(),
                "Check audience targeting".to_string(),
                "Analyze creative performance".to_string(),
            ],
        }
    }
}

#[async_trait]
impl Stage for InsightAgent {
    fn kind(&self) -> StageKind {
        StageKind::Hypothesizer
    }

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
        let summary = scope.summary().await?;
        Ok(StageOutput::Insights(
            self.generate_insights(&summary, scope.query).await,
        ))
    }
}
