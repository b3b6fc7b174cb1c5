//! 离线模式下的确定性响应
//!
//! 通过提示词中的关键字判断调用方所处的阶段，按固定优先级返回预置的响应，
//! 保证没有API KEY或网络不可用时整条流水线仍然可以完整运行。

use async_trait::async_trait;

use super::TextGenerator;

const PLAN_RESPONSE: &str = r#"{
  "tasks": [
    {"id": "task_1", "agent": "data_agent", "description": "Summarize dataset"},
    {"id": "task_2", "agent": "insight_agent", "description": "Generate hypotheses", "dependencies": ["task_1"]},
    {"id": "task_3", "agent": "evaluator_agent", "description": "Validate with metrics", "dependencies": ["task_2"]},
    {"id": "task_4", "agent": "creative_agent", "description": "Generate creative suggestions", "dependencies": ["task_3"]}
  ]
}"#;

const INSIGHT_RESPONSE: &str = r#"{
  "hypotheses": [
    {
      "id": "hyp_1",
      "title": "Creative Fatigue",
      "description": "Ad creatives showing declining engagement over time",
      "confidence": 0.75,
      "evidence": ["CTR dropped significantly over campaign duration"],
      "severity": "high"
    }
  ],
  "primary_cause": "hyp_1",
  "recommended_actions": [
    "Refresh creative messaging",
    "Test new ad formats"
  ]
}"#;

const EVALUATOR_RESPONSE: &str = r#"{
  "validated_hypotheses": [
    {
      "hypothesis_id": "hyp_1",
      "title": "Creative Fatigue",
      "validation_score": 0.82,
      "metrics": {"correlation": -0.75, "p_value": 0.001, "sample_size": 150},
      "is_valid": true,
      "strength": "strong"
    }
  ],
  "recommendation": {
    "action": "Refresh creative",
    "priority": "high",
    "expected_impact": "+15-25% CTR"
  }
}"#;

const CREATIVE_RESPONSE: &str = r#"{
  "creatives": [
    {
      "angle": "Value-focused",
      "headline": "Save 40% on Premium Quality - Limited Time",
      "message": "Get the best value now! Our biggest sale is ending soon. Shop now and save big.",
      "target_ctr": "2.5-3.5%",
      "rationale": "Clear value prop with urgency"
    }
  ]
}"#;

const GENERIC_RESPONSE: &str = "Mock response generated successfully.";

/// 按关键字选择预置响应，优先级：plan/task > insight > evaluator > creative
pub fn canned_response(system_prompt: &str, user_prompt: &str) -> &'static str {
    let system = system_prompt.to_lowercase();
    let user = user_prompt.to_lowercase();

    if system.contains("plan") || user.contains("task") {
        PLAN_RESPONSE
    } else if system.contains("insight") {
        INSIGHT_RESPONSE
    } else if system.contains("evaluator") {
        EVALUATOR_RESPONSE
    } else if system.contains("creative") {
        CREATIVE_RESPONSE
    } else {
        GENERIC_RESPONSE
    }
}

/// 确定性的文本生成器，用于离线运行与测试
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        tracing::info!("使用离线模拟响应");
        canned_response(system_prompt, user_prompt).to_string()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
