use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use crate::generator::context::GeneratorContext;
use crate::generator::stage::{Stage, StageOutput, StageScope};
use crate::types::{StageKind, Task};
use crate::utils::prompts::PromptKind;
use crate::utils::response_parser::parse_list;

/// 规划器：把业务问题拆解为有序的分析任务
pub struct PlannerAgent {
    context: GeneratorContext,
}

impl PlannerAgent {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }

    /// 模型不可用或返回无法使用的计划时采用的固定计划
    pub fn default_plan() -> Vec<Task> {
        vec![
            Task::new(
                "data_summary",
                StageKind::Summarizer,
                "Summarize dataset characteristics and identify patterns",
                &[],
            ),
            Task::new(
                "insights",
                StageKind::Hypothesizer,
                "Generate hypotheses explaining performance changes",
                &["data_summary"],
            ),
            Task::new(
                "evaluation",
                StageKind::Validator,
                "Validate hypotheses with quantitative metrics",
                &["insights"],
            ),
            Task::new(
                "creatives",
                StageKind::Creative,
                "Generate creative recommendations for underperformers",
                &["evaluation"],
            ),
        ]
    }

    pub async fn plan(&self, query: &str, context: Option<&Value>) -> Vec<Task> {
        tracing::info!("规划器收到问题: {}", query);

        let system_prompt = self.context.system_prompt(PromptKind::Planner);
        let user_prompt = Self::build_user_prompt(query, context);
        let response = self.context.generate(&system_prompt, &user_prompt).await;

        match Self::parse_plan(&response) {
            Ok(tasks) => {
                tracing::info!("生成了{}个任务", tasks.len());
                tasks
            }
            Err(e) => {
                tracing::warn!("⚠️ 任务计划不可用，使用默认计划: {}", e);
                Self::default_plan()
            }
        }
    }

    fn build_user_prompt(query: &str, context: Option<&Value>) -> String {
        let context = context
            .map(Value::to_string)
            .unwrap_or_else(|| "No additional context provided".to_string());
        format!(
            r#"Business Query: {}

Context: {}

Break this query into specific, actionable tasks for data analysis.
Available agents: data_agent, insight_agent, evaluator_agent, creative_agent.
Return a JSON object with the 'tasks' array. Each task has id, agent, description and dependencies."#,
            query, context
        )
    }

    /// 单个任务对象按一个元素的计划处理
    fn parse_plan(response: &str) -> Result<Vec<Task>> {
        let tasks = parse_list(response, "tasks")?;
        let tasks: Vec<Task> = serde_json::from_value(Value::Array(tasks))?;
        if tasks.is_empty() {
            return Err(anyhow!("plan contains no tasks"));
        }
        Ok(tasks)
    }
}

#[async_trait]
impl Stage for PlannerAgent {
    fn kind(&self) -> StageKind {
        StageKind::Planner
    }

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
        Ok(StageOutput::Plan(self.plan(scope.query, None).await))
    }
}
