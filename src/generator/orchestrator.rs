//! 分析流程编排
//!
//! 一次运行的状态机：`Created -> Running -> Completed | Failed`。
//! 任务按规划顺序串行执行，单个任务的错误或panic在任务边界被捕获并记录为
//! 该任务的结果，只有数据加载这类任务之外的失败才会让整次运行失败。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use futures::FutureExt;
use serde::Serialize;
use uuid::Uuid;

use crate::data;
use crate::generator::agents::{
    CreativeAgent, DataAgent, EvaluatorAgent, InsightAgent, PlannerAgent,
};
use crate::generator::context::GeneratorContext;
use crate::generator::report::{self, Report};
use crate::generator::results::{RunResults, TaskOutcome};
use crate::generator::stage::{Stage, StageOutput, StageScope, StageTable};
use crate::types::{Dataset, StageKind, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Created,
    Running,
    Completed,
    Failed,
}

/// 执行轨迹，运行过程中持续更新
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionLog {
    pub run_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub query: String,
    pub tasks: Vec<Task>,
    pub results: RunResults,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLog {
    fn new(query: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            start_time: Local::now().to_rfc3339(),
            end_time: None,
            query: query.to_string(),
            tasks: Vec::new(),
            results: RunResults::new(),
            status: RunStatus::Created,
            error: None,
        }
    }

    fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.end_time = Some(Local::now().to_rfc3339());
    }
}

pub struct Orchestrator {
    context: GeneratorContext,
    planner: Arc<PlannerAgent>,
    data_agent: Arc<DataAgent>,
    insight_agent: Arc<InsightAgent>,
    overrides: StageTable,
    execution_log: ExecutionLog,
}

impl Orchestrator {
    pub fn new(context: GeneratorContext) -> Self {
        Self {
            planner: Arc::new(PlannerAgent::new(context.clone())),
            data_agent: Arc::new(DataAgent::new()),
            insight_agent: Arc::new(InsightAgent::new(context.clone())),
            context,
            overrides: StageTable::new(),
            execution_log: ExecutionLog::new(""),
        }
    }

    /// 注册替换阶段，之后的运行中该类型的任务都交给它执行
    pub fn register_stage(&mut self, stage: Arc<dyn Stage>) {
        tracing::debug!("注册替换阶段: {}", stage.kind());
        self.overrides.register(stage);
    }

    pub fn execution_log(&self) -> &ExecutionLog {
        &self.execution_log
    }

    pub fn status(&self) -> RunStatus {
        self.execution_log.status
    }

    pub async fn analyze(&mut self, query: &str, data_path: &Path) -> Result<Report> {
        tracing::info!("开始分析: {}", query);
        self.execution_log = ExecutionLog::new(query);
        self.execution_log.status = RunStatus::Running;

        let dataset = match data::load_or_create(data_path)
            .with_context(|| format!("加载数据失败: {}", data_path.display()))
        {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => {
                tracing::error!("❌ 分析失败: {:#}", e);
                self.execution_log.error = Some(format!("{:#}", e));
                self.execution_log.finish(RunStatus::Failed);
                return Err(e);
            }
        };
        tracing::info!("已加载{}条记录", dataset.len());

        let stages = self.stage_table(&dataset);
        let mut results = RunResults::new();

        let tasks = Self::plan(&stages, &results, &dataset, query).await;
        self.execution_log.tasks = tasks.clone();

        for task in &tasks {
            let outcome = Self::execute_task(&stages, &results, &dataset, query, task).await;
            results.insert(task.id.clone(), outcome.clone());
            self.execution_log.results.insert(task.id.clone(), outcome);
        }

        let report = report::assemble(query, &dataset, &results);
        self.execution_log.finish(RunStatus::Completed);
        tracing::info!("✅ 分析完成");
        Ok(report)
    }

    /// 本次运行的分发表：内置阶段加上替换阶段
    fn stage_table(&self, dataset: &Arc<Dataset>) -> StageTable {
        let mut stages = StageTable::new();
        stages.register(self.planner.clone());
        stages.register(self.data_agent.clone());
        stages.register(self.insight_agent.clone());
        stages.register(Arc::new(EvaluatorAgent::new(dataset.clone())));
        stages.register(Arc::new(CreativeAgent::new(
            self.context.clone(),
            dataset.clone(),
        )));
        stages.overlay(&self.overrides);
        stages
    }

    async fn plan(
        stages: &StageTable,
        results: &RunResults,
        dataset: &Dataset,
        query: &str,
    ) -> Vec<Task> {
        let Some(planner) = stages.get(StageKind::Planner) else {
            return PlannerAgent::default_plan();
        };

        let scope = StageScope::new(results, dataset, query, stages);
        match AssertUnwindSafe(planner.run(&scope)).catch_unwind().await {
            Ok(Ok(StageOutput::Plan(tasks))) if !tasks.is_empty() => tasks,
            Ok(Ok(other)) => {
                tracing::warn!("⚠️ 规划阶段返回了{}的输出，使用默认计划", other.kind());
                PlannerAgent::default_plan()
            }
            Ok(Err(e)) => {
                tracing::warn!("⚠️ 规划失败，使用默认计划: {:#}", e);
                PlannerAgent::default_plan()
            }
            Err(panic) => {
                tracing::error!("❌ 规划阶段panic，使用默认计划: {}", panic_message(&*panic));
                PlannerAgent::default_plan()
            }
        }
    }

    async fn execute_task(
        stages: &StageTable,
        results: &RunResults,
        dataset: &Dataset,
        query: &str,
        task: &Task,
    ) -> TaskOutcome {
        tracing::info!("执行任务: {} ({})", task.id, task.agent);

        let Some(kind) = task.agent.stage() else {
            tracing::warn!("⚠️ 未知的agent: {}", task.agent);
            return TaskOutcome::UnknownAgent { task: task.clone() };
        };
        let Some(stage) = stages.get(kind) else {
            return TaskOutcome::Error {
                error: format!("no stage registered for {}", kind),
                task: task.clone(),
            };
        };

        let scope = StageScope::new(results, dataset, query, stages);
        match AssertUnwindSafe(stage.run(&scope)).catch_unwind().await {
            Ok(Ok(output)) => TaskOutcome::Completed { output },
            Ok(Err(e)) => {
                tracing::error!("❌ 任务{}执行出错: {:#}", task.id, e);
                TaskOutcome::Error {
                    error: format!("{:#}", e),
                    task: task.clone(),
                }
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("❌ 任务{}发生panic: {}", task.id, message);
                TaskOutcome::Error {
                    error: message,
                    task: task.clone(),
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::agents::testing::{ScriptedGenerator, test_context};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FailingStage(StageKind);

    #[async_trait]
    impl Stage for FailingStage {
        fn kind(&self) -> StageKind {
            self.0
        }

        async fn run(&self, _scope: &StageScope<'_>) -> Result<StageOutput> {
            Err(anyhow!("{} is down", self.0))
        }
    }

    struct PanickingStage;

    #[async_trait]
    impl Stage for PanickingStage {
        fn kind(&self) -> StageKind {
            StageKind::Summarizer
        }

        async fn run(&self, _scope: &StageScope<'_>) -> Result<StageOutput> {
            panic!("summarizer exploded")
        }
    }

    fn data_path(temp_dir: &TempDir) -> std::path::PathBuf {
        temp_dir.path().join("sample_fb_ads.csv")
    }

    #[tokio::test]
    async fn test_full_run_with_mock() {
        let temp_dir = TempDir::new().unwrap();
        let mut orchestrator = Orchestrator::new(test_context(ScriptedGenerator::mock()));
        assert_eq!(orchestrator.status(), RunStatus::Created);

        let report = orchestrator
            .analyze("Analyze ROAS drop", &data_path(&temp_dir))
            .await
            .unwrap();

        assert_eq!(orchestrator.status(), RunStatus::Completed);
        assert_eq!(report.summary.total_records, 250);
        assert_eq!(report.summary.total_campaigns, 5);
        assert!(report.data_summary.is_some());
        assert_eq!(report.hypothesis_count(), 1);
        assert!(report.validated_insights.is_some());

        let log = orchestrator.execution_log();
        assert_eq!(log.tasks.len(), 4);
        assert_eq!(log.results.len(), 4);
        assert!(log.end_time.is_some());
        assert!(log.results.iter().all(|(_, o)| o.status() == "completed"));
    }

    #[tokio::test]
    async fn test_stage_error_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let mut orchestrator = Orchestrator::new(test_context(ScriptedGenerator::mock()));
        orchestrator.register_stage(Arc::new(FailingStage(StageKind::Validator)));

        let report = orchestrator
            .analyze("Analyze ROAS drop", &data_path(&temp_dir))
            .await
            .unwrap();

        let log = orchestrator.execution_log();
        assert_eq!(log.status, RunStatus::Completed);
        match log.results.get("task_3").unwrap() {
            TaskOutcome::Error { error, task } => {
                assert!(error.contains("is down"));
                assert_eq!(task.id, "task_3");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(log.results.get("task_4").unwrap().status(), "completed");
        assert!(report.validated_insights.is_none());
    }

    #[tokio::test]
    async fn test_stage_panic_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let mut orchestrator = Orchestrator::new(test_context(ScriptedGenerator::mock()));
        orchestrator.register_stage(Arc::new(PanickingStage));

        let report = orchestrator
            .analyze("Analyze ROAS drop", &data_path(&temp_dir))
            .await
            .unwrap();

        let log = orchestrator.execution_log();
        match log.results.get("task_1").unwrap() {
            TaskOutcome::Error { error, .. } => assert!(error.contains("summarizer exploded")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(report.data_summary.is_none());
        assert_eq!(orchestrator.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_planner_uses_default_plan() {
        let temp_dir = TempDir::new().unwrap();
        let mut orchestrator = Orchestrator::new(test_context(ScriptedGenerator::mock()));
        orchestrator.register_stage(Arc::new(FailingStage(StageKind::Planner)));

        orchestrator
            .analyze("Analyze ROAS drop", &data_path(&temp_dir))
            .await
            .unwrap();

        assert_eq!(orchestrator.execution_log().tasks, PlannerAgent::default_plan());
    }

    #[tokio::test]
    async fn test_unreadable_data_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        let path = data_path(&temp_dir);
        std::fs::write(&path, "campaign_name,roas\nA,abc\n").unwrap();

        let mut orchestrator = Orchestrator::new(test_context(ScriptedGenerator::mock()));
        let result = orchestrator.analyze("q", &path).await;

        assert!(result.is_err());
        assert_eq!(orchestrator.status(), RunStatus::Failed);
        assert!(orchestrator.execution_log().error.is_some());
        assert!(orchestrator.execution_log().end_time.is_some());
    }

    #[test]
    fn test_execution_log_serialization() {
        let mut log = ExecutionLog::new("q");
        log.finish(RunStatus::Completed);
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["query"], "q");
        assert!(value.get("error").is_none());
        assert!(Uuid::parse_str(value["run_id"].as_str().unwrap()).is_ok());
    }
}
