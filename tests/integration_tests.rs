use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adsight::config::Config;
use adsight::generator::context::GeneratorContext;
use adsight::generator::orchestrator::{Orchestrator, RunStatus};
use adsight::generator::outlet::{DiskOutlet, Outlet};
use adsight::generator::results::TaskOutcome;
use adsight::generator::stage::{Stage, StageOutput, StageScope};
use adsight::llm::client::{TextGenerator, canned_response};
use adsight::types::StageKind;
use anyhow::{Result, bail};
use async_trait::async_trait;
use tempfile::TempDir;

fn offline_config(temp_dir: &TempDir) -> Config {
    let mut config = Config {
        data_path: temp_dir.path().join("data").join("sample_fb_ads.csv"),
        output_path: temp_dir.path().join("reports"),
        logs_path: temp_dir.path().join("logs"),
        prompt_dirs: Vec::new(),
        ..Default::default()
    };
    config.llm.offline = true;
    config
}

/// 规划请求返回固定文本，其余请求使用离线响应
struct PlanOverride {
    plan: &'static str,
    calls: AtomicUsize,
}

impl PlanOverride {
    fn new(plan: &'static str) -> Self {
        Self {
            plan,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for PlanOverride {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if system_prompt.to_lowercase().contains("planner") {
            self.plan.to_string()
        } else {
            canned_response(system_prompt, user_prompt).to_string()
        }
    }

    fn name(&self) -> &str {
        "plan-override"
    }
}

struct BrokenValidator;

#[async_trait]
impl Stage for BrokenValidator {
    fn kind(&self) -> StageKind {
        StageKind::Validator
    }

    async fn run(&self, _scope: &StageScope<'_>) -> Result<StageOutput> {
        bail!("metrics backend unavailable")
    }
}

#[tokio::test]
async fn test_offline_run_writes_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(&temp_dir);

    let outcome = adsight::launch(&config, "Analyze ROAS drop").await.unwrap();
    let report = &outcome.report;

    assert_eq!(report.summary.total_records, 250);
    assert_eq!(report.summary.total_campaigns, 5);
    assert_eq!(report.summary.analysis_status, "completed");
    assert!(report.data_summary.is_some());
    assert_eq!(report.hypothesis_count(), 1);
    assert!(report.validated_insights.is_some());
    assert!(!report.recommendations.is_empty());

    let markdown = std::fs::read_to_string(config.output_path.join("report.md")).unwrap();
    assert!(markdown.starts_with("# Facebook Ads Performance Analysis Report"));
    assert!(markdown.contains("Creative Fatigue"));

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config.logs_path.join("agent_logs.json")).unwrap())
            .unwrap();
    assert_eq!(log["status"], "completed");
    assert_eq!(log["tasks"].as_array().unwrap().len(), 4);
    for id in ["task_1", "task_2", "task_3", "task_4"] {
        assert_eq!(log["results"][id]["status"], "completed");
    }
}

#[tokio::test]
async fn test_out_of_order_plan_heals_missing_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(&temp_dir);
    let generator = Arc::new(PlanOverride::new(
        r#"{"tasks": [
            {"id": "make_copy", "agent": "creative_agent", "description": "Write creatives"},
            {"id": "check", "agent": "evaluator_agent", "description": "Validate"},
            {"id": "explain", "agent": "insight_agent", "description": "Explain"},
            {"id": "summarize", "agent": "data_agent", "description": "Summarize"}
        ]}"#,
    ));
    let context = GeneratorContext::with_generator(config.clone(), generator);
    let mut orchestrator = Orchestrator::new(context);

    let report = orchestrator
        .analyze("Analyze ROAS drop", &config.data_path)
        .await
        .unwrap();

    let log = orchestrator.execution_log();
    assert_eq!(log.status, RunStatus::Completed);
    let ids: Vec<&str> = log.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["make_copy", "check", "explain", "summarize"]);
    for id in &ids {
        assert_eq!(log.results.get(id).unwrap().status(), "completed");
    }
    assert!(report.validated_insights.is_some());
    assert!(report.insights.is_some());
}

#[tokio::test]
async fn test_failing_stage_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(&temp_dir);
    let context = GeneratorContext::new(config.clone());
    let mut orchestrator = Orchestrator::new(context);
    orchestrator.register_stage(Arc::new(BrokenValidator));

    let report = orchestrator
        .analyze("Analyze ROAS drop", &config.data_path)
        .await
        .unwrap();

    let results = &orchestrator.execution_log().results;
    match results.get("task_3").unwrap() {
        TaskOutcome::Error { error, task } => {
            assert!(error.contains("metrics backend unavailable"));
            assert_eq!(task.id, "task_3");
        }
        other => panic!("unexpected outcome: {:?}", other.status()),
    }
    assert_eq!(results.get("task_4").unwrap().status(), "completed");
    assert!(report.validated_insights.is_none());
    assert!(!report.creative_suggestions.is_empty());

    let outlet = DiskOutlet::new(&config.output_path, &config.logs_path);
    let written = outlet.save(&report, orchestrator.execution_log()).unwrap();
    assert_eq!(written.len(), 4);
    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(outlet.execution_log_path()).unwrap())
            .unwrap();
    assert_eq!(log["results"]["task_3"]["status"], "error");
}

#[tokio::test]
async fn test_unknown_agent_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(&temp_dir);
    let generator = Arc::new(PlanOverride::new(
        r#"{"tasks": [
            {"id": "task_1", "agent": "data_agent", "description": "Summarize"},
            {"id": "task_2", "agent": "weather_agent", "description": "Check the weather"}
        ]}"#,
    ));
    let context = GeneratorContext::with_generator(config.clone(), generator);
    let mut orchestrator = Orchestrator::new(context);

    let report = orchestrator
        .analyze("Analyze ROAS drop", &config.data_path)
        .await
        .unwrap();

    let results = &orchestrator.execution_log().results;
    assert_eq!(results.get("task_1").unwrap().status(), "completed");
    assert_eq!(results.get("task_2").unwrap().status(), "unknown_agent");
    assert_eq!(orchestrator.status(), RunStatus::Completed);
    assert!(report.data_summary.is_some());
    assert!(report.insights.is_none());
}

#[tokio::test]
async fn test_unparseable_plan_uses_default_plan() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(&temp_dir);
    let generator = Arc::new(PlanOverride::new("I would rather not plan today."));
    let context = GeneratorContext::with_generator(config.clone(), generator.clone());
    let mut orchestrator = Orchestrator::new(context);

    orchestrator
        .analyze("Analyze ROAS drop", &config.data_path)
        .await
        .unwrap();

    let ids: Vec<&str> = orchestrator
        .execution_log()
        .tasks
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, vec!["data_summary", "insights", "evaluation", "creatives"]);
    assert!(generator.calls.load(Ordering::SeqCst) >= 2);
}
