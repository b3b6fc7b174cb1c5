use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;

use crate::generator::results::RunResults;
use crate::types::{CreativeSuggestion, DataSummary, Dataset, Insights, StageKind, Task, Validation};

/// 各阶段的输出，按阶段类型区分
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOutput {
    Plan(Vec<Task>),
    Summary(DataSummary),
    Insights(Insights),
    Validation(Validation),
    Creatives(Vec<CreativeSuggestion>),
}

impl StageOutput {
    pub fn kind(&self) -> StageKind {
        match self {
            StageOutput::Plan(_) => StageKind::Planner,
            StageOutput::Summary(_) => StageKind::Summarizer,
            StageOutput::Insights(_) => StageKind::Hypothesizer,
            StageOutput::Validation(_) => StageKind::Validator,
            StageOutput::Creatives(_) => StageKind::Creative,
        }
    }
}

/// 流水线中的一个阶段
///
/// 阶段通过`StageScope`读取上游结果，缺失时由作用域就地补算。
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput>;
}

/// 阶段分发表
#[derive(Clone, Default)]
pub struct StageTable {
    stages: HashMap<StageKind, Arc<dyn Stage>>,
}

impl StageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按阶段类型注册，返回被替换的旧阶段
    pub fn register(&mut self, stage: Arc<dyn Stage>) -> Option<Arc<dyn Stage>> {
        self.stages.insert(stage.kind(), stage)
    }

    pub fn get(&self, kind: StageKind) -> Option<&Arc<dyn Stage>> {
        self.stages.get(&kind)
    }

    /// 用另一张表中的阶段覆盖当前表
    pub fn overlay(&mut self, other: &StageTable) {
        for stage in other.stages.values() {
            self.register(stage.clone());
        }
    }
}

/// 阶段执行时可见的运行状态
pub struct StageScope<'a> {
    pub results: &'a RunResults,
    pub dataset: &'a Dataset,
    pub query: &'a str,
    pub stages: &'a StageTable,
}

impl<'a> StageScope<'a> {
    pub fn new(
        results: &'a RunResults,
        dataset: &'a Dataset,
        query: &'a str,
        stages: &'a StageTable,
    ) -> Self {
        Self {
            results,
            dataset,
            query,
            stages,
        }
    }

    /// 上游阶段的输出：优先取结果表，缺失时就地执行该阶段（不写回结果表）
    pub async fn resolve(&self, kind: StageKind) -> Result<StageOutput> {
        if let Some(output) = self.results.find(kind) {
            return Ok(output.clone());
        }

        tracing::debug!("结果表中没有{}的输出，重新计算", kind);
        let stage = self
            .stages
            .get(kind)
            .ok_or_else(|| anyhow!("no stage registered for {}", kind))?;
        let output = stage.run(self).await?;
        if output.kind() != kind {
            return Err(anyhow!(
                "stage {} returned output of {}",
                kind,
                output.kind()
            ));
        }
        Ok(output)
    }

    pub async fn summary(&self) -> Result<DataSummary> {
        match self.resolve(StageKind::Summarizer).await? {
            StageOutput::Summary(summary) => Ok(summary),
            other => Err(anyhow!("expected data summary, got {}", other.kind())),
        }
    }

    pub async fn insights(&self) -> Result<Insights> {
        match self.resolve(StageKind::Hypothesizer).await? {
            StageOutput::Insights(insights) => Ok(insights),
            other => Err(anyhow!("expected insights, got {}", other.kind())),
        }
    }

    pub async fn validation(&self) -> Result<Validation> {
        match self.resolve(StageKind::Validator).await? {
            StageOutput::Validation(validation) => Ok(validation),
            other => Err(anyhow!("expected validation, got {}", other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::results::TaskOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSummarizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Stage for CountingSummarizer {
        fn kind(&self) -> StageKind {
            StageKind::Summarizer
        }

        async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StageOutput::Summary(DataSummary {
                total_records: scope.dataset.len(),
                ..Default::default()
            }))
        }
    }

    struct MislabeledStage;

    #[async_trait]
    impl Stage for MislabeledStage {
        fn kind(&self) -> StageKind {
            StageKind::Hypothesizer
        }

        async fn run(&self, _scope: &StageScope<'_>) -> Result<StageOutput> {
            Ok(StageOutput::Creatives(Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_resolve_uses_results_first() {
        let counter = Arc::new(CountingSummarizer {
            calls: AtomicUsize::new(0),
        });
        let mut table = StageTable::new();
        table.register(counter.clone());

        let mut results = RunResults::new();
        results.insert(
            "data_summary",
            TaskOutcome::Completed {
                output: StageOutput::Summary(DataSummary {
                    total_records: 99,
                    ..Default::default()
                }),
            },
        );
        let dataset = Dataset::default();
        let scope = StageScope::new(&results, &dataset, "q", &table);

        assert_eq!(scope.summary().await.unwrap().total_records, 99);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_recomputes_missing_upstream() {
        let counter = Arc::new(CountingSummarizer {
            calls: AtomicUsize::new(0),
        });
        let mut table = StageTable::new();
        table.register(counter.clone());

        let results = RunResults::new();
        let dataset = Dataset::new(vec![Default::default(), Default::default()]);
        let scope = StageScope::new(&results, &dataset, "q", &table);

        assert_eq!(scope.summary().await.unwrap().total_records, 2);
        assert_eq!(scope.summary().await.unwrap().total_records, 2);
        // 补算结果不写回结果表
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_missing_stage_is_error() {
        let table = StageTable::new();
        let results = RunResults::new();
        let dataset = Dataset::default();
        let scope = StageScope::new(&results, &dataset, "q", &table);

        assert!(scope.validation().await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_rejects_mislabeled_output() {
        let mut table = StageTable::new();
        table.register(Arc::new(MislabeledStage));
        let results = RunResults::new();
        let dataset = Dataset::default();
        let scope = StageScope::new(&results, &dataset, "q", &table);

        assert!(scope.insights().await.is_err());
    }

    #[test]
    fn test_overlay_replaces_by_kind() {
        let mut base = StageTable::new();
        base.register(Arc::new(MislabeledStage));
        let mut overrides = StageTable::new();
        overrides.register(Arc::new(CountingSummarizer {
            calls: AtomicUsize::new(0),
        }));

        base.overlay(&overrides);
        assert_eq!(
            base.get(StageKind::Summarizer).map(|stage| stage.kind()),
            Some(StageKind::Summarizer)
        );
        assert!(base.get(StageKind::Hypothesizer).is_some());
        assert!(base.get(StageKind::Creative).is_none());
    }
}
