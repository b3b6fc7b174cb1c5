use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::orchestrator::Orchestrator;
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::report::Report;

/// 一次完整分析的产出
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Report,
    /// 写出的报告与日志文件
    pub artifacts: Vec<PathBuf>,
}

/// 启动分析工作流
pub async fn launch(config: &Config, query: &str) -> Result<AnalysisOutcome> {
    let context = GeneratorContext::new(config.clone());
    execute(context, query).await
}

/// 使用给定上下文执行分析并保存结果
pub async fn execute(context: GeneratorContext, query: &str) -> Result<AnalysisOutcome> {
    let config = context.config.clone();
    let outlet = DiskOutlet::new(&config.output_path, &config.logs_path);
    let mut orchestrator = Orchestrator::new(context);

    match orchestrator.analyze(query, &config.data_path).await {
        Ok(report) => {
            let artifacts = outlet.save(&report, orchestrator.execution_log())?;
            Ok(AnalysisOutcome { report, artifacts })
        }
        Err(e) => {
            // 失败的运行同样保留执行轨迹
            if let Err(save_err) = outlet.save_execution_log(orchestrator.execution_log()) {
                tracing::warn!("⚠️ 执行轨迹保存失败: {}", save_err);
            }
            Err(e)
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
