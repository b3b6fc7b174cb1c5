use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::generator::orchestrator::ExecutionLog;
use crate::generator::report::Report;
use crate::types::{CreativeSuggestion, Hypothesis, Validation};
use crate::utils::truncate_chars;

pub trait Outlet {
    /// 保存报告与执行轨迹，返回写出的文件路径
    fn save(&self, report: &Report, execution_log: &ExecutionLog) -> Result<Vec<PathBuf>>;
}

#[derive(Serialize)]
struct InsightsArtifact<'a> {
    hypotheses: &'a [Hypothesis],
    validated: Option<&'a Validation>,
}

/// 写入本地磁盘的输出
pub struct DiskOutlet {
    output_path: PathBuf,
    logs_path: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_path: impl Into<PathBuf>, logs_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            logs_path: logs_path.into(),
        }
    }

    pub fn insights_path(&self) -> PathBuf {
        self.output_path.join("insights.json")
    }

    pub fn creatives_path(&self) -> PathBuf {
        self.output_path.join("creatives.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_path.join("report.md")
    }

    pub fn execution_log_path(&self) -> PathBuf {
        self.logs_path.join("agent_logs.json")
    }

    /// 单独保存执行轨迹，运行失败时也会调用
    pub fn save_execution_log(&self, execution_log: &ExecutionLog) -> Result<PathBuf> {
        fs::create_dir_all(&self.logs_path).context(format!(
            "Failed to create logs directory {}",
            self.logs_path.display()
        ))?;
        let path = self.execution_log_path();
        Self::write_json(&path, execution_log)?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content).context(format!("Failed to write {}", path.display()))
    }
}

impl Outlet for DiskOutlet {
    fn save(&self, report: &Report, execution_log: &ExecutionLog) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_path).context(format!(
            "Failed to create output directory {}",
            self.output_path.display()
        ))?;

        let insights = InsightsArtifact {
            hypotheses: report
                .insights
                .as_ref()
                .map(|i| i.hypotheses.as_slice())
                .unwrap_or_default(),
            validated: report.validated_insights.as_ref(),
        };
        Self::write_json(&self.insights_path(), &insights)?;
        Self::write_json(&self.creatives_path(), &report.creative_suggestions)?;

        let report_path = self.report_path();
        fs::write(&report_path, render_markdown(report))
            .context(format!("Failed to write {}", report_path.display()))?;

        self.save_execution_log(execution_log)?;

        tracing::info!("💾 结果已保存到 {}", self.output_path.display());
        Ok(vec![
            self.report_path(),
            self.insights_path(),
            self.creatives_path(),
            self.execution_log_path(),
        ])
    }
}

/// 生成可读的Markdown报告
pub fn render_markdown(report: &Report) -> String {
    let mut md = String::new();

    let _ = write!(
        md,
        "# Facebook Ads Performance Analysis Report\n\n\
         ## Query\n{}\n\n\
         **Analysis Date:** {}\n\n\
         ---\n\n\
         ## Executive Summary\n\n\
         **Total Records Analyzed:** {}  \n\
         **Total Campaigns:** {}  \n\
         **Status:** {}\n\n\
         ---\n\n\
         ## Key Insights\n\n",
        report.query,
        report.timestamp,
        report.summary.total_records,
        report.summary.total_campaigns,
        report.summary.analysis_status,
    );

    if let Some(insights) = &report.insights {
        md.push_str("### Performance Hypotheses\n\n");
        for hypothesis in &insights.hypotheses {
            let _ = writeln!(
                md,
                "**{}** (Confidence: {:.1}%)",
                hypothesis.title,
                hypothesis.confidence * 100.0
            );
            let _ = writeln!(md, "- {}\n", hypothesis.description);
        }
    }

    if let Some(validation) = &report.validated_insights {
        md.push_str("### Validated Insights\n\n");
        for validated in &validation.validated_hypotheses {
            let _ = writeln!(
                md,
                "**{}** - Validation Score: {:.1}%",
                validated.title(),
                validated.validation_score * 100.0
            );
            let _ = writeln!(md, "- Strength: {}", validated.strength);
            let _ = writeln!(
                md,
                "- Is Valid: {}\n",
                if validated.is_valid { "Yes" } else { "No" }
            );
        }
    }

    if !report.recommendations.is_empty() {
        md.push_str("## Recommended Actions\n\n");
        for (index, recommendation) in report.recommendations.iter().enumerate() {
            let _ = writeln!(md, "{}. **{}**", index + 1, recommendation.title());
            let _ = writeln!(
                md,
                "   - Priority: {}",
                recommendation.priority().to_string().to_uppercase()
            );
            let _ = writeln!(
                md,
                "   - Expected Impact: {}\n",
                recommendation.expected_impact()
            );
        }
    }

    if !report.creative_suggestions.is_empty() {
        md.push_str("## Creative Suggestions\n\n");
        for (campaign, creatives) in group_by_campaign(&report.creative_suggestions) {
            let _ = writeln!(md, "### {}\n", campaign);
            for creative in creatives.iter().take(3) {
                let _ = writeln!(md, "**{}**", creative.angle);
                let _ = writeln!(md, "- Headline: {}", creative.headline);
                let _ = writeln!(md, "- Message: {}...", truncate_chars(&creative.message, 100));
                let _ = writeln!(md, "- Target CTR: {}\n", creative.target_ctr);
            }
        }
    }

    md.push_str("\n---\n\n*Generated by adsight*");
    md
}

/// 按首次出现的顺序分组
fn group_by_campaign(creatives: &[CreativeSuggestion]) -> Vec<(&str, Vec<&CreativeSuggestion>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&CreativeSuggestion>> = BTreeMap::new();
    for creative in creatives {
        let campaign = creative.campaign_name.as_str();
        if !groups.contains_key(campaign) {
            order.push(campaign);
        }
        groups.entry(campaign).or_default().push(creative);
    }
    order
        .into_iter()
        .map(|campaign| (campaign, groups.remove(campaign).unwrap_or_default()))
        .collect()
}
