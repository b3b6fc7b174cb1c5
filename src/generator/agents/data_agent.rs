use anyhow::Result;
use async_trait::async_trait;

use crate::generator::stage::{Stage, StageOutput, StageScope};
use crate::types::summary::{
    CampaignDetails, CtrStats, DateRange, Outlier, OutlierKind, Outliers, RoasStats, SpendStats,
    SummaryMetrics,
};
use crate::types::{DataSummary, Dataset, StageKind};
use crate::utils::stats;

/// ROAS低于该值视为表现不佳
pub const LOW_ROAS_THRESHOLD: f64 = 2.0;

/// 数据分析：纯计算，不调用模型
#[derive(Debug, Clone, Default)]
pub struct DataAgent;

impl DataAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, dataset: &Dataset) -> DataSummary {
        tracing::info!("数据分析开始，共{}条记录", dataset.len());

        let summary = DataSummary {
            total_campaigns: dataset.campaign_count(),
            total_records: dataset.len(),
            date_range: Self::date_range(dataset),
            metrics: Self::metrics(dataset),
            patterns: Self::patterns(dataset),
            outliers: Self::outliers(dataset),
        };

        tracing::info!("数据分析完成，识别出{}个模式", summary.patterns.len());
        summary
    }

    fn date_range(dataset: &Dataset) -> DateRange {
        let dates = dataset.records().iter().filter_map(|r| r.date.as_deref());
        DateRange {
            start: dates.clone().min().map(str::to_string),
            end: dates.max().map(str::to_string),
        }
    }

    fn metrics(dataset: &Dataset) -> SummaryMetrics {
        let roas = dataset.roas_values();
        let ctr = dataset.ctr_values();
        let spend = dataset.spend_values();

        SummaryMetrics {
            roas: stats::mean(&roas).map(|mean| RoasStats {
                mean,
                median: stats::median(&roas).unwrap_or(mean),
                std: stats::sample_std(&roas),
                min: stats::min(&roas).unwrap_or(mean),
                max: stats::max(&roas).unwrap_or(mean),
            }),
            ctr: stats::mean(&ctr).map(|mean| CtrStats {
                mean,
                median: stats::median(&ctr).unwrap_or(mean),
                std: stats::sample_std(&ctr),
            }),
            spend: stats::mean(&spend).map(|mean| SpendStats {
                total: spend.iter().sum(),
                mean,
                median: stats::median(&spend).unwrap_or(mean),
            }),
        }
    }

    fn patterns(dataset: &Dataset) -> Vec<String> {
        let mut patterns = Vec::new();
        let records = dataset.records();
        let roas = dataset.roas_values();

        // 时间维度上的ROAS下滑：比较最早与最近各四分之一的记录
        if dataset.has_dates() && !roas.is_empty() && records.len() > 10 {
            let sorted = dataset.sorted_by_date();
            let quarter = sorted.len() / 4;
            let early: Vec<f64> = sorted[..quarter].iter().filter_map(|r| r.roas).collect();
            let recent: Vec<f64> = sorted[sorted.len() - quarter..]
                .iter()
                .filter_map(|r| r.roas)
                .collect();
            if let (Some(early), Some(recent)) = (stats::mean(&early), stats::mean(&recent))
                && recent < early * 0.8
            {
                patterns.push("Declining ROAS trend detected".to_string());
            }
        }

        let low_performers = roas.iter().filter(|v| **v < LOW_ROAS_THRESHOLD).count();
        // 严格超过30%，整数比较避免浮点误差
        if !roas.is_empty() && low_performers * 10 > records.len() * 3 {
            patterns.push(format!(
                "{} campaigns with ROAS < {:.1}",
                low_performers, LOW_ROAS_THRESHOLD
            ));
        }

        if let Some(q3) = stats::quantile(&dataset.spend_values(), 0.75) {
            let high_spend_low_roas = records
                .iter()
                .filter(|r| {
                    matches!((r.spend, r.roas), (Some(spend), Some(roas)) if spend > q3 && roas < LOW_ROAS_THRESHOLD)
                })
                .count();
            if high_spend_low_roas > 0 {
                patterns.push(format!(
                    "{} high-spend campaigns with low ROAS",
                    high_spend_low_roas
                ));
            }
        }

        patterns
    }

    fn outliers(dataset: &Dataset) -> Outliers {
        let Some((lower, upper)) = stats::iqr_bounds(&dataset.roas_values(), 1.5) else {
            return Outliers::default();
        };

        let roas = dataset
            .records()
            .iter()
            .filter_map(|record| {
                let value = record.roas?;
                let kind = if value > upper {
                    OutlierKind::High
                } else if value < lower {
                    OutlierKind::Low
                } else {
                    return None;
                };
                Some(Outlier {
                    campaign: record.campaign_name.clone(),
                    value,
                    kind,
                })
            })
            .collect();

        Outliers { roas: Some(roas) }
    }

    /// 单个广告系列的明细，不存在时返回None
    pub fn campaign_details(dataset: &Dataset, campaign_name: &str) -> Option<CampaignDetails> {
        let records = dataset.campaign_records(campaign_name);
        if records.is_empty() {
            return None;
        }

        let roas: Vec<f64> = records.iter().filter_map(|r| r.roas).collect();
        let ctr: Vec<f64> = records.iter().filter_map(|r| r.ctr).collect();
        Some(CampaignDetails {
            campaign_name: campaign_name.to_string(),
            record_count: records.len(),
            avg_roas: stats::mean(&roas),
            avg_ctr: stats::mean(&ctr),
            total_spend: records.iter().filter_map(|r| r.spend).sum(),
            creative_samples: dataset.distinct_creatives(campaign_name, 3),
        })
    }
}

#[async_trait]
impl Stage for DataAgent {
    fn kind(&self) -> StageKind {
        StageKind::Summarizer
    }

    async fn run(&self, scope: &StageScope<'_>) -> Result<StageOutput> {
        Ok(StageOutput::Summary(self.analyze(scope.dataset)))
    }
}
