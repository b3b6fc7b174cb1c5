use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 投放数据中的一行记录
///
/// 除`campaign_name`外的列都是可选的，缺失的列或空单元格以`None`表示，
/// 统计时直接跳过，不会被当作0。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Record {
    /// 广告系列名称，不要求唯一
    pub campaign_name: String,

    /// 日期，保持原始字符串（ISO格式可直接按字典序排序）
    #[serde(default)]
    pub date: Option<String>,

    /// 花费
    #[serde(default)]
    pub spend: Option<f64>,

    /// 展示次数
    #[serde(default)]
    pub impressions: Option<u64>,

    /// 点击次数
    #[serde(default)]
    pub clicks: Option<u64>,

    /// 点击率
    #[serde(default)]
    pub ctr: Option<f64>,

    /// 广告支出回报率
    #[serde(default)]
    pub roas: Option<f64>,

    /// 广告文案
    #[serde(default)]
    pub creative_message: Option<String>,
}

/// 只读的数据集，保持文件中的行顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 去重后的广告系列数量
    pub fn campaign_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.campaign_name.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn has_dates(&self) -> bool {
        self.records.iter().any(|r| r.date.is_some())
    }

    pub fn roas_values(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.roas).collect()
    }

    pub fn ctr_values(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.ctr).collect()
    }

    pub fn spend_values(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.spend).collect()
    }

    /// 按日期稳定排序后的记录引用，没有日期的记录排在最前
    pub fn sorted_by_date(&self) -> Vec<&Record> {
        let mut sorted: Vec<&Record> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.date.cmp(&b.date));
        sorted
    }

    /// 按广告系列名称分组（BTreeMap保证遍历顺序稳定）
    pub fn group_by_campaign(&self) -> BTreeMap<&str, Vec<&Record>> {
        let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(record.campaign_name.as_str())
                .or_default()
                .push(record);
        }
        groups
    }

    pub fn campaign_records(&self, campaign_name: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.campaign_name == campaign_name)
            .collect()
    }

    /// 某个广告系列中按首次出现顺序去重的文案，最多`limit`条
    pub fn distinct_creatives(&self, campaign_name: &str, limit: usize) -> Vec<String> {
        let mut seen = Vec::new();
        for record in self.campaign_records(campaign_name) {
            if let Some(message) = &record.creative_message
                && !seen.contains(message)
            {
                seen.push(message.clone());
                if seen.len() >= limit {
                    break;
                }
            }
        }
        seen
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(campaign: &str, date: &str, creative: &str) -> Record {
        Record {
            campaign_name: campaign.to_string(),
            date: Some(date.to_string()),
            creative_message: Some(creative.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_campaign_count_ignores_duplicates() {
        let dataset = Dataset::new(vec![
            record("A", "2024-01-01", "a"),
            record("A", "2024-01-02", "a"),
            record("B", "2024-01-01", "b"),
        ]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.campaign_count(), 2);
    }

    #[test]
    fn test_sorted_by_date() {
        let dataset = Dataset::new(vec![
            record("A", "2024-03-01", "x"),
            record("B", "2024-01-01", "y"),
            record("C", "2024-02-01", "z"),
        ]);
        let names: Vec<_> = dataset
            .sorted_by_date()
            .iter()
            .map(|r| r.campaign_name.clone())
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_distinct_creatives_keeps_first_appearance_order() {
        let dataset = Dataset::new(vec![
            record("A", "2024-01-01", "second"),
            record("A", "2024-01-02", "first"),
            record("A", "2024-01-03", "second"),
            record("A", "2024-01-04", "third"),
            record("A", "2024-01-05", "fourth"),
        ]);
        assert_eq!(
            dataset.distinct_creatives("A", 3),
            vec!["second", "first", "third"]
        );
        assert!(dataset.distinct_creatives("missing", 3).is_empty());
    }
}
