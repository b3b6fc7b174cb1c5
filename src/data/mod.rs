//! 投放数据的加载与示例数据生成

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::types::{Dataset, Record};

/// 示例数据中的广告系列
pub const SAMPLE_CAMPAIGNS: [&str; 5] = [
    "Summer Sale",
    "Winter Collection",
    "Spring Promo",
    "Holiday Special",
    "New Year",
];

/// 每个广告系列生成的示例记录数
pub const SAMPLE_ROWS_PER_CAMPAIGN: usize = 50;

const SAMPLE_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("无法读取数据文件 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("数据文件 {path} 第{line}行格式错误: {source}")]
    Row {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("无法写入数据文件 {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("无法创建目录 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 读取CSV数据集，表头决定列，缺失的可选列记为`None`
pub fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        let record = row.map_err(|source| DataError::Row {
            path: path.to_path_buf(),
            line: source.position().map(|p| p.line()).unwrap_or_default(),
            source,
        })?;
        records.push(record);
    }

    tracing::info!("已加载{}条记录: {}", records.len(), path.display());
    Ok(Dataset::new(records))
}

/// 写出CSV数据集，必要时创建父目录
pub fn save_csv(dataset: &Dataset, path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| DataError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for record in dataset.records() {
        writer.serialize(record).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;
    Ok(())
}

/// 生成确定性的示例数据：5个广告系列，每个50条记录
pub fn sample_dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let year_start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

    let mut records = Vec::with_capacity(SAMPLE_CAMPAIGNS.len() * SAMPLE_ROWS_PER_CAMPAIGN);
    for campaign in SAMPLE_CAMPAIGNS {
        for _ in 0..SAMPLE_ROWS_PER_CAMPAIGN {
            let date = year_start + Duration::days(rng.random_range(0..366));
            records.push(Record {
                campaign_name: campaign.to_string(),
                date: Some(date.format("%Y-%m-%d").to_string()),
                spend: Some(rng.random_range(50.0..500.0)),
                impressions: Some(rng.random_range(1000..10000)),
                clicks: Some(rng.random_range(20..300)),
                ctr: Some(rng.random_range(0.01..0.05)),
                roas: Some(rng.random_range(1.5..5.0)),
                creative_message: Some(format!("{} - Amazing deals await! Shop now.", campaign)),
            });
        }
    }
    Dataset::new(records)
}

/// 加载数据集；文件不存在时生成示例数据并尝试写回该路径
///
/// 写回失败只记录警告，示例数据照常返回。
pub fn load_or_create(path: &Path) -> Result<Dataset, DataError> {
    if path.exists() {
        return load_csv(path);
    }

    tracing::warn!("⚠️ 数据文件不存在: {}，使用示例数据", path.display());
    let dataset = sample_dataset();
    match save_csv(&dataset, path) {
        Ok(()) => tracing::info!(
            "已生成示例数据{}条并保存到 {}",
            dataset.len(),
            path.display()
        ),
        Err(e) => tracing::warn!("⚠️ 示例数据保存失败: {}", e),
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_dataset_shape() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 250);
        assert_eq!(dataset.campaign_count(), 5);

        for record in dataset.records() {
            let roas = record.roas.unwrap();
            assert!((1.5..5.0).contains(&roas));
            let ctr = record.ctr.unwrap();
            assert!((0.01..0.05).contains(&ctr));
            assert!(record.date.as_deref().unwrap().starts_with("2024-"));
        }
    }

    #[test]
    fn test_sample_dataset_is_deterministic() {
        assert_eq!(sample_dataset(), sample_dataset());
    }

    #[test]
    fn test_load_csv_with_missing_columns() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ads.csv");
        std::fs::write(
            &path,
            "campaign_name,roas,creative_message\nAlpha,2.5,Buy now\nBeta,,\n",
        )
        .unwrap();

        let dataset = load_csv(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].roas, Some(2.5));
        assert_eq!(dataset.records()[1].roas, None);
        assert_eq!(dataset.records()[1].creative_message, None);
        assert_eq!(dataset.records()[0].spend, None);
        assert!(!dataset.has_dates());
    }

    #[test]
    fn test_load_csv_rejects_bad_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ads.csv");
        std::fs::write(&path, "campaign_name,roas\nAlpha,not-a-number\n").unwrap();

        assert!(matches!(load_csv(&path), Err(DataError::Row { .. })));
    }

    #[test]
    fn test_load_or_create_persists_sample() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("sample_fb_ads.csv");

        let created = load_or_create(&path).unwrap();
        assert!(path.exists());

        let reloaded = load_or_create(&path).unwrap();
        assert_eq!(reloaded.len(), created.len());
        assert_eq!(reloaded.records()[0].campaign_name, "Summer Sale");
    }
}
