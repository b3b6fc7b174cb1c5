#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::generator::workflow::launch;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir) -> Config {
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

    #[tokio::test]
    async fn test_workflow_launch_offline() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);

        let outcome = launch(&config, "Analyze ROAS drop").await.unwrap();

        assert_eq!(outcome.report.query, "Analyze ROAS drop");
        assert_eq!(outcome.report.summary.total_records, 250);
        assert_eq!(outcome.artifacts.len(), 4);
        assert!(config.data_path.exists());
        assert!(config.output_path.join("report.md").exists());
        assert!(config.output_path.join("insights.json").exists());
        assert!(config.output_path.join("creatives.json").exists());
        assert!(config.logs_path.join("agent_logs.json").exists());
    }

    #[tokio::test]
    async fn test_workflow_failure_keeps_execution_log() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);
        std::fs::create_dir_all(config.data_path.parent().unwrap()).unwrap();
        std::fs::write(&config.data_path, "campaign_name,spend\nA,lots\n").unwrap();

        let result = launch(&config, "Analyze ROAS drop").await;
        assert!(result.is_err());
        assert!(!config.output_path.join("report.md").exists());

        let log: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(config.logs_path.join("agent_logs.json")).unwrap())
                .unwrap();
        assert_eq!(log["status"], "failed");
        assert!(log["error"].as_str().unwrap().contains("sample_fb_ads.csv"));
    }
}
