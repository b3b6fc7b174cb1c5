pub mod client;

use std::sync::Arc;

use crate::config::Config;
use client::{LLMClient, MockGenerator, TextGenerator};

/// 根据配置选择文本生成器
///
/// 离线模式、缺少API KEY或客户端构建失败时使用确定性的模拟响应。
pub fn create_generator(config: &Config) -> Arc<dyn TextGenerator> {
    let llm = &config.llm;
    if llm.offline {
        tracing::info!("离线模式已开启，使用模拟响应");
        return Arc::new(MockGenerator::new());
    }
    if llm.api_key.trim().is_empty() && llm.provider.requires_api_key() {
        tracing::warn!("⚠️ 未配置{}的API KEY，使用模拟响应", llm.provider);
        return Arc::new(MockGenerator::new());
    }

    match LLMClient::new(llm.clone()) {
        Ok(client) => {
            tracing::info!(provider = %llm.provider, model = %llm.model, "已连接模型服务");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("⚠️ 无法创建LLM客户端，使用模拟响应: {}", e);
            Arc::new(MockGenerator::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_uses_mock() {
        let mut config = Config::default();
        config.llm.api_key = "sk-test".to_string();
        config.llm.offline = true;
        assert_eq!(create_generator(&config).name(), "mock");
    }

    #[test]
    fn test_missing_api_key_uses_mock() {
        let mut config = Config::default();
        config.llm.api_key = String::new();
        assert_eq!(create_generator(&config).name(), "mock");
    }
}
