//! LLM客户端 - 提供统一的文本生成接口

use anyhow::Result;
use async_trait::async_trait;

use crate::config::LLMConfig;

pub mod mock;
mod providers;

pub use mock::{MockGenerator, canned_response};

use providers::ProviderClient;

/// 文本生成接口
///
/// 实现方必须保证`generate`总能返回文本：调用失败时自行降级为确定性响应，
/// 上游阶段只需要处理"文本不可解析"这一种情况。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String;

    /// 用于日志的实现名称
    fn name(&self) -> &str;
}

/// LLM客户端，基于rig的provider客户端访问在线模型
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 单轮对话，只尝试一次
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let agent = self.client.create_agent(system_prompt, &self.config);
        agent.prompt(user_prompt).await
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        tracing::debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            "调用模型服务"
        );
        match self.prompt(system_prompt, user_prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("❌ 调用模型服务出错，使用离线响应: {}", e);
                canned_response(system_prompt, user_prompt).to_string()
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}
