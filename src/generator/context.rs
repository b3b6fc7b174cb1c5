use std::sync::Arc;

use crate::{
    config::Config,
    llm::{client::TextGenerator, create_generator},
    utils::prompts::{PromptKind, PromptLibrary},
};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 文本生成器，在线模型或离线模拟
    pub generator: Arc<dyn TextGenerator>,
    /// 配置
    pub config: Config,
    /// 提示词模板库
    pub prompts: PromptLibrary,
}

impl GeneratorContext {
    /// 根据配置创建上下文，文本生成器由配置决定
    pub fn new(config: Config) -> Self {
        let generator = create_generator(&config);
        Self::with_generator(config, generator)
    }

    /// 使用指定的文本生成器创建上下文
    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let prompts = PromptLibrary::new(config.prompt_dirs.clone());
        Self {
            generator,
            config,
            prompts,
        }
    }

    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        self.generator.generate(system_prompt, user_prompt).await
    }

    pub fn system_prompt(&self, kind: PromptKind) -> String {
        self.prompts.system_prompt(kind)
    }
}
