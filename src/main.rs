use crate::generator::workflow::launch;
use clap::Parser;

mod cli;
mod config;
mod data;
mod generator;
mod llm;
mod logging;
mod types;
mod utils;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 配置错误: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("⚠️ 警告: 日志文件初始化失败: {:#}", e);
    }

    match launch(&config, &args.query).await {
        Ok(outcome) => {
            let report = &outcome.report;
            println!("✅ 分析完成: {}", report.query);
            println!("   Records analyzed: {}", report.summary.total_records);
            println!("   Campaigns: {}", report.summary.total_campaigns);
            println!("   Hypotheses: {}", report.hypothesis_count());
            println!("   Creatives: {}", report.creative_suggestions.len());
            println!("📄 Artifacts:");
            for path in &outcome.artifacts {
                println!("   {}", path.display());
            }
            if !report.recommendations.is_empty() {
                println!("🎯 Top recommendations:");
                for (index, recommendation) in report.recommendations.iter().take(3).enumerate() {
                    println!(
                        "   {}. [{}] {}",
                        index + 1,
                        recommendation.priority().to_string().to_uppercase(),
                        recommendation.title()
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("❌ 分析失败: {:#}", e);
            std::process::exit(1);
        }
    }
}
