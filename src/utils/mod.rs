pub mod prompts;
pub mod response_parser;
pub mod stats;

/// 按字符截取前`limit`个字符，避免在多字节字符中间切断
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
