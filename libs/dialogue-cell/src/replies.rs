use regex::Regex;

pub const EMPTY_MESSAGE_REPLY: &str = "무엇을 도와드릴까요?";
pub const GREETING_REPLY: &str = "안녕하세요! 하늘병원 챗봇입니다. 무엇을 도와드릴까요?";
pub const APOLOGY_REPLY: &str =
    "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const RETRY_REPLY: &str = "요청을 처리하지 못했습니다. 잠시 후 다시 시도해주세요.";

/// Strips markdown the generator tends to emit even when told not to:
/// code fences, bold/italic emphasis, inline code, heading prefixes.
pub struct ResponseCleaner {
    fence: Regex,
    emphasis: Regex,
    inline_code: Regex,
    heading: Regex,
}

impl ResponseCleaner {
    pub fn new() -> Self {
        Self {
            fence: Regex::new(r"```[a-zA-Z]*\n?|```").unwrap(),
            emphasis: Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__|\*([^*\n]+)\*").unwrap(),
            inline_code: Regex::new(r"`([^`]+)`").unwrap(),
            heading: Regex::new(r"(?m)^#{1,6}\s*").unwrap(),
        }
    }

    pub fn clean(&self, text: &str) -> String {
        let out = self.fence.replace_all(text, "");
        let out = self
            .emphasis
            .replace_all(&out, |caps: &regex::Captures| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            });
        let out = self.inline_code.replace_all(&out, "$1");
        let out = self.heading.replace_all(&out, "");
        out.trim().to_string()
    }
}

impl Default for ResponseCleaner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_is_stripped() {
        let cleaner = ResponseCleaner::new();
        assert_eq!(cleaner.clean("**진료 시간**은 `08:30`부터입니다."), "진료 시간은 08:30부터입니다.");
        assert_eq!(cleaner.clean("## 안내\n주차장은 지하에 있습니다."), "안내\n주차장은 지하에 있습니다.");
        assert_eq!(
            cleaner.clean("```\n예약 완료\n```"),
            "예약 완료"
        );
    }

    #[test]
    fn plain_text_is_untouched() {
        let cleaner = ResponseCleaner::new();
        assert_eq!(cleaner.clean("평일 08:30~17:00 진료합니다."), "평일 08:30~17:00 진료합니다.");
    }
}
