use std::env;
use tracing::warn;

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a number, using default {}", key, default);
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_primary_base_url: String,
    pub llm_primary_api_key: String,
    pub llm_primary_model: String,
    pub llm_secondary_base_url: String,
    pub llm_secondary_api_key: String,
    pub llm_secondary_model: String,
    pub holiday_api_base_url: String,
    pub holiday_api_key: String,
    pub auth_required: bool,
    pub cache_default_ttl_secs: u64,
    pub cache_dynamic_ttl_secs: u64,
    pub cache_static_ttl_secs: u64,
    pub cache_sweep_hour: u32,
    pub cache_lock_dir: String,
    pub rag_top_k: u32,
    pub rag_index_version: String,
    pub prompt_version: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            llm_primary_base_url: env::var("LLM_PRIMARY_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("LLM_PRIMARY_BASE_URL not set, using default");
                    "https://api.openai.com/v1".to_string()
                }),
            llm_primary_api_key: env::var("LLM_PRIMARY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("LLM_PRIMARY_API_KEY not set, using empty value");
                    String::new()
                }),
            llm_primary_model: env::var("LLM_PRIMARY_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            llm_secondary_base_url: env::var("LLM_SECONDARY_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("LLM_SECONDARY_BASE_URL not set, using default");
                    "https://api.groq.com/openai/v1".to_string()
                }),
            llm_secondary_api_key: env::var("LLM_SECONDARY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("LLM_SECONDARY_API_KEY not set, using empty value");
                    String::new()
                }),
            llm_secondary_model: env::var("LLM_SECONDARY_MODEL")
                .unwrap_or_else(|_| "llama-3.1-70b-versatile".to_string()),
            holiday_api_base_url: env::var("HOLIDAY_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("HOLIDAY_API_BASE_URL not set, using empty value");
                    String::new()
                }),
            holiday_api_key: env::var("HOLIDAY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("HOLIDAY_API_KEY not set, using empty value");
                    String::new()
                }),
            auth_required: env::var("CHAT_AUTH_REQUIRED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            cache_default_ttl_secs: env_u64("CACHE_DEFAULT_TTL_SECS", 60 * 60 * 24),
            cache_dynamic_ttl_secs: env_u64("CACHE_DYNAMIC_TTL_SECS", 60 * 10),
            cache_static_ttl_secs: env_u64("CACHE_STATIC_TTL_SECS", 60 * 60 * 24 * 7),
            cache_sweep_hour: env_u64("CACHE_SWEEP_HOUR", 4) as u32,
            cache_lock_dir: env::var("CACHE_LOCK_DIR")
                .unwrap_or_else(|_| env::temp_dir().to_string_lossy().into_owned()),
            rag_top_k: env_u64("RAG_TOP_K", 4) as u32,
            rag_index_version: env::var("RAG_INDEX_VERSION")
                .unwrap_or_else(|_| "v1".to_string()),
            prompt_version: env::var("PROMPT_VERSION")
                .unwrap_or_else(|_| "v1".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.llm_primary_base_url.is_empty()
            && !self.llm_primary_api_key.is_empty()
    }

    pub fn is_holiday_lookup_configured(&self) -> bool {
        !self.holiday_api_base_url.is_empty()
    }
}
