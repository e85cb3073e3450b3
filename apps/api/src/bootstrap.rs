//! Wires every cell into a ready-to-serve orchestrator. Stores are
//! in-memory stand-ins for the hospital information system; the seed
//! data below matches what the HIS sync job would normally load.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use cache_cell::{CacheSweeper, KeyVersions, ResponseCacheGate, TtlSettings};
use calendar_cell::{ClinicCalendar, HolidayClient};
use dialogue_cell::{BookingFunnel, DialogueOrchestrator, OrchestratorDeps, StateRecovery};
use extraction_cell::departments::DEPARTMENTS;
use generation_cell::{
    CorpusDocument, FailoverGenerator, KeywordRetriever, OpenAiCompatProvider, TextGenerator,
};
use intent_cell::{ClinicInfo, StaticAnswerCatalog, ToolIntentRouter};
use shared_config::AppConfig;
use shared_models::{Doctor, WaitStatus};
use shared_store::memory::{
    InMemoryAuditLogStore, InMemoryCacheStore, InMemoryDoctorDirectory,
    InMemoryMedicalHistoryStore, InMemoryNotificationOutbox, InMemoryReservationStore,
    InMemoryTurnStore, InMemoryWaitStatusStore,
};
use shared_store::CacheStore;
use tool_cell::{ToolExecutor, ToolHandlers};

pub fn build_orchestrator(config: &AppConfig) -> Arc<DialogueOrchestrator> {
    let cache_store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let orchestrator = build_with_cache(config, cache_store.clone());

    CacheSweeper::new(
        cache_store,
        config.cache_lock_dir.clone(),
        config.cache_sweep_hour,
    )
    .spawn();

    orchestrator
}

fn build_with_cache(
    config: &AppConfig,
    cache_store: Arc<dyn CacheStore>,
) -> Arc<DialogueOrchestrator> {
    let generator = build_generator(config);

    let turns = Arc::new(InMemoryTurnStore::new());
    let reservations = Arc::new(InMemoryReservationStore::new());
    let audit = Arc::new(InMemoryAuditLogStore::new());
    let doctors = Arc::new(InMemoryDoctorDirectory::new(seed_doctors()));
    let wait = Arc::new(InMemoryWaitStatusStore::new(seed_wait_statuses()));
    let history = Arc::new(InMemoryMedicalHistoryStore::new());
    let outbox = Arc::new(InMemoryNotificationOutbox::new());

    let holiday = Arc::new(HolidayClient::new(
        config.holiday_api_base_url.clone(),
        config.holiday_api_key.clone(),
    ));
    let calendar = Arc::new(ClinicCalendar::new(holiday));

    let handlers = ToolHandlers::new(
        reservations,
        doctors.clone(),
        wait,
        history,
        turns.clone(),
        outbox,
        calendar,
    );
    let executor = Arc::new(ToolExecutor::new(handlers, audit, config.auth_required));

    let cache = ResponseCacheGate::new(
        cache_store,
        KeyVersions {
            index_version: config.rag_index_version.clone(),
            top_k: config.rag_top_k,
            prompt_version: config.prompt_version.clone(),
        },
        TtlSettings {
            default_secs: config.cache_default_ttl_secs,
            dynamic_secs: config.cache_dynamic_ttl_secs,
            static_secs: config.cache_static_ttl_secs,
        },
    );

    Arc::new(DialogueOrchestrator::new(OrchestratorDeps {
        statics: StaticAnswerCatalog::new(ClinicInfo::default()),
        router: ToolIntentRouter::new(generator.clone()),
        recovery: StateRecovery::new(turns.clone()),
        funnel: BookingFunnel::new(doctors),
        executor,
        generator,
        retriever: Arc::new(KeywordRetriever::new(seed_corpus())),
        cache,
        turns,
        auth_required: config.auth_required,
        rag_top_k: config.rag_top_k,
    }))
}

fn build_generator(config: &AppConfig) -> Arc<dyn TextGenerator> {
    let mut providers: Vec<(String, Arc<dyn TextGenerator>)> = vec![(
        "primary".to_string(),
        Arc::new(OpenAiCompatProvider::new(
            "primary",
            config.llm_primary_base_url.clone(),
            config.llm_primary_api_key.clone(),
            config.llm_primary_model.clone(),
        )),
    )];

    if config.llm_secondary_api_key.is_empty() {
        warn!("no secondary LLM configured, running without failover");
    } else {
        providers.push((
            "secondary".to_string(),
            Arc::new(OpenAiCompatProvider::new(
                "secondary",
                config.llm_secondary_base_url.clone(),
                config.llm_secondary_api_key.clone(),
                config.llm_secondary_model.clone(),
            )),
        ));
    }

    info!(provider_count = providers.len(), "text generation ready");
    Arc::new(FailoverGenerator::new(providers))
}

fn seed_doctors() -> Vec<Doctor> {
    let named: [(&str, &str, &str, &str, &str); 5] = [
        ("d-100", "100", "김철수", "외과", "원장"),
        ("d-101", "101", "박영희", "외과", "과장"),
        ("d-102", "102", "이정훈", "내과", "과장"),
        ("d-103", "103", "최수민", "정형외과", "원장"),
        ("d-104", "104", "강지원", "호흡기내과", "전문의"),
    ];

    let mut doctors: Vec<Doctor> = named
        .iter()
        .map(|(id, code, name, dept, title)| Doctor {
            id: (*id).to_string(),
            code: (*code).to_string(),
            display_name: (*name).to_string(),
            department: (*dept).to_string(),
            title: Some((*title).to_string()),
            phone: None,
        })
        .collect();

    // Every remaining department gets a duty doctor so default
    // assignment never comes back empty.
    for (i, dept) in DEPARTMENTS.iter().enumerate() {
        if doctors.iter().any(|d| d.department == *dept) {
            continue;
        }
        let code = 200 + i as u32;
        doctors.push(Doctor {
            id: format!("d-{code}"),
            code: code.to_string(),
            display_name: format!("{dept} 당직의"),
            department: (*dept).to_string(),
            title: Some("전문의".to_string()),
            phone: None,
        });
    }

    doctors
}

fn seed_wait_statuses() -> Vec<WaitStatus> {
    [("외과", 4, 20), ("내과", 7, 35), ("정형외과", 2, 10)]
        .iter()
        .map(|(dept, waiting, minutes)| WaitStatus {
            department: (*dept).to_string(),
            current_waiting: *waiting,
            estimated_minutes: *minutes,
            last_updated: Utc::now(),
        })
        .collect()
}

fn seed_corpus() -> Vec<CorpusDocument> {
    [
        (
            "doc-flu",
            "독감 예방접종 안내",
            "독감 예방접종 비용은 5만원이며 내과에서 접종합니다. 접종은 평일 진료 시간 내에 가능합니다.",
        ),
        (
            "doc-checkup",
            "건강검진 안내",
            "종합 건강검진은 검진센터에서 평일 오전에 진행되며, 기본 검진 비용은 15만원부터입니다. 검진 전날 밤 9시 이후 금식이 필요합니다.",
        ),
        (
            "doc-visit",
            "외래 진료 절차",
            "외래 진료는 원무과 접수 후 해당 진료과에서 진행됩니다. 초진 환자는 신분증을 지참해 주세요.",
        ),
        (
            "doc-docs",
            "제증명 발급 안내",
            "진단서와 소견서는 진료 후 원무과에서 발급받을 수 있습니다. 진단서 발급 비용은 2만원입니다.",
        ),
    ]
    .iter()
    .map(|(id, title, text)| CorpusDocument {
        id: (*id).to_string(),
        title: (*title).to_string(),
        text: (*text).to_string(),
    })
    .collect()
}
