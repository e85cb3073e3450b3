use shared_models::{ButtonPayload, SourceRef, TablePayload};

use crate::keywords::{contains_any, FIXED_INFO_KEYWORDS, FIXED_INFO_PERSONAL_EXCEPTIONS};

/// True for location/hours/parking/contact/cancer-center questions, except
/// when the phrasing is personal ("내 진료시간") and belongs to the tool
/// flow instead.
pub fn is_fixed_info_query(query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    let lower = query.to_lowercase();
    let fixed = FIXED_INFO_KEYWORDS
        .iter()
        .any(|k| query.contains(k) || lower.contains(k));
    fixed && !contains_any(query, &FIXED_INFO_PERSONAL_EXCEPTIONS)
}

#[derive(Debug, Clone)]
pub struct ClinicInfo {
    pub name: String,
    pub address: String,
    pub main_phone: String,
    pub er_phone: String,
    pub parking_summary: String,
    pub cancer_centers: Vec<String>,
}

impl Default for ClinicInfo {
    fn default() -> Self {
        Self {
            name: "하늘병원".to_string(),
            address: "경기도 의정부시 하늘로 123".to_string(),
            main_phone: "1577-3330".to_string(),
            er_phone: "031-820-0119".to_string(),
            parking_summary: "본관 지하 1~3층 주차장을 이용하실 수 있으며, 외래 환자는 진료 확인 시 3시간 무료입니다.".to_string(),
            cancer_centers: vec![
                "위암".to_string(),
                "대장암".to_string(),
                "간암".to_string(),
                "유방암".to_string(),
                "폐암".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaticAnswer {
    pub topic: &'static str,
    pub reply: String,
    pub table: Option<TablePayload>,
    pub buttons: Vec<ButtonPayload>,
    pub sources: Vec<SourceRef>,
}

pub struct StaticAnswerCatalog {
    info: ClinicInfo,
}

impl StaticAnswerCatalog {
    pub fn new(info: ClinicInfo) -> Self {
        Self { info }
    }

    pub fn answer(&self, query: &str) -> Option<StaticAnswer> {
        if !is_fixed_info_query(query) {
            return None;
        }
        let lower = query.to_lowercase();
        let answer = if query.contains("주차") || query.contains("정산") || lower.contains("parking")
        {
            self.build("parking", self.info.parking_summary.clone(), None, vec![])
        } else if query.contains("위치") || query.contains("주소") {
            self.build(
                "location",
                format!("{} 위치는 {} 입니다.", self.info.name, self.info.address),
                None,
                vec![ButtonPayload {
                    text: "길찾기".to_string(),
                    action: "directions".to_string(),
                }],
            )
        } else if query.contains("암센터") {
            self.build(
                "cancer_center",
                format!(
                    "{}에서는 {} 암센터를 운영하고 있습니다.",
                    self.info.name,
                    self.info.cancer_centers.join(", ")
                ),
                None,
                vec![],
            )
        } else if query.contains("번호") || query.contains("연락처") || query.contains("콜센터")
            || query.contains("응급실")
        {
            self.build(
                "contact",
                format!(
                    "대표번호는 {}, 응급실은 {} 입니다.",
                    self.info.main_phone, self.info.er_phone
                ),
                None,
                vec![ButtonPayload {
                    text: "전화 걸기".to_string(),
                    action: format!("call:{}", self.info.main_phone),
                }],
            )
        } else {
            // Hours topics are what remains of the fixed-info keyword set.
            self.build(
                "hours",
                "진료 시간은 평일 08:30~17:00, 토요일(1·3주) 08:30~12:00이며 일요일과 공휴일은 휴진입니다.".to_string(),
                Some(TablePayload {
                    headers: vec!["구분".to_string(), "진료 시간".to_string()],
                    rows: vec![
                        vec!["평일".to_string(), "08:30~17:00".to_string()],
                        vec!["토요일(1·3주)".to_string(), "08:30~12:00".to_string()],
                        vec!["일요일/공휴일".to_string(), "휴진".to_string()],
                    ],
                }),
                vec![],
            )
        };
        Some(answer)
    }

    fn build(
        &self,
        topic: &'static str,
        reply: String,
        table: Option<TablePayload>,
        buttons: Vec<ButtonPayload>,
    ) -> StaticAnswer {
        StaticAnswer {
            topic,
            reply,
            table,
            buttons,
            sources: vec![SourceRef {
                kind: "static".to_string(),
                id: Some(topic.to_string()),
                title: None,
                score: None,
                snippet: None,
            }],
        }
    }
}
