//! Axum route handlers for the school-planning API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::matching::store;
use crate::models::case::CanonicalCase;
use crate::models::profile::{ApplicantProfile, ScoredCase};
use crate::planning::report::AnalysisReport;
use crate::state::AppState;

const DEFAULT_SAMPLE_LIMIT: i64 = 10;
const MAX_SAMPLE_LIMIT: i64 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SchoolPlanningResponse {
    pub analysis_report: AnalysisReport,
    pub matched_cases: Vec<ScoredCase>,
}

#[derive(Debug, Serialize)]
pub struct CasesCountResponse {
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct SampleParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SampleCasesResponse {
    pub cases: Vec<CanonicalCase>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/school-planning
///
/// The core operation: match the profile against the corpus, categorize the
/// matches into a tier plan, and wrap both in a narrative analysis report.
/// An empty match set is a 404 — there is nothing to plan against.
pub async fn handle_school_planning(
    State(state): State<AppState>,
    Json(profile): Json<ApplicantProfile>,
) -> Result<Json<SchoolPlanningResponse>, AppError> {
    if profile.undergrad_school.trim().is_empty() {
        return Err(AppError::Validation(
            "undergrad_school cannot be empty".to_string(),
        ));
    }

    let corpus = store::load_corpus(&state.db, profile.target_degree)
        .await
        .map_err(AppError::Internal)?;

    let matched = state.engine.find_similar(&profile, &corpus);
    if matched.is_empty() {
        return Err(AppError::NotFound(
            "未找到相似案例，请调整筛选条件".to_string(),
        ));
    }
    info!(
        matched = matched.len(),
        corpus = corpus.len(),
        "profile matched against corpus"
    );

    let plan = state.engine.categorize(&matched);
    let analysis_report = state
        .report_generator
        .generate(&profile, &plan, &matched)
        .await?;

    Ok(Json(SchoolPlanningResponse {
        analysis_report,
        matched_cases: matched,
    }))
}

/// GET /api/v1/cases/count
pub async fn handle_cases_count(
    State(state): State<AppState>,
) -> Result<Json<CasesCountResponse>, AppError> {
    let total = store::count_cases(&state.db)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(CasesCountResponse { total }))
}

/// GET /api/v1/cases/sample?limit=n
///
/// A small inspection window into the canonical corpus.
pub async fn handle_sample_cases(
    State(state): State<AppState>,
    Query(params): Query<SampleParams>,
) -> Result<Json<SampleCasesResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SAMPLE_LIMIT)
        .clamp(1, MAX_SAMPLE_LIMIT);

    let cases = store::sample_cases(&state.db, limit)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(SampleCasesResponse { cases }))
}

/// GET /api/v1/config/options
///
/// Static option lists backing the form frontend's dropdowns.
pub async fn handle_config_options() -> Json<serde_json::Value> {
    Json(json!({
        "school_tiers": ["985", "211", "双一流", "普通一本", "普通二本", "海外院校", "其他"],
        "language_tests": ["雅思", "托福", "多邻国", "暂无"],
        "degree_levels": ["硕士", "博士"],
        "countries": ["英国", "香港", "新加坡", "美国", "澳大利亚", "加拿大", "德国", "法国", "荷兰"],
        "popular_majors": [
            "计算机科学", "软件工程", "数据科学", "人工智能", "机器学习",
            "金融", "会计", "市场营销", "管理学", "工商管理",
            "机械工程", "电子工程", "土木工程", "材料科学",
            "经济学", "国际关系", "教育学", "心理学", "传媒学"
        ],
        "popular_universities": [
            "北京大学", "清华大学", "复旦大学", "上海交通大学", "浙江大学",
            "中国科学技术大学", "南京大学", "华中科技大学", "中山大学", "西安交通大学",
            "哈尔滨工业大学", "北京理工大学", "东南大学", "同济大学", "天津大学"
        ],
        "post_graduation_plans": ["立即回国", "先在当地工作", "不确定"],
        "school_selection_factors": [
            "综合排名", "专业排名", "地理位置与就业", "学费与性价比",
            "教授与科研实力", "校园文化"
        ]
    }))
}
