//! Analysis report generation — pluggable, trait-based narrative layer over
//! the deterministic matching output.
//!
//! Default: `LlmReportGenerator` (consultant prose via the chat endpoint),
//! degrading to the deterministic template on any LLM failure.
//! `TemplateReportGenerator` is used outright when no API key is configured.
//!
//! `AppState` holds an `Arc<dyn ReportGenerator>`, picked at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::matching::ranking::TierPlan;
use crate::models::profile::{ApplicantProfile, ScoredCase};
use crate::planning::prompts;

/// The report handed back to the API caller. The recommendations always come
/// from the deterministic categorization; only the prose is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub strengths: String,
    pub weaknesses: String,
    pub recommendations: TierPlan,
    pub suggestions: String,
}

/// The prose sections the LLM is asked to produce.
#[derive(Debug, Deserialize)]
struct NarrativeSections {
    strengths: String,
    weaknesses: String,
    suggestions: String,
}

/// One matched case as presented to the LLM — a compact summary, not the
/// full canonical record.
#[derive(Debug, Serialize)]
struct CaseSummary<'a> {
    institution: &'a str,
    program: &'a str,
    undergrad_school_tier: &'a str,
    undergrad_major: Option<&'a str>,
    gpa_scale_4: Option<f64>,
    language: String,
    gre_score: Option<i32>,
    similarity_score: f64,
}

impl<'a> From<&'a ScoredCase> for CaseSummary<'a> {
    fn from(scored: &'a ScoredCase) -> Self {
        let case = &scored.case;
        Self {
            institution: &case.institution,
            program: &case.program,
            undergrad_school_tier: case.undergrad_school_tier.as_str(),
            undergrad_major: case.undergrad_major.as_deref(),
            gpa_scale_4: case.gpa_scale_4,
            language: match (case.language_type, case.language_score) {
                (Some(test), Some(score)) => format!("{} {score}", test.as_str()),
                (Some(test), None) => test.as_str().to_string(),
                _ => "N/A".to_string(),
            },
            gre_score: case.gre_score,
            similarity_score: scored.similarity_score,
        }
    }
}

/// The report generator trait. Implement this to swap backends without
/// touching the endpoint or handler code.
///
/// Carried in `AppState` as `Arc<dyn ReportGenerator>`.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &ApplicantProfile,
        plan: &TierPlan,
        matched: &[ScoredCase],
    ) -> Result<AnalysisReport, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmReportGenerator — default backend
// ────────────────────────────────────────────────────────────────────────────

/// Consultant prose via the chat endpoint. Any LLM failure (transport, API,
/// malformed JSON, empty sections) degrades to the template report so the
/// planning endpoint never fails on narrative generation alone.
pub struct LlmReportGenerator {
    llm: LlmClient,
}

impl LlmReportGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportGenerator for LlmReportGenerator {
    async fn generate(
        &self,
        profile: &ApplicantProfile,
        plan: &TierPlan,
        matched: &[ScoredCase],
    ) -> Result<AnalysisReport, AppError> {
        let prompt = build_report_prompt(profile, plan, matched)?;

        let sections = match self
            .llm
            .call_json::<NarrativeSections>(&prompt, prompts::CONSULTANT_SYSTEM)
            .await
        {
            Ok(sections) if sections.is_complete() => sections,
            Ok(_) => {
                warn!("LLM report had empty sections, falling back to template");
                return Ok(template_report(profile, plan, matched));
            }
            Err(e) => {
                warn!("LLM report generation failed ({e}), falling back to template");
                return Ok(template_report(profile, plan, matched));
            }
        };

        Ok(AnalysisReport {
            strengths: sections.strengths,
            weaknesses: sections.weaknesses,
            recommendations: plan.clone(),
            suggestions: sections.suggestions,
        })
    }
}

impl NarrativeSections {
    fn is_complete(&self) -> bool {
        !self.strengths.trim().is_empty()
            && !self.weaknesses.trim().is_empty()
            && !self.suggestions.trim().is_empty()
    }
}

fn build_report_prompt(
    profile: &ApplicantProfile,
    plan: &TierPlan,
    matched: &[ScoredCase],
) -> Result<String, AppError> {
    let summaries: Vec<CaseSummary<'_>> = matched.iter().map(CaseSummary::from).collect();

    let profile_json =
        serde_json::to_string_pretty(profile).map_err(|e| AppError::Llm(e.to_string()))?;
    let plan_json = serde_json::to_string_pretty(plan).map_err(|e| AppError::Llm(e.to_string()))?;
    let cases_json =
        serde_json::to_string_pretty(&summaries).map_err(|e| AppError::Llm(e.to_string()))?;

    Ok(prompts::REPORT_PROMPT_TEMPLATE
        .replace("{profile_json}", &profile_json)
        .replace("{plan_json}", &plan_json)
        .replace("{cases_json}", &cases_json))
}

// ────────────────────────────────────────────────────────────────────────────
// TemplateReportGenerator — deterministic fallback
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic report without any LLM call. Used when no API key is
/// configured, and as the degradation path of the LLM backend.
pub struct TemplateReportGenerator;

#[async_trait]
impl ReportGenerator for TemplateReportGenerator {
    async fn generate(
        &self,
        profile: &ApplicantProfile,
        plan: &TierPlan,
        matched: &[ScoredCase],
    ) -> Result<AnalysisReport, AppError> {
        Ok(template_report(profile, plan, matched))
    }
}

/// Builds the template report from the profile and the matched set. Every
/// prose section is guaranteed non-empty; the tier plan is embedded unchanged.
fn template_report(
    profile: &ApplicantProfile,
    plan: &TierPlan,
    matched: &[ScoredCase],
) -> AnalysisReport {
    let strengths = format!(
        "本科院校为{}（{}），专业{}，GPA {}。共匹配到 {} 个背景相似的成功录取案例，\
        说明该背景在目标申请层次中有可参照的成功先例。",
        profile.undergrad_school,
        profile.school_tier.as_str(),
        profile.major,
        profile.gpa,
        matched.len()
    );

    let mut weaknesses = String::new();
    if profile.language_score.is_none() {
        weaknesses.push_str("尚未提供有效语言成绩，建议尽早完成语言考试。");
    }
    if profile.gre_score.is_none() {
        weaknesses.push_str("未提供 GRE 成绩，部分项目可能因此受限。");
    }
    if weaknesses.is_empty() {
        weaknesses.push_str("与头部成功案例相比仍有提升空间，建议进一步完善申请材料。");
    }

    let suggestions = format!(
        "建议围绕 {} 所冲刺院校、{} 所核心院校和 {} 所保底院校制定申请策略，\
        并根据各校要求逐项补齐材料。如需更详细的分析，请联系专业顾问。",
        plan.reach.len(),
        plan.target.len(),
        plan.safety.len()
    );

    AnalysisReport {
        strengths,
        weaknesses,
        recommendations: plan.clone(),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::ranking::Recommendation;
    use crate::models::case::{DegreeLevel, SchoolTier};

    fn profile() -> ApplicantProfile {
        serde_json::from_value(serde_json::json!({
            "undergrad_school": "华东理工大学",
            "school_tier": "211",
            "major": "软件工程",
            "gpa": "85/100",
            "target_degree": "master"
        }))
        .unwrap()
    }

    fn plan() -> TierPlan {
        TierPlan {
            reach: vec![Recommendation {
                institution: "香港大学".to_string(),
                program: "计算机科学硕士".to_string(),
                reason: "相似度得分: 72.0".to_string(),
                evidence_case_id: 11,
            }],
            target: vec![],
            safety: vec![],
        }
    }

    #[tokio::test]
    async fn test_template_report_sections_non_empty() {
        let report = TemplateReportGenerator
            .generate(&profile(), &plan(), &[])
            .await
            .unwrap();
        assert!(!report.strengths.trim().is_empty());
        assert!(!report.weaknesses.trim().is_empty());
        assert!(!report.suggestions.trim().is_empty());
    }

    #[test]
    fn test_template_report_embeds_plan_unchanged() {
        let plan = plan();
        let report = template_report(&profile(), &plan, &[]);
        assert_eq!(report.recommendations.reach.len(), 1);
        assert_eq!(report.recommendations.reach[0].institution, "香港大学");
        assert_eq!(report.recommendations.reach[0].evidence_case_id, 11);
    }

    #[test]
    fn test_template_report_flags_missing_scores() {
        let report = template_report(&profile(), &TierPlan::default(), &[]);
        assert!(report.weaknesses.contains("语言"));
        assert!(report.weaknesses.contains("GRE"));
    }

    #[test]
    fn test_report_prompt_includes_profile_and_cases() {
        let mut p = profile();
        p.school_tier = SchoolTier::Tier985;
        p.target_degree = DegreeLevel::Master;
        let prompt = build_report_prompt(&p, &TierPlan::default(), &[]).unwrap();
        assert!(prompt.contains("华东理工大学"));
        assert!(!prompt.contains("{profile_json}"));
        assert!(!prompt.contains("{plan_json}"));
        assert!(!prompt.contains("{cases_json}"));
    }
}
