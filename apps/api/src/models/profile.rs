//! Applicant profile (the live query input) and the scored-case wrapper.

use serde::{Deserialize, Serialize};

use crate::models::case::{CanonicalCase, DegreeLevel, LanguageTest, SchoolTier};

/// A validated applicant profile, produced by the external request-validation
/// layer. Read-only; never persisted by the matching core.
///
/// The matching engine only reads the academic fields and `target_degree`;
/// the remaining target-selection fields flow through to the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub undergrad_school: String,
    pub school_tier: SchoolTier,
    pub major: String,
    /// Raw GPA expression, e.g. "3.5/4.0" or "88/100".
    pub gpa: String,
    #[serde(default)]
    pub major_gpa: Option<String>,
    #[serde(default)]
    pub major_ranking: Option<String>,
    #[serde(default)]
    pub exchange_experience: bool,
    #[serde(default)]
    pub language_test: Option<LanguageTest>,
    #[serde(default)]
    pub language_score: Option<f64>,
    #[serde(default)]
    pub gre_score: Option<i32>,
    pub target_degree: DegreeLevel,
    #[serde(default)]
    pub target_countries: Vec<String>,
    /// Target majors ordered by preference.
    #[serde(default)]
    pub target_majors: Vec<String>,
    /// Selection factors ordered by priority.
    #[serde(default)]
    pub school_selection_factors: Vec<String>,
    #[serde(default)]
    pub post_graduation_plan: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
}

/// A canonical case annotated with its similarity score against one profile.
/// Ephemeral — created per request, ranking operates on lists of these.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCase {
    #[serde(flatten)]
    pub case: CanonicalCase,
    pub similarity_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_minimal_fields() {
        let json = r#"{
            "undergrad_school": "华东理工大学",
            "school_tier": "211",
            "major": "软件工程",
            "gpa": "85/100",
            "target_degree": "master"
        }"#;
        let profile: ApplicantProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.school_tier, SchoolTier::Tier211);
        assert_eq!(profile.target_degree, DegreeLevel::Master);
        assert!(profile.target_countries.is_empty());
        assert_eq!(profile.language_test, None);
        assert!(!profile.exchange_experience);
    }

    #[test]
    fn test_profile_deserializes_with_selection_fields() {
        let json = r#"{
            "undergrad_school": "Tsinghua University",
            "school_tier": "985",
            "major": "Computer Science",
            "gpa": "3.8/4.0",
            "language_test": "ielts",
            "language_score": 7.0,
            "gre_score": 325,
            "target_degree": "doctorate",
            "target_countries": ["英国", "香港"],
            "target_majors": ["人工智能", "数据科学"],
            "school_selection_factors": ["专业排名", "地理位置与就业"],
            "post_graduation_plan": "先在当地工作",
            "budget": "30-40万"
        }"#;
        let profile: ApplicantProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.language_test, Some(LanguageTest::Ielts));
        assert_eq!(profile.target_majors.len(), 2);
        assert_eq!(profile.school_selection_factors[0], "专业排名");
    }
}
