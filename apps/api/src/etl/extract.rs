//! Record Extractor — turns one raw historical record into a canonical case.
//!
//! Structured columns take precedence over values derived from free text;
//! free-text derivation is the fallback. Every step is a pure function
//! returning present/absent — parse noise never throws. Logging of rejected
//! or unparseable records happens at the pipeline call site.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::FromRow;
use thiserror::Error;

use crate::matching::classifier::ClassifierTables;
use crate::matching::gpa::parse_gpa;
use crate::matching::language::parse_language_score;
use crate::models::case::{CanonicalCase, DegreeLevel, WorkExperience};

/// One raw row from the bulk source store.
#[derive(Debug, Clone, Default, FromRow)]
pub struct RawRecord {
    pub id: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub institution: Option<String>,
    pub program: Option<String>,
    pub background: Option<String>,
    pub gpa: Option<String>,
    pub language_score: Option<String>,
    pub graduation_year: Option<String>,
}

/// Why a raw record was excluded from the canonical corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("no institution in columns or title")]
    MissingInstitution,
    #[error("degree level could not be determined")]
    UndeterminedDegreeLevel,
}

/// Admissions-year plausibility window for extracted graduation years.
const YEAR_WINDOW: std::ops::RangeInclusive<i32> = 2020..=2030;

/// Minimum character length for a text-derived school/major match; shorter
/// matches are suffix-only noise.
const MIN_MATCH_CHARS: usize = 3;

// Title shaped like "<institution>…<program>" split on degree-level markers.
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([^，,。]*(?:大学|学院|University|College|Institute))[^，,。]*?([^，,。]*(?:硕士|博士|Master|PhD))",
    )
    .unwrap()
});
static SCHOOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^，,。\s]*(?:大学|学院|University|College))").unwrap());
// 的 is excluded so a narrative particle before the major ("…的经济学")
// is not swallowed into the capture.
static MAJOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^，,。\s的]*(?:工程|科学|技术|管理|经济|学))").unwrap());
static GPA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GPA[：:\s]*(\d+\.?\d*(?:/\d+\.?\d*)?)").unwrap());
static LANGUAGE_SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:雅思|托福|多邻国|IELTS|TOEFL|Duolingo|ielts|toefl|duolingo)[：:\s]*\d+\.?\d*)")
        .unwrap()
});
static GRE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"GRE[：:\s]*(\d+)").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(20\d{2})").unwrap());

/// Extracts a canonical case from one raw record, or rejects it.
pub fn extract_case(
    raw: &RawRecord,
    tables: &ClassifierTables,
) -> Result<CanonicalCase, RejectReason> {
    let title = raw.title.as_deref().unwrap_or("").trim();
    let background = raw.background.as_deref().unwrap_or("").trim();

    let (title_institution, title_program) = split_title(title);

    let institution = column_or(&raw.institution, title_institution)
        .ok_or(RejectReason::MissingInstitution)?;
    let program = column_or(&raw.program, title_program).unwrap_or_default();

    let degree_level = detect_degree_level(title, &program)
        .ok_or(RejectReason::UndeterminedDegreeLevel)?;

    let undergrad_school = extract_undergrad_school(background, &institution);
    let undergrad_major = extract_undergrad_major(background);

    // An explicit tier label in the background text wins over the
    // name-based classification.
    let undergrad_school_tier = tables
        .tier_label_in(background)
        .unwrap_or_else(|| tables.classify_school_tier(undergrad_school.as_deref()));

    let gpa_original = column_or(&raw.gpa, extract_gpa_text(background, title));
    let (gpa_scale_4, gpa_scale_100) = match gpa_original.as_deref().and_then(parse_gpa) {
        Some((gpa_4, gpa_100)) => (Some(gpa_4), Some(gpa_100)),
        None => (None, None),
    };

    let language_source = column_or(&raw.language_score, extract_language_text(background, title));
    let (language_type, language_score) = language_source
        .as_deref()
        .map(parse_language_score)
        .unwrap_or((None, None));

    Ok(CanonicalCase {
        original_id: raw.id,
        institution,
        program,
        degree_level,
        undergrad_school,
        undergrad_school_tier,
        undergrad_major,
        gpa_original,
        gpa_scale_4,
        gpa_scale_100,
        language_type,
        language_score,
        gre_score: extract_gre(background, title),
        work_experience: extract_work_experience(background, title),
        graduation_year: extract_graduation_year(raw.graduation_year.as_deref(), background, title),
        original_url: raw.url.clone(),
        original_title: raw.title.clone(),
    })
}

/// A non-empty structured column wins over the text-derived fallback.
fn column_or(column: &Option<String>, derived: Option<String>) -> Option<String> {
    match column.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => derived,
    }
}

/// Splits a title on degree-level markers to isolate the admitting
/// institution from the program name.
fn split_title(title: &str) -> (Option<String>, Option<String>) {
    match TITLE_RE.captures(title) {
        Some(caps) => (
            Some(caps[1].trim().to_string()).filter(|s| !s.is_empty()),
            Some(caps[2].trim().to_string()).filter(|s| !s.is_empty()),
        ),
        None => (None, None),
    }
}

/// Doctorate markers anywhere in title+program text; Master's otherwise.
/// Undetermined only when there is no text to search at all.
fn detect_degree_level(title: &str, program: &str) -> Option<DegreeLevel> {
    let combined = format!("{title} {program}").trim().to_lowercase();
    if combined.is_empty() {
        return None;
    }
    if ["博士", "phd", "doctor"].iter().any(|kw| combined.contains(kw)) {
        Some(DegreeLevel::Doctorate)
    } else {
        Some(DegreeLevel::Master)
    }
}

/// First institution-suffix match in the background text that is long enough
/// and is not the admitting institution itself.
fn extract_undergrad_school(background: &str, admitting: &str) -> Option<String> {
    SCHOOL_RE
        .captures_iter(background)
        .map(|caps| clean_school_name(caps[1].trim()).to_string())
        .find(|name| name.chars().count() >= MIN_MATCH_CHARS && name != admitting)
}

/// Drops narrative lead-ins the school regex inevitably swallows, e.g.
/// "本科华东理工大学" or "2023年毕业于武汉大学".
fn clean_school_name(name: &str) -> &str {
    let mut name = name;
    for marker in ["毕业于", "就读于", "本科"] {
        if let Some(idx) = name.find(marker) {
            name = &name[idx + marker.len()..];
        }
    }
    name
}

/// First major-suffix match in the background text, filtered for noise.
fn extract_undergrad_major(background: &str) -> Option<String> {
    MAJOR_RE
        .captures_iter(background)
        .map(|caps| caps[1].trim().to_string())
        .find(|major| {
            major.chars().count() >= MIN_MATCH_CHARS
                && !major.contains("大学")
                && !major.contains("学院")
        })
}

fn extract_gpa_text(background: &str, title: &str) -> Option<String> {
    GPA_RE
        .captures(background)
        .or_else(|| GPA_RE.captures(title))
        .map(|caps| caps[1].to_string())
}

fn extract_language_text(background: &str, title: &str) -> Option<String> {
    LANGUAGE_SNIPPET_RE
        .captures(background)
        .or_else(|| LANGUAGE_SNIPPET_RE.captures(title))
        .map(|caps| caps[1].to_string())
}

fn extract_gre(background: &str, title: &str) -> Option<i32> {
    GRE_RE
        .captures(background)
        .or_else(|| GRE_RE.captures(title))
        .and_then(|caps| caps[1].parse().ok())
}

/// Structured column first (when numeric), else a year token from free text,
/// validated against the plausible admissions window.
fn extract_graduation_year(
    column: Option<&str>,
    background: &str,
    title: &str,
) -> Option<i32> {
    if let Some(year) = column.map(str::trim).and_then(|s| s.parse::<i32>().ok()) {
        return Some(year);
    }
    YEAR_RE
        .captures(background)
        .or_else(|| YEAR_RE.captures(title))
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .filter(|year| YEAR_WINDOW.contains(year))
}

/// Three-way work-experience classification, defaulting to fresh graduate.
fn extract_work_experience(background: &str, title: &str) -> WorkExperience {
    let combined = format!("{background} {title}");
    if combined.contains("应届") {
        WorkExperience::FreshGraduate
    } else if combined.contains("已毕业") {
        WorkExperience::Graduated
    } else if combined.contains("经验") {
        WorkExperience::Experienced
    } else {
        WorkExperience::FreshGraduate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::{LanguageTest, SchoolTier};

    fn tables() -> ClassifierTables {
        ClassifierTables::default()
    }

    fn raw(title: &str, background: &str) -> RawRecord {
        RawRecord {
            id: 1,
            title: Some(title.to_string()),
            background: Some(background.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_title_split_into_institution_and_program() {
        let record = raw("香港大学计算机科学硕士offer分享", "");
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.institution, "香港大学");
        assert_eq!(case.program, "计算机科学硕士");
        assert_eq!(case.degree_level, DegreeLevel::Master);
    }

    #[test]
    fn test_structured_columns_win_over_title() {
        let mut record = raw("香港大学计算机科学硕士offer", "");
        record.institution = Some("新加坡国立大学".to_string());
        record.program = Some("数据科学硕士".to_string());
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.institution, "新加坡国立大学");
        assert_eq!(case.program, "数据科学硕士");
    }

    #[test]
    fn test_doctorate_markers_in_title() {
        let record = raw("新加坡国立大学计算机博士录取", "");
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.degree_level, DegreeLevel::Doctorate);
    }

    #[test]
    fn test_background_yields_school_major_and_tier() {
        let record = raw(
            "香港大学计算机科学硕士offer",
            "本科华东理工大学，软件工程专业，GPA 3.6/4.0，雅思7.0，应届生",
        );
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.undergrad_school.as_deref(), Some("华东理工大学"));
        assert_eq!(case.undergrad_major.as_deref(), Some("软件工程"));
        assert_eq!(case.undergrad_school_tier, SchoolTier::Tier211);
        assert_eq!(case.gpa_scale_4, Some(3.6));
        assert_eq!(case.gpa_scale_100, Some(90.0));
        assert_eq!(case.language_type, Some(LanguageTest::Ielts));
        assert_eq!(case.language_score, Some(7.0));
        assert_eq!(case.work_experience, WorkExperience::FreshGraduate);
    }

    #[test]
    fn test_explicit_tier_label_overrides_name_classification() {
        // The school name alone would classify as 985; the explicit label wins.
        let record = raw(
            "香港大学计算机科学硕士offer",
            "本科211院校 清华大学 计算机科学与技术",
        );
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.undergrad_school_tier, SchoolTier::Tier211);
    }

    #[test]
    fn test_gpa_column_wins_over_background_text() {
        let mut record = raw("香港大学金融硕士offer", "本科南京大学 GPA 3.2/4.0");
        record.gpa = Some("3.8/4.0".to_string());
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.gpa_original.as_deref(), Some("3.8/4.0"));
        assert_eq!(case.gpa_scale_4, Some(3.8));
    }

    #[test]
    fn test_gpa_invariant_both_present_or_both_absent() {
        let record = raw("香港大学金融硕士offer", "本科南京大学，无成绩信息");
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.gpa_scale_4, None);
        assert_eq!(case.gpa_scale_100, None);
    }

    #[test]
    fn test_out_of_range_language_score_absent_in_case() {
        let mut record = raw("香港大学金融硕士offer", "");
        record.language_score = Some("雅思 95".to_string());
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.language_type, Some(LanguageTest::Ielts));
        assert_eq!(case.language_score, None);
    }

    #[test]
    fn test_language_snippet_not_confused_by_other_numbers() {
        // The first number in the background is a year; the language snippet
        // extractor must still pick up the IELTS score.
        let record = raw(
            "香港大学金融硕士offer",
            "2023年毕业于武汉大学，雅思6.5，GRE: 325",
        );
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.language_type, Some(LanguageTest::Ielts));
        assert_eq!(case.language_score, Some(6.5));
        assert_eq!(case.gre_score, Some(325));
        assert_eq!(case.graduation_year, Some(2023));
        assert_eq!(case.undergrad_school.as_deref(), Some("武汉大学"));
    }

    #[test]
    fn test_graduation_year_column_priority_and_window() {
        let mut record = raw("香港大学金融硕士offer", "2035年的信息不可信");
        record.graduation_year = Some("2024".to_string());
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.graduation_year, Some(2024));

        // Without the column, an out-of-window text year is discarded.
        record.graduation_year = None;
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.graduation_year, None);
    }

    #[test]
    fn test_work_experience_three_way() {
        let tables = tables();
        let fresh = raw("香港大学金融硕士offer", "应届生申请");
        let graduated = raw("香港大学金融硕士offer", "已毕业两年");
        let experienced = raw("香港大学金融硕士offer", "三年工作经验");
        let default = raw("香港大学金融硕士offer", "");
        assert_eq!(
            extract_case(&fresh, &tables).unwrap().work_experience,
            WorkExperience::FreshGraduate
        );
        assert_eq!(
            extract_case(&graduated, &tables).unwrap().work_experience,
            WorkExperience::Graduated
        );
        assert_eq!(
            extract_case(&experienced, &tables).unwrap().work_experience,
            WorkExperience::Experienced
        );
        assert_eq!(
            extract_case(&default, &tables).unwrap().work_experience,
            WorkExperience::FreshGraduate
        );
    }

    #[test]
    fn test_empty_record_rejected_for_missing_institution() {
        let record = RawRecord {
            id: 7,
            ..RawRecord::default()
        };
        assert_eq!(
            extract_case(&record, &tables()),
            Err(RejectReason::MissingInstitution)
        );
    }

    #[test]
    fn test_unknown_tier_when_no_background_school() {
        let record = raw("香港大学金融硕士offer", "");
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.undergrad_school, None);
        assert_eq!(case.undergrad_school_tier, SchoolTier::Unknown);
    }

    #[test]
    fn test_short_matches_filtered_as_noise() {
        // "大学" alone (2 chars) must not be taken as an undergrad school.
        let record = raw("香港大学金融硕士offer", "想申请 大学 的经济学项目");
        let case = extract_case(&record, &tables()).unwrap();
        assert_eq!(case.undergrad_school, None);
        assert_eq!(case.undergrad_major.as_deref(), Some("经济学"));
    }
}
