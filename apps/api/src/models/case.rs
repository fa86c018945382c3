//! Canonical admission-case model and its categorical enums.
//!
//! A `CanonicalCase` is produced once by the ETL extractor, stored in the
//! `cases` table, and read back as an immutable corpus snapshot for matching.
//! Enums are stored as their `as_str` token in TEXT columns; unknown stored
//! tokens degrade to the enum's unknown/default variant on load rather than
//! failing the whole snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Degree level of the admitted program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    Master,
    Doctorate,
}

impl DegreeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DegreeLevel::Master => "master",
            DegreeLevel::Doctorate => "doctorate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "master" => Some(DegreeLevel::Master),
            "doctorate" => Some(DegreeLevel::Doctorate),
            _ => None,
        }
    }
}

/// Coarse ordinal classification of undergraduate institution prestige.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolTier {
    #[serde(rename = "985")]
    Tier985,
    #[serde(rename = "211")]
    Tier211,
    #[serde(rename = "overseas")]
    Overseas,
    #[serde(rename = "ordinary")]
    Ordinary,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SchoolTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SchoolTier::Tier985 => "985",
            SchoolTier::Tier211 => "211",
            SchoolTier::Overseas => "overseas",
            SchoolTier::Ordinary => "ordinary",
            SchoolTier::Other => "other",
            SchoolTier::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "985" => Some(SchoolTier::Tier985),
            "211" => Some(SchoolTier::Tier211),
            "overseas" => Some(SchoolTier::Overseas),
            "ordinary" => Some(SchoolTier::Ordinary),
            "other" => Some(SchoolTier::Other),
            "unknown" => Some(SchoolTier::Unknown),
            _ => None,
        }
    }

    /// Ordinal prestige level used by the school-tier sub-score.
    /// Overseas institutions rank alongside 211.
    pub fn level(self) -> u8 {
        match self {
            SchoolTier::Tier985 => 4,
            SchoolTier::Tier211 | SchoolTier::Overseas => 3,
            SchoolTier::Ordinary => 2,
            SchoolTier::Other | SchoolTier::Unknown => 1,
        }
    }
}

/// Standardized language test. The plausibility ceiling is per test: a score
/// above the ceiling indicates a parsing error and is discarded, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageTest {
    Ielts,
    Toefl,
    Duolingo,
}

impl LanguageTest {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageTest::Ielts => "ielts",
            LanguageTest::Toefl => "toefl",
            LanguageTest::Duolingo => "duolingo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ielts" => Some(LanguageTest::Ielts),
            "toefl" => Some(LanguageTest::Toefl),
            "duolingo" => Some(LanguageTest::Duolingo),
            _ => None,
        }
    }

    pub fn ceiling(self) -> f64 {
        match self {
            LanguageTest::Ielts => 9.0,
            LanguageTest::Toefl => 120.0,
            LanguageTest::Duolingo => 160.0,
        }
    }
}

/// Work-experience status at application time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkExperience {
    #[default]
    FreshGraduate,
    Graduated,
    Experienced,
}

impl WorkExperience {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkExperience::FreshGraduate => "fresh_graduate",
            WorkExperience::Graduated => "graduated",
            WorkExperience::Experienced => "experienced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fresh_graduate" => Some(WorkExperience::FreshGraduate),
            "graduated" => Some(WorkExperience::Graduated),
            "experienced" => Some(WorkExperience::Experienced),
            _ => None,
        }
    }
}

/// One cleaned historical admission record.
///
/// Invariants upheld by the extractor:
/// - `gpa_scale_4` and `gpa_scale_100` are both present (mutually consistent,
///   clamped to range) or both absent.
/// - `language_score`, if present, satisfies the test-specific ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCase {
    /// Id of the raw record in the source store (provenance; also the
    /// deterministic tie-break key for equal similarity scores).
    pub original_id: i64,
    pub institution: String,
    pub program: String,
    pub degree_level: DegreeLevel,
    pub undergrad_school: Option<String>,
    pub undergrad_school_tier: SchoolTier,
    pub undergrad_major: Option<String>,
    pub gpa_original: Option<String>,
    pub gpa_scale_4: Option<f64>,
    pub gpa_scale_100: Option<f64>,
    pub language_type: Option<LanguageTest>,
    pub language_score: Option<f64>,
    pub gre_score: Option<i32>,
    pub work_experience: WorkExperience,
    pub graduation_year: Option<i32>,
    pub original_url: Option<String>,
    pub original_title: Option<String>,
}

/// Raw database row for the `cases` table. Converted to `CanonicalCase` on
/// load; enum columns that fail to parse degrade to unknown/default variants.
#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: i64,
    pub original_id: i64,
    pub institution: String,
    pub program: String,
    pub degree_level: String,
    pub undergrad_school: Option<String>,
    pub undergrad_school_tier: String,
    pub undergrad_major: Option<String>,
    pub gpa_original: Option<String>,
    pub gpa_scale_4: Option<f64>,
    pub gpa_scale_100: Option<f64>,
    pub language_type: Option<String>,
    pub language_score: Option<f64>,
    pub gre_score: Option<i32>,
    pub work_experience: String,
    pub graduation_year: Option<i32>,
    pub original_url: Option<String>,
    pub original_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CaseRow> for CanonicalCase {
    fn from(row: CaseRow) -> Self {
        CanonicalCase {
            original_id: row.original_id,
            institution: row.institution,
            program: row.program,
            degree_level: DegreeLevel::parse(&row.degree_level).unwrap_or(DegreeLevel::Master),
            undergrad_school: row.undergrad_school,
            undergrad_school_tier: SchoolTier::parse(&row.undergrad_school_tier)
                .unwrap_or(SchoolTier::Unknown),
            undergrad_major: row.undergrad_major,
            gpa_original: row.gpa_original,
            gpa_scale_4: row.gpa_scale_4,
            gpa_scale_100: row.gpa_scale_100,
            language_type: row.language_type.as_deref().and_then(LanguageTest::parse),
            language_score: row.language_score,
            gre_score: row.gre_score,
            work_experience: WorkExperience::parse(&row.work_experience).unwrap_or_default(),
            graduation_year: row.graduation_year,
            original_url: row.original_url,
            original_title: row.original_title,
        }
    }
}
