//! Similarity Scorer — deterministic, weighted multi-field matching between
//! an applicant profile and one canonical case.
//!
//! The total score is the sum of independent per-field sub-scores, each
//! bounded above by its configured weight. Missing data on either side makes
//! a field contribute 0 — never a negative amount.

use serde::{Deserialize, Serialize};

use crate::matching::classifier::ClassifierTables;
use crate::matching::gpa::parse_gpa;
use crate::models::case::{CanonicalCase, SchoolTier};
use crate::models::profile::ApplicantProfile;

/// Per-field weights. Configuration, not constants — injected at engine
/// construction so deployments can tune them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWeights {
    pub school_tier: f64,
    pub gpa: f64,
    pub major: f64,
    pub language: f64,
    pub standardized_test: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            school_tier: 30.0,
            gpa: 25.0,
            major: 20.0,
            language: 15.0,
            standardized_test: 10.0,
        }
    }
}

impl MatchWeights {
    /// Upper bound of any similarity score.
    pub fn total(&self) -> f64 {
        self.school_tier + self.gpa + self.major + self.language + self.standardized_test
    }
}

/// The matching engine: weights + classifier tables + result cap.
/// Stateless per request — safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    pub(crate) weights: MatchWeights,
    pub(crate) tables: ClassifierTables,
    pub(crate) max_results: usize,
}

pub const DEFAULT_MAX_RESULTS: usize = 20;

impl MatchEngine {
    pub fn new(weights: MatchWeights, tables: ClassifierTables, max_results: usize) -> Self {
        Self {
            weights,
            tables,
            max_results,
        }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    pub fn tables(&self) -> &ClassifierTables {
        &self.tables
    }

    /// Computes the similarity score between a profile and one case.
    /// Deterministic: the same pair always yields the same float.
    pub fn similarity_score(&self, profile: &ApplicantProfile, case: &CanonicalCase) -> f64 {
        let profile_gpa_4 = parse_gpa(&profile.gpa).map(|(gpa_4, _)| gpa_4);
        self.score_with_profile_gpa(profile, profile_gpa_4, case)
    }

    /// Scoring entry point with the profile GPA pre-parsed, so a corpus scan
    /// parses the profile's raw GPA string once instead of once per case.
    pub(crate) fn score_with_profile_gpa(
        &self,
        profile: &ApplicantProfile,
        profile_gpa_4: Option<f64>,
        case: &CanonicalCase,
    ) -> f64 {
        let mut total = school_tier_score(
            profile.school_tier,
            case.undergrad_school_tier,
            self.weights.school_tier,
        );

        if let (Some(user), Some(case_gpa)) = (profile_gpa_4, case.gpa_scale_4) {
            total += gpa_score(user, case_gpa, self.weights.gpa);
        }

        if let Some(case_major) = case.undergrad_major.as_deref() {
            total += self.major_score(&profile.major, case_major);
        }

        if let (Some(user), Some(case_score)) = (profile.language_score, case.language_score) {
            total += language_score(user, case_score, self.weights.language);
        }

        if let (Some(user), Some(case_gre)) = (profile.gre_score, case.gre_score) {
            total += standardized_test_score(user, case_gre, self.weights.standardized_test);
        }

        total
    }

    /// Major sub-score: exact match, then token-set overlap, then shared
    /// coarse major-group bucket at 30% of weight.
    fn major_score(&self, user_major: &str, case_major: &str) -> f64 {
        let weight = self.weights.major;
        let user = user_major.trim().to_lowercase();
        let case = case_major.trim().to_lowercase();
        if user.is_empty() || case.is_empty() {
            return 0.0;
        }

        if user == case {
            return weight;
        }

        let user_tokens: std::collections::HashSet<&str> = user.split_whitespace().collect();
        let case_tokens: std::collections::HashSet<&str> = case.split_whitespace().collect();
        let shared = user_tokens.intersection(&case_tokens).count();
        if shared > 0 {
            let union = user_tokens.union(&case_tokens).count();
            return weight * shared as f64 / union as f64;
        }

        let user_group = self.tables.classify_major_group(&user);
        let case_group = self.tables.classify_major_group(&case);
        match (user_group, case_group) {
            (Some(a), Some(b)) if a == b => weight * 0.3,
            _ => 0.0,
        }
    }
}

/// School-tier sub-score over ordinal prestige levels: exact level match is
/// full weight, adjacent levels half, anything further 0. An unknown case
/// tier means the field is missing and contributes 0.
pub fn school_tier_score(user: SchoolTier, case: SchoolTier, weight: f64) -> f64 {
    if case == SchoolTier::Unknown {
        return 0.0;
    }
    let diff = i16::from(user.level()).abs_diff(i16::from(case.level()));
    match diff {
        0 => weight,
        1 => weight * 0.5,
        _ => 0.0,
    }
}

/// GPA sub-score: banded decay over the absolute 4.0-scale difference.
pub fn gpa_score(user_gpa_4: f64, case_gpa_4: f64, weight: f64) -> f64 {
    if case_gpa_4 <= 0.0 {
        return 0.0;
    }
    let diff = (user_gpa_4 - case_gpa_4).abs();
    let factor = if diff <= 0.1 {
        1.0
    } else if diff <= 0.2 {
        0.8
    } else if diff <= 0.3 {
        0.6
    } else if diff <= 0.5 {
        0.4
    } else {
        0.2
    };
    weight * factor
}

/// Language sub-score: banded decay over the absolute score difference.
pub fn language_score(user: f64, case: f64, weight: f64) -> f64 {
    if case <= 0.0 {
        return 0.0;
    }
    let diff = (user - case).abs();
    let factor = if diff <= 0.5 {
        1.0
    } else if diff <= 1.0 {
        0.7
    } else if diff <= 1.5 {
        0.4
    } else {
        0.1
    };
    weight * factor
}

/// Standardized-test (GRE) sub-score: requires both values positive.
pub fn standardized_test_score(user: i32, case: i32, weight: f64) -> f64 {
    if user <= 0 || case <= 0 {
        return 0.0;
    }
    let diff = (user - case).abs();
    let factor = if diff <= 10 {
        1.0
    } else if diff <= 20 {
        0.7
    } else if diff <= 30 {
        0.4
    } else {
        0.1
    };
    weight * factor
}
