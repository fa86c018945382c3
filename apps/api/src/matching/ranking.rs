//! Ranking & Categorization Engine — scores the corpus for one applicant,
//! orders the survivors, and partitions them into reach/target/safety tiers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::matching::gpa::parse_gpa;
use crate::matching::scorer::MatchEngine;
use crate::models::case::CanonicalCase;
use crate::models::profile::{ApplicantProfile, ScoredCase};

/// Score at or above which an institution is a core (target) pick outright.
const TARGET_SCORE_THRESHOLD: f64 = 60.0;
/// Score at or above which an institution may still fill the target tier.
const SAFETY_SCORE_THRESHOLD: f64 = 40.0;
/// Target tier is backfilled from safety until it holds this many entries.
const MIN_TARGET_ENTRIES: usize = 3;
/// Reach-tier seeding scans only this many of the highest-scoring cases.
/// A qualifying prestigious institution ranked below this window is silently
/// omitted — a known heuristic limitation carried over from the source data.
const REACH_SCAN_WINDOW: usize = 5;

const MAX_REACH: usize = 3;
const MAX_TARGET: usize = 4;
const MAX_SAFETY: usize = 3;

/// One recommended institution, with the evidence case backing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub institution: String,
    pub program: String,
    pub reason: String,
    pub evidence_case_id: i64,
}

/// Admission-likelihood partitioning, from least to most likely to admit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierPlan {
    pub reach: Vec<Recommendation>,
    pub target: Vec<Recommendation>,
    pub safety: Vec<Recommendation>,
}

impl MatchEngine {
    /// Scores the corpus against one profile and returns the ranked matches.
    ///
    /// Pipeline: hard-filter on target degree → score → drop zero scores →
    /// sort descending (ties broken by ascending original id, so ranking does
    /// not depend on corpus load order) → truncate to `max_results`.
    pub fn find_similar(
        &self,
        profile: &ApplicantProfile,
        corpus: &[CanonicalCase],
    ) -> Vec<ScoredCase> {
        let profile_gpa_4 = parse_gpa(&profile.gpa).map(|(gpa_4, _)| gpa_4);

        let mut scored: Vec<ScoredCase> = corpus
            .iter()
            .filter(|case| case.degree_level == profile.target_degree)
            .filter_map(|case| {
                let similarity_score = self.score_with_profile_gpa(profile, profile_gpa_4, case);
                (similarity_score > 0.0).then(|| ScoredCase {
                    case: case.clone(),
                    similarity_score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.case.original_id.cmp(&b.case.original_id))
        });
        scored.truncate(self.max_results);
        scored
    }

    /// Partitions ranked cases into reach/target/safety, keeping only the
    /// best-scoring case per institution (one recommendation per school).
    ///
    /// An empty input yields an empty plan — not an error.
    pub fn categorize(&self, scored: &[ScoredCase]) -> TierPlan {
        let mut plan = TierPlan::default();
        if scored.is_empty() {
            return plan;
        }

        // Input is sorted descending, so the first case seen per institution
        // is that institution's best.
        let mut seen = HashSet::new();
        let mut target: Vec<Recommendation> = Vec::new();
        let mut safety: Vec<Recommendation> = Vec::new();

        for entry in scored {
            if !seen.insert(entry.case.institution.as_str()) {
                continue;
            }
            let rec = Recommendation {
                institution: entry.case.institution.clone(),
                program: entry.case.program.clone(),
                reason: format!("Similarity score {:.1}", entry.similarity_score),
                evidence_case_id: entry.case.original_id,
            };
            if entry.similarity_score >= TARGET_SCORE_THRESHOLD {
                target.push(rec);
            } else if entry.similarity_score >= SAFETY_SCORE_THRESHOLD
                && target.len() < MIN_TARGET_ENTRIES
            {
                target.push(rec);
            } else {
                safety.push(rec);
            }
        }

        // Promote safety entries (FIFO) while the target tier is short.
        while target.len() < MIN_TARGET_ENTRIES && !safety.is_empty() {
            target.push(safety.remove(0));
        }

        // Seed reach picks from prestigious institutions among the top cases,
        // independent of the threshold logic above.
        let mut reach_seen = HashSet::new();
        for entry in scored.iter().take(REACH_SCAN_WINDOW) {
            if self.tables().is_prestigious(&entry.case.institution)
                && reach_seen.insert(entry.case.institution.as_str())
            {
                plan.reach.push(Recommendation {
                    institution: entry.case.institution.clone(),
                    program: entry.case.program.clone(),
                    reason: format!(
                        "Top-tier institution worth a reach application (similarity {:.1})",
                        entry.similarity_score
                    ),
                    evidence_case_id: entry.case.original_id,
                });
                if plan.reach.len() >= MAX_REACH {
                    break;
                }
            }
        }

        target.truncate(MAX_TARGET);
        safety.truncate(MAX_SAFETY);
        plan.target = target;
        plan.safety = safety;
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::classifier::ClassifierTables;
    use crate::matching::scorer::{MatchEngine, MatchWeights};
    use crate::models::case::{DegreeLevel, LanguageTest, SchoolTier, WorkExperience};

    fn engine() -> MatchEngine {
        MatchEngine::new(MatchWeights::default(), ClassifierTables::default(), 20)
    }

    fn profile() -> ApplicantProfile {
        ApplicantProfile {
            undergrad_school: "浙江大学".to_string(),
            school_tier: SchoolTier::Tier985,
            major: "Software Engineering".to_string(),
            gpa: "85/100".to_string(),
            major_gpa: None,
            major_ranking: None,
            exchange_experience: false,
            language_test: Some(LanguageTest::Ielts),
            language_score: Some(7.0),
            gre_score: None,
            target_degree: DegreeLevel::Master,
            target_countries: vec![],
            target_majors: vec![],
            school_selection_factors: vec![],
            post_graduation_plan: None,
            budget: None,
        }
    }

    fn case(original_id: i64, institution: &str, tier: SchoolTier, gpa_4: f64) -> CanonicalCase {
        CanonicalCase {
            original_id,
            institution: institution.to_string(),
            program: "计算机科学硕士".to_string(),
            degree_level: DegreeLevel::Master,
            undergrad_school: None,
            undergrad_school_tier: tier,
            undergrad_major: Some("软件工程".to_string()),
            gpa_original: None,
            gpa_scale_4: Some(gpa_4),
            gpa_scale_100: Some(gpa_4 * 25.0),
            language_type: Some(LanguageTest::Ielts),
            language_score: Some(7.0),
            gre_score: None,
            work_experience: WorkExperience::FreshGraduate,
            graduation_year: Some(2024),
            original_url: None,
            original_title: None,
        }
    }

    fn seeded_corpus() -> Vec<CanonicalCase> {
        vec![
            case(1, "香港大学", SchoolTier::Tier985, 3.4),
            case(2, "香港科技大学", SchoolTier::Tier985, 3.3),
            case(3, "新加坡国立大学", SchoolTier::Tier985, 3.4),
            case(4, "南洋理工大学", SchoolTier::Tier211, 3.2),
            case(5, "曼彻斯特大学", SchoolTier::Tier211, 3.0),
            case(6, "悉尼大学", SchoolTier::Ordinary, 2.8),
            case(7, "格拉斯哥大学", SchoolTier::Ordinary, 3.0),
            case(8, "利兹大学", SchoolTier::Tier211, 3.4),
            case(9, "香港城市大学", SchoolTier::Tier985, 3.5),
            case(10, "昆士兰大学", SchoolTier::Other, 2.5),
        ]
    }

    #[test]
    fn test_find_similar_end_to_end() {
        let engine = engine();
        let profile = profile();
        let results = engine.find_similar(&profile, &seeded_corpus());

        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
        assert!(results[0].similarity_score <= engine.weights().total());
    }

    #[test]
    fn test_degree_filter_is_hard() {
        let engine = engine();
        let mut corpus = seeded_corpus();
        for case in &mut corpus {
            case.degree_level = DegreeLevel::Doctorate;
        }
        assert!(engine.find_similar(&profile(), &corpus).is_empty());
    }

    #[test]
    fn test_zero_score_cases_dropped() {
        let engine = engine();
        let mut profile = profile();
        // Remove every scoreable field overlap
        profile.gpa = String::new();
        profile.language_score = None;
        profile.major = "历史学".to_string();
        profile.school_tier = SchoolTier::Tier985;

        let mut sparse = case(1, "昆士兰大学", SchoolTier::Unknown, 0.0);
        sparse.gpa_scale_4 = None;
        sparse.gpa_scale_100 = None;
        sparse.language_score = None;
        sparse.undergrad_major = None;

        assert!(engine.find_similar(&profile, &[sparse]).is_empty());
    }

    #[test]
    fn test_truncates_to_max_results() {
        let engine = MatchEngine::new(MatchWeights::default(), ClassifierTables::default(), 3);
        let results = engine.find_similar(&profile(), &seeded_corpus());
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_equal_scores_tie_break_by_original_id() {
        let engine = engine();
        // Identical cases except institution/id — identical scores.
        let corpus = vec![
            case(42, "利兹大学", SchoolTier::Tier985, 3.4),
            case(7, "香港大学", SchoolTier::Tier985, 3.4),
        ];
        let results = engine.find_similar(&profile(), &corpus);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].similarity_score, results[1].similarity_score);
        assert_eq!(results[0].case.original_id, 7);
        assert_eq!(results[1].case.original_id, 42);
    }

    #[test]
    fn test_categorize_caps_and_no_duplicate_institutions() {
        let engine = engine();
        let profile = profile();
        let results = engine.find_similar(&profile, &seeded_corpus());
        let plan = engine.categorize(&results);

        assert!(plan.reach.len() <= 3);
        assert!(plan.target.len() <= 4);
        assert!(plan.safety.len() <= 3);

        for tier in [&plan.reach, &plan.target, &plan.safety] {
            let mut seen = HashSet::new();
            for rec in tier {
                assert!(seen.insert(rec.institution.as_str()), "dup {}", rec.institution);
            }
        }
    }

    #[test]
    fn test_categorize_keeps_best_case_per_institution() {
        let engine = engine();
        let scored = vec![
            ScoredCase {
                case: case(1, "香港大学", SchoolTier::Tier985, 3.4),
                similarity_score: 80.0,
            },
            ScoredCase {
                case: case(2, "香港大学", SchoolTier::Tier211, 3.0),
                similarity_score: 55.0,
            },
        ];
        let plan = engine.categorize(&scored);
        let all: Vec<_> = plan
            .target
            .iter()
            .chain(plan.safety.iter())
            .filter(|r| r.institution == "香港大学")
            .collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].evidence_case_id, 1);
    }

    #[test]
    fn test_categorize_backfills_target_from_safety() {
        let engine = engine();
        // All low scores land in safety first, then FIFO-promote into target.
        let scored: Vec<ScoredCase> = (1..=4)
            .map(|id| ScoredCase {
                case: case(id, &format!("大学{id}"), SchoolTier::Ordinary, 2.5),
                similarity_score: 30.0,
            })
            .collect();
        let plan = engine.categorize(&scored);
        assert_eq!(plan.target.len(), 3);
        assert_eq!(plan.safety.len(), 1);
        // FIFO: the first-seen (highest-ranked) entries were promoted first
        assert_eq!(plan.target[0].institution, "大学1");
    }

    #[test]
    fn test_reach_seeded_from_prestigious_top_cases_only() {
        let engine = engine();
        let mut scored: Vec<ScoredCase> = Vec::new();
        // Five non-prestigious cases occupy the scan window
        for id in 1..=5 {
            scored.push(ScoredCase {
                case: case(id, &format!("大学{id}"), SchoolTier::Tier985, 3.4),
                similarity_score: 90.0 - id as f64,
            });
        }
        // A prestigious institution ranked 6th is not seeded
        scored.push(ScoredCase {
            case: case(6, "牛津大学", SchoolTier::Tier985, 3.4),
            similarity_score: 70.0,
        });
        let plan = engine.categorize(&scored);
        assert!(plan.reach.is_empty());

        // Promote it into the window and it is seeded
        scored.remove(0);
        let plan = engine.categorize(&scored);
        assert_eq!(plan.reach.len(), 1);
        assert_eq!(plan.reach[0].institution, "牛津大学");
    }

    #[test]
    fn test_reach_dedups_repeated_prestigious_institution() {
        let engine = engine();
        let scored = vec![
            ScoredCase {
                case: case(1, "香港大学", SchoolTier::Tier985, 3.4),
                similarity_score: 90.0,
            },
            ScoredCase {
                case: case(2, "香港大学", SchoolTier::Tier985, 3.3),
                similarity_score: 85.0,
            },
        ];
        let plan = engine.categorize(&scored);
        assert_eq!(plan.reach.len(), 1);
        assert_eq!(plan.reach[0].evidence_case_id, 1);
    }

    #[test]
    fn test_categorize_empty_input_is_empty_plan() {
        let plan = engine().categorize(&[]);
        assert!(plan.reach.is_empty());
        assert!(plan.target.is_empty());
        assert!(plan.safety.is_empty());
    }
}
