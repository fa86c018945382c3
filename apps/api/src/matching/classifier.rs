//! Attribute Classifier — maps free-text school/major strings to coarse
//! categorical tiers and groups via ordered keyword-list membership.
//!
//! Deliberately a conservative, auditable lookup-table classifier. The
//! keyword tables are injected configuration (loadable from a JSON resource,
//! defaulting to the curated lists), so the classifier is testable against
//! synthetic tables and the lists can be versioned outside the code.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::case::SchoolTier;

/// Coarse major-field bucket used as the last-resort major similarity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorGroup {
    Computer,
    Business,
    Engineering,
    Science,
}

/// An explicit tier label that may appear verbatim in background text.
/// A matched label overrides name-based classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierLabel {
    pub label: String,
    pub tier: SchoolTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MajorGroupEntry {
    pub group: MajorGroup,
    pub keywords: Vec<String>,
}

/// The keyword tables backing the classifier. Order matters: 985 names are
/// tested before 211 keywords, which are tested before overseas markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierTables {
    pub tier_985_schools: Vec<String>,
    pub tier_211_keywords: Vec<String>,
    pub overseas_markers: Vec<String>,
    pub tier_labels: Vec<TierLabel>,
    pub major_groups: Vec<MajorGroupEntry>,
    /// Institution-name substrings eligible for reach-tier seeding.
    pub prestigious_institutions: Vec<String>,
}

impl ClassifierTables {
    /// Loads tables from a JSON resource file.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read classifier tables from '{path}'"))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Classifier tables file '{path}' is not valid JSON"))
    }

    /// Classifies an undergraduate school name into a tier.
    /// Absent/empty input yields `Unknown`, not `Ordinary`.
    pub fn classify_school_tier(&self, school_name: Option<&str>) -> SchoolTier {
        let name = match school_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return SchoolTier::Unknown,
        };

        if self.tier_985_schools.iter().any(|s| name.contains(s.as_str())) {
            return SchoolTier::Tier985;
        }
        if self.tier_211_keywords.iter().any(|kw| name.contains(kw.as_str())) {
            return SchoolTier::Tier211;
        }
        if self.overseas_markers.iter().any(|kw| name.contains(kw.as_str())) {
            return SchoolTier::Overseas;
        }
        SchoolTier::Ordinary
    }

    /// Looks for an explicit tier label inside free text (e.g. "985院校").
    pub fn tier_label_in(&self, text: &str) -> Option<SchoolTier> {
        self.tier_labels
            .iter()
            .find(|entry| text.contains(entry.label.as_str()))
            .map(|entry| entry.tier)
    }

    /// Classifies a major string into one of the fixed group buckets.
    /// Absent input or no keyword hit yields `None`, never an error.
    pub fn classify_major_group(&self, major: &str) -> Option<MajorGroup> {
        let major = major.trim().to_lowercase();
        if major.is_empty() {
            return None;
        }
        self.major_groups
            .iter()
            .find(|entry| entry.keywords.iter().any(|kw| major.contains(kw.as_str())))
            .map(|entry| entry.group)
    }

    pub fn is_prestigious(&self, institution: &str) -> bool {
        self.prestigious_institutions
            .iter()
            .any(|name| institution.contains(name.as_str()))
    }
}

impl Default for ClassifierTables {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        ClassifierTables {
            tier_985_schools: owned(&[
                "清华大学", "北京大学", "复旦大学", "上海交通大学", "浙江大学",
                "中国科学技术大学", "南京大学", "哈尔滨工业大学", "西安交通大学",
                "中山大学", "华南理工大学", "山东大学", "华中科技大学", "大连理工大学",
                "北京理工大学", "天津大学", "东南大学", "华东师范大学", "中南大学",
                "西北工业大学", "同济大学", "厦门大学", "北京航空航天大学", "重庆大学",
                "四川大学", "电子科技大学", "中国人民大学", "兰州大学", "东北大学",
                "湖南大学", "武汉大学", "中国农业大学", "中国海洋大学",
                "北京师范大学", "中央民族大学", "国防科技大学", "西北农林科技大学",
                "南开大学", "吉林大学",
            ]),
            tier_211_keywords: owned(&[
                "北京邮电", "上海财经", "中央财经", "对外经济贸易", "华东理工",
                "东华大学", "上海大学", "苏州大学", "南京理工", "南京航空航天",
                "河海大学", "江南大学", "南京师范", "华中师范", "华南师范",
                "暨南大学", "华南农业", "广西大学", "海南大学", "西南交通",
                "西南财经", "陕西师范", "长安大学", "宁夏大学", "石河子大学",
                "青海大学", "内蒙古大学", "延边大学", "东北师范", "哈尔滨工程",
                "东北农业", "东北林业", "辽宁大学", "大连海事", "太原理工",
                "河北工业", "华北电力", "北京交通", "北京科技", "北京化工",
                "北京林业", "中国传媒", "中国政法", "中国矿业", "中国石油",
                "中国地质", "北京中医药", "北京外国语", "上海外国语", "华东政法",
                "南京邮电", "南京信息工程", "南京农业", "中国药科", "江苏大学",
                "扬州大学", "云南大学", "新疆大学", "黑龙江大学", "天津医科",
            ]),
            overseas_markers: owned(&["University", "College", "Institute"]),
            tier_labels: vec![
                TierLabel { label: "985院校".to_string(), tier: SchoolTier::Tier985 },
                TierLabel { label: "211院校".to_string(), tier: SchoolTier::Tier211 },
                TierLabel { label: "普通本科".to_string(), tier: SchoolTier::Ordinary },
                TierLabel { label: "海外院校".to_string(), tier: SchoolTier::Overseas },
            ],
            major_groups: vec![
                MajorGroupEntry {
                    group: MajorGroup::Computer,
                    keywords: owned(&[
                        "计算机", "软件", "信息", "computer", "software", "information",
                    ]),
                },
                MajorGroupEntry {
                    group: MajorGroup::Business,
                    keywords: owned(&[
                        "商业", "管理", "金融", "经济", "business", "management",
                        "finance", "economics",
                    ]),
                },
                MajorGroupEntry {
                    group: MajorGroup::Engineering,
                    keywords: owned(&[
                        "工程", "机械", "电子", "engineering", "mechanical", "electrical",
                    ]),
                },
                MajorGroupEntry {
                    group: MajorGroup::Science,
                    keywords: owned(&[
                        "科学", "数学", "物理", "化学", "science", "mathematics",
                        "physics", "chemistry",
                    ]),
                },
            ],
            prestigious_institutions: owned(&[
                "牛津大学", "剑桥大学", "帝国理工学院", "伦敦政治经济学院",
                "香港大学", "香港科技大学", "香港中文大学", "新加坡国立大学",
                "南洋理工大学",
            ]),
        }
    }
}
