// All LLM prompt constants for the planning module.

/// System prompt for report generation — enforces JSON-only output.
pub const CONSULTANT_SYSTEM: &str =
    "你是一名拥有15年经验的资深留学申请顾问，擅长根据学生背景和成功录取案例提供精准的选校建议。\
    请使用简体中文回答。 \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Report prompt template.
/// Replace: {profile_json}, {plan_json}, {cases_json}
pub const REPORT_PROMPT_TEMPLATE: &str = r#"请根据以下学生背景和成功录取案例，为该学生撰写一份留学选校分析。

# 学生背景:
{profile_json}

# 选校梯度（已由匹配引擎确定，仅供撰写理由时参考，不要改动）:
{plan_json}

# 相似成功案例（按相似度降序）:
{cases_json}

请输出一个 JSON 对象，结构如下（字段名保持英文，内容使用简体中文）:
{
  "strengths": "背景优势分析：院校层次、GPA、专业匹配度、语言与标化成绩、海外经历等，结合具体案例数据。",
  "weaknesses": "背景短板分析：与成功案例的差距、标化成绩不足、跨专业挑战等，并指出改进方向。",
  "suggestions": "2-3条具体可行的提升建议，结合学生的毕业后规划与选校偏好。"
}

要求:
- 每个字段都必须是非空字符串。
- 分析必须引用提供的案例数据作为佐证，不得虚构案例。
- 充分考虑学生的选校偏好、预算和毕业后规划。"#;
