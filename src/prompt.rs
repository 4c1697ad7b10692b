//! System prompt templates and their selection.
//!
//! Two templates exist: a generic TCM diagnosis prompt and a constitution
//! questionnaire prompt. The questionnaire prompt is chosen only when the
//! submitted text carries both questionnaire markers.

use crate::model::types::ChatMessage;

/// Markers present in exported constitution questionnaire results.
pub const QUESTIONNAIRE_MARKERS: [&str; 2] = ["体质测试时间", "体质症状评分"];

/// Generic diagnosis and treatment template.
pub const DIAGNOSIS_TEMPLATE: &str = "\
你是一名专业的中医，请根据接下来的病例描述，给出详细的诊断意见以及治疗方案。
请注意：
1. 使用中医术语回答。
2. 包括病因分析、症状描述、诊断结论和具体的治疗方案。
3. 治疗方案可包括中药处方、中成药处方、针灸建议和其他中医治疗方法。
4. 请确保回答完整，详细，专业。
5. 要求使用markdown格式回答,但是不要出现markdown代码块的标识符，如'''markdown'''。
6. 响应格式请用{\"response\" : \"回复信息\"}的json格式回答,但是注意，一定不要添加代码块标识符'''json'''。
";

/// Constitution questionnaire analysis template.
pub const QUESTIONNAIRE_TEMPLATE: &str = "\
你是一名专业的中医体质专家，请根据接下来的体质测试数据，给出详细的体质分析报告。

请按照以下格式进行分析：

## 🌟 体质分析结果

### 主要体质类型
根据九种体质分类法（平和质、气虚质、阳虚质、阴虚质、痰湿质、湿热质、血瘀质、气郁质、特禀质），判断用户的主要体质类型。

### 📊 体质特征分析
详细分析用户的体质特点，包括：
- 主要症状表现
- 体质偏向程度
- 可能的健康隐患

### 🍃 个性化养生方案

#### 1. 饮食调理
- 推荐食物（具体食材和做法）
- 避免食物
- 饮食原则

#### 2. 运动建议
- 适合的运动类型
- 运动强度和频率
- 注意事项

#### 3. 生活起居
- 作息建议
- 情绪调节
- 环境适应

#### 4. 中医调理
- 推荐中药材（日常保健用）
- 穴位按摩
- 季节养生要点

### 📅 21天养生打卡计划

制定一个为期21天的具体养生计划，包括：
- 每日必做项目（如饮食、运动、作息）
- 每周重点调理项目
- 阶段性目标

### ⚠️ 注意事项
- 体质调理的注意要点
- 什么情况下需要就医
- 长期调理建议

请确保：
1. 分析基于中医理论，准确专业
2. 建议具体可操作，便于执行
3. 考虑用户的具体情况（年龄、性别、生活习惯等）
4. 使用温和鼓励的语气
5. 响应格式用{\"response\" : \"回复信息\"}的json格式
";

/// Which system template a request is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Diagnosis,
    Questionnaire,
}

impl PromptKind {
    /// Questionnaire iff every marker occurs in `text`.
    pub fn detect(text: &str) -> Self {
        if QUESTIONNAIRE_MARKERS.iter().all(|m| text.contains(m)) {
            PromptKind::Questionnaire
        } else {
            PromptKind::Diagnosis
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            PromptKind::Diagnosis => DIAGNOSIS_TEMPLATE,
            PromptKind::Questionnaire => QUESTIONNAIRE_TEMPLATE,
        }
    }

    /// Build the `[system, user]` message pair.
    pub fn build(self, text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.template()), ChatMessage::user(text)]
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptKind::Diagnosis => write!(f, "diagnosis"),
            PromptKind::Questionnaire => write!(f, "questionnaire"),
        }
    }
}

/// Prompt for `/api/translation`: always the diagnosis template.
pub fn diagnosis_prompt(text: &str) -> Vec<ChatMessage> {
    PromptKind::Diagnosis.build(text)
}

/// Prompt for `/api`: template chosen by [`PromptKind::detect`].
pub fn consultation_prompt(text: &str) -> (PromptKind, Vec<ChatMessage>) {
    let kind = PromptKind::detect(text);
    (kind, kind.build(text))
}
