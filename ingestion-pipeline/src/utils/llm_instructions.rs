use common::utils::config::PromptLanguage;

/// Marks the start of the question block in a completion.
pub const QUESTION_MARKER: &str = "Q:";
/// Marks the start of the answer block; the response is split on its first occurrence.
pub const ANSWER_MARKER: &str = "A:";

pub static QA_SYNTHESIS_INSTRUCTIONS_EN: &str = r#"Generate a set of high-quality question-answer pairs from the text below. Follow these rules:

1. Questions
- Write as many differently-phrased questions about the same topic as you can (for example K questions).
- Cover the key facts and main concepts of the text.
- Mix styles: direct questions, requests for confirmation, requests for explanation.

2. Answer
- Write one comprehensive answer that addresses every angle of the questions.
- Base the answer strictly on the given text. Keep names, dates, roles and other specifics exact.

3. Format
- Start the question block with "Q:" and keep all questions in a single paragraph.
- Start the answer with "A:". Use "A:" exactly once.

4. Content
- Stay on the topic of the text and add nothing it does not mention.
- If the text is not enough to answer some aspect, say that it "cannot be determined from the given information".

Example layout (content must come from the given text):

Q: [Question 1]? [Question 2]? [Question 3]? ... [Question K]?

A: [One complete answer covering every question]

Given text:
"#;

pub static QA_SYNTHESIS_INSTRUCTIONS_ZH: &str = r#"根据下面给出的文本，生成一组高质量的问答对，并遵守以下规则：

1. 问题
- 围绕同一主题，尽可能多地写出表述不同的问题（例如K个）。
- 覆盖文本中的关键信息和核心概念。
- 变换提问方式：直接提问、请求确认、请求解释等。

2. 答案
- 给出一个全面的答案，回应问题的各个角度。
- 答案必须严格依据给定文本，准确保留名称、日期、职位等具体信息。

3. 格式
- 用"Q:"开始问题部分，所有问题写在同一段内。
- 用"A:"开始答案部分，"A:"只能出现一次。

4. 内容
- 紧扣文本主题，不添加文本未提及的信息。
- 如果文本不足以回答某个方面，请在答案中说明"根据给定信息无法确定"。

示例结构（内容须来自给定文本）：

Q: [问题1]？ [问题2]？ [问题3]？ …… [问题K]？

A: [覆盖所有问题的完整答案]

给定文本：
"#;

static QA_SYNTHESIS_CLOSING_EN: &str = "Generate the question-answer pairs for this text.";
static QA_SYNTHESIS_CLOSING_ZH: &str = "请基于这段文本生成问答对。";

/// Wraps a passage, verbatim, in the synthesis instructions.
pub fn build_synthesis_prompt(passage: &str, language: PromptLanguage) -> String {
    let (instructions, closing) = match language {
        PromptLanguage::English => (QA_SYNTHESIS_INSTRUCTIONS_EN, QA_SYNTHESIS_CLOSING_EN),
        PromptLanguage::Chinese => (QA_SYNTHESIS_INSTRUCTIONS_ZH, QA_SYNTHESIS_CLOSING_ZH),
    };

    format!("{instructions}{passage}\n\n{closing}")
}
