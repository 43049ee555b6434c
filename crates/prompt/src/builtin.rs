//! Prompt definitions compiled into the binary.
//!
//! A workspace file `.kbhub/prompts/<id>.yml` with the same id replaces the
//! built-in at load time.

/// Answer generation prompt.
pub const GENERATE_PROMPT_ID: &str = "kbhub.generate";

/// Answer checking prompt.
pub const CHECK_PROMPT_ID: &str = "kbhub.check";

/// Reflection prompt.
pub const REFLECT_PROMPT_ID: &str = "kbhub.reflect";

const GENERATE_YAML: &str = r#"
id: kbhub.generate
title: Answer generator
apiVersion: "1.0"
createdBy: kbhub
system: |
  You are a knowledgeable assistant for legal, historical, economic, and political topics.
  Use the context below to write a precise, accurate answer to the user's latest question.
  Every statement must be supported by the context and relevant to the question.

  When the context only partly covers the question, give a short answer from what is
  available and do not speculate beyond it.
template: |
  User question:
  {{question}}

  Context:
  {{context}}

  Conversation history:
  {{history}}

  Answer:
"#;

const CHECK_YAML: &str = r#"
id: kbhub.check
title: Answer checker
apiVersion: "1.0"
createdBy: kbhub
system: |
  You check answers about legal, historical, economic, and political topics.
  Decide whether the assistant's answer is correct, relevant, and directly supported by
  the provided context. The answer has to address the user's question and agree with
  the context.

  If the answer is accurate and supported by the context, the decision is "Y".
  If it is incorrect, irrelevant, or unsupported, the decision is "N".
template: |
  Using the information below, is the assistant's answer valid for the question and context?

  Question:
  {{question}}

  Context:
  {{context}}

  Answer:
  {{answer}}
"#;

const REFLECT_YAML: &str = r#"
id: kbhub.reflect
title: Answer reflection
apiVersion: "1.0"
createdBy: kbhub
system: |
  You improve answers about law, history, economics, and politics that were judged
  incorrect or irrelevant. Given the original question, the retrieved context, and the
  failed answer, write a new answer that is accurate, relevant, and supported by the context.

  Do not write phrases such as "updated answer", "corrected answer", or "here is the revised
  answer", and do not comment on the correction. Reply with a clean, self-contained answer
  to the original question.
template: |
  Original question:
  {{question}}

  Context:
  {{context}}

  Failed answer:
  {{answer}}
"#;

/// Raw YAML of every built-in prompt, keyed by id.
pub(crate) const BUILTIN_PROMPTS: [(&str, &str); 3] = [
    (GENERATE_PROMPT_ID, GENERATE_YAML),
    (CHECK_PROMPT_ID, CHECK_YAML),
    (REFLECT_PROMPT_ID, REFLECT_YAML),
];

/// Raw YAML for a built-in prompt id.
pub(crate) fn builtin_yaml(prompt_id: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, yaml)| *yaml)
}
