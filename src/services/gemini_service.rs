use crate::error::{Error, Result};
use crate::models::question::{GeneratedQuestion, PyqSolution, QuestionContext, QuestionType};
use crate::services::key_rotator::KeyRotator;
use crate::services::output_parser;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

// How much topic history is quoted back into the prompt.
const MAX_EXISTING_EXCERPTS: usize = 5;
const MAX_GENERATED_EXCERPTS: usize = 3;

#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    rotator: Arc<KeyRotator>,
    api_url: String,
    max_validation_retries: Option<u32>,
}

impl GeminiService {
    pub fn new(
        api_keys: Vec<String>,
        client: Client,
        max_validation_retries: Option<u32>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            rotator: Arc::new(KeyRotator::new(api_keys)?),
            api_url: GEMINI_API_URL.to_string(),
            max_validation_retries,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Generates a fresh question for a topic. Invalid model output is
    /// discarded and the whole prompt/call/parse cycle restarts; without a
    /// configured retry cap this loops until the model produces a valid
    /// question.
    pub async fn generate_question(
        &self,
        question_type: QuestionType,
        topic_id: Uuid,
        existing_questions: &[String],
        already_generated: &[String],
        context: &QuestionContext,
    ) -> Result<GeneratedQuestion> {
        let mut failed_attempts: u32 = 0;
        loop {
            let prompt = build_question_prompt(
                question_type,
                existing_questions,
                already_generated,
                context,
            );
            let generated_text = self.call_api(&prompt).await?;
            let question = output_parser::parse_generated_question(&generated_text, question_type);

            if verify_generated_question(&question) {
                return Ok(question);
            }

            failed_attempts += 1;
            tracing::warn!(
                %topic_id,
                attempt = failed_attempts,
                "answer verification failed, regenerating"
            );
            if let Some(cap) = self.max_validation_retries {
                if failed_attempts >= cap {
                    return Err(Error::GenerationRetriesExceeded(failed_attempts));
                }
            }
        }
    }

    /// Produces an answer/solution pair for an existing question statement,
    /// with the same call/parse/verify/retry discipline as
    /// [`generate_question`](Self::generate_question).
    pub async fn solve_pyq(
        &self,
        question_statement: &str,
        question_type: QuestionType,
        options: Option<&[String]>,
        context: &QuestionContext,
    ) -> Result<PyqSolution> {
        let mut failed_attempts: u32 = 0;
        loop {
            let prompt =
                build_pyq_solution_prompt(question_statement, question_type, options, context);
            let generated_text = self.call_api(&prompt).await?;
            let solution = output_parser::parse_pyq_solution(&generated_text);

            if verify_answer_shape(question_type, &solution.answer) {
                return Ok(solution);
            }

            failed_attempts += 1;
            tracing::warn!(
                attempt = failed_attempts,
                "PYQ answer verification failed, regenerating"
            );
            if let Some(cap) = self.max_validation_retries {
                if failed_attempts >= cap {
                    return Err(Error::GenerationRetriesExceeded(failed_attempts));
                }
            }
        }
    }

    // One external call. Every failure mode (transport fault, non-2xx,
    // undecodable body, empty candidate list) burns the current key and
    // moves on to the next; once every key in the pool has been tried once
    // the call fails for good.
    async fn call_api(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{
                    "text": prompt
                }]
            }],
            "generationConfig": {
                "temperature": 0.9,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 2048,
            }
        });

        for attempt in 1..=self.rotator.len() {
            let api_key = self.rotator.next_key();
            let response = self
                .client
                .post(&self.api_url)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await;

            match response {
                Ok(res) if res.status().is_success() => {
                    match res.json::<GenerateContentResponse>().await {
                        Ok(data) => match data.into_text() {
                            Some(text) => return Ok(text),
                            None => {
                                tracing::error!(attempt, "generation response had no candidates")
                            }
                        },
                        Err(e) => {
                            tracing::error!(attempt, error = %e, "failed to decode generation response")
                        }
                    }
                }
                Ok(res) => {
                    let status = res.status();
                    let text = res.text().await.unwrap_or_default();
                    tracing::error!(attempt, %status, body = %text, "generation request rejected");
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "generation request failed");
                }
            }
        }

        Err(Error::ApiKeysExhausted(self.rotator.len()))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
    }
}

fn build_question_prompt(
    question_type: QuestionType,
    existing_questions: &[String],
    already_generated: &[String],
    context: &QuestionContext,
) -> String {
    let existing_context = if existing_questions.is_empty() {
        String::new()
    } else {
        format!(
            "Here are previous year questions on this topic for inspiration (DO NOT copy directly, use them to understand the concept and difficulty level):\n{}",
            existing_questions
                .iter()
                .take(MAX_EXISTING_EXCERPTS)
                .cloned()
                .collect::<Vec<_>>()
                .join("\n\n")
        )
    };

    let generated_context = if already_generated.is_empty() {
        String::new()
    } else {
        let recent =
            &already_generated[already_generated.len().saturating_sub(MAX_GENERATED_EXCERPTS)..];
        format!(
            "These questions have already been generated for this topic, create something FRESH and UNIQUE:\n{}",
            recent.join("\n\n")
        )
    };

    let (type_instructions, validation_rules) = match question_type {
        QuestionType::Mcq => (
            "Generate a Multiple Choice Question with 4 options where ONLY ONE option is correct.",
            "CRITICAL: Ensure that EXACTLY ONE option is correct. Double-check your answer.",
        ),
        QuestionType::Msq => (
            "Generate a Multiple Select Question with 4 options where ONE OR MORE options can be correct (but at least one must be correct).",
            "CRITICAL: Ensure that AT LEAST ONE option is correct. Multiple correct options are allowed and encouraged when appropriate.",
        ),
        QuestionType::Nat => (
            "Generate a Numerical Answer Type question where the answer is a specific number (integer or decimal).",
            "CRITICAL: Provide an exact numerical answer. No ranges or approximations.",
        ),
        QuestionType::Sub => (
            "Generate a Subjective question that requires a detailed descriptive answer.",
            "CRITICAL: Provide a comprehensive answer with proper explanation.",
        ),
    };

    let options_template = if question_type.has_options() {
        "OPTIONS:\n\
A) [option A - make it clear and complete]\n\
B) [option B - make it clear and complete]\n\
C) [option C - make it clear and complete]\n\
D) [option D - make it clear and complete]\n"
    } else {
        ""
    };

    let answer_format = match question_type {
        QuestionType::Mcq => "single letter like \"A\"",
        QuestionType::Msq => "letters separated by commas like \"A,C\" or single letter like \"B\"",
        QuestionType::Nat => "exact number like \"42\" or \"3.14\"",
        QuestionType::Sub => "brief but complete answer",
    };

    let quality_line = match question_type {
        QuestionType::Mcq => "Exactly one option is correct",
        QuestionType::Msq => "At least one option is correct",
        QuestionType::Nat | QuestionType::Sub => "Answer is precise",
    };

    format!(
        "You are an expert question creator for {exam} - {course} exam.\n\n\
EXAM CONTEXT:\n\
- Exam: {exam}\n\
- Course: {course}\n\
- Subject: {subject}\n\
- Topic: {topic}\n\n\
IMPORTANT: Create a question that matches the difficulty level and style typical for {exam} {course} exam.\n\n\
{type_instructions}\n\n\
{validation_rules}\n\n\
{existing_context}\n\n\
{generated_context}\n\n\
FORMATTING INSTRUCTIONS:\n\
Format your response EXACTLY as follows (do not include any other text):\n\n\
QUESTION: [write the clear, unambiguous question statement here]\n\
{options_template}\
ANSWER: [{answer_format}]\n\
SOLUTION: [write detailed step-by-step solution explaining how to arrive at the answer]\n\n\
QUALITY CHECKLIST:\n\
- Question is clear and unambiguous\n\
- {quality_line}\n\
- Solution is detailed and easy to follow\n\
- Difficulty matches {exam} standard",
        exam = context.exam_name,
        course = context.course_name,
        subject = context.subject_name,
        topic = context.topic_name,
        type_instructions = type_instructions,
        validation_rules = validation_rules,
        existing_context = existing_context,
        generated_context = generated_context,
        options_template = options_template,
        answer_format = answer_format,
        quality_line = quality_line,
    )
}

fn build_pyq_solution_prompt(
    question_statement: &str,
    question_type: QuestionType,
    options: Option<&[String]>,
    context: &QuestionContext,
) -> String {
    let options_text = options
        .map(|opts| {
            let lettered = opts
                .iter()
                .enumerate()
                .map(|(idx, opt)| format!("{}) {}", (b'A' + idx as u8) as char, opt))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n\nOPTIONS:\n{}", lettered)
        })
        .unwrap_or_default();

    let answer_format = match question_type {
        QuestionType::Mcq => "Provide the correct option letter (A, B, C, or D)",
        QuestionType::Msq => {
            "Provide the correct option letters separated by commas (e.g., \"A,C\" or just \"B\" if only one is correct)"
        }
        QuestionType::Nat => "Provide the exact numerical answer",
        QuestionType::Sub => "Provide a comprehensive answer",
    };

    let critical = match question_type {
        QuestionType::Mcq => "\n\nCRITICAL: Choose EXACTLY ONE correct option.",
        QuestionType::Msq => "\n\nCRITICAL: Choose AT LEAST ONE correct option (can be multiple).",
        QuestionType::Nat | QuestionType::Sub => "",
    };

    format!(
        "You are solving a {exam} - {course} exam question.\n\n\
QUESTION:\n\
{statement}{options_text}\n\n\
Your task:\n\
1. {answer_format}\n\
2. Provide a detailed step-by-step solution\n\n\
Format your response EXACTLY as follows:\n\
ANSWER: [your answer here]\n\
SOLUTION: [detailed step-by-step solution]{critical}",
        exam = context.exam_name,
        course = context.course_name,
        statement = question_statement,
        options_text = options_text,
        answer_format = answer_format,
        critical = critical,
    )
}

fn verify_generated_question(question: &GeneratedQuestion) -> bool {
    if !verify_answer_shape(question.question_type, &question.answer) {
        return false;
    }

    if question.question_type.has_options() {
        match &question.options {
            Some(options) if options.len() == 4 => {}
            _ => return false,
        }
    }

    if question.question_statement.chars().count() < 10 {
        return false;
    }
    if question.solution.chars().count() < 20 {
        return false;
    }

    true
}

fn verify_answer_shape(question_type: QuestionType, answer: &str) -> bool {
    match question_type {
        QuestionType::Mcq => {
            let answer = answer.trim().to_uppercase();
            matches!(answer.as_str(), "A" | "B" | "C" | "D")
        }
        QuestionType::Msq => {
            let answer = answer.to_uppercase();
            answer
                .split(',')
                .map(str::trim)
                .all(|part| matches!(part, "A" | "B" | "C" | "D"))
        }
        QuestionType::Nat => answer.trim().parse::<f64>().is_ok(),
        QuestionType::Sub => !answer.trim().is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> QuestionContext {
        QuestionContext {
            exam_name: "GATE".to_string(),
            course_name: "Computer Science".to_string(),
            subject_name: "Algorithms".to_string(),
            topic_name: "Dynamic Programming".to_string(),
        }
    }

    fn valid_mcq() -> GeneratedQuestion {
        GeneratedQuestion {
            question_statement: "Which traversal visits the root first?".to_string(),
            options: Some(vec![
                "Preorder".to_string(),
                "Inorder".to_string(),
                "Postorder".to_string(),
                "Level order".to_string(),
            ]),
            answer: "A".to_string(),
            solution: "Preorder traversal visits the root before both subtrees.".to_string(),
            question_type: QuestionType::Mcq,
        }
    }

    #[test]
    fn mcq_answer_must_be_a_single_known_letter() {
        let mut question = valid_mcq();
        assert!(verify_generated_question(&question));

        question.answer = "E".to_string();
        assert!(!verify_generated_question(&question));

        question.answer = "AB".to_string();
        assert!(!verify_generated_question(&question));

        question.answer = " b ".to_string();
        assert!(verify_generated_question(&question));
    }

    #[test]
    fn msq_accepts_comma_separated_subsets_and_rejects_strays() {
        assert!(verify_answer_shape(QuestionType::Msq, "A,C"));
        assert!(verify_answer_shape(QuestionType::Msq, "B"));
        assert!(verify_answer_shape(QuestionType::Msq, "a, d"));
        assert!(!verify_answer_shape(QuestionType::Msq, ""));
        assert!(!verify_answer_shape(QuestionType::Msq, "A,E"));
        assert!(!verify_answer_shape(QuestionType::Msq, "A,,B"));
    }

    #[test]
    fn nat_answer_must_parse_as_a_number() {
        assert!(verify_answer_shape(QuestionType::Nat, "42"));
        assert!(verify_answer_shape(QuestionType::Nat, " 3.14 "));
        assert!(verify_answer_shape(QuestionType::Nat, "-0.5"));
        assert!(!verify_answer_shape(QuestionType::Nat, "about 42"));
        assert!(!verify_answer_shape(QuestionType::Nat, ""));
    }

    #[test]
    fn sub_answer_must_not_be_empty() {
        assert!(verify_answer_shape(QuestionType::Sub, "Entropy never decreases."));
        assert!(!verify_answer_shape(QuestionType::Sub, "   "));
    }

    #[test]
    fn short_statement_or_solution_is_rejected() {
        let mut question = valid_mcq();
        question.question_statement = "Short?".to_string();
        assert!(!verify_generated_question(&question));

        let mut question = valid_mcq();
        question.solution = "Too short.".to_string();
        assert!(!verify_generated_question(&question));
    }

    #[test]
    fn choice_questions_require_exactly_four_options() {
        let mut question = valid_mcq();
        question.options = Some(vec!["one".to_string(), "two".to_string()]);
        assert!(!verify_generated_question(&question));

        let mut question = valid_mcq();
        question.options = None;
        assert!(!verify_generated_question(&question));
    }

    #[test]
    fn prompt_embeds_context_and_type_rules() {
        let prompt = build_question_prompt(QuestionType::Mcq, &[], &[], &context());
        assert!(prompt.contains("- Exam: GATE"));
        assert!(prompt.contains("- Topic: Dynamic Programming"));
        assert!(prompt.contains("ONLY ONE option is correct"));
        assert!(prompt.contains("A) [option A"));

        let prompt = build_question_prompt(QuestionType::Nat, &[], &[], &context());
        assert!(!prompt.contains("OPTIONS:"));
        assert!(prompt.contains("exact number like \"42\""));
    }

    #[test]
    fn prompt_quotes_at_most_five_existing_and_last_three_generated() {
        let existing: Vec<String> = (1..=7).map(|i| format!("old question {i}")).collect();
        let generated: Vec<String> = (1..=5).map(|i| format!("fresh question {i}")).collect();
        let prompt = build_question_prompt(QuestionType::Msq, &existing, &generated, &context());

        assert!(prompt.contains("old question 5"));
        assert!(!prompt.contains("old question 6"));
        assert!(prompt.contains("fresh question 3"));
        assert!(prompt.contains("fresh question 5"));
        assert!(!prompt.contains("fresh question 2"));
    }

    #[test]
    fn pyq_prompt_letters_the_given_options() {
        let options = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let prompt = build_pyq_solution_prompt(
            "Which of these is a Greek letter?",
            QuestionType::Msq,
            Some(&options),
            &context(),
        );
        assert!(prompt.contains("A) alpha"));
        assert!(prompt.contains("C) gamma"));
        assert!(prompt.contains("AT LEAST ONE correct option"));

        let prompt = build_pyq_solution_prompt("State and prove Bayes' theorem.", QuestionType::Sub, None, &context());
        assert!(!prompt.contains("OPTIONS:"));
        assert!(!prompt.contains("CRITICAL"));
    }
}
