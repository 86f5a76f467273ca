//! Extraction of labeled sections from raw model output.
//!
//! The generation prompt instructs the model to answer with `QUESTION:`,
//! `OPTIONS:`, `ANSWER:` and `SOLUTION:` blocks. Model output drifts, so a
//! missing label yields an empty field rather than an error; the shape
//! checks in the generation client catch the damage and trigger a
//! regeneration. Keeping all of the label handling here lets a stricter
//! parser replace it without touching callers.

use crate::models::question::{GeneratedQuestion, PyqSolution, QuestionType};

const MAX_OPTIONS: usize = 4;

pub fn parse_generated_question(text: &str, question_type: QuestionType) -> GeneratedQuestion {
    let question_statement = section(text, "QUESTION:", &["OPTIONS:", "ANSWER:"])
        .unwrap_or_default();
    // The answer is a single line: it ends at the first newline or at the
    // SOLUTION: label, whichever comes first.
    let answer = section(text, "ANSWER:", &["\n", "SOLUTION:"]).unwrap_or_default();
    let solution = section(text, "SOLUTION:", &[]).unwrap_or_default();

    let options = if question_type.has_options() {
        section(text, "OPTIONS:", &["ANSWER:"]).map(|block| parse_options(&block))
    } else {
        None
    };

    GeneratedQuestion {
        question_statement,
        options,
        answer,
        solution,
        question_type,
    }
}

pub fn parse_pyq_solution(text: &str) -> PyqSolution {
    PyqSolution {
        answer: section(text, "ANSWER:", &["\n", "SOLUTION:"]).unwrap_or_default(),
        solution: section(text, "SOLUTION:", &[]).unwrap_or_default(),
    }
}

fn section(text: &str, label: &str, terminators: &[&str]) -> Option<String> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let end = terminators
        .iter()
        .filter_map(|t| rest.find(t))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn parse_options(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_OPTIONS)
        .map(|line| strip_option_marker(line).to_string())
        .collect()
}

// Drops a leading "A) " style marker; anything else is left untouched.
fn strip_option_marker(line: &str) -> &str {
    let bytes = line.as_bytes();
    if bytes.len() >= 2 && (b'A'..=b'D').contains(&bytes[0]) && bytes[1] == b')' {
        line[2..].trim_start()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MCQ_RESPONSE: &str = "QUESTION: What is the derivative of x^2?\n\
OPTIONS:\n\
A) 2x\n\
B) x\n\
C) x^2\n\
D) 2\n\
ANSWER: A\n\
SOLUTION: Apply the power rule: d/dx x^n = n*x^(n-1), so d/dx x^2 = 2x.";

    #[test]
    fn parses_all_sections_of_an_mcq_response() {
        let question = parse_generated_question(MCQ_RESPONSE, QuestionType::Mcq);
        assert_eq!(question.question_statement, "What is the derivative of x^2?");
        assert_eq!(
            question.options,
            Some(vec![
                "2x".to_string(),
                "x".to_string(),
                "x^2".to_string(),
                "2".to_string()
            ])
        );
        assert_eq!(question.answer, "A");
        assert!(question.solution.starts_with("Apply the power rule"));
    }

    #[test]
    fn missing_sections_become_empty_strings_not_errors() {
        let question = parse_generated_question("free-form rambling", QuestionType::Nat);
        assert_eq!(question.question_statement, "");
        assert_eq!(question.answer, "");
        assert_eq!(question.solution, "");
        assert_eq!(question.options, None);
    }

    #[test]
    fn options_label_missing_yields_none_for_choice_types() {
        let text = "QUESTION: Pick one.\nANSWER: B\nSOLUTION: Because it is the only valid choice.";
        let question = parse_generated_question(text, QuestionType::Mcq);
        assert_eq!(question.options, None);
        assert_eq!(question.answer, "B");
    }

    #[test]
    fn answer_stops_at_the_first_newline() {
        let text = "ANSWER: 42\nextra prose\nSOLUTION: Detailed working goes here for the reader.";
        let question = parse_generated_question(text, QuestionType::Nat);
        assert_eq!(question.answer, "42");
    }

    #[test]
    fn option_markers_are_stripped_and_blank_lines_skipped() {
        let text = "QUESTION: q\nOPTIONS:\n\nA) first\n  B)   second\nthird\nD) fourth\nANSWER: A\nSOLUTION: s";
        let question = parse_generated_question(text, QuestionType::Msq);
        assert_eq!(
            question.options,
            Some(vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string(),
                "fourth".to_string()
            ])
        );
    }

    #[test]
    fn at_most_four_options_are_kept() {
        let text = "OPTIONS:\nA) a\nB) b\nC) c\nD) d\nE) e\nANSWER: A\nSOLUTION: s";
        let question = parse_generated_question(text, QuestionType::Mcq);
        assert_eq!(question.options.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn pyq_solution_extracts_answer_and_solution_only() {
        let text = "ANSWER: A,C\nSOLUTION: Options A and C both satisfy the constraint.";
        let solution = parse_pyq_solution(text);
        assert_eq!(solution.answer, "A,C");
        assert_eq!(
            solution.solution,
            "Options A and C both satisfy the constraint."
        );
    }

    #[test]
    fn nat_answers_never_carry_options() {
        let question = parse_generated_question(MCQ_RESPONSE, QuestionType::Nat);
        assert_eq!(question.options, None);
    }
}
