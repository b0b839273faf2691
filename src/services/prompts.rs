//! Prompt construction for initialization, judgement and crossover.

use crate::domain::models::{Candidate, ChatMessage, Example};

const EXPLANATIVE_PROMPT: &str = "You are an expert professor in your field of expertise. \
A good explanation is minimal, deductive, correct and complete. \
It should be clearly understandable by your PhD students, omitting obvious details \
but including all the necessary steps to reach the conclusion.";

const JUDGEMENT_PROMPT: &str = "Be precise about what you think is good or bad in the proposed explanation. \
Think hard about what might be incorrect in the explanation \
and always propose ways to improve it to make it clearer, \
more concise if possible, more precise if necessary, and more convincing.";

/// Dataset instructions plus the multi-step reasoning requirement.
pub fn task_prompt(instructions: &str, reasoning_step_instructions: &str) -> String {
    format!(
        "{instructions}\n\nProvide a reasoning consisting in multiple steps, using one line per step. {reasoning_step_instructions}"
    )
}

fn example_block(example: &Example) -> String {
    format!(
        "<Example>\nQUESTION: {}\nREASONING:\n{}\nANSWER: {}\n</Example>",
        example.question,
        example.reasoning.join("\n"),
        example.answer
    )
}

fn worked_answer(example: &Example) -> String {
    format!(
        "REASONING:\n{}\nANSWER: {}",
        example.reasoning.join("\n"),
        example.answer
    )
}

/// Messages for a first-generation candidate.
///
/// The first `n_shot / 2` examples are inlined in the system message; the
/// rest are replayed as user/assistant turns before the real question.
pub fn initialization_messages(
    task: &str,
    examples: &[Example],
    n_shot: usize,
    question: &str,
) -> Vec<ChatMessage> {
    let split = (n_shot / 2).min(examples.len());
    let (inlined, replayed) = examples.split_at(split);

    let mut system = format!("<Instructions>\n{task}\n</Instructions>");
    for example in inlined {
        system.push_str("\n\n");
        system.push_str(&example_block(example));
    }

    let mut messages = Vec::with_capacity(2 + replayed.len() * 2);
    messages.push(ChatMessage::system(system));
    for example in replayed {
        messages.push(ChatMessage::user(format!("QUESTION: {}", example.question)));
        messages.push(ChatMessage::assistant(worked_answer(example)));
    }
    messages.push(ChatMessage::user(format!("QUESTION: {question}")));

    messages
}

/// Messages asking for a critique of `candidate`.
///
/// Without prior critiques the model judges the explanation itself; otherwise
/// it judges the earlier experts' commentaries, numbered from 0.
pub fn judgement_messages(task: &str, question: &str, candidate: &Candidate) -> Vec<ChatMessage> {
    let goal = if candidate.has_critiques() {
        "Your goal is to judge the commentaries made by other experts on the explanation"
    } else {
        "Your goal is to produce a commentary/judgement of the explanation"
    };

    let system = format!(
        "<Instructions>\n<Task>\n{task}\n</Task>\n\n{EXPLANATIVE_PROMPT}\n\n{JUDGEMENT_PROMPT}\n\n\
{goal} proposed to answer the following question:\n\n<Question>\n{question}\n</Question>\n</Instructions>"
    );

    let mut content = format!(
        "The explanation to comment/judge:\n\n{}",
        candidate.explanation
    );
    if candidate.has_critiques() {
        content.push_str("\n\nThe commentaries made by other experts to judge/comment:");
        for (i, critique) in candidate.critiques.iter().enumerate() {
            content.push_str(&format!("\n\nEXPERT {i}:\n\n{critique}"));
        }
    }

    vec![ChatMessage::system(system), ChatMessage::user(content)]
}

/// Messages asking the model to synthesize one explanation from `parents`.
pub fn crossover_messages(task: &str, question: &str, parents: &[&Candidate]) -> Vec<ChatMessage> {
    let system = format!(
        "<Instructions>\n<Task>\n{task}\n</Task>\n\n{EXPLANATIVE_PROMPT}\n\n\
Based on the following {} explanation proposals and associated commentaries/judgements made by field experts, \
propose the most accurate explanation to answer the following question, focusing on correctness:\n\n\
<Question>\n{question}\n</Question>\n</Instructions>",
        parents.len()
    );

    let mut content = String::new();
    for (i, parent) in parents.iter().enumerate() {
        if i > 0 {
            content.push_str("\n\n");
        }
        content.push_str(&format!("EXPLANATION {i}:\n\n{}", parent.explanation));
        for (j, critique) in parent.critiques.iter().enumerate() {
            content.push_str(&format!("\n\nEXPERT JUDGEMENT {i} {j}:\n\n{critique}"));
        }
    }
    content.push_str(
        "\n\nPropose the best possible explanation and answer. Start with `REASONING:` and conclude with `ANSWER:`.",
    );

    vec![ChatMessage::system(system), ChatMessage::user(content)]
}
