use crate::models::{Goal, RoadmapParams};
use crate::utils::{AppError, AppResult};

use super::completion_service::{CompletionClient, CompletionError};

pub const SYSTEM_MESSAGE: &str = "Generate a personalized learning roadmap.";

/// Subjects the model is reminded of for each exam.
fn subject_note(goal: Goal) -> &'static str {
    match goal {
        Goal::Jee => "JEE has three subjects: Physics, Chemistry, and Mathematics.",
        Goal::Neet => "NEET has three subjects: Physics, Chemistry, and Biology.",
        Goal::Gate => "GATE has 7 subjects.",
        Goal::Upsc => "UPSC has 3 subjects.",
        Goal::Ca => "CA has 2 subjects.",
    }
}

pub fn build_prompt(params: &RoadmapParams) -> String {
    let goal = params.goal.label();
    let start = params.start_date.format("%B %-d, %Y");
    let end = params.end_date.format("%B %-d, %Y");

    format!(
        "I am a {speed} aiming to prepare for {goal} at a {level} level. \
My preparation timeline is from {start} to {end}. Ensure the references and YouTube channel \
links are correct and legitimate, and provide clickable hyperlinks so users can directly access them.

Please keep in mind the following:

{subjects}

Provide the following information:

Goal: A one-line description of the end goal.

Daily Study Plan:

Include a day-wise and topic-wise study plan.
Provide clickable references for each topic.
Present the study plan in a bullet point format.
Example structure

Day\tTopic\tReference
Day 1-2\tTopic one\tReference - Source
Day 3-4\tTopic two\tReference - Source
...\t...\t...

YouTube Channels:

Provide a list of YouTube channels for {goal} preparation. Only list and provide clickable links \
which are correct and ensure you double-check them.
Separate the channels into English and Hindi categories.
English:

Hindi:

Books List:

Include a list of recommended books for {goal} preparation, separated by subject.

Websites:

Provide a list of helpful websites for {goal} preparation.

Additional Tips:

Please ensure that the references and resources are reliable and up-to-date. The study plan \
should be detailed, and each element should be accessible with the provided hyperlinks.
",
        speed = params.speed.label(),
        level = params.level.label(),
        subjects = subject_note(params.goal),
    )
}

/// Asks the completion endpoint for a roadmap. Every failure collapses to one
/// outward error; the cause is only logged.
pub async fn generate(client: &CompletionClient, params: &RoadmapParams) -> AppResult<String> {
    let prompt = build_prompt(params);

    match client.complete(SYSTEM_MESSAGE, &prompt).await {
        Ok(roadmap) => {
            log::info!(
                "✅ Roadmap generated for {} ({} chars)",
                params.goal,
                roadmap.len()
            );
            Ok(roadmap)
        }
        Err(CompletionError::NotConfigured) => {
            log::warn!("⚠️  Roadmap requested but no completion credential is configured");
            Err(AppError::Unavailable(
                "Roadmap generation is not available".to_string(),
            ))
        }
        Err(e) => {
            log::error!("❌ Error calling completion endpoint: {}", e);
            Err(AppError::Upstream(
                "Failed to generate content with the completion service".to_string(),
            ))
        }
    }
}
