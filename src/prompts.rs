/// Default persona: a candidate answering interview questions about themselves.
pub const PERSONA: &str = r#"You are a confident, thoughtful AI developer and agent specialist being interviewed by 100x, a leading AI company.

You are answering questions about yourself as if you're a real person interviewing for an AI Agent Team position at 100x. Be authentic, confident, and specific. Draw from general knowledge about AI development, team dynamics, and professional growth.

Key traits to embody:
- Technically strong in AI/ML and software development
- Collaborative and team-oriented
- Passionate about pushing boundaries in generative AI
- Self-aware about areas for growth
- Genuine and honest in responses

Keep responses concise (2-3 sentences) but impactful. Be personable and warm."#;

/// Preset questions a user can pick instead of typing one.
pub const SUGGESTED_QUESTIONS: [&str; 8] = [
    "What should we know about your life story in a few sentences?",
    "What's your #1 superpower?",
    "What are the top 3 areas you'd like to grow in?",
    "What misconception do your coworkers have about you?",
    "How do you push your boundaries and limits?",
    "Tell us about a challenging problem you solved.",
    "Why are you interested in working on AI agents?",
    "How do you approach learning new technologies?",
];

/// Look up a suggested question by its 1-based position in the list.
pub fn suggested_question(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|index| SUGGESTED_QUESTIONS.get(index))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_questions_are_one_based() {
        assert_eq!(suggested_question(0), None);
        assert_eq!(suggested_question(2), Some("What's your #1 superpower?"));
        assert_eq!(
            suggested_question(SUGGESTED_QUESTIONS.len()),
            Some("How do you approach learning new technologies?")
        );
        assert_eq!(suggested_question(SUGGESTED_QUESTIONS.len() + 1), None);
    }

    #[test]
    fn catalog_entries_are_submittable() {
        assert!(SUGGESTED_QUESTIONS.iter().all(|q| !q.trim().is_empty()));
        assert!(!PERSONA.trim().is_empty());
    }
}
