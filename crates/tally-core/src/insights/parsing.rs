//! Parse free-form model output into exactly three insights
//!
//! Models are asked for bullet points but rarely follow instructions
//! exactly. Only bulleted lines are kept; missing slots are topped up with
//! filler text so the caller always gets three non-empty strings.

/// Number of insights returned to the user
pub const INSIGHT_COUNT: usize = 3;

/// Appended, in order, when fewer than three bullets are found
pub const FILLER_INSIGHTS: [&str; INSIGHT_COUNT] = [
    "Keep tracking your expenses to identify spending patterns.",
    "Consider reviewing your largest expense categories for potential savings.",
    "Regular expense tracking helps with better financial planning.",
];

/// Characters that open a bullet line
const BULLET_MARKERS: [char; 3] = ['•', '-', '*'];

/// Extract the bullet lines of `text`, padded with filler to exactly three
pub fn parse_insights(text: &str) -> [String; INSIGHT_COUNT] {
    let mut insights = bullet_lines(text)
        .into_iter()
        .chain(FILLER_INSIGHTS.iter().map(|s| s.to_string()));

    std::array::from_fn(|_| insights.next().unwrap_or_default())
}

/// Bullet lines with their markers stripped, empty ones dropped
pub fn bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BULLET_MARKERS))
        .map(|line| {
            line.trim_start_matches(|c: char| BULLET_MARKERS.contains(&c) || c == ' ')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
