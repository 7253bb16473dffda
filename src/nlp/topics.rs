//! Coarse topic labels from a fixed keyword table.

/// Topic label and the lowercase cues that trigger it.
pub type TopicRule = (&'static str, &'static [&'static str]);

/// Label returned when no rule matches.
pub const GENERAL_TOPIC: &str = "General";

/// Production topic table.
pub const CIVIC_TOPICS: &[TopicRule] = &[
    (
        "Budget",
        &["budget", "funding", "fiscal", "revenue", "expenditure", "appropriation"],
    ),
    (
        "Housing",
        &["housing", "affordable housing", "development", "zoning", "residential"],
    ),
    (
        "Transportation",
        &["transportation", "transit", "traffic", "parking", "bike lane", "road"],
    ),
    (
        "Environment",
        &["environment", "climate", "sustainability", "green", "pollution", "energy"],
    ),
    (
        "Public Safety",
        &["public safety", "police", "fire", "emergency", "crime", "911"],
    ),
    (
        "Education",
        &["education", "school", "student", "teacher", "curriculum", "university"],
    ),
    (
        "Health",
        &["health", "healthcare", "medical", "hospital", "clinic", "pandemic"],
    ),
    (
        "Economic Development",
        &["economic", "business", "jobs", "employment", "commerce", "development"],
    ),
    (
        "Planning",
        &["planning", "zoning", "land use", "urban", "development"],
    ),
    (
        "Legislation",
        &["bill", "legislation", "law", "ordinance", "resolution", "amendment"],
    ),
    (
        "Contracts",
        &["contract", "procurement", "vendor", "rfp", "bid"],
    ),
    (
        "Finance",
        &["finance", "financial", "treasury", "bonds", "debt"],
    ),
];

/// Labels from [`CIVIC_TOPICS`] whose cues appear in `text`, or `["General"]`.
pub fn detect_topics(text: &str) -> Vec<String> {
    detect_topics_with(text, CIVIC_TOPICS)
}

/// Labels from `rules` whose cues appear in `text`, in table order, or `["General"]`.
pub fn detect_topics_with(text: &str, rules: &[TopicRule]) -> Vec<String> {
    let lowered = text.to_lowercase();
    let topics: Vec<String> = rules
        .iter()
        .filter(|(_, cues)| cues.iter().any(|cue| lowered.contains(cue)))
        .map(|(label, _)| label.to_string())
        .collect();
    if topics.is_empty() {
        vec![GENERAL_TOPIC.to_string()]
    } else {
        topics
    }
}
