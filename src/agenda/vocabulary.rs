//! Keyword tables that drive agenda synthesis.

/// Keyword to theme mapping for board agendas, matched as lowercase substrings.
pub const DEFAULT_THEMES: &[(&str, &str)] = &[
    ("audit", "audits"),
    ("oversight", "oversight reviews"),
    ("hearing", "public hearings"),
    ("grant award", "grant awards"),
    ("grant", "grant awards"),
    ("lease", "lease agreements"),
    ("loan", "loan and financing requests"),
    ("insurance", "insurance renewals"),
    ("transfer of funds", "budget transfers"),
    ("transfer", "budget transfers"),
    ("resolution", "policy resolutions"),
    ("ordinance", "policy ordinances"),
    ("contract", "contract approvals"),
    ("procurement", "procurement actions"),
    ("public comment", "public engagement"),
    ("community", "community investments"),
    ("infrastructure", "infrastructure projects"),
    ("capital", "capital projects"),
    ("water", "water and sewer projects"),
    ("sewer", "water and sewer projects"),
    ("budget", "budget adjustments"),
    ("housing", "housing initiatives"),
    ("economic development", "economic development"),
    ("retirement", "retirement system actions"),
    ("personnel", "personnel actions"),
    ("employee travel", "employee travel requests"),
    ("travel request", "employee travel requests"),
    ("travel reimbursement", "employee travel requests"),
];

/// Terms marking an item as a likely subject of policy debate.
pub const DEFAULT_DEBATE_KEYWORDS: &[&str] = &[
    "audit", "oversight", "hearing", "grant", "lease", "loan", "resolution", "ordinance",
    "contract", "procurement", "policy", "public", "community", "budget", "housing", "economic",
    "infrastructure", "capital", "development", "zoning", "environment", "sustainability",
    "transportation", "education", "safety", "justice", "equity",
];

/// Themes counted but never headlined.
pub const DEFAULT_OPERATIONAL_THEMES: &[&str] = &[
    "employee travel requests",
    "personnel actions",
    "retirement system actions",
    "insurance renewals",
];

/// Terms that mark a category or descriptor as routine administration.
pub const DEFAULT_OPERATIONAL_TERMS: &[&str] = &["travel", "personnel", "retirement", "employee"];

/// Label used in the lead sentence.
pub const DEFAULT_MEETING_LABEL: &str = "Board of Estimates meeting";

/// Vocabulary used by [`super::AgendaSynthesizer`]; replaceable for tests or other boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaVocabulary {
    /// Ordered `(keyword, theme)` pairs.
    pub themes: Vec<(String, String)>,
    /// Policy-debate terms.
    pub debate_keywords: Vec<String>,
    /// Themes excluded from headlines.
    pub operational_themes: Vec<String>,
    /// Terms that mark routine administrative items.
    pub operational_terms: Vec<String>,
    /// Subject of the lead sentence, e.g. `Board of Estimates meeting`.
    pub meeting_label: String,
}

impl Default for AgendaVocabulary {
    fn default() -> Self {
        Self {
            themes: DEFAULT_THEMES
                .iter()
                .map(|(keyword, theme)| (keyword.to_string(), theme.to_string()))
                .collect(),
            debate_keywords: owned(DEFAULT_DEBATE_KEYWORDS),
            operational_themes: owned(DEFAULT_OPERATIONAL_THEMES),
            operational_terms: owned(DEFAULT_OPERATIONAL_TERMS),
            meeting_label: DEFAULT_MEETING_LABEL.to_string(),
        }
    }
}

impl AgendaVocabulary {
    /// Whether `theme` is excluded from headlines.
    pub fn is_operational_theme(&self, theme: &str) -> bool {
        self.operational_themes.iter().any(|t| t == theme)
    }

    /// Whether `text` mentions routine administration.
    pub fn mentions_operational_term(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.operational_terms
            .iter()
            .any(|term| lowered.contains(term.as_str()))
    }

    /// Distinct themes whose keywords appear in `lowered`, in table order.
    pub(crate) fn themes_in(&self, lowered: &str) -> Vec<&str> {
        let mut found: Vec<&str> = Vec::new();
        for (keyword, theme) in &self.themes {
            if lowered.contains(keyword.as_str()) && !found.contains(&theme.as_str()) {
                found.push(theme);
            }
        }
        found
    }

    /// Whether `lowered` contains any debate keyword.
    pub(crate) fn is_debate_topic(&self, lowered: &str) -> bool {
        self.debate_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
