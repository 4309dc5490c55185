use super::filter::QueryString;
use super::scores::DEFAULT_SCORE;
use serde::{Deserialize, Serialize};

/// Query keys an event row can be filtered on
pub const YEAR_KEY: &str = "year";
pub const GROUP_KEY: &str = "group";
pub const ACTIVITY_KEY: &str = "activity";

/// Description of a sports day: who competes in what, and how it is scored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SportsDay {
    #[serde(default)]
    pub genders: Vec<String>,
    #[serde(default)]
    pub scores: Vec<ScoreOption>,
    #[serde(default)]
    pub years: Vec<Year>,
    #[serde(default)]
    pub forms: Vec<Form>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Year {
    pub id: String,
    pub name: String,
}

/// A competing form/house
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub name: String,
    /// CSS-style colour name or hex value
    pub colour: String,
}

/// A placing and the points it is worth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOption {
    pub name: String,
    pub value: u32,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub applicable_years: ApplicabilityRules,
    #[serde(default)]
    pub applicable_genders: ApplicabilityRules,
}

/// Which years or genders an event runs for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApplicabilityRules {
    #[default]
    All,
    None,
    Include { ids: Vec<String> },
    Exclude { ids: Vec<String> },
}

impl ApplicabilityRules {
    pub fn applies_to(&self, id: &str) -> bool {
        match self {
            ApplicabilityRules::All => true,
            ApplicabilityRules::None => false,
            ApplicabilityRules::Include { ids } => ids.iter().any(|i| i == id),
            ApplicabilityRules::Exclude { ids } => !ids.iter().any(|i| i == id),
        }
    }
}

/// One scoreable row on the page: an event for a single year and gender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    /// `{year}-{gender}-{event}`
    pub id: String,
    pub name: String,
    pub year_id: String,
    pub gender_id: String,
    /// Event id, used by the `activity` filter
    pub filter_key: String,
}

impl EventRow {
    /// Whether the row survives the `year`/`group`/`activity` filters.
    /// Absent keys do not filter.
    pub fn matches(&self, query: &QueryString) -> bool {
        let passes = |key: &str, value: &str| query.get(key).map_or(true, |wanted| wanted == value);

        passes(YEAR_KEY, &self.year_id)
            && passes(GROUP_KEY, &self.gender_id)
            && passes(ACTIVITY_KEY, &self.filter_key)
    }

    /// Element id of the control scoring `form_id` on this row
    pub fn control_id(&self, form_id: &str) -> String {
        format!("{}-{}", self.id, form_id)
    }
}

impl SportsDay {
    /// Expand every applicable event into one row per year and gender
    pub fn rows(&self) -> Vec<EventRow> {
        let mut rows = Vec::new();

        for year in &self.years {
            for event in &self.events {
                if !event.applicable_years.applies_to(&year.id) {
                    continue;
                }
                for gender in &self.genders {
                    if !event.applicable_genders.applies_to(gender) {
                        continue;
                    }
                    rows.push(EventRow {
                        id: format!("{}-{}-{}", year.id, gender, event.id),
                        name: event.name.clone(),
                        year_id: year.id.clone(),
                        gender_id: gender.clone(),
                        filter_key: event.id.clone(),
                    });
                }
            }
        }

        rows
    }

    /// Values a score control can be set to: no score, then each placing
    pub fn score_options(&self) -> Vec<String> {
        let mut options = vec![DEFAULT_SCORE.to_string()];
        for score in &self.scores {
            let value = score.value.to_string();
            if !options.contains(&value) {
                options.push(value);
            }
        }
        options
    }

    pub fn form(&self, id: &str) -> Option<&Form> {
        self.forms.iter().find(|form| form.id == id)
    }

    pub fn year(&self, id: &str) -> Option<&Year> {
        self.years.iter().find(|year| year.id == id)
    }

    /// A small example day used when no sheet has been configured
    pub fn example() -> Self {
        Self {
            genders: vec!["boys".to_string(), "girls".to_string()],
            scores: vec![
                ScoreOption { name: "1st".to_string(), value: 10, default: false },
                ScoreOption { name: "2nd".to_string(), value: 8, default: false },
                ScoreOption { name: "3rd".to_string(), value: 6, default: false },
                ScoreOption { name: "Took part".to_string(), value: 1, default: true },
            ],
            years: vec![
                Year { id: "y7".to_string(), name: "Year 7".to_string() },
                Year { id: "y8".to_string(), name: "Year 8".to_string() },
            ],
            forms: vec![
                Form { id: "red".to_string(), name: "Red".to_string(), colour: "red".to_string() },
                Form { id: "blue".to_string(), name: "Blue".to_string(), colour: "blue".to_string() },
                Form { id: "gold".to_string(), name: "Gold".to_string(), colour: "yellow".to_string() },
            ],
            events: vec![
                EventSpec {
                    id: "sprint".to_string(),
                    name: "100m Sprint".to_string(),
                    applicable_years: ApplicabilityRules::All,
                    applicable_genders: ApplicabilityRules::All,
                },
                EventSpec {
                    id: "relay".to_string(),
                    name: "4x100m Relay".to_string(),
                    applicable_years: ApplicabilityRules::Include { ids: vec!["y8".to_string()] },
                    applicable_genders: ApplicabilityRules::All,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_expand_years_and_genders() {
        let day = SportsDay::example();
        let rows = day.rows();

        // y7: sprint x 2 genders, y8: sprint + relay x 2 genders
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].id, "y7-boys-sprint");
        assert!(rows.iter().any(|row| row.id == "y8-girls-relay"));
        assert!(!rows.iter().any(|row| row.id == "y7-boys-relay"));
    }

    #[test]
    fn test_applicability_rules() {
        assert!(ApplicabilityRules::All.applies_to("x"));
        assert!(!ApplicabilityRules::None.applies_to("x"));

        let include = ApplicabilityRules::Include { ids: vec!["a".to_string()] };
        assert!(include.applies_to("a"));
        assert!(!include.applies_to("b"));

        let exclude = ApplicabilityRules::Exclude { ids: vec!["a".to_string()] };
        assert!(!exclude.applies_to("a"));
        assert!(exclude.applies_to("b"));
    }

    #[test]
    fn test_rules_deserialize_from_tagged_toml() {
        let spec: EventSpec = toml::from_str(
            r#"
id = "relay"
name = "Relay"
applicable_years = { type = "include", ids = ["y8"] }
"#,
        )
        .unwrap();

        assert_eq!(
            spec.applicable_years,
            ApplicabilityRules::Include { ids: vec!["y8".to_string()] }
        );
        assert_eq!(spec.applicable_genders, ApplicabilityRules::All);
    }

    #[test]
    fn test_row_filters() {
        let row = EventRow {
            id: "y7-boys-sprint".to_string(),
            name: "100m Sprint".to_string(),
            year_id: "y7".to_string(),
            gender_id: "boys".to_string(),
            filter_key: "sprint".to_string(),
        };

        assert!(row.matches(&QueryString::parse("")));
        assert!(row.matches(&QueryString::parse("?year=y7&group=boys")));
        assert!(row.matches(&QueryString::parse("?activity=sprint&house=red")));
        assert!(!row.matches(&QueryString::parse("?year=y8")));
        assert!(!row.matches(&QueryString::parse("?group=girls")));
        assert_eq!(row.control_id("red"), "y7-boys-sprint-red");
    }

    #[test]
    fn test_score_options_start_with_default() {
        let options = SportsDay::example().score_options();
        assert_eq!(options, vec!["0", "10", "8", "6", "1"]);
    }
}
