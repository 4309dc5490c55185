use super::scores::ScoreMap;
use super::sheet::{EventRow, Form, SportsDay};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Running totals across every event row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    /// year id -> form id -> points
    pub by_year: BTreeMap<String, BTreeMap<String, u64>>,
    pub year_totals: BTreeMap<String, u64>,
    pub form_totals: BTreeMap<String, u64>,
    pub grand_total: u64,
}

impl Scoreboard {
    /// Sum the stored score maps (event id -> serialized map) of `rows`.
    /// Every form in `forms` gets a total, even when it has no points.
    pub fn tally(rows: &[EventRow], stored: &HashMap<String, String>, forms: &[Form]) -> Self {
        let mut board = Scoreboard::default();

        for row in rows {
            let Some(raw) = stored.get(&row.id) else {
                continue;
            };
            let map = match ScoreMap::parse(raw) {
                Ok(map) => map,
                Err(e) => {
                    debug!("Skipping scores for {} in tally: {}", row.id, e);
                    continue;
                }
            };

            let year = board.by_year.entry(row.year_id.clone()).or_default();
            for (form_id, score) in map.iter() {
                if let Some(score) = score {
                    *year.entry(form_id.to_string()).or_insert(0) += u64::from(score);
                }
            }
        }

        for (year_id, forms_in_year) in &board.by_year {
            board
                .year_totals
                .insert(year_id.clone(), forms_in_year.values().sum());
        }

        for form in forms {
            let total = board
                .by_year
                .values()
                .filter_map(|forms_in_year| forms_in_year.get(&form.id))
                .sum();
            board.form_totals.insert(form.id.clone(), total);
        }

        board.grand_total = board.form_totals.values().sum();
        board
    }

    pub fn form_total(&self, form_id: &str) -> u64 {
        self.form_totals.get(form_id).copied().unwrap_or(0)
    }

    /// Standings fragment for the status banner: a line of form totals,
    /// then one line per year of the day, both in form order
    pub fn render_fragment(&self, day: &SportsDay) -> String {
        let mut lines = vec![format!(
            "Standings: {}",
            standings_line(&day.forms, |form| self.form_total(&form.id), self.grand_total)
        )];

        for year in &day.years {
            let forms_in_year = self.by_year.get(&year.id);
            let points = |form: &Form| {
                forms_in_year
                    .and_then(|forms| forms.get(&form.id))
                    .copied()
                    .unwrap_or(0)
            };
            let year_total = self.year_totals.get(&year.id).copied().unwrap_or(0);
            lines.push(format!(
                "{}: {}",
                year.name,
                standings_line(&day.forms, points, year_total)
            ));
        }

        lines.join("\n")
    }
}

fn standings_line(forms: &[Form], points: impl Fn(&Form) -> u64, total: u64) -> String {
    let mut parts: Vec<String> = forms
        .iter()
        .map(|form| format!("{} {}", form.name, points(form)))
        .collect();
    parts.push(format!("Total {}", total));
    parts.join(" | ")
}
