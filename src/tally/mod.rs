use crate::listview::{self, SortDirection};
use crate::models::{TallyEntry, TallyField};

// One ranked row of the results table
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: usize,
    pub entry: TallyEntry,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TallyResults {
    pub standings: Vec<Standing>,
    pub total_votes: u64,
}

impl TallyResults {
    pub fn leader(&self) -> Option<&Standing> {
        self.standings.first()
    }

    pub fn summary(&self) -> String {
        if self.total_votes == 0 {
            return "No votes have been counted yet.".to_string();
        }
        let mut summary = String::new();
        for standing in &self.standings {
            let name = standing.entry.display_name();
            // Mark the leading candidate
            let name = if standing.rank == 1 { format!("**{name}**") } else { name };
            summary.push_str(&format!(
                "#{} {} ({}): {} votes ({})\n",
                standing.rank,
                name,
                standing.entry.party,
                standing.entry.vote_count,
                format_percentage(standing.percentage)
            ));
        }
        summary.push_str(&format!("\n{} votes cast.", self.total_votes));
        summary
    }
}

pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

// One decimal place, e.g. "26.4%"
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Rank candidates by vote count, highest first. Equal counts keep the order
/// the backend returned them in.
pub fn calculate_results(entries: &[TallyEntry]) -> TallyResults {
    // Counts come from the backend, so saturate rather than overflow
    let total_votes = entries
        .iter()
        .fold(0u64, |total, e| total.saturating_add(e.vote_count));

    let all = listview::filter(entries, "");
    let ranked = listview::sort(&all, TallyField::VoteCount, SortDirection::Descending);

    let standings = ranked
        .into_iter()
        .enumerate()
        .map(|(i, entry)| Standing {
            rank: i + 1,
            entry: entry.clone(),
            percentage: percentage(entry.vote_count, total_votes),
        })
        .collect();

    TallyResults {
        standings,
        total_votes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, first: &str, last: &str, party: &str, votes: u64) -> TallyEntry {
        TallyEntry {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            party: party.to_string(),
            vote_count: votes,
        }
    }

    fn sample() -> Vec<TallyEntry> {
        vec![
            entry("1", "Ranil", "Wickramasinghe", "UNP", 5482),
            entry("2", "Mahinda", "Rajapaksa", "SLPP", 4925),
            entry("3", "Anura", "Kumara", "JVP", 3654),
            entry("4", "Sajith", "Premadasa", "SJB", 4125),
            entry("5", "Champika", "Ranawaka", "NPP", 2841),
        ]
    }

    #[test]
    fn ranks_by_vote_count() {
        let results = calculate_results(&sample());
        let order: Vec<&str> = results.standings.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "4", "3", "5"]);
        assert_eq!(results.total_votes, 21027);
        assert_eq!(results.leader().unwrap().entry.last_name, "Wickramasinghe");
    }

    #[test]
    fn percentages_use_one_decimal() {
        let results = calculate_results(&sample());
        let leader = results.leader().unwrap();
        assert_eq!(format_percentage(leader.percentage), "26.1%");
        let total: f64 = results.standings.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_backend_order() {
        let entries = vec![
            entry("a", "A", "One", "X", 10),
            entry("b", "B", "Two", "Y", 20),
            entry("c", "C", "Three", "Z", 10),
        ];
        let results = calculate_results(&entries);
        let order: Vec<&str> = results.standings.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn no_votes_is_not_a_division_by_zero() {
        let entries = vec![entry("1", "A", "B", "C", 0)];
        let results = calculate_results(&entries);
        assert_eq!(results.standings[0].percentage, 0.0);
        assert_eq!(results.summary(), "No votes have been counted yet.");
        assert!(calculate_results(&[]).leader().is_none());
    }

    #[test]
    fn summary_marks_leader() {
        let summary = calculate_results(&sample()).summary();
        assert!(summary.starts_with("#1 **Ranil Wickramasinghe** (UNP): 5482 votes (26.1%)"));
        assert!(summary.ends_with("21027 votes cast."));
    }

    #[test]
    fn huge_backend_counts_saturate_the_total() {
        let big = u64::MAX / 2 + 1;
        let json = format!(
            r#"[{{"id":"1","firstName":"A","lastName":"One","party":"X","voteCount":{big}}},
                {{"id":"2","firstName":"B","lastName":"Two","party":"Y","voteCount":{big}}}]"#
        );
        let entries: Vec<TallyEntry> = serde_json::from_str(&json).unwrap();

        let results = calculate_results(&entries);
        assert_eq!(results.total_votes, u64::MAX);
        assert_eq!(format_percentage(results.standings[0].percentage), "50.0%");
    }
}
