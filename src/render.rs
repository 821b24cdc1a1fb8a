use chrono::{DateTime, Utc};

use crate::dashboard::{Dashboard, Tile};
use crate::listview::{ListView, LoadState};
use crate::models::{Ballot, Candidate, Record, Vote, Voter};
use crate::tally::{TallyResults, format_percentage};

pub const MASK: &str = "••••••••";

// One table cell. `Masked` shows the record's masked value once revealed.
pub enum Cell {
    Text(String),
    Masked,
}

// How a record lays out as a table row
pub trait Tabular: Record {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;

    fn row(&self, revealed: bool) -> Vec<String> {
        self.cells()
            .into_iter()
            .map(|cell| match cell {
                Cell::Text(text) => text,
                Cell::Masked => match self.masked_value() {
                    Some(value) if revealed => value.to_string(),
                    _ => MASK.to_string(),
                },
            })
            .collect()
    }
}

fn timestamp(t: &DateTime<Utc>) -> Cell {
    Cell::Text(t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

impl Tabular for Ballot {
    fn headers() -> &'static [&'static str] {
        &["Ballot ID", "Created", "Hashed Ballot"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![text(&self.public_ballot_id), timestamp(&self.created_at), Cell::Masked]
    }
}

impl Tabular for Vote {
    fn headers() -> &'static [&'static str] {
        &["Timestamp", "Voter NIC", "Cipher Text", "Plain Text", "Candidate ID"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            timestamp(&self.timestamp),
            text(&self.voter_nic),
            text(&self.cipher_text),
            Cell::Masked,
            text(&self.candidate_id),
        ]
    }
}

impl Tabular for Candidate {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Party"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![text(&self.id), text(&self.name), text(&self.party)]
    }
}

impl Tabular for Voter {
    fn headers() -> &'static [&'static str] {
        &["Name", "Age", "Registration Code", "NIC", "Status"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.full_name()),
            Cell::Text(self.age.to_string()),
            text(&self.registration_code),
            text(&self.nic),
            text(if self.disabled { "Disabled" } else { "Active" }),
        ]
    }
}

/// Left-aligned columns padded to the widest cell, separated by two spaces.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(headers.to_vec());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in rows {
        out.push('\n');
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

pub fn render_records<R: Tabular>(records: &[&R], is_revealed: impl Fn(&str) -> bool) -> String {
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.row(is_revealed(r.id()))).collect();
    render_table(R::headers(), &rows)
}

/// Whole list page: inline error, empty message or table plus footer.
pub fn render_list<R: Tabular>(view: &ListView<R>) -> String {
    let mut out = String::new();
    if let LoadState::Failed { message, stale } = view.load_state() {
        out.push_str(&format!("Error: {message}\n"));
        // First load failed, no table to show
        if !stale {
            return out;
        }
    }

    let rows = view.displayed();
    if rows.is_empty() {
        out.push_str(&format!("No {} found.\n", R::NOUN));
    } else {
        out.push_str(&render_records(&rows, |id| view.is_revealed(id)));
        out.push('\n');
    }
    out.push_str(&format!(
        "Page {} of {} - {} of {} {}",
        view.current_page(),
        view.total_pages(),
        view.filtered().len(),
        view.records().len(),
        R::NOUN
    ));
    out
}

pub fn render_tally(results: &TallyResults) -> String {
    let rows: Vec<Vec<String>> = results
        .standings
        .iter()
        .map(|s| {
            vec![
                format!("#{}", s.rank),
                s.entry.display_name(),
                s.entry.party.clone(),
                s.entry.vote_count.to_string(),
                format_percentage(s.percentage),
            ]
        })
        .collect();

    let mut out = String::new();
    if let Some(leader) = results.leader() {
        out.push_str(&format!(
            "Leading Candidate: {} - {}, {} votes ({})\n\n",
            leader.entry.display_name(),
            leader.entry.party,
            leader.entry.vote_count,
            format_percentage(leader.percentage)
        ));
    }
    out.push_str(&render_table(&["Rank", "Candidate", "Party", "Votes", "Percentage"], &rows));
    out.push_str(&format!("\n\nTotal Votes Cast: {}", results.total_votes));
    out
}

// 1024 -> "1,024"
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::from("Admin Dashboard\n\n");
    for (title, tile) in dashboard.tiles() {
        let value = match tile {
            Tile::Count(n) => group_thousands(*n),
            Tile::Failed(message) => format!("Error: {message}"),
        };
        out.push_str(&format!("{title:<18}{value}\n"));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use chrono::TimeZone;

    fn vote(id: &str, plain: &str) -> Vote {
        Vote {
            id: id.to_string(),
            voter_nic: format!("19991234567{id}"),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 21, 10, 30, 0).unwrap(),
            cipher_text: "AES256-CBC:Xj9K".to_string(),
            plain_text: plain.to_string(),
            candidate_id: "CAND001".to_string(),
        }
    }

    #[test]
    fn table_pads_columns() {
        let out = render_table(
            &["A", "Long header"],
            &[vec!["value".into(), "x".into()], vec!["v".into(), "y".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "A      Long header");
        assert_eq!(lines[1], "-----  -----------");
        assert_eq!(lines[2], "value  x");
    }

    #[test]
    fn masked_field_hidden_until_revealed() {
        let mut view = ListView::<Vote>::new(10);
        let ticket = view.begin_fetch();
        view.finish_fetch(ticket, Ok(vec![vote("1", "Candidate A"), vote("2", "Candidate B")]));
        view.toggle_reveal("2");

        let out = render_list(&view);
        assert!(out.contains("Candidate B"));
        assert!(!out.contains("Candidate A"));
        assert!(out.contains(MASK));
        assert!(out.ends_with("Page 1 of 1 - 2 of 2 votes"));
    }

    #[test]
    fn first_load_failure_shows_only_error() {
        let mut view = ListView::<Vote>::new(10);
        let ticket = view.begin_fetch();
        view.finish_fetch(ticket, Err(ApiError::Status { status: 500, message: None }));
        assert_eq!(render_list(&view), "Error: Failed to fetch votes\n");
    }

    #[test]
    fn empty_result_says_so() {
        let mut view = ListView::<Vote>::new(10);
        let ticket = view.begin_fetch();
        view.finish_fetch(ticket, Ok(vec![vote("1", "Candidate A")]));
        view.set_search_term("nobody");
        let out = render_list(&view);
        assert!(out.starts_with("No votes found."));
        assert!(out.ends_with("Page 1 of 1 - 0 of 1 votes"));
    }

    #[test]
    fn ballot_hash_is_its_masked_cell() {
        let ballot = Ballot {
            public_ballot_id: "PB-001".to_string(),
            hashed_ballot: "9f86d081884c7d65".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 10, 21, 9, 0, 0).unwrap(),
        };
        assert_eq!(ballot.row(false)[2], MASK);
        assert_eq!(ballot.row(true)[2], "9f86d081884c7d65");
        assert_eq!(ballot.row(true)[0], "PB-001");
    }

    #[test]
    fn dashboard_groups_counts_and_shows_errors_inline() {
        let dashboard = Dashboard {
            registered_voters: Tile::Count(1024),
            candidates: Tile::Count(8),
            votes_cast: Tile::Failed("Failed to fetch votes".to_string()),
        };
        let out = render_dashboard(&dashboard);
        assert!(out.contains("Registered Voters 1,024"));
        assert!(out.contains("Candidates        8"));
        assert!(out.ends_with("Votes Cast        Error: Failed to fetch votes"));
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(999), "999");
    }
}
