//! Status board filtering.
//!
//! Rows are restricted to the user's scope and laid out role-major: every
//! Main Server row (in centre order) comes before any Backup Server row, and
//! so on through `ROLE_ORDER`.

use super::access::CentreScope;
use super::history::{latest_per_key, HistoryIndex};
use super::record::{normalize_centre, role_rank, StatusRecord};

/// Current status rows plus the sorted history behind them.
#[derive(Debug, Clone, Default)]
pub struct BoardData {
    pub current: Vec<StatusRecord>,
    pub history: HistoryIndex,
}

impl BoardData {
    /// Build board data from a status table and an optional separate history
    /// table. Without a history table the status table is the history and
    /// the current row per server is its newest observation.
    pub fn new(status: Vec<StatusRecord>, history: Option<Vec<StatusRecord>>) -> Self {
        let history = match history {
            Some(history) => HistoryIndex::from_records(&history),
            None => HistoryIndex::from_records(&status),
        };
        Self {
            current: latest_per_key(&status),
            history,
        }
    }

    pub fn centres(&self, scope: &CentreScope) -> Vec<String> {
        centre_order(&self.current, scope)
    }

    /// Current rows visible under `scope`, role-major in `centres` order.
    pub fn visible(&self, scope: &CentreScope) -> Vec<StatusRecord> {
        filter(&self.current, &self.centres(scope))
    }
}

/// Centres visible under `scope`, in display order.
///
/// `All` yields centres in first-appearance order of `rows`, counting only
/// rows with a displayed role; a list scope yields the list itself,
/// including centres with no rows yet.
pub fn centre_order(rows: &[StatusRecord], scope: &CentreScope) -> Vec<String> {
    match scope {
        CentreScope::Only(centres) => centres.clone(),
        CentreScope::All => {
            let mut seen: Vec<String> = Vec::new();
            for row in rows.iter().filter(|row| role_rank(&row.server).is_some()) {
                let centre = normalize_centre(&row.centre);
                if !centre.is_empty() && !seen.contains(&centre) {
                    seen.push(centre);
                }
            }
            seen
        }
    }
}

/// Keep rows whose centre is in `centres`, drop unknown roles, order by
/// role then by position in `centres`. Stable on ties.
///
/// `centres` is the resolved display order from [`centre_order`], taken
/// from the full status table so that re-filtering a result keeps it.
pub fn filter(rows: &[StatusRecord], centres: &[String]) -> Vec<StatusRecord> {
    let mut ranked: Vec<(usize, usize, &StatusRecord)> = rows
        .iter()
        .filter_map(|row| {
            let role = role_rank(&row.server)?;
            let centre = normalize_centre(&row.centre);
            let centre_rank = centres.iter().position(|c| *c == centre)?;
            Some((role, centre_rank, row))
        })
        .collect();

    ranked.sort_by_key(|(role, centre, _)| (*role, *centre));
    ranked.into_iter().map(|(_, _, row)| row.clone()).collect()
}

/// Rows for a single centre, in role order.
pub fn rows_for_centre(rows: &[StatusRecord], centre: &str) -> Vec<StatusRecord> {
    let centre = normalize_centre(centre);
    rows.iter()
        .filter(|row| normalize_centre(&row.centre) == centre)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::CheckStatus;
    use chrono::{TimeZone, Utc};

    fn rec(centre: &str, server: &str) -> StatusRecord {
        StatusRecord {
            centre: centre.to_string(),
            server: server.to_string(),
            status: CheckStatus::Success,
            raw_status: "success".to_string(),
            response_ms: Some(10.0),
            ip: "10.0.0.1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    fn table() -> Vec<StatusRecord> {
        vec![
            rec("Delhi", "Backup Server"),
            rec(" pune", "Bitvoice Server"),
            rec("Mumbai", "Main Server"),
            rec("PUNE ", "Main Server"),
            rec("Delhi", "Main Server"),
            rec("Pune", "Print Server"),
            rec("Pune", "Backup Server"),
        ]
    }

    fn labels(rows: &[StatusRecord]) -> Vec<(String, String)> {
        rows.iter()
            .map(|r| (normalize_centre(&r.centre), r.server.clone()))
            .collect()
    }

    fn data() -> BoardData {
        BoardData {
            current: table(),
            history: HistoryIndex::default(),
        }
    }

    #[test]
    fn all_scope_uses_table_order() {
        let out = data().visible(&CentreScope::All);
        assert_eq!(
            labels(&out),
            vec![
                ("DELHI".into(), "Main Server".into()),
                ("PUNE".into(), "Main Server".into()),
                ("MUMBAI".into(), "Main Server".into()),
                ("DELHI".into(), "Backup Server".into()),
                ("PUNE".into(), "Backup Server".into()),
                ("PUNE".into(), "Bitvoice Server".into()),
            ]
        );
    }

    #[test]
    fn list_scope_uses_assignment_order() {
        let scope = CentreScope::Only(vec!["MUMBAI".into(), "PUNE".into()]);
        let out = data().visible(&scope);
        assert_eq!(
            labels(&out),
            vec![
                ("MUMBAI".into(), "Main Server".into()),
                ("PUNE".into(), "Main Server".into()),
                ("PUNE".into(), "Backup Server".into()),
                ("PUNE".into(), "Bitvoice Server".into()),
            ]
        );
    }

    #[test]
    fn main_servers_before_backups() {
        let out = data().visible(&CentreScope::All);
        let last_main = out.iter().rposition(|r| r.server == "Main Server").unwrap();
        let first_backup = out.iter().position(|r| r.server == "Backup Server").unwrap();
        assert!(last_main < first_backup);
    }

    #[test]
    fn filter_is_idempotent() {
        let data = data();
        for scope in [
            CentreScope::All,
            CentreScope::Only(vec!["PUNE".into(), "DELHI".into()]),
        ] {
            let centres = data.centres(&scope);
            let once = filter(&data.current, &centres);
            assert_eq!(filter(&once, &centres), once);
        }
    }

    #[test]
    fn refiltering_keeps_table_centre_order() {
        let data = BoardData {
            current: vec![
                rec("A", "Backup Server"),
                rec("B", "Main Server"),
                rec("B", "Backup Server"),
            ],
            history: HistoryIndex::default(),
        };
        let centres = data.centres(&CentreScope::All);
        assert_eq!(centres, vec!["A".to_string(), "B".to_string()]);

        let once = data.visible(&CentreScope::All);
        assert_eq!(
            labels(&once),
            vec![
                ("B".into(), "Main Server".into()),
                ("A".into(), "Backup Server".into()),
                ("B".into(), "Backup Server".into()),
            ]
        );
        assert_eq!(filter(&once, &centres), once);
    }

    #[test]
    fn centres_with_only_hidden_roles_are_not_listed() {
        let rows = vec![rec("X", "Print Server"), rec("B", "Main Server")];
        assert_eq!(
            centre_order(&rows, &CentreScope::All),
            vec!["B".to_string()]
        );
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let scope = CentreScope::Only(vec!["CHENNAI".into()]);
        assert!(data().visible(&scope).is_empty());
        assert_eq!(centre_order(&table(), &scope), vec!["CHENNAI".to_string()]);
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let out = data().visible(&CentreScope::All);
        assert!(out.iter().all(|r| r.server != "Print Server"));
    }

    #[test]
    fn rows_for_one_centre() {
        let out = data().visible(&CentreScope::All);
        let pune = rows_for_centre(&out, "pune");
        assert_eq!(pune.len(), 3);
        assert_eq!(pune[0].server, "Main Server");
    }
}
