//! Helpers for rendering the synced state for display

use std::fmt::Display;

use common::types::{chain::BlockNumber, events::ContractEvent};

/// The value shown for an event that carries no data
pub const NO_DATA_PLACEHOLDER: &str = "initial Value";
/// The block at which the workshop ends
pub const DEFAULT_WORKSHOP_END_BLOCK: BlockNumber = 450_000;
/// The default number of recent events shown
pub const DEFAULT_RECENT_EVENTS_LIMIT: usize = 5;

/// Whether the workshop is still running at a given block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkshopStatus {
    /// The chain has not yet reached the end block
    Running,
    /// The chain is at or past the end block
    Ended,
}

impl WorkshopStatus {
    /// The workshop status at the given block
    pub fn at(current_block: BlockNumber, end_block: BlockNumber) -> Self {
        if current_block < end_block { WorkshopStatus::Running } else { WorkshopStatus::Ended }
    }
}

impl Display for WorkshopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkshopStatus::Running => write!(f, "Still Running"),
            WorkshopStatus::Ended => write!(f, "Ended"),
        }
    }
}

/// A row of the recent events table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRow {
    /// The position of the event, counting down from the most recent
    pub position: usize,
    /// The first data value of the event, i.e. the counter's new value
    pub value: String,
}

/// Build the table rows for a most-recent-first slice of events
///
/// The most recent event gets the highest position, so positions read as a
/// countdown from the length of the slice to one
pub fn event_rows(recent_events: &[ContractEvent]) -> Vec<EventRow> {
    let n = recent_events.len();
    recent_events
        .iter()
        .enumerate()
        .map(|(i, event)| EventRow {
            position: n - i,
            value: event.data.first().cloned().unwrap_or_else(|| NO_DATA_PLACEHOLDER.to_string()),
        })
        .collect()
}

/// Render the rows as a plain text table
pub fn render_event_table(rows: &[EventRow]) -> String {
    let mut table = format!("{:<4} {:>68}", "#", "New Balance");
    for row in rows {
        table.push_str(&format!("\n{:<4} {:>68}", row.position, row.value));
    }

    table
}

#[cfg(test)]
mod test {
    use common::types::events::ContractEvent;

    use super::*;

    /// Build an event with the given data
    fn event_with_data(data: &[&str]) -> ContractEvent {
        ContractEvent::new(
            "0x7de".to_string(),
            vec![],
            data.iter().map(|d| d.to_string()).collect(),
        )
    }

    /// Tests the numbering and values of the table rows
    #[test]
    fn test_event_rows() {
        let recent = vec![
            event_with_data(&["0x3"]),
            event_with_data(&["0x2", "0xff"]),
            event_with_data(&[]),
        ];
        let rows = event_rows(&recent);

        assert_eq!(
            rows,
            vec![
                EventRow { position: 3, value: "0x3".to_string() },
                EventRow { position: 2, value: "0x2".to_string() },
                EventRow { position: 1, value: NO_DATA_PLACEHOLDER.to_string() },
            ]
        );
        assert!(event_rows(&[]).is_empty());
    }

    /// Tests the workshop status boundary
    #[test]
    fn test_workshop_status() {
        let end = DEFAULT_WORKSHOP_END_BLOCK;
        assert_eq!(WorkshopStatus::at(end - 1, end), WorkshopStatus::Running);
        assert_eq!(WorkshopStatus::at(end, end), WorkshopStatus::Ended);
        assert_eq!(WorkshopStatus::Running.to_string(), "Still Running");
    }

    /// Tests that the rendered table has a header and one line per row
    #[test]
    fn test_render_table() {
        let rows = event_rows(&[event_with_data(&["0x5"])]);
        let table = render_event_table(&rows);

        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("New Balance"));
        assert!(lines[1].starts_with('1'));
        assert!(lines[1].ends_with("0x5"));
    }
}
