use serde::{Deserialize, Serialize};

/// Seat tier classification derived from a seat's row. The mapping is a
/// fixed row-to-tier table over the auditorium layout: the last two rows are
/// VIP, the four rows before them premium, everything else standard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatTier {
    Standard,
    Premium,
    Vip,
}

impl SeatTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatTier::Standard => "standard",
            SeatTier::Premium => "premium",
            SeatTier::Vip => "vip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(SeatTier::Standard),
            "premium" => Some(SeatTier::Premium),
            "vip" => Some(SeatTier::Vip),
            _ => None,
        }
    }
}

/// Auditorium seat layout: ordered row labels (screen-first) and a uniform
/// seats-per-row count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatLayout {
    pub rows: Vec<String>,
    pub seats_per_row: i32,
}

impl SeatLayout {
    pub fn new(rows: Vec<String>, seats_per_row: i32) -> Self {
        Self { rows, seats_per_row }
    }

    pub fn total_seats(&self) -> i32 {
        self.rows.len() as i32 * self.seats_per_row
    }

    /// True when `seat_id` names a valid `{row}{number}` pair in this layout.
    pub fn contains(&self, seat_id: &str) -> bool {
        match parse_seat_id(seat_id) {
            Some((row, number)) => {
                self.rows.iter().any(|r| r == &row) && number >= 1 && number <= self.seats_per_row
            }
            None => false,
        }
    }

    pub fn tier_for_row(&self, row: &str) -> Option<SeatTier> {
        let idx = self.rows.iter().position(|r| r == row)?;
        let from_back = self.rows.len() - 1 - idx;
        Some(if from_back < 2 {
            SeatTier::Vip
        } else if from_back < 6 {
            SeatTier::Premium
        } else {
            SeatTier::Standard
        })
    }

    pub fn tier_for_seat(&self, seat_id: &str) -> Option<SeatTier> {
        let (row, number) = parse_seat_id(seat_id)?;
        if number < 1 || number > self.seats_per_row {
            return None;
        }
        self.tier_for_row(&row)
    }
}

/// One seat in the availability projection returned to seat-map UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatGridEntry {
    pub seat: String,
    pub row: String,
    pub tier: SeatTier,
    pub booked: bool,
}

/// Split a seat identifier like "A12" into its row label and seat number.
pub fn parse_seat_id(seat_id: &str) -> Option<(String, i32)> {
    let split = seat_id.find(|c: char| c.is_ascii_digit())?;
    let (row, number) = seat_id.split_at(split);
    if row.is_empty() || !row.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let number: i32 = number.parse().ok()?;
    Some((row.to_string(), number))
}

pub fn build_seat_grid(layout: &SeatLayout, booked: &[String]) -> Vec<SeatGridEntry> {
    let mut grid = Vec::with_capacity(layout.total_seats() as usize);
    for row in &layout.rows {
        // Row position decides the tier, not the individual seat
        let tier = layout.tier_for_row(row).unwrap_or(SeatTier::Standard);
        for number in 1..=layout.seats_per_row {
            let seat = format!("{}{}", row, number);
            let booked = booked.iter().any(|b| b == &seat);
            grid.push(SeatGridEntry {
                seat,
                row: row.clone(),
                tier,
                booked,
            });
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SeatLayout {
        SeatLayout::new(
            vec!["A", "B", "C", "D", "E", "F", "G", "H"]
                .into_iter()
                .map(String::from)
                .collect(),
            10,
        )
    }

    #[test]
    fn test_parse_seat_id() {
        assert_eq!(parse_seat_id("A1"), Some(("A".to_string(), 1)));
        assert_eq!(parse_seat_id("H10"), Some(("H".to_string(), 10)));
        assert_eq!(parse_seat_id("12"), None);
        assert_eq!(parse_seat_id("A"), None);
        assert_eq!(parse_seat_id(""), None);
    }

    #[test]
    fn test_layout_contains() {
        let layout = layout();
        assert!(layout.contains("A1"));
        assert!(layout.contains("H10"));
        assert!(!layout.contains("H11"));
        assert!(!layout.contains("Z1"));
        assert!(!layout.contains("A0"));
    }

    #[test]
    fn test_row_to_tier_table() {
        let layout = layout();
        // Last two rows are VIP
        assert_eq!(layout.tier_for_row("H"), Some(SeatTier::Vip));
        assert_eq!(layout.tier_for_row("G"), Some(SeatTier::Vip));
        // Four rows before them are premium
        assert_eq!(layout.tier_for_row("F"), Some(SeatTier::Premium));
        assert_eq!(layout.tier_for_row("C"), Some(SeatTier::Premium));
        // Remainder is standard
        assert_eq!(layout.tier_for_row("B"), Some(SeatTier::Standard));
        assert_eq!(layout.tier_for_row("A"), Some(SeatTier::Standard));
    }

    #[test]
    fn test_seat_grid_marks_booked() {
        let layout = layout();
        let booked = vec!["A1".to_string(), "H10".to_string()];
        let grid = build_seat_grid(&layout, &booked);

        assert_eq!(grid.len(), 80);
        assert!(grid.iter().find(|s| s.seat == "A1").unwrap().booked);
        assert!(grid.iter().find(|s| s.seat == "H10").unwrap().booked);
        assert!(!grid.iter().find(|s| s.seat == "B5").unwrap().booked);
    }
}
