//! Cell geometry and labels for the three-column gallery grid.

/// Columns in the gallery grid.
pub const COLUMNS: usize = 3;

/// Gap between neighbouring cells, in layout units.
pub const GUTTER: f32 = 1.0;

/// Share of the viewport width given to one cell.
const CELL_WIDTH_RATIO: f32 = 0.3333;

/// Insets applied around the thumbnail inside its cell.
///
/// Interior columns split the gutter so the outer edges keep half of it
/// and every visible gap ends up exactly one gutter wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInsets {
    pub bottom: f32,
    pub leading: f32,
    pub trailing: f32,
}

impl CellInsets {
    pub fn for_position(position: usize, spacing: f32) -> Self {
        let column = (position % COLUMNS) as f32;
        let columns = COLUMNS as f32;
        Self {
            bottom: spacing,
            leading: column * spacing / columns,
            trailing: spacing - (column + 1.0) * spacing / columns,
        }
    }
}

/// Square edge of one cell for a viewport of the given width.
pub fn cell_edge(viewport_width: f32) -> f32 {
    (viewport_width * CELL_WIDTH_RATIO).max(1.0)
}

/// `m:ss` label for a playback duration, `None` when there is nothing to show.
///
/// Minutes are not wrapped into hours.
pub fn format_duration(duration: Option<f64>) -> Option<String> {
    let duration = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    let seconds = duration as u64;
    Some(format!("{}:{:02}", seconds / 60, seconds % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_insets_per_column() {
        let left = CellInsets::for_position(0, GUTTER);
        let middle = CellInsets::for_position(1, GUTTER);
        let right = CellInsets::for_position(2, GUTTER);

        assert!(close(left.leading, 0.0) && close(left.trailing, 2.0 / 3.0));
        assert!(close(middle.leading, 1.0 / 3.0) && close(middle.trailing, 1.0 / 3.0));
        assert!(close(right.leading, 2.0 / 3.0) && close(right.trailing, 0.0));
        assert!(close(left.bottom, GUTTER));
    }

    #[test]
    fn test_interior_gaps_are_one_gutter() {
        for column in 0..COLUMNS - 1 {
            let a = CellInsets::for_position(column, GUTTER);
            let b = CellInsets::for_position(column + 1, GUTTER);
            assert!(close(a.trailing + b.leading, GUTTER));
        }
        // Wraps every three positions
        assert_eq!(
            CellInsets::for_position(4, GUTTER),
            CellInsets::for_position(1, GUTTER)
        );
    }

    #[test]
    fn test_cell_edge() {
        assert!((cell_edge(300.0) - 99.99).abs() < 1e-3);
        assert!(close(cell_edge(0.0), 1.0));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), None);
        assert_eq!(format_duration(Some(0.0)), None);
        assert_eq!(format_duration(Some(-3.0)), None);
        assert_eq!(format_duration(Some(65.0)), Some("1:05".to_string()));
        assert_eq!(format_duration(Some(3661.0)), Some("61:01".to_string()));
        assert_eq!(format_duration(Some(9.9)), Some("0:09".to_string()));
    }
}
