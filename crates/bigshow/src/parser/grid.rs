/// A CSS-grid-like slide layout as column and row fractions.
///
/// An empty `rows` (or `columns`) list means a single implicit track that
/// grows with the number of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub columns: Vec<f32>,
    pub rows: Vec<f32>,
}

impl GridLayout {
    /// Resolve a named layout (`50-50`, `grid-3x2`, ...) or a custom
    /// `grid-template-columns: ...; grid-template-rows: ...` declaration.
    pub fn parse(layout: &str) -> Option<Self> {
        let named = match layout.trim() {
            "50-50" => "grid-template-columns: 50% 50%;",
            "75-25" => "grid-template-columns: 75% 25%;",
            "25-75" => "grid-template-columns: 25% 75%;",
            "50-50-rows" => "grid-template-rows: 50% 50%;",
            "75-25-rows" => "grid-template-rows: 75% 25%;",
            "25-75-rows" => "grid-template-rows: 25% 75%;",
            "grid-3x2" => "grid-template-columns: repeat(3, 1fr); grid-template-rows: repeat(2, 1fr);",
            "grid-2x3" => "grid-template-columns: repeat(2, 1fr); grid-template-rows: repeat(3, 1fr);",
            other => other,
        };

        let mut grid = GridLayout {
            columns: Vec::new(),
            rows: Vec::new(),
        };
        let mut recognized = false;
        for declaration in named.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            match property.trim() {
                "grid-template-columns" => {
                    grid.columns = tracks(value)?;
                    recognized = true;
                }
                "grid-template-rows" => {
                    grid.rows = tracks(value)?;
                    recognized = true;
                }
                _ => {}
            }
        }

        if !recognized {
            log::warn!("unknown slide layout {layout:?}");
            return None;
        }
        Some(grid)
    }

    /// Column count, at least one.
    pub fn column_count(&self) -> usize {
        self.columns.len().max(1)
    }

    /// Row count for a given number of cells, at least one.
    pub fn row_count(&self, cells: usize) -> usize {
        if self.rows.is_empty() {
            cells.div_ceil(self.column_count()).max(1)
        } else {
            self.rows.len()
        }
    }

    /// Column fractions, defaulting to one full-width track.
    pub fn column_fractions(&self) -> Vec<f32> {
        if self.columns.is_empty() {
            vec![1.0]
        } else {
            self.columns.clone()
        }
    }

    /// Row fractions for `cells` cells; implicit rows share the height equally.
    pub fn row_fractions(&self, cells: usize) -> Vec<f32> {
        if self.rows.is_empty() {
            let n = self.row_count(cells);
            vec![1.0 / n as f32; n]
        } else {
            self.rows.clone()
        }
    }
}

/// Parse a track list into fractions summing to 1. Supports `N%`, `Nfr`
/// and `repeat(n, track)`.
fn tracks(value: &str) -> Option<Vec<f32>> {
    let mut raw: Vec<(f32, bool)> = Vec::new();
    let value = value.trim();
    let mut rest = value;

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix("repeat(") {
            let close = inner.find(')')?;
            let (count, track) = inner[..close].split_once(',')?;
            let count: usize = count.trim().parse().ok()?;
            let track = track_size(track.trim())?;
            raw.extend(std::iter::repeat_n(track, count));
            rest = inner[close + 1..].trim_start();
            continue;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        raw.push(track_size(&rest[..end])?);
        rest = rest[end..].trim_start();
    }

    if raw.is_empty() {
        return None;
    }

    // Percentages claim their share first; fr tracks split what remains.
    let percent: f32 = raw.iter().filter(|(_, fr)| !fr).map(|(v, _)| v / 100.0).sum();
    let fr_total: f32 = raw.iter().filter(|(_, fr)| *fr).map(|(v, _)| v).sum();
    let remaining = (1.0 - percent).max(0.0);

    Some(
        raw.into_iter()
            .map(|(v, fr)| {
                if fr {
                    if fr_total > 0.0 { remaining * v / fr_total } else { 0.0 }
                } else {
                    v / 100.0
                }
            })
            .collect(),
    )
}

fn track_size(token: &str) -> Option<(f32, bool)> {
    if let Some(p) = token.strip_suffix('%') {
        return p.parse().ok().map(|v| (v, false));
    }
    if let Some(f) = token.strip_suffix("fr") {
        return f.parse().ok().map(|v| (v, true));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_columns() {
        let grid = GridLayout::parse("75-25").unwrap();
        assert_eq!(grid.columns, vec![0.75, 0.25]);
        assert!(grid.rows.is_empty());
        assert_eq!(grid.row_count(4), 2);
    }

    #[test]
    fn test_named_rows() {
        let grid = GridLayout::parse("25-75-rows").unwrap();
        assert!(grid.columns.is_empty());
        assert_eq!(grid.rows, vec![0.25, 0.75]);
        assert_eq!(grid.column_fractions(), vec![1.0]);
    }

    #[test]
    fn test_repeat_fr() {
        let grid = GridLayout::parse("grid-3x2").unwrap();
        assert_eq!(grid.columns.len(), 3);
        assert_eq!(grid.rows.len(), 2);
        assert!((grid.columns[0] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_mixed_tracks() {
        let grid = GridLayout::parse("grid-template-columns: 40% 1fr 2fr").unwrap();
        assert!((grid.columns[0] - 0.4).abs() < 1e-6);
        assert!((grid.columns[1] - 0.2).abs() < 1e-6);
        assert!((grid.columns[2] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_layout() {
        assert_eq!(GridLayout::parse("sideways"), None);
        assert_eq!(GridLayout::parse("grid-template-columns: auto"), None);
    }

    #[test]
    fn test_implicit_rows_share_height() {
        let grid = GridLayout::parse("50-50").unwrap();
        assert_eq!(grid.row_fractions(3), vec![0.5, 0.5]);
    }
}
