// Manual graph builder: a two-column table of X slots and user-entered values.
// X cells are generated from the resolution and are not editable; value cells
// hold raw text so that half-typed numbers survive between frames.

use std::path::Path;

use thiserror::Error;

pub const RESOLUTION_RANGE: (f64, f64) = (0.001, 1000.0);
pub const SLOTS_RANGE: (usize, usize) = (1, 1000);

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("builder file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("builder file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Unit {
    Seconds,
    Millimeters,
}

impl Unit {
    pub const ALL: [Unit; 2] = [Unit::Seconds, Unit::Millimeters];

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Seconds => "s",
            Unit::Millimeters => "mm",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub x: String,
    pub value: String,
}

pub struct GraphBuilder {
    resolution: f64,
    unit: Unit,
    slots: usize,
    rows: Vec<Row>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        GraphBuilder {
            resolution: 1.0,
            unit: Unit::Seconds,
            slots: 10,
            rows: Vec::new(),
        }
    }
}

impl GraphBuilder {
    pub fn new() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: f64) {
        let (min, max) = RESOLUTION_RANGE;
        if resolution.is_nan() {
            return;
        }
        self.resolution = resolution.clamp(min, max);
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn set_slots(&mut self, slots: usize) {
        let (min, max) = SLOTS_RANGE;
        self.slots = slots.clamp(min, max);
    }

    pub fn x_header(&self) -> String {
        format!("X ({})", self.unit.symbol())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Editable access to the value cell of `row`.
    pub fn value_mut(&mut self, row: usize) -> Option<&mut String> {
        self.rows.get_mut(row).map(|row| &mut row.value)
    }

    /// Replaces the table with `slots` empty rows at multiples of the resolution.
    pub fn setup_slots(&mut self) {
        self.rows = (0..self.slots)
            .map(|i| Row {
                x: format!("{:.3}", i as f64 * self.resolution),
                value: String::new(),
            })
            .collect();
    }

    /// Returns `false` if `row` does not exist.
    pub fn set_value(&mut self, row: usize, value: f64) -> bool {
        match self.rows.get_mut(row) {
            Some(row) => {
                row.value = format!("{:.3}", value);
                true
            }
            None => false,
        }
    }

    /// Writes `value` into the first row with a blank value cell.
    pub fn fill_next_empty(&mut self, value: f64) -> Option<usize> {
        let index = self
            .rows
            .iter()
            .position(|row| row.value.trim().is_empty())?;
        self.rows[index].value = format!("{:.3}", value);
        Some(index)
    }

    /// The rows whose X and value both parse as finite numbers.
    pub fn series(&self) -> Vec<[f64; 2]> {
        self.rows
            .iter()
            .filter_map(|row| {
                let x = row.x.trim().parse::<f64>().ok()?;
                let y = row.value.trim().parse::<f64>().ok()?;
                (x.is_finite() && y.is_finite()).then_some([x, y])
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), BuilderError> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["x", "value"])?;
        for row in &self.rows {
            writer.write_record([row.x.as_str(), row.value.as_str()])?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Replaces the table with the rows of a file written by [`GraphBuilder::save_csv`].
    /// The first line is taken as a header and skipped.
    pub fn load_csv(&mut self, path: &Path) -> Result<(), BuilderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(Row {
                x: record.get(0).unwrap_or_default().to_owned(),
                value: record.get(1).unwrap_or_default().to_owned(),
            });
        }

        log::debug!("loaded {} builder rows from {:?}", rows.len(), path);
        self.rows = rows;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn setup_slots_uses_resolution() {
        let mut builder = GraphBuilder::new();
        builder.set_resolution(0.5);
        builder.set_slots(4);
        builder.setup_slots();

        let xs = builder.rows().iter().map(|r| r.x.as_str()).collect::<Vec<_>>();
        assert_eq!(xs, vec!["0.000", "0.500", "1.000", "1.500"]);
        assert!(builder.rows().iter().all(|r| r.value.is_empty()));
    }

    #[test]
    fn inputs_are_clamped() {
        let mut builder = GraphBuilder::new();
        builder.set_resolution(0.0);
        assert_eq!(builder.resolution(), 0.001);
        builder.set_resolution(5000.0);
        assert_eq!(builder.resolution(), 1000.0);
        builder.set_slots(0);
        assert_eq!(builder.slots(), 1);
        builder.set_slots(2000);
        assert_eq!(builder.slots(), 1000);
    }

    #[test]
    fn header_follows_unit() {
        let mut builder = GraphBuilder::new();
        assert_eq!(builder.x_header(), "X (s)");
        builder.set_unit(Unit::Millimeters);
        assert_eq!(builder.x_header(), "X (mm)");
    }

    #[test]
    fn fill_next_empty_walks_the_table() {
        let mut builder = GraphBuilder::new();
        builder.set_slots(2);
        builder.setup_slots();

        assert_eq!(builder.fill_next_empty(1.23456), Some(0));
        assert_eq!(builder.fill_next_empty(2.0), Some(1));
        assert_eq!(builder.fill_next_empty(3.0), None);
        assert_eq!(builder.rows()[0].value, "1.235");
        assert_eq!(builder.rows()[1].value, "2.000");
    }

    #[test]
    fn set_value_overwrites_selected_row() {
        let mut builder = GraphBuilder::new();
        builder.set_slots(3);
        builder.setup_slots();
        builder.set_value(1, 4.0);
        builder.set_value(1, 7.5);

        assert_eq!(builder.rows()[1].value, "7.500");
        assert!(!builder.set_value(3, 1.0));
        // a blank row before it is still the next one to fill
        assert_eq!(builder.fill_next_empty(1.0), Some(0));
    }

    #[test]
    fn series_skips_unparsable_rows() {
        let mut builder = GraphBuilder::new();
        builder.set_slots(4);
        builder.setup_slots();
        builder.set_value(0, 5.0);
        *builder.value_mut(1).unwrap() = "abc".into();
        *builder.value_mut(3).unwrap() = " 6.5 ".into();

        assert_eq!(builder.series(), vec![[0.0, 5.0], [3.0, 6.5]]);
    }

    #[test]
    fn series_skips_non_finite_values() {
        let mut builder = GraphBuilder::new();
        builder.set_slots(5);
        builder.setup_slots();
        builder.set_value(0, 1.0);
        *builder.value_mut(1).unwrap() = "inf".into();
        builder.set_value(2, 2.0);
        *builder.value_mut(3).unwrap() = "-inf".into();
        *builder.value_mut(4).unwrap() = "NaN".into();

        assert_eq!(builder.series(), vec![[0.0, 1.0], [2.0, 2.0]]);
    }

    #[test]
    fn save_and_load_keep_raw_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builder.csv");

        let mut builder = GraphBuilder::new();
        builder.set_slots(3);
        builder.setup_slots();
        builder.set_value(0, 1.0);
        *builder.value_mut(2).unwrap() = "n/a".into();
        builder.save_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("x,value\n0.000,1.000\n"));

        let mut loaded = GraphBuilder::new();
        loaded.load_csv(&path).unwrap();
        assert_eq!(loaded.rows(), builder.rows());
    }

    #[test]
    fn load_tolerates_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "x,value\n1.0\n2.0,3.0").unwrap();
        drop(file);

        let mut builder = GraphBuilder::new();
        builder.load_csv(&path).unwrap();

        assert_eq!(builder.rows().len(), 2);
        assert_eq!(builder.rows()[0].value, "");
        assert_eq!(builder.series(), vec![[2.0, 3.0]]);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let mut builder = GraphBuilder::new();
        let result = builder.load_csv(Path::new("/nonexistent/flowbench/builder.csv"));
        assert!(result.is_err());
    }
}
