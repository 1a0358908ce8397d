use std::ops::RangeInclusive;

/// Text field backing store for a number: keeps the text being edited and the
/// last value that parsed and fell inside the accepted range.
pub struct ParsableFloat {
    value: f64,
    string: String,
    range: Option<RangeInclusive<f64>>,
    last_parse_ok: bool,
}

impl ParsableFloat {
    pub fn new(value: f64) -> ParsableFloat {
        ParsableFloat {
            value,
            string: value.to_string(),
            range: None,
            last_parse_ok: true,
        }
    }

    pub fn bounded(value: f64, range: RangeInclusive<f64>) -> ParsableFloat {
        ParsableFloat {
            range: Some(range),
            ..ParsableFloat::new(value)
        }
    }

    pub fn editable_string(&mut self) -> &mut String {
        &mut self.string
    }

    pub fn update(&mut self) {
        match self.string.trim().parse::<f64>() {
            Ok(value) if self.accepts(value) => {
                self.value = value;
                self.last_parse_ok = true;
            }
            _ => {
                self.last_parse_ok = false;
            }
        }
    }

    fn accepts(&self, value: f64) -> bool {
        match &self.range {
            Some(range) => range.contains(&value),
            None => value.is_finite(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_parsed_ok(&self) -> bool {
        self.last_parse_ok
    }
}

impl From<f64> for ParsableFloat {
    fn from(value: f64) -> Self {
        ParsableFloat::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_good_value() {
        let mut pf = ParsableFloat::new(1.5);
        *pf.editable_string() = "2.25".into();
        pf.update();
        assert_eq!(pf.value(), 2.25);
        assert!(pf.is_parsed_ok());

        *pf.editable_string() = "2.2x".into();
        pf.update();
        assert_eq!(pf.value(), 2.25);
        assert!(!pf.is_parsed_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut pf = ParsableFloat::bounded(50.0, 1.0..=1000.0);
        *pf.editable_string() = "0".into();
        pf.update();
        assert_eq!(pf.value(), 50.0);
        assert!(!pf.is_parsed_ok());

        *pf.editable_string() = " 20 ".into();
        pf.update();
        assert_eq!(pf.value(), 20.0);
        assert!(pf.is_parsed_ok());
    }
}
