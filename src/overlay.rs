use eframe::egui::Color32;

pub const LIVE_COLOR: Color32 = Color32::from_rgb(0x00, 0xe6, 0x76);
pub const MARKER_COLOR: Color32 = Color32::from_rgb(0x66, 0xff, 0xda);

pub const PALETTE: [Color32; 5] = [
    Color32::from_rgb(0x00, 0xe6, 0x76),
    Color32::from_rgb(0x1a, 0x73, 0xe8),
    Color32::from_rgb(0x9b, 0xe9, 0xc9),
    Color32::from_rgb(0x66, 0xff, 0xda),
    Color32::from_rgb(0x7e, 0xe7, 0xff),
];

/// A static series drawn on top of the live line.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub label: Option<String>,
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
    pub marker_color: Color32,
}

#[derive(Debug, Default)]
pub struct OverlaySet {
    overlays: Vec<Overlay>,
    title: Option<String>,
    color_index: usize,
}

impl OverlaySet {
    pub fn new() -> OverlaySet {
        OverlaySet::default()
    }

    /// Adds a series, replacing the existing ones when `clear` is set. Empty
    /// series are ignored.
    pub fn plot(&mut self, points: Vec<[f64; 2]>, clear: bool, label: Option<&str>) -> bool {
        if points.is_empty() {
            return false;
        }

        if clear {
            self.overlays.clear();
        }

        self.color_index = (self.color_index + 1) % PALETTE.len();

        if let Some(label) = label.filter(|l| !l.is_empty()) {
            self.title = Some(label.to_owned());
        }

        self.overlays.push(Overlay {
            label: label.map(str::to_owned),
            points,
            color: PALETTE[self.color_index],
            marker_color: MARKER_COLOR,
        });

        true
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
        self.title = None;
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

pub fn color_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_flag_replaces_series() {
        let mut set = OverlaySet::new();
        assert!(set.plot(vec![[0.0, 1.0]], true, Some("Manual Build")));
        assert!(set.plot(vec![[0.0, 2.0]], false, None));
        assert_eq!(set.overlays().len(), 2);
        assert_eq!(set.title(), Some("Manual Build"));

        assert!(set.plot(vec![[0.0, 3.0]], true, Some("Second")));
        assert_eq!(set.overlays().len(), 1);
        assert_eq!(set.overlays()[0].points, vec![[0.0, 3.0]]);
        assert_eq!(set.title(), Some("Second"));
    }

    #[test]
    fn colors_cycle_through_palette() {
        let mut set = OverlaySet::new();
        for i in 0..6 {
            set.plot(vec![[i as f64, 0.0]], false, None);
        }

        let colors = set.overlays().iter().map(|o| color_hex(o.color)).collect::<Vec<_>>();
        assert_eq!(
            colors,
            vec!["#1a73e8", "#9be9c9", "#66ffda", "#7ee7ff", "#00e676", "#1a73e8"]
        );
    }

    #[test]
    fn empty_series_is_ignored() {
        let mut set = OverlaySet::new();
        assert!(!set.plot(Vec::new(), true, Some("Nothing")));
        assert!(set.is_empty());
        assert_eq!(set.title(), None);
    }

    #[test]
    fn clear_drops_title() {
        let mut set = OverlaySet::new();
        set.plot(vec![[0.0, 1.0]], true, Some("Manual Build"));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.title(), None);
    }
}
