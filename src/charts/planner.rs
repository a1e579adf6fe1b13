//! Label planning for stacked charts.
//!
//! Given the segments stacked at each category position (one bar, one band
//! column, one ring of wedges), decide per segment whether a text label is
//! drawn, what it says, where it sits relative to the segment and what color
//! and tilt it uses. Small segments stay unlabeled so charts don't drown in
//! text; the hover placeholder keeps tooltips alive for hidden ones.
//!
//! Pure computation over in-memory tables; the chart sinks do the drawing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::theme::{self, Rgb};

/// One stacked value. The owning [`Stack`] carries the category key.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub series: String,
    pub value: f64,
}

impl Segment {
    pub fn new(series: impl Into<String>, value: f64) -> Self {
        Self {
            series: series.into(),
            value,
        }
    }
}

/// All segments at one category position, bottom to top in a caller-supplied
/// deterministic order. Map iteration order is not acceptable here: the
/// visual stacking must be identical across renders.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    pub category: String,
    pub segments: Vec<Segment>,
}

impl Stack {
    pub fn new(category: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            category: category.into(),
            segments,
        }
    }

    /// Sum of segment values, negatives clamped to zero.
    pub fn total(&self) -> f64 {
        self.segments.iter().map(|s| s.value.max(0.0)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelMode {
    /// Label segments above the relative threshold.
    Auto,
    /// Label exactly the series in the allow-set.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    Inside,
    Outside,
    Above,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColor {
    Black,
    White,
    Custom(Rgb),
}

impl LabelColor {
    pub fn rgb(self) -> Rgb {
        match self {
            LabelColor::Black => theme::BLACK,
            LabelColor::White => theme::WHITE,
            LabelColor::Custom(c) => c,
        }
    }
}

/// Planner inputs that come from the chart config rather than the data.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub mode: LabelMode,
    /// Manual-mode allow-set of series names.
    pub allow: BTreeSet<String>,
    /// Minimum share of the stack for a segment to be labeled in auto mode.
    pub relative_threshold: f64,
    /// Minimum share for the label to sit inside the segment.
    pub inside_threshold: f64,
    /// Segments below this absolute value are too thin to hold text,
    /// whatever their share; their labels go outside.
    pub absolute_floor: f64,
    /// Append the formatted value and unit to the series name.
    pub show_values: bool,
    pub unit: String,
    /// Caller-picked text colors per series.
    pub text_colors: BTreeMap<String, LabelColor>,
    /// Series whose fills are too light for white text.
    pub force_black: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: LabelMode::Auto,
            allow: BTreeSet::new(),
            relative_threshold: 0.05,
            inside_threshold: 0.10,
            absolute_floor: 1.0,
            show_values: true,
            unit: "PJ".to_string(),
            text_colors: BTreeMap::new(),
            force_black: theme::FORCE_BLACK_TEXT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Drawing instructions for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlan {
    pub category: String,
    pub series: String,
    pub visible: bool,
    pub text: String,
    pub position: LabelPosition,
    pub color: LabelColor,
    /// Tilt of band labels following the local trend. Always within
    /// [-12, 0] degrees; 0 for bar segments.
    pub angle_degrees: f64,
}

/// Hover stays active on unlabeled segments as long as the text is
/// non-empty, so hidden labels carry a single blank.
pub const HIDDEN_TEXT: &str = " ";

/// Visibility rule shared by every chart page.
pub fn is_visible(cfg: &PlannerConfig, series: &str, rel: f64) -> bool {
    match cfg.mode {
        LabelMode::Auto => rel >= cfg.relative_threshold,
        LabelMode::Manual => cfg.allow.contains(series),
    }
}

fn text_color(cfg: &PlannerConfig, series: &str) -> LabelColor {
    if cfg.force_black.iter().any(|s| s == series) {
        return LabelColor::Black;
    }
    cfg.text_colors
        .get(series)
        .copied()
        .unwrap_or(LabelColor::White)
}

fn label_text(cfg: &PlannerConfig, series: &str, value: f64) -> String {
    if cfg.show_values {
        format!("{} {:.0} ({}/yr)", series, value, cfg.unit)
    } else {
        series.to_string()
    }
}

/// Plan labels for discrete stacked bars. One plan per segment, in input
/// order. Zero-total stacks produce no visible labels; negative values are
/// treated as zero.
pub fn plan_stacks(stacks: &[Stack], cfg: &PlannerConfig) -> Vec<LabelPlan> {
    let mut plans = Vec::new();
    for stack in stacks {
        let total = stack.total();
        for segment in &stack.segments {
            let value = segment.value.max(0.0);
            let rel = if total > 0.0 { value / total } else { 0.0 };
            let visible = is_visible(cfg, &segment.series, rel);
            let (position, text) = if visible {
                let position = if value < cfg.absolute_floor {
                    // Too thin to contain text even when its share is large.
                    LabelPosition::Outside
                } else if rel >= cfg.inside_threshold {
                    LabelPosition::Inside
                } else {
                    LabelPosition::Outside
                };
                (position, label_text(cfg, &segment.series, value))
            } else {
                (LabelPosition::None, HIDDEN_TEXT.to_string())
            };
            plans.push(LabelPlan {
                category: stack.category.clone(),
                series: segment.series.clone(),
                visible,
                text,
                position,
                color: text_color(cfg, &segment.series),
                angle_degrees: 0.0,
            });
        }
    }
    plans
}

/// Tilt for a band label at `target`, from the series values `window`
/// categories before and after. Rising bands tilt counter-clockwise up to
/// 12 degrees; flat or falling bands stay level. Missing window positions
/// (edge of the category range) yield 0.
pub fn band_angle(values: &[f64], target: usize, window: usize) -> f64 {
    let before = match target.checked_sub(window).and_then(|i| values.get(i)) {
        Some(v) => *v,
        None => return 0.0,
    };
    let after = match values.get(target + window) {
        Some(v) => *v,
        None => return 0.0,
    };
    let denom = (before.abs() + after.abs()) / 2.0;
    if denom == 0.0 {
        return 0.0;
    }
    let slope_ratio = (after - before) / denom;
    (-slope_ratio * 12.0).clamp(-12.0, 0.0)
}

/// Muted color for labels hoisted above a band too thin to hold them.
const ABOVE_BAND_COLOR: Rgb = Rgb::new(0x66, 0x66, 0x66);

/// Plan labels for a stacked-area chart at one target category position.
///
/// `series` holds (name, values-per-category) with values aligned to the
/// category axis; the caller passes them in stacking order. Band labels
/// carry the series name only; values would crowd the trend view.
pub fn plan_bands(
    categories: &[String],
    series: &[(String, Vec<f64>)],
    target: usize,
    window: usize,
    cfg: &PlannerConfig,
) -> Vec<LabelPlan> {
    let Some(category) = categories.get(target) else {
        return Vec::new();
    };
    let total: f64 = series
        .iter()
        .filter_map(|(_, values)| values.get(target))
        .map(|v| v.max(0.0))
        .sum();

    let mut plans = Vec::new();
    for (name, values) in series {
        let value = values.get(target).copied().unwrap_or(0.0).max(0.0);
        let rel = if total > 0.0 { value / total } else { 0.0 };
        let visible = is_visible(cfg, name, rel);
        let (position, color) = if !visible {
            (LabelPosition::None, text_color(cfg, name))
        } else if rel >= cfg.relative_threshold {
            (LabelPosition::Inside, text_color(cfg, name))
        } else {
            // Manually requested label on a thin band: lift it above the
            // band top in a muted color.
            (LabelPosition::Above, LabelColor::Custom(ABOVE_BAND_COLOR))
        };
        plans.push(LabelPlan {
            category: category.clone(),
            series: name.clone(),
            visible,
            text: if visible {
                name.clone()
            } else {
                HIDDEN_TEXT.to_string()
            },
            position,
            color,
            angle_degrees: if visible {
                band_angle(values, target, window)
            } else {
                0.0
            },
        });
    }
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stack_2035() -> Stack {
        Stack::new(
            "2035",
            vec![
                Segment::new("Elec", 40.0),
                Segment::new("NG", 3.0),
                Segment::new("Coal", 0.5),
            ],
        )
    }

    fn cfg() -> PlannerConfig {
        PlannerConfig {
            show_values: false,
            ..PlannerConfig::default()
        }
    }

    #[test]
    fn shares_sum_to_one_for_positive_stacks() {
        let stack = stack_2035();
        let total = stack.total();
        let share_sum: f64 = stack.segments.iter().map(|s| s.value / total).sum();
        assert_relative_eq!(share_sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn auto_mode_thresholds_and_floor() {
        // Elec 40/43.5 is large and above the floor: inside. NG at ~7% of
        // the stack is visible but below the 10% inside threshold. Coal at
        // ~1% is hidden with the hover placeholder.
        let plans = plan_stacks(&[stack_2035()], &cfg());
        assert_eq!(plans.len(), 3);

        let elec = &plans[0];
        assert!(elec.visible);
        assert_eq!(elec.position, LabelPosition::Inside);

        let ng = &plans[1];
        assert!(ng.visible);
        assert_eq!(ng.position, LabelPosition::Outside);

        let coal = &plans[2];
        assert!(!coal.visible);
        assert_eq!(coal.position, LabelPosition::None);
        assert_eq!(coal.text, " ");
    }

    #[test]
    fn spec_scenario_with_five_percent_ng() {
        // stack_total 100: NG at 3% falls under the 5% threshold, Coal under
        // the absolute floor is also below threshold and stays hidden.
        let stack = Stack::new(
            "2035",
            vec![
                Segment::new("Elec", 40.0),
                Segment::new("NG", 3.0),
                Segment::new("Coal", 0.5),
                Segment::new("Wood", 56.5),
            ],
        );
        let plans = plan_stacks(&[stack], &cfg());
        assert!(plans[0].visible && plans[0].position == LabelPosition::Inside);
        assert!(!plans[1].visible);
        assert!(!plans[2].visible);
        assert_eq!(plans[2].text, " ");
    }

    #[test]
    fn floor_forces_outside_even_when_share_is_large() {
        let stack = Stack::new(
            "2040",
            vec![Segment::new("Coal", 0.6), Segment::new("NG", 0.4)],
        );
        let plans = plan_stacks(&[stack], &cfg());
        assert!(plans[0].visible);
        assert_eq!(plans[0].position, LabelPosition::Outside);
    }

    #[test]
    fn manual_mode_ignores_shares() {
        let mut manual = cfg();
        manual.mode = LabelMode::Manual;
        manual.allow = ["Coal".to_string()].into_iter().collect();
        let plans = plan_stacks(&[stack_2035()], &manual);
        assert!(!plans[0].visible); // Elec large but not allowed
        assert!(plans[2].visible); // Coal tiny but allowed
        assert_eq!(plans[2].position, LabelPosition::Outside);
    }

    #[test]
    fn zero_total_stack_labels_nothing() {
        let stack = Stack::new(
            "2000",
            vec![Segment::new("Elec", 0.0), Segment::new("NG", 0.0)],
        );
        let plans = plan_stacks(&[stack], &cfg());
        assert!(plans.iter().all(|p| !p.visible));
        assert!(plans.iter().all(|p| p.text == " "));
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let stack = Stack::new(
            "2000",
            vec![Segment::new("Elec", -5.0), Segment::new("NG", 10.0)],
        );
        let plans = plan_stacks(&[stack], &cfg());
        assert!(!plans[0].visible);
        assert!(plans[1].visible);
    }

    #[test]
    fn planner_is_idempotent() {
        let stacks = vec![stack_2035()];
        let a = plan_stacks(&stacks, &cfg());
        let b = plan_stacks(&stacks, &cfg());
        assert_eq!(a, b);
    }

    #[test]
    fn value_suffix_formatting() {
        let mut with_values = cfg();
        with_values.show_values = true;
        with_values.unit = "TJ".into();
        let plans = plan_stacks(&[stack_2035()], &with_values);
        assert_eq!(plans[0].text, "Elec 40 (TJ/yr)");
    }

    #[test]
    fn text_colors_default_override_and_force_black() {
        let mut c = cfg();
        c.text_colors
            .insert("NG".into(), LabelColor::Custom(Rgb::new(1, 2, 3)));
        let plans = plan_stacks(&[stack_2035()], &c);
        // Elec is on the force-black list even though nothing was picked.
        assert_eq!(plans[0].color, LabelColor::Black);
        assert_eq!(plans[1].color, LabelColor::Custom(Rgb::new(1, 2, 3)));
        assert_eq!(plans[2].color, LabelColor::White);
    }

    #[test]
    fn band_angle_bounds_and_direction() {
        // Strictly rising: negative angle, capped at -12.
        let rising = [1.0, 2.0, 4.0, 8.0, 16.0];
        let a = band_angle(&rising, 2, 2);
        assert!(a < 0.0 && a >= -12.0);

        let steep = [0.0, 0.0, 1.0, 50.0, 100.0];
        assert_relative_eq!(band_angle(&steep, 2, 2), -12.0);

        // Flat and falling bands never tilt positive.
        assert_relative_eq!(band_angle(&[5.0, 5.0, 5.0], 1, 1), 0.0);
        assert_relative_eq!(band_angle(&[8.0, 4.0, 2.0], 1, 1), 0.0);
    }

    #[test]
    fn band_angle_missing_window_is_flat() {
        let values = [1.0, 2.0, 3.0];
        assert_relative_eq!(band_angle(&values, 0, 1), 0.0);
        assert_relative_eq!(band_angle(&values, 2, 1), 0.0);
        assert_relative_eq!(band_angle(&[], 0, 1), 0.0);
    }

    #[test]
    fn band_angle_zero_denominator_is_flat() {
        assert_relative_eq!(band_angle(&[0.0, 1.0, 0.0], 1, 1), 0.0);
    }

    #[test]
    fn band_plans_inside_and_above() {
        let categories: Vec<String> = (2030..2041).map(|y| y.to_string()).collect();
        let big: Vec<f64> = (0..11).map(|i| 50.0 + i as f64).collect();
        let thin: Vec<f64> = vec![0.5; 11];
        let series = vec![("NG".to_string(), big), ("Coal".to_string(), thin)];

        let mut manual = cfg();
        manual.mode = LabelMode::Manual;
        manual.allow = ["NG".to_string(), "Coal".to_string()]
            .into_iter()
            .collect();

        let plans = plan_bands(&categories, &series, 5, 3, &manual);
        assert_eq!(plans[0].position, LabelPosition::Inside);
        assert!(plans[0].angle_degrees <= 0.0 && plans[0].angle_degrees >= -12.0);
        assert_eq!(plans[1].position, LabelPosition::Above);
        assert_eq!(
            plans[1].color,
            LabelColor::Custom(Rgb::new(0x66, 0x66, 0x66))
        );
    }

    #[test]
    fn band_plans_hidden_in_auto_below_threshold() {
        let categories: Vec<String> = (2030..2033).map(|y| y.to_string()).collect();
        let series = vec![
            ("NG".to_string(), vec![99.0, 99.0, 99.0]),
            ("Coal".to_string(), vec![1.0, 1.0, 1.0]),
        ];
        let plans = plan_bands(&categories, &series, 1, 1, &cfg());
        assert!(plans[0].visible);
        assert!(!plans[1].visible);
        assert_eq!(plans[1].text, " ");
    }

    #[test]
    fn band_target_out_of_range_produces_no_plans() {
        let plans = plan_bands(&["2030".to_string()], &[], 5, 3, &cfg());
        assert!(plans.is_empty());
    }
}
