//! Hierarchical ring layout for the sunburst pages.
//!
//! Groups a single year's rows by subsector → carrier → technology and lays
//! the sums out as concentric rings of wedges. Pure geometry: angles are
//! fractions of a full turn, the GUI converts to screen coordinates.

use polars::prelude::*;
use std::collections::BTreeMap;

use crate::charts::planner::{self, LabelMode, PlannerConfig};
use crate::data::loader::{
    Dataset, EnergyUnit, COL_CARRIER, COL_ENERGY, COL_PROVINCE, COL_SECTOR, COL_SUBSECTOR,
    COL_TECH, COL_YEAR,
};
use crate::lookup;
use crate::theme::{self, ColorDim, Rgb};

/// Ring dimensions, innermost first.
const RING_DIMS: [ColorDim; 3] = [ColorDim::Subsector, ColorDim::Carrier, ColorDim::Tech];

#[derive(Debug, Clone)]
pub struct SunburstQuery {
    /// Substring match against the sector column; None keeps every sector.
    pub sector: Option<String>,
    /// None aggregates across all provinces.
    pub provinces: Option<Vec<String>>,
    pub year: i32,
    pub display_unit: EnergyUnit,
    /// Number of rings, 1..=3 (subsector, then carrier, then technology).
    pub ring_count: usize,
    /// Wedges below this share of the grand total get no label text.
    pub min_label_share: f64,
    /// Label values as percent of total instead of absolute.
    pub show_percent: bool,
    /// Ellipsis-abbreviate innermost ring names beyond this length.
    pub max_label_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    /// 0-based ring index, innermost first.
    pub ring: usize,
    pub name: String,
    /// Path from the innermost ring down to this node, for hover text.
    pub path: Vec<String>,
    pub value: f64,
    /// Start angle as a fraction of a full turn, measured clockwise.
    pub start: f64,
    /// Angular extent as a fraction of a full turn.
    pub sweep: f64,
    pub color: Rgb,
    /// Label text; empty when the wedge is too small to label.
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SunburstData {
    pub total: f64,
    pub unit_label: String,
    pub ring_count: usize,
    pub wedges: Vec<Wedge>,
}

impl SunburstData {
    pub fn is_empty(&self) -> bool {
        self.wedges.is_empty() || self.total <= 0.0
    }

    /// Wedge at a ring and angle fraction, for hover lookups.
    pub fn hit(&self, ring: usize, frac: f64) -> Option<&Wedge> {
        let frac = frac.rem_euclid(1.0);
        self.wedges
            .iter()
            .find(|w| w.ring == ring && frac >= w.start && frac < w.start + w.sweep)
    }

    /// Outermost-ring values with their full hierarchy path, as a frame for
    /// the CSV download.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let outer = self.ring_count.saturating_sub(1);
        let names = [COL_SUBSECTOR, COL_CARRIER, COL_TECH];
        let leaves: Vec<&Wedge> = self.wedges.iter().filter(|w| w.ring == outer).collect();

        let mut columns: Vec<Column> = (0..self.ring_count)
            .map(|level| {
                let values: Vec<String> =
                    leaves.iter().map(|w| w.path[level].clone()).collect();
                Column::new(names[level].into(), values)
            })
            .collect();
        columns.push(Column::new(
            format!("Energy ({}/yr)", self.unit_label).into(),
            leaves.iter().map(|w| w.value).collect::<Vec<f64>>(),
        ));
        DataFrame::new(columns)
    }
}

/// Group, lay out and label the rings for one sunburst chart.
pub fn build(ds: &Dataset, query: &SunburstQuery) -> PolarsResult<SunburstData> {
    let ring_count = query.ring_count.clamp(1, RING_DIMS.len());

    let frame = &ds.frame;
    let years = frame.column(COL_YEAR)?.i32()?;
    let sectors = frame.column(COL_SECTOR)?.str()?;
    let provinces = frame.column(COL_PROVINCE)?.str()?;
    let subsectors = frame.column(COL_SUBSECTOR)?.str()?;
    let carriers = frame.column(COL_CARRIER)?.str()?;
    let techs = frame.column(COL_TECH)?.str()?;
    let energy = frame.column(COL_ENERGY)?.f64()?;

    let sector_needle = query.sector.as_ref().map(|s| s.to_lowercase());
    let factor = ds.base_unit.conversion_to(query.display_unit);

    // Leaf sums keyed by the truncated hierarchy path.
    let mut leaves: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for i in 0..frame.height() {
        let (Some(year), Some(sector), Some(province), Some(sub), Some(carrier), Some(tech)) = (
            years.get(i),
            sectors.get(i),
            provinces.get(i),
            subsectors.get(i),
            carriers.get(i),
            techs.get(i),
        ) else {
            continue;
        };
        let Some(value) = energy.get(i) else {
            continue;
        };
        if year != query.year || value.is_nan() {
            continue;
        }
        if let Some(needle) = &sector_needle {
            if !sector.to_lowercase().contains(needle) {
                continue;
            }
        }
        if let Some(selected) = &query.provinces {
            if !selected.iter().any(|p| p == province) {
                continue;
            }
        }
        let path: Vec<String> = [sub, carrier, tech][..ring_count]
            .iter()
            .map(|s| s.to_string())
            .collect();
        *leaves.entry(path).or_insert(0.0) += (value * factor).max(0.0);
    }

    let total: f64 = leaves.values().sum();
    let mut data = SunburstData {
        total,
        unit_label: query.display_unit.label().to_string(),
        ring_count,
        wedges: Vec::new(),
    };
    if total <= 0.0 {
        return Ok(data);
    }

    let label_cfg = PlannerConfig {
        mode: LabelMode::Auto,
        relative_threshold: query.min_label_share,
        ..PlannerConfig::default()
    };

    let leaves: Vec<(Vec<String>, f64)> = leaves.into_iter().collect();
    layout_ring(&leaves, 0, 0.0, 1.0, total, query, &label_cfg, &mut data.wedges);
    Ok(data)
}

/// Subdivide `[start, start+sweep)` among the distinct names at `ring`,
/// recursing into each group for the next ring out.
#[allow(clippy::too_many_arguments)]
fn layout_ring(
    leaves: &[(Vec<String>, f64)],
    ring: usize,
    start: f64,
    sweep: f64,
    total: f64,
    query: &SunburstQuery,
    label_cfg: &PlannerConfig,
    wedges: &mut Vec<Wedge>,
) {
    let group_total: f64 = leaves.iter().map(|(_, v)| v).sum();
    if group_total <= 0.0 {
        return;
    }

    let mut groups: BTreeMap<&str, Vec<&(Vec<String>, f64)>> = BTreeMap::new();
    for leaf in leaves {
        groups.entry(leaf.0[ring].as_str()).or_default().push(leaf);
    }

    let mut cursor = start;
    for (name, members) in groups {
        let value: f64 = members.iter().map(|(_, v)| v).sum();
        let wedge_sweep = sweep * value / group_total;
        let rel = value / total;

        let display_name = if ring == 0 {
            match query.max_label_len {
                Some(max) => lookup::abbreviate(name, max),
                None => name.to_string(),
            }
        } else {
            name.to_string()
        };
        let text = if planner::is_visible(label_cfg, name, rel) {
            if query.show_percent {
                format!("{}\n{:.1}%", display_name, rel * 100.0)
            } else {
                format!(
                    "{}\n{:.0} ({}/yr)",
                    display_name,
                    value,
                    query.display_unit.label()
                )
            }
        } else {
            String::new()
        };

        let path: Vec<String> = members[0].0[..=ring].to_vec();
        wedges.push(Wedge {
            ring,
            name: name.to_string(),
            path,
            value,
            start: cursor,
            sweep: wedge_sweep,
            color: theme::series_color(RING_DIMS[ring], name),
            text,
        });

        if ring + 1 < query.ring_count.clamp(1, RING_DIMS.len()) {
            let inner: Vec<(Vec<String>, f64)> = members
                .iter()
                .map(|(path, v)| (path.clone(), *v))
                .collect();
            layout_ring(
                &inner,
                ring + 1,
                cursor,
                wedge_sweep,
                total,
                query,
                label_cfg,
                wedges,
            );
        }
        cursor += wedge_sweep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::data::loader::Dataset;

    fn dataset() -> Dataset {
        let df = DataFrame::new(vec![
            Column::new("prov".into(), ["ab", "ab", "ab", "qc"].as_slice()),
            Column::new(
                "Sector".into(),
                ["Transport", "Transport", "Transport", "Industry"].as_slice(),
            ),
            Column::new("Subsector".into(), ["LDV", "LDV", "HDV", "Chem_ph"].as_slice()),
            Column::new("en_carrier".into(), ["p", "e", "d", "ng"].as_slice()),
            Column::new(
                "tech".into(),
                ["p_ice", "e_bev", "d_ice", "ng_ph"].as_slice(),
            ),
            Column::new("Year".into(), [2030i32, 2030, 2030, 2030].as_slice()),
            Column::new(
                "Energy demand (PJ/yr)".into(),
                [60.0, 20.0, 20.0, 50.0].as_slice(),
            ),
        ])
        .unwrap();
        Dataset::from_frame(df).unwrap()
    }

    fn query() -> SunburstQuery {
        SunburstQuery {
            sector: Some("transport".into()),
            provinces: None,
            year: 2030,
            display_unit: EnergyUnit::PJ,
            ring_count: 3,
            min_label_share: 0.03,
            show_percent: false,
            max_label_len: None,
        }
    }

    #[test]
    fn ring_zero_covers_the_full_circle() {
        let data = build(&dataset(), &query()).unwrap();
        assert_relative_eq!(data.total, 100.0);
        let ring0: Vec<&Wedge> = data.wedges.iter().filter(|w| w.ring == 0).collect();
        let sweep: f64 = ring0.iter().map(|w| w.sweep).sum();
        assert_relative_eq!(sweep, 1.0, epsilon = 1e-12);
        // HDV and LDV, sorted deterministically.
        assert_eq!(ring0[0].name, "HDV");
        assert_eq!(ring0[1].name, "LDV");
        assert_relative_eq!(ring0[1].sweep, 0.8);
    }

    #[test]
    fn children_nest_inside_their_parent_arc() {
        let data = build(&dataset(), &query()).unwrap();
        let parent = data
            .wedges
            .iter()
            .find(|w| w.ring == 0 && w.name == "LDV")
            .unwrap()
            .clone();
        for child in data.wedges.iter().filter(|w| w.ring == 1) {
            if child.path[0] == "LDV" {
                assert!(child.start >= parent.start - 1e-12);
                assert!(child.start + child.sweep <= parent.start + parent.sweep + 1e-12);
            }
        }
        // Carrier ring carries decorated names.
        assert!(data.wedges.iter().any(|w| w.ring == 1 && w.name == "Gasoline"));
        assert!(data
            .wedges
            .iter()
            .any(|w| w.ring == 2 && w.name == "Gasoline ICE"));
    }

    #[test]
    fn sector_filter_uses_substring_match() {
        let mut q = query();
        q.sector = Some("indus".into());
        let data = build(&dataset(), &q).unwrap();
        assert_relative_eq!(data.total, 50.0);
        assert_eq!(data.wedges[0].name, "Chem_ph");
    }

    #[test]
    fn small_wedges_lose_their_label_text() {
        let mut q = query();
        q.min_label_share = 0.5;
        let data = build(&dataset(), &q).unwrap();
        let ldv = data
            .wedges
            .iter()
            .find(|w| w.ring == 0 && w.name == "LDV")
            .unwrap();
        assert!(!ldv.text.is_empty());
        let hdv = data
            .wedges
            .iter()
            .find(|w| w.ring == 0 && w.name == "HDV")
            .unwrap();
        assert!(hdv.text.is_empty());
    }

    #[test]
    fn percent_labels_show_share_of_total() {
        let mut q = query();
        q.show_percent = true;
        let data = build(&dataset(), &q).unwrap();
        let ldv = data
            .wedges
            .iter()
            .find(|w| w.ring == 0 && w.name == "LDV")
            .unwrap();
        assert_eq!(ldv.text, "LDV\n80.0%");
    }

    #[test]
    fn ring_count_limits_depth() {
        let mut q = query();
        q.ring_count = 1;
        let data = build(&dataset(), &q).unwrap();
        assert!(data.wedges.iter().all(|w| w.ring == 0));
    }

    #[test]
    fn hit_testing_finds_wedges_by_angle() {
        let data = build(&dataset(), &query()).unwrap();
        let first = data.wedges.iter().find(|w| w.ring == 0).unwrap();
        let hit = data.hit(0, first.start + first.sweep / 2.0).unwrap();
        assert_eq!(hit.name, first.name);
        assert!(data.hit(5, 0.5).is_none());
    }

    #[test]
    fn to_frame_exports_outer_ring_with_paths() {
        let data = build(&dataset(), &query()).unwrap();
        let df = data.to_frame().unwrap();
        // One row per (subsector, carrier, tech) leaf.
        assert_eq!(df.height(), 3);
        assert!(df.column("Subsector").is_ok());
        assert!(df.column("Carrier").is_ok());
        assert!(df.column("Tech_name").is_ok());
        assert!(df.column("Energy (PJ/yr)").is_ok());
    }

    #[test]
    fn missing_year_yields_empty_data() {
        let mut q = query();
        q.year = 1999;
        let data = build(&dataset(), &q).unwrap();
        assert!(data.is_empty());
    }
}
