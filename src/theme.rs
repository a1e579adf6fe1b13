//! Display colors for chart series.
//!
//! Tables are keyed by display name (carriers, technologies) or by raw
//! subsector code. Series missing from every table fall back to a fixed
//! palette indexed by a stable hash of the name, so a series keeps its
//! color across renders, filter changes and test runs.

/// Plain sRGB triple. Sinks convert to their own color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`. Returns None for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const WHITE: Rgb = Rgb::new(255, 255, 255);

/// Carrier display name → fill color.
const CARRIER_COLORS: &[(&str, &str)] = &[
    // Fossil liquids
    ("Diesel", "#800100"),
    ("R-Diesel", "#82ec7e"),
    ("Biodiesel", "#29c12e"),
    ("Gasoline", "#ff0000"),
    ("Jet Fuel", "#ffa6a7"),
    ("HFO", "#4c4a4a"),
    ("LFO", "#9e9e9e"),
    // Gaseous & thermal
    ("Prop", "#4a7fc8"),
    ("NG", "#4f95d9"),
    ("Steam", "#b3e5fc"),
    // Low-carbon / renewables
    ("Ethanol", "#87da78"),
    ("Wood", "#02b050"),
    ("Plastics", "#65514b"),
    ("Elec", "#ffbf00"),
    // Solids
    ("Coal", "#0d0d0d"),
];

/// Carrier+tech display name → fill color. Shades grouped by carrier family.
const TECH_COLORS: &[(&str, &str)] = &[
    ("Diesel ICE", "#800100"),
    ("Diesel Engine Drive", "#a32e23"),
    ("Diesel Power Gen", "#c65b46"),
    ("Diesel Proc. Heat", "#e8886a"),
    ("Biodiesel ICE", "#29c12e"),
    ("Renewable Diesel ICE", "#82ec7e"),
    ("Ethanol ICE", "#5a7b39"),
    ("Jet ICE", "#ffa6a7"),
    ("Gasoline ICE", "#ff0000"),
    ("Electric Resistive Heat", "#ffbf00"),
    ("Elec. Other Bldg.", "#ffd966"),
    ("Elec. Hot Water", "#fff2b2"),
    ("Elec. Facility Support", "#ffdd69"),
    ("Elec. Grid Drive", "#ffe9a3"),
    ("Elec. Other Processes", "#fff6d1"),
    ("Battery EV", "#fffde4"),
    ("Air-Source HP", "#ffe184"),
    ("HFO Boiler", "#757575"),
    ("HFO Other Bldg.", "#979797"),
    ("HFO Hot Water", "#b9b9b9"),
    ("HFO Proc. Heat", "#dbdbdb"),
    ("HFO Power Gen", "#ededed"),
    ("HFO ICE", "#cacaca"),
    ("LFO Boiler", "#9e9e9e"),
    ("LFO Other Bldg.", "#bdbdbd"),
    ("LFO Hot Water", "#dcdcdc"),
    ("LFO Cooking", "#ebebeb"),
    ("LFO HE Furnace", "#c5c5c5"),
    ("LFO Mech. Furnace", "#d6d6d6"),
    ("LFO Non-Eff. Furnace", "#e7e7e7"),
    ("NG Mech. Furnace", "#4f95d9"),
    ("NG Cooking", "#71aee1"),
    ("NG Boiler", "#92c7e9"),
    ("NG Hot Water", "#b4e0f1"),
    ("NG Engine Drive", "#d5f9f9"),
    ("NG Proc. Heat", "#a4caf7"),
    ("NG Power Gen", "#c5ddfb"),
    ("NG HE Furnace", "#c5ebfa"),
    ("NG Non-Eff. Furnace", "#e0f2fa"),
    ("NG ICE", "#b1d8f8"),
    ("Prop Mech. Furnace", "#043cd6"),
    ("Prop Cooking", "#356de4"),
    ("Prop Boiler", "#6e9ef0"),
    ("Prop Hot Water", "#b2d0fb"),
    ("Prop ICE", "#dbe9fd"),
    ("Steam Exchanger", "#b3e5fc"),
    ("Steam Other Bldg.", "#c7ebfb"),
    ("Steam Hot Water", "#dbf2fb"),
    ("Steam Proc. Heat", "#eaf8fc"),
    ("Steam Heat Exch.", "#f7fcff"),
    ("Coal Proc. Heat", "#0d0d0d"),
    ("Plastics Proc. Heat", "#65514b"),
    ("Wood Proc. Heat", "#02b050"),
    ("Wood Cooking", "#5ed075"),
    ("Wood Stove", "#99e0a1"),
    ("Wood Hot Water", "#b6ebbf"),
];

/// Subsector code → fill color. Gradients within each industry family.
const SUBSECTOR_COLORS: &[(&str, &str)] = &[
    // Cement (yellow gradient)
    ("Cement_fs", "#bca136"),
    ("Cement_md", "#c6b354"),
    ("Cement_op", "#d1c672"),
    ("Cement_ph", "#dbd890"),
    ("Cement_tr", "#e5ebb0"),
    // Chemical industry (blue gradient)
    ("Chem_fs", "#2986cc"),
    ("Chem_md", "#52a2d9"),
    ("Chem_op", "#7abde6"),
    ("Chem_pg", "#a3d9f2"),
    ("Chem_ph", "#ccf5ff"),
    ("Chem_tr", "#e6faff"),
    // Construction (gold gradient)
    ("Const_pg", "#bf9000"),
    ("Const_ph", "#c8a536"),
    ("Const_tr", "#d2bb6d"),
    // Copper mine (copper gradient)
    ("Cu mine_fs", "#b45f06"),
    ("Cu mine_md", "#c17328"),
    ("Cu mine_op", "#cd8750"),
    ("Cu mine_ph", "#da9b77"),
    ("Cu mine_pg", "#e6af9e"),
    ("Cu mine_tr", "#f3c3c6"),
    // Forest products (forest green gradient)
    ("Forest_pg", "#3c763d"),
    ("Forest_ph", "#74a874"),
    ("Forest_tr", "#adcbb0"),
    // Iron & steel (grey gradient)
    ("I&S_fs", "#808080"),
    ("I&S_md", "#999999"),
    ("I&S_op", "#b3b3b3"),
    ("I&S_pg", "#cccccc"),
    ("I&S_ph", "#e5e5e5"),
    ("I&S_tr", "#f2f2f2"),
    // Manufacturing (light green gradient)
    ("Manuf_fs", "#b6d7a8"),
    ("Manuf_md", "#c5dfbc"),
    ("Manuf_op", "#d5e8cf"),
    ("Manuf_pg", "#e4f0e3"),
    ("Manuf_ph", "#f3f8f7"),
    ("Manuf_tr", "#ffffff"),
    // Other non-metal (purple gradient)
    ("O non-met_fs", "#674ea7"),
    ("O non-met_md", "#8b7ec1"),
    ("O non-met_pg", "#afaeda"),
    ("O non-met_ph", "#d3cff2"),
    ("O non-met_tr", "#f7f7ff"),
    // Salt (pale teal gradient)
    ("Salt_fs", "#a2c4c9"),
    ("Salt_md", "#bad2d7"),
    ("Salt_ph", "#d3e1e5"),
    ("Salt_tr", "#ebf0f3"),
    // Smelting (orange gradient)
    ("Smelt_fs", "#e69138"),
    ("Smelt_md", "#eaad69"),
    ("Smelt_op", "#efd999"),
    ("Smelt_ph", "#f2e4c3"),
    ("Smelt_tr", "#f7f3ed"),
    // Pulp & paper (green gradient)
    ("p&p_fs", "#6aa84f"),
    ("p&p_md", "#93bc7e"),
    ("p&p_op", "#bad0ad"),
    ("p&p_pg", "#e1e4dc"),
    ("p&p_ph", "#f8f9f7"),
    ("p&p_tr", "#ffffff"),
    // Aluminum (blue gradient)
    ("Alum_fs", "#a4c2f4"),
    ("Alum_md", "#b7d1f7"),
    ("Alum_op", "#cae1fa"),
    ("Alum_ph", "#ddefff"),
    ("Alum_tr", "#f0fcff"),
    // Gold & silver mine (gold gradient)
    ("G&S mine_fs", "#ffd966"),
    ("G&S mine_md", "#ffe391"),
    ("G&S mine_op", "#ffedbd"),
    ("G&S mine_pg", "#fff8e8"),
    ("G&S mine_ph", "#ffffff"),
    ("G&S mine_tr", "#fffdf5"),
    // Iron mine (blue-grey gradient)
    ("I mine_fs", "#6fa8dc"),
    ("I mine_md", "#97bee4"),
    ("I mine_op", "#bfd5ec"),
    ("I mine_pg", "#e7ebf3"),
    ("I mine_ph", "#f3f8fb"),
    ("I mine_tr", "#ffffff"),
    // Other metal (peach gradient)
    ("O metal_fs", "#f6b26b"),
    ("O metal_md", "#f8c693"),
    ("O metal_op", "#f9d8bc"),
    ("O metal_pg", "#faebdc"),
    ("O metal_ph", "#fcfcf5"),
    ("O metal_tr", "#ffffff"),
    // Potash mine (rose gradient)
    ("K mine_fs", "#c27ba0"),
    ("K mine_md", "#d6a4be"),
    ("K mine_ph", "#ebcee0"),
    ("K mine_tr", "#fff7fa"),
    // Transport / building activity codes
    ("Mot", "#555555"),
    ("Nmot", "#888888"),
    ("COth", "#bbbbbb"),
    ("CSH", "#666ee0"),
    ("CWH", "#a64d79"),
    ("ROth", "#999999"),
    ("RSH", "#b7b7b7"),
    ("RWH", "#cccccc"),
    ("Air", "#2b78e4"),
    ("HDV", "#134f5c"),
    ("ICB", "#741b47"),
    ("LDV", "#bf9000"),
    ("MDV", "#f6b26b"),
    ("Off-Road", "#cfe2f3"),
    ("Rail", "#b45f06"),
    ("SB", "#6d9eeb"),
    ("UB", "#38761d"),
    ("Marine", "#1155cc"),
];

/// Fallback fill palette for series absent from every table.
const FALLBACK_PALETTE: [Rgb; 10] = [
    Rgb::new(231, 76, 60),  // red
    Rgb::new(46, 204, 113), // green
    Rgb::new(155, 89, 182), // purple
    Rgb::new(243, 156, 18), // orange
    Rgb::new(26, 188, 156), // teal
    Rgb::new(233, 30, 99),  // pink
    Rgb::new(0, 188, 212),  // cyan
    Rgb::new(255, 87, 34),  // deep orange
    Rgb::new(121, 85, 72),  // brown
    Rgb::new(96, 125, 139), // blue grey
];

/// Series whose fill is light enough that label text defaults to black.
pub const FORCE_BLACK_TEXT: [&str; 2] = ["Jet Fuel", "Elec"];

/// Grouping dimension a chart is colored by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColorDim {
    Carrier,
    Tech,
    Subsector,
}

fn table_for(dim: ColorDim) -> &'static [(&'static str, &'static str)] {
    match dim {
        ColorDim::Carrier => CARRIER_COLORS,
        ColorDim::Tech => TECH_COLORS,
        ColorDim::Subsector => SUBSECTOR_COLORS,
    }
}

/// Table color for a series, or None if it has no entry.
pub fn table_color(dim: ColorDim, series: &str) -> Option<Rgb> {
    table_for(dim)
        .iter()
        .find(|(name, _)| *name == series)
        .and_then(|(_, hex)| Rgb::from_hex(hex))
}

/// Stable hash of a series name. FNV-1a; the std hasher keys are not
/// guaranteed stable across releases.
fn fnv1a(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Deterministic fallback color for an unmapped series.
pub fn fallback_color(series: &str) -> Rgb {
    FALLBACK_PALETTE[(fnv1a(series) % FALLBACK_PALETTE.len() as u64) as usize]
}

/// Fill color for a series: table entry if present, stable fallback otherwise.
pub fn series_color(dim: ColorDim, series: &str) -> Rgb {
    table_color(dim, series).unwrap_or_else(|| fallback_color(series))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_round_trip() {
        let c = Rgb::from_hex("#4f95d9").unwrap();
        assert_eq!((c.r, c.g, c.b), (0x4f, 0x95, 0xd9));
        assert_eq!(c.to_hex(), "#4f95d9");
        assert_eq!(Rgb::from_hex("4f95d9"), None);
        assert_eq!(Rgb::from_hex("#xyzxyz"), None);
    }

    #[test]
    fn known_series_use_table_colors() {
        assert_eq!(
            series_color(ColorDim::Carrier, "NG"),
            Rgb::from_hex("#4f95d9").unwrap()
        );
        assert_eq!(
            series_color(ColorDim::Tech, "Battery EV"),
            Rgb::from_hex("#fffde4").unwrap()
        );
        assert_eq!(
            series_color(ColorDim::Subsector, "Cement_ph"),
            Rgb::from_hex("#dbd890").unwrap()
        );
    }

    #[test]
    fn fallback_is_deterministic_and_from_palette() {
        let a = series_color(ColorDim::Carrier, "Hydrogen");
        let b = series_color(ColorDim::Carrier, "Hydrogen");
        assert_eq!(a, b);
        assert!(FALLBACK_PALETTE.contains(&a));
    }

    #[test]
    fn distinct_unknown_names_usually_differ() {
        let names = ["Hydrogen", "Ammonia", "Solar", "Geothermal"];
        let distinct: std::collections::HashSet<_> =
            names.iter().map(|n| fallback_color(n).to_hex()).collect();
        assert!(distinct.len() > 1);
    }
}
