//! Static code→name tables for energy-model output.
//! Model exports use short technical codes; the charts display full names.

/// Longest label drawn before ellipsis abbreviation kicks in.
pub const MAX_LABEL_LEN: usize = 20;

/// Carrier short code → display name.
pub fn carrier_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "d" => "Diesel",
        "db" => "Biodiesel",
        "dr" => "R-Diesel",
        "et" => "Ethanol",
        "j" => "Jet Fuel",
        "p" => "Gasoline",
        "e" => "Elec",
        "hfo" => "HFO",
        "lfo" => "LFO",
        "ng" => "NG",
        "pro" => "Prop",
        "st" => "Steam",
        "c" => "Coal",
        "pl" => "Plastics",
        "w" => "Wood",
        _ => return None,
    };
    Some(name)
}

/// Carrier+technology code → display name.
pub fn tech_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "d_ice" => "Diesel ICE",
        "db_ice" => "Biodiesel ICE",
        "dr_ice" => "Renewable Diesel ICE",
        "et_ice" => "Ethanol ICE",
        "j_ice" => "Jet ICE",
        "p_ice" => "Gasoline ICE",
        "e_resht" => "Electric Resistive Heat",
        "hfo_boil" => "HFO Boiler",
        "lfo_boil" => "LFO Boiler",
        "ng_mef" => "NG Mech. Furnace",
        "pro_mef" => "Prop Mech. Furnace",
        "st_HtXch" => "Steam Exchanger",
        "e_othbldg" => "Elec. Other Bldg.",
        "hfo_othbldg" => "HFO Other Bldg.",
        "lfo_othbldg" => "LFO Other Bldg.",
        "ng_cook" => "NG Cooking",
        "pro_cook" => "Prop Cooking",
        "st_othbldg" => "Steam Other Bldg.",
        "ng_boil" => "NG Boiler",
        "pro_boil" => "Prop Boiler",
        "e_hwt" => "Elec. Hot Water",
        "hfo_hwt" => "HFO Hot Water",
        "lfo_hwt" => "LFO Hot Water",
        "ng_hwt" => "NG Hot Water",
        "pro_hwt" => "Prop Hot Water",
        "st_hwt" => "Steam Hot Water",
        "e_fs" => "Elec. Facility Support",
        "e_gridmd" => "Elec. Grid Drive",
        "ng_icemd" => "NG Engine Drive",
        "e_op" => "Elec. Other Processes",
        "c_ph" => "Coal Proc. Heat",
        "e_ph" => "Elec. Proc. Heat",
        "ng_ph" => "NG Proc. Heat",
        "pl_ph" => "Plastics Proc. Heat",
        "st_ph" => "Steam Proc. Heat",
        "d_icemd" => "Diesel Engine Drive",
        "d_icepg" => "Diesel Power Gen",
        "d_ph" => "Diesel Proc. Heat",
        "hfo_ph" => "HFO Proc. Heat",
        "ng_icepg" => "NG Power Gen",
        "hfo_icepg" => "HFO Power Gen",
        "w_ph" => "Wood Proc. Heat",
        "e_bev" => "Battery EV",
        "lfo_cook" => "LFO Cooking",
        "w_cook" => "Wood Cooking",
        "e_ashp" => "Air-Source HP",
        "lfo_hef" => "LFO HE Furnace",
        "lfo_mef" => "LFO Mech. Furnace",
        "lfo_nef" => "LFO Non-Eff. Furnace",
        "ng_hef" => "NG HE Furnace",
        "ng_nef" => "NG Non-Eff. Furnace",
        "w_stove" => "Wood Stove",
        "w_hwt" => "Wood Hot Water",
        "ng_ice" => "NG ICE",
        "pro_ice" => "Prop ICE",
        "hfo_ice" => "HFO ICE",
        "st_htXch" => "Steam Heat Exch.",
        _ => return None,
    };
    Some(name)
}

/// Province short code → display name.
pub fn province_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "ab" => "Alberta",
        "qc" => "Quebec",
        "sk" => "Saskatchewan",
        "atl" => "Atlantic Provinces",
        "bct" => "British-Columbia",
        "on" => "Ontario",
        "mb" => "Manitoba",
        _ => return None,
    };
    Some(name)
}

/// Carriers counted by the decarbonisation indicator.
pub const FOSSIL_CARRIERS: [&str; 10] = [
    "Coal", "HFO", "LFO", "Diesel", "R-Diesel", "Gasoline", "Jet Fuel", "Prop", "NG", "Plastics",
];

/// Canonical carrier stacking order: fossil & petrochemical at the bottom,
/// renewables and electricity on top.
pub const CARRIER_STACK_ORDER: [&str; 15] = [
    "Coal",
    "Plastics",
    "HFO",
    "LFO",
    "Diesel",
    "Gasoline",
    "Jet Fuel",
    "Prop",
    "NG",
    "Steam",
    "Biodiesel",
    "R-Diesel",
    "Ethanol",
    "Wood",
    "Elec",
];

/// Sort a set of series names into the canonical stack order. Names without
/// a canonical position keep their relative order after the known ones.
pub fn stack_sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort_by_key(|n| {
        CARRIER_STACK_ORDER
            .iter()
            .position(|s| s == n)
            .unwrap_or(CARRIER_STACK_ORDER.len())
    });
    names
}

pub fn is_fossil(series: &str) -> bool {
    FOSSIL_CARRIERS.contains(&series)
}

/// Shorten a label to `max_len` characters, ellipsis included.
pub fn abbreviate(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        return label.to_string();
    }
    let head: String = label.chars().take(max_len.saturating_sub(1)).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(carrier_name("ng"), Some("NG"));
        assert_eq!(carrier_name("e"), Some("Elec"));
        assert_eq!(tech_name("d_ice"), Some("Diesel ICE"));
        assert_eq!(province_name("qc"), Some("Quebec"));
    }

    #[test]
    fn unknown_codes_are_none() {
        assert_eq!(carrier_name("h2"), None);
        assert_eq!(tech_name(""), None);
    }

    #[test]
    fn stack_sort_puts_fossils_first_and_elec_last() {
        let sorted = stack_sorted(vec![
            "Elec".into(),
            "Coal".into(),
            "NG".into(),
            "Hydrogen".into(),
        ]);
        assert_eq!(sorted, vec!["Coal", "NG", "Elec", "Hydrogen"]);
    }

    #[test]
    fn abbreviate_keeps_short_labels_and_trims_long_ones() {
        assert_eq!(abbreviate("Diesel", 8), "Diesel");
        assert_eq!(abbreviate("Renewable Diesel ICE", 8), "Renewab…");
        assert_eq!(abbreviate("Renewable Diesel ICE", 8).chars().count(), 8);
    }
}
