//! Raw category text → canonical trade category.
//!
//! Static table of insurance-restoration trades with their common spellings
//! and Xactimate-style three-letter codes, extended by config aliases.
//! Unknown labels pass through as their own category; never an error.

use std::collections::{BTreeMap, HashMap};

use crate::label::{normalize_label, tidy};
use crate::model::ParsedLineItem;

/// Canonical category → raw labels that map to it (`normalize_label` form).
/// The canonical name itself always matches and need not be listed.
pub const TAXONOMY: &[(&str, &[&str])] = &[
    ("Roofing", &["roof", "rfg", "roofs", "shingles", "reroof", "re roof", "roof covering"]),
    ("Siding", &["sdg", "side", "vinyl siding", "exterior siding"]),
    ("Gutters", &["gutter", "sfg", "soffit fascia and gutter", "soffit", "fascia", "downspouts"]),
    ("Drywall", &["dry", "sheetrock", "gypsum", "gypsum board", "wallboard"]),
    ("Painting", &["pnt", "paint", "painter", "paint and finish"]),
    ("Flooring", &["flr", "floor", "floors", "fcc", "fcw", "fcv", "fct", "fcs", "carpet", "floor covering", "vinyl flooring", "tile flooring", "hardwood"]),
    ("Framing", &["frm", "frame", "rough carpentry", "rough framing"]),
    ("Finish Carpentry", &["fnc", "trim", "finish carp", "millwork", "baseboard"]),
    ("Insulation", &["ins", "insul"]),
    ("Electrical", &["ele", "elec", "electric", "electrician"]),
    ("Plumbing", &["plm", "plumb", "plumber"]),
    ("HVAC", &["hva", "heating", "heating and cooling", "air conditioning", "mechanical"]),
    ("Windows", &["wdw", "wdv", "wda", "window", "glazing"]),
    ("Doors", &["dor", "door", "exterior door", "interior door"]),
    ("Cabinetry", &["cab", "cabinet", "cabinets", "cabinetry and countertops"]),
    ("Countertops", &["ctr", "countertop", "counter tops", "counters"]),
    ("Demolition", &["dmo", "demo", "tear off", "tearout", "tear out", "removal"]),
    ("Water Mitigation", &["wtr", "water", "mitigation", "water extraction", "drying", "dehumidification"]),
    ("Cleaning", &["cln", "clean", "final cleaning"]),
    ("Debris Removal", &["debris", "dumpster", "haul off", "haul away", "hauling"]),
    ("Masonry", &["msn", "brick", "stone", "stucco"]),
    ("Concrete", &["cnc", "flatwork", "slab"]),
    ("Fencing", &["fen", "fence"]),
    ("Decking", &["dck", "deck", "decks"]),
    ("Contents", &["con", "content", "contents manipulation", "pack out", "packout"]),
    ("Labor", &["lab", "labour", "general labor"]),
    ("Permits and Fees", &["permit", "permits", "fees", "fee", "pmt"]),
    ("General Conditions", &["gc", "supervision", "project management", "temporary", "temp"]),
];

/// Canonical category names in table order.
pub fn canonical_categories() -> Vec<&'static str> {
    TAXONOMY.iter().map(|(name, _)| *name).collect()
}

/// Keys shorter than this never take part in typo matching; three-letter
/// codes are one edit away from each other too often.
const MIN_FUZZY_LEN: usize = 5;

#[derive(Debug, Clone)]
pub struct CategoryNormalizer {
    /// normalized raw label → canonical label
    table: HashMap<String, String>,
    /// table keys in sorted order, for deterministic typo matching
    fuzzy_keys: Vec<String>,
}

impl Default for CategoryNormalizer {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl CategoryNormalizer {
    /// Built-in table plus user aliases. Aliases override built-in entries.
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let mut table = HashMap::new();
        for (canonical, raws) in TAXONOMY {
            table.insert(normalize_label(canonical), canonical.to_string());
            for raw in raws.iter() {
                table.insert(normalize_label(raw), canonical.to_string());
            }
        }
        for (raw, canonical) in aliases {
            let canonical = tidy(canonical);
            table.insert(normalize_label(raw), canonical.clone());
            // An alias target names a category of its own.
            table.entry(normalize_label(&canonical)).or_insert(canonical);
        }

        let mut fuzzy_keys: Vec<String> = table
            .keys()
            .filter(|k| k.chars().count() >= MIN_FUZZY_LEN)
            .cloned()
            .collect();
        fuzzy_keys.sort();

        Self { table, fuzzy_keys }
    }

    /// Canonical label for a known raw label, `None` if nothing matches.
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        let key = normalize_label(raw);
        if key.is_empty() {
            return None;
        }
        if let Some(hit) = self.table.get(&key) {
            return Some(hit);
        }
        if let Some(hit) = singular(&key).and_then(|s| self.table.get(&s)) {
            return Some(hit);
        }
        self.typo_match(&key)
    }

    /// Canonical label for any raw label. Unmatched labels pass through tidied.
    pub fn normalize(&self, raw: &str) -> String {
        match self.lookup(raw) {
            Some(canonical) => canonical.to_string(),
            None => tidy(raw),
        }
    }

    /// Single-edit match against keys of five or more characters. Ambiguous
    /// hits (keys for different categories) match nothing.
    fn typo_match(&self, key: &str) -> Option<&str> {
        if key.chars().count() < MIN_FUZZY_LEN {
            return None;
        }
        let mut found: Option<&str> = None;
        for candidate in &self.fuzzy_keys {
            if strsim::levenshtein(key, candidate) != 1 {
                continue;
            }
            let canonical = self.table.get(candidate).map(|s| s.as_str())?;
            match found {
                None => found = Some(canonical),
                Some(prev) if prev == canonical => {}
                Some(_) => {
                    log::debug!("category '{key}' is one edit from several categories, leaving as is");
                    return None;
                }
            }
        }
        found
    }
}

/// "gutters" → "gutter", "batteries" → "battery". Only the last word changes.
fn singular(key: &str) -> Option<String> {
    if let Some(stem) = key.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    if key.ends_with("ss") {
        return None;
    }
    key.strip_suffix('s').map(|s| s.to_string())
}

/// Distinct canonical categories of `items` in first-seen order.
pub fn get_unique_categories(items: &[ParsedLineItem]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.canonical_category.as_str()) {
            out.push(item.canonical_category.clone());
        }
    }
    out
}
