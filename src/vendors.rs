use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

/// Only vendors already tagged as drink outlets get category tags
const DRINKS_TAG: &str = "Drinks";

/// One vendor record. Fields beyond name and tags pass through the rewrite
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorsData {
    pub zones: BTreeMap<String, Zone>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Counters reported after a tagging run
#[derive(Debug, Clone, Copy, Default)]
pub struct TagSummary {
    pub drink_vendors_found: usize,
    pub categories_added: usize,
}

fn add_tag(tags: &mut Vec<String>, tag: &str) -> usize {
    if tags.iter().any(|existing| existing == tag) {
        0
    } else {
        tags.push(tag.to_string());
        1
    }
}

/// Appends drink-category tags to every Drinks vendor based on substring
/// matches on its lower-cased name. The rules are independent predicates,
/// so a vendor can collect several tags; tags already present are never
/// duplicated, which makes repeated runs a no-op.
pub fn apply_drink_categories(data: &mut VendorsData) -> TagSummary {
    let mut summary = TagSummary::default();

    for zone in data.zones.values_mut() {
        for vendor in &mut zone.vendors {
            if !vendor.tags.iter().any(|tag| tag == DRINKS_TAG) {
                continue;
            }
            summary.drink_vendors_found += 1;
            let name = vendor.name.to_lowercase();

            if name.contains("cocktail") || name.contains("spirit") {
                summary.categories_added += add_tag(&mut vendor.tags, "Cocktails");
            }

            if name.contains("beer") || name.contains("guinness") {
                summary.categories_added += add_tag(&mut vendor.tags, "Beer");
            }

            if name.contains("coffee") || name.contains("caffe") {
                summary.categories_added += add_tag(&mut vendor.tags, "Coffee");
            }

            if name.contains("soft drinks") || name.contains("no & low") {
                summary.categories_added += add_tag(&mut vendor.tags, "Non_Alcoholic");
            }

            // General bars that don't fit a specific category
            if name.contains("bar")
                && !name.contains("cocktail")
                && !name.contains("spirit")
                && !name.contains("beer")
                && !name.contains("soft drinks")
            {
                summary.categories_added += add_tag(&mut vendor.tags, "Mixed_Bar");
            }

            if name.contains("wine") {
                summary.categories_added += add_tag(&mut vendor.tags, "Wine");
            }
        }
    }

    summary
}

/// Reads the vendors dataset, applies the category rules, and rewrites the
/// file in place, pretty-printed. Any read, parse, or write failure
/// propagates; this is a supervised one-shot batch job with no recovery.
pub fn categorize_drink_vendors<P: AsRef<Path>>(path: P) -> Result<TagSummary, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(&path)?;
    let mut data: VendorsData = serde_json::from_str(&raw)?;

    let summary = apply_drink_categories(&mut data);

    fs::write(&path, serde_json::to_string_pretty(&data)?)?;
    Ok(summary)
}
