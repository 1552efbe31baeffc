//! Place name to GEOID lookup for one layer

use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{GeoReference, Layer};

/// Maps place names of one layer to their GEOIDs
#[derive(Debug, Clone, Default)]
pub struct GeographyMap {
    layer: String,
    geoids: FxHashMap<String, String>,
}

impl GeographyMap {
    /// Build the map for `layer` from the full GEOID table
    ///
    /// Entries tagged with another layer are ignored. `name_suffix` is cut
    /// from each name before keying, which turns "Outagamie County, WI" into
    /// "Outagamie"; pass an empty suffix to key by the name as published.
    /// GEOIDs are unique within the layer: a repeated GEOID or place name
    /// keeps its first entry.
    #[must_use]
    pub fn for_layer(entries: &[GeoReference], layer: Layer, name_suffix: &str) -> Self {
        let tag = layer.tag();
        let mut geoids = FxHashMap::default();
        let mut seen_geoids = FxHashSet::default();
        let mut skipped = 0usize;

        for entry in entries.iter().filter(|e| e.layer == tag) {
            let name = strip_suffix(&entry.name, name_suffix);
            if !seen_geoids.insert(entry.geoid.clone()) {
                skipped += 1;
                debug!("Duplicate GEOID {} in layer {tag}, skipping {name:?}", entry.geoid);
                continue;
            }
            if geoids.contains_key(&name) {
                skipped += 1;
                debug!("Duplicate place name {name:?} in layer {tag}, keeping first GEOID");
                continue;
            }
            geoids.insert(name, entry.geoid.clone());
        }

        if skipped > 0 {
            warn!("Skipped {skipped} duplicate GEOID entries for layer {tag}");
        }
        info!("{tag} GEOID entries count: {}", geoids.len());

        Self {
            layer: tag.to_string(),
            geoids,
        }
    }

    /// GEOID for a place name
    #[must_use]
    pub fn geoid_for(&self, name: &str) -> Option<&str> {
        self.geoids.get(name).map(String::as_str)
    }

    /// Place names known to this layer
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.geoids.keys().map(String::as_str)
    }

    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.geoids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geoids.is_empty()
    }
}

fn strip_suffix(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return name.trim().to_string();
    }
    name.split(suffix).next().unwrap_or(name).trim().to_string()
}
