//! Tile-provider catalog.
//!
//! A catalog is an ordered list of tile styles; exactly one entry is active
//! at any time, addressed by index. The catalog is configuration data handed
//! to the controller, not code.

use crate::geo::TileCoord;

/// Subdomains rotated into `{s}` template slots
const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Marker label tone that reads against a style's base colors. Dark
/// basemaps need light labels and vice versa; this is a fixed attribute of
/// each catalog entry, never computed from tile pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTone {
    Dark,
    Light,
}

/// Descriptor for one raster tile provider
#[derive(Debug, Clone, PartialEq)]
pub struct TileStyle {
    pub name: String,
    pub url_template: String,
    pub attribution: String,
    pub label_tone: LabelTone,
    pub max_zoom: u8,
}

impl TileStyle {
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        attribution: impl Into<String>,
        label_tone: LabelTone,
    ) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            attribution: attribution.into(),
            label_tone,
            max_zoom: 19,
        }
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Expand the URL template for the requested tile coordinate, filling
    /// `{z}`, `{x}`, `{y}` and rotating `{s}` across subdomains.
    pub fn url_for(&self, coord: TileCoord) -> String {
        let sub = SUBDOMAINS[((coord.x + coord.y) % SUBDOMAINS.len() as u32) as usize];
        self.url_template
            .replace("{s}", sub)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Ordered, fixed set of tile styles
#[derive(Debug, Clone, Default)]
pub struct StyleCatalog {
    styles: Vec<TileStyle>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<TileStyle>) -> Self {
        Self { styles }
    }

    /// The stock catalog: OpenStreetMap plus the Thunderforest styles of the
    /// original deployment. Thunderforest entries are only included when an
    /// API key is supplied; the key is substituted at construction so the
    /// templates handed out are complete.
    pub fn default_catalog(thunderforest_key: Option<&str>) -> Self {
        let mut styles = vec![TileStyle::new(
            "OpenStreetMap",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            "© OpenStreetMap contributors",
            LabelTone::Dark,
        )];

        if let Some(key) = thunderforest_key {
            let tf = |name: &str, slug: &str, tone: LabelTone| {
                TileStyle::new(
                    name,
                    format!(
                        "https://tile.thunderforest.com/{}/{{z}}/{{x}}/{{y}}.png?apikey={}",
                        slug, key
                    ),
                    "Maps © Thunderforest, Data © OpenStreetMap contributors",
                    tone,
                )
                .with_max_zoom(22)
            };
            styles.push(tf("OpenCycleMap", "cycle", LabelTone::Dark));
            styles.push(tf("Transport", "transport", LabelTone::Dark));
            styles.push(tf("Landscape", "landscape", LabelTone::Dark));
            styles.push(tf("Transport Dark", "transport-dark", LabelTone::Light));
        }

        Self { styles }
    }

    pub fn get(&self, index: usize) -> Option<&TileStyle> {
        self.styles.get(index)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Clamp a (possibly restored, possibly stale) index into range. Out of
    /// range falls back to the first entry.
    pub fn clamp(&self, index: usize) -> usize {
        if index < self.styles.len() {
            index
        } else {
            0
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileStyle> {
        self.styles.iter()
    }
}
