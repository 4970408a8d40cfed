//! Data model for physical graph templates.
//!
//! Only the slice of the wire format this layer actually touches is modeled:
//! drop identity, label, category and layout position. Everything else in the
//! transported JSON is opaque to the viewer and passes through untouched when
//! exported (the JSON export downloads the service's response body verbatim).

use serde::{Deserialize, Serialize};

/// Category of a drop, used for canvas coloring only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DropCategory {
    /// A data drop (file, memory block, ...).
    Data,
    /// An application drop (bash, python, ...).
    Application,
    /// A long-lived service drop.
    Service,
}

/// A single drop in a physical graph template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropNode {
    /// Object identifier, unique within the template.
    pub oid: String,
    /// Human-readable label shown on the canvas.
    pub name: String,
    /// Drop category.
    pub category: DropCategory,
    /// Layout position of the node center in world units.
    #[serde(default)]
    pub position: (f32, f32),
}

/// A directed link between two drops, identified by their oids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropLink {
    /// Oid of the source drop.
    pub from: String,
    /// Oid of the target drop.
    pub to: String,
}

/// A named physical graph template as displayed by the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalGraphTemplate {
    /// Template name; also the filename base for every export.
    pub name: String,
    /// Drops in the template.
    pub drops: Vec<DropNode>,
    /// Links between drops.
    pub links: Vec<DropLink>,
}

impl PhysicalGraphTemplate {
    /// Parses a template from the JSON body returned by the graph service.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the template to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Looks up a drop by its oid.
    pub fn drop_by_oid(&self, oid: &str) -> Option<&DropNode> {
        self.drops.iter().find(|d| d.oid == oid)
    }

    /// Axis-aligned bounding box of all node centers, or `None` for an empty
    /// template.
    pub fn bounds(&self) -> Option<((f32, f32), (f32, f32))> {
        let mut drops = self.drops.iter();
        let first = drops.next()?;
        let (mut min, mut max) = (first.position, first.position);
        for d in drops {
            min.0 = min.0.min(d.position.0);
            min.1 = min.1.min(d.position.1);
            max.0 = max.0.max(d.position.0);
            max.1 = max.1.max(d.position.1);
        }
        Some((min, max))
    }

    /// A small built-in template shown at startup so the canvas is never
    /// empty before the first service load.
    pub fn sample() -> Self {
        let node = |oid: &str, name: &str, category, position| DropNode {
            oid: oid.to_owned(),
            name: name.to_owned(),
            category,
            position,
        };
        let link = |from: &str, to: &str| DropLink {
            from: from.to_owned(),
            to: to.to_owned(),
        };
        Self {
            name: "example_pipeline.graph".to_owned(),
            drops: vec![
                node("1_0", "input.ms", DropCategory::Data, (0.0, 0.0)),
                node("2_0", "split", DropCategory::Application, (180.0, 0.0)),
                node("3_0", "channel_0", DropCategory::Data, (360.0, -70.0)),
                node("3_1", "channel_1", DropCategory::Data, (360.0, 70.0)),
                node("4_0", "clean", DropCategory::Application, (540.0, 0.0)),
                node("5_0", "image.fits", DropCategory::Data, (720.0, 0.0)),
            ],
            links: vec![
                link("1_0", "2_0"),
                link("2_0", "3_0"),
                link("2_0", "3_1"),
                link("3_0", "4_0"),
                link("3_1", "4_0"),
                link("4_0", "5_0"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_json_round_trip_keeps_drops_and_links() {
        let template = PhysicalGraphTemplate::sample();
        let json = template.to_json().unwrap();
        let parsed = PhysicalGraphTemplate::from_json(&json).unwrap();
        assert_eq!(parsed.name, template.name);
        assert_eq!(parsed.drops.len(), template.drops.len());
        assert_eq!(parsed.links.len(), template.links.len());
        assert_eq!(parsed.drop_by_oid("4_0").unwrap().name, "clean");
    }

    #[test]
    fn bounds_cover_all_node_centers() {
        let template = PhysicalGraphTemplate::sample();
        let ((min_x, min_y), (max_x, max_y)) = template.bounds().unwrap();
        assert_eq!(min_x, 0.0);
        assert_eq!(min_y, -70.0);
        assert_eq!(max_x, 720.0);
        assert_eq!(max_y, 70.0);
    }

    #[test]
    fn bounds_of_empty_template_is_none() {
        assert!(PhysicalGraphTemplate::default().bounds().is_none());
    }
}
