//! # Typed Snapshot Records
//!
//! The strongly-typed view of a snapshot, built immediately after ingestion.
//! String attributes are parsed once here; the engine never touches the raw
//! maps again. Every recognized key is documented on its field together with
//! the default used when the key is absent or malformed.

use crate::color::Color;
use crate::combine_mode::{CombineMode, PartBase, PartTarget};
use crate::snapshot::{attribute, is_true_value, AttributeMap, Snapshot, ROOT_COMPONENT_ID};
use glam::DVec3;
use std::collections::BTreeMap;

fn parse_f64(attrs: &AttributeMap, key: &str, default: f64) -> f64 {
    let text = attribute(attrs, key);
    if text.is_empty() {
        return default;
    }
    text.parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = text, "malformed numeric attribute");
        default
    })
}

fn parse_f32(attrs: &AttributeMap, key: &str, default: f32) -> f32 {
    parse_f64(attrs, key, f64::from(default)) as f32
}

fn parse_flag(attrs: &AttributeMap, key: &str) -> bool {
    is_true_value(attribute(attrs, key))
}

fn non_empty(attrs: &AttributeMap, key: &str) -> Option<String> {
    let text = attribute(attrs, key);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// A skeletal part: a chain of nodes swept with a cross-section template.
#[derive(Debug, Clone)]
pub struct PartRecord {
    /// The part id.
    pub id: String,
    /// `disabled` (default false): the part builds a preview but never joins
    /// the combined body.
    pub disabled: bool,
    /// `xMirrored` (default false): a mirror twin is synthesized during
    /// preprocessing.
    pub x_mirrored: bool,
    /// `subdived` (default false): stroke subdivision pass-through.
    pub subdived: bool,
    /// `rounded` (default false): rounded stroke ends pass-through.
    pub rounded: bool,
    /// `chamfered` (default false): the cross-section corners are chamfered.
    pub chamfered: bool,
    /// `smooth` (default false): stroke smoothing pass-through.
    pub smooth: bool,
    /// `countershaded` (default false): texture-layer hint carried on object
    /// nodes for downstream consumers.
    pub countershaded: bool,
    /// `deformUnified` (default false): deform pass-through.
    pub deform_unified: bool,
    /// `target` (default `Model`).
    pub target: PartTarget,
    /// `base` (default `Xyz`).
    pub base: PartBase,
    /// `color` as `#RRGGBB`/`#AARRGGBB` (default: engine default color).
    pub color: Option<Color>,
    /// `colorSolubility` (default 0).
    pub color_solubility: f32,
    /// `metallic` (default 0).
    pub metalness: f32,
    /// `roughness` (default 1).
    pub roughness: f32,
    /// `deformThickness` (default 1).
    pub deform_thickness: f64,
    /// `deformWidth` (default 1).
    pub deform_width: f64,
    /// `hollowThickness` (default 0).
    pub hollow_thickness: f64,
    /// `cutRotation` in degrees (default 0).
    pub cut_rotation: f64,
    /// `cutFace`: a built-in template name or a linked part id.
    pub cut_face: Option<String>,
    /// `fillMesh`: id of an externally provided fill-mesh snapshot.
    pub fill_mesh: Option<String>,
    /// `__dirty` (default false): set by the document layer on edit.
    pub dirty: bool,
    /// `__mirrorFromPartId`: source part of a synthesized mirror twin.
    pub mirror_from: Option<String>,
    /// `__mirroredByPartId`: mirror twin synthesized from this part.
    pub mirrored_by: Option<String>,
}

impl PartRecord {
    /// Parses one part entity.
    pub fn parse(id: &str, attrs: &AttributeMap) -> Self {
        Self {
            id: id.to_string(),
            disabled: parse_flag(attrs, "disabled"),
            x_mirrored: parse_flag(attrs, "xMirrored"),
            subdived: parse_flag(attrs, "subdived"),
            rounded: parse_flag(attrs, "rounded"),
            chamfered: parse_flag(attrs, "chamfered"),
            smooth: parse_flag(attrs, "smooth"),
            countershaded: parse_flag(attrs, "countershaded"),
            deform_unified: parse_flag(attrs, "deformUnified"),
            target: PartTarget::parse(attribute(attrs, "target")),
            base: PartBase::parse(attribute(attrs, "base")),
            color: non_empty(attrs, "color").and_then(|text| Color::parse(&text)),
            color_solubility: parse_f32(attrs, "colorSolubility", 0.0),
            metalness: parse_f32(attrs, "metallic", 0.0),
            roughness: parse_f32(attrs, "roughness", 1.0),
            deform_thickness: parse_f64(attrs, "deformThickness", 1.0),
            deform_width: parse_f64(attrs, "deformWidth", 1.0),
            hollow_thickness: parse_f64(attrs, "hollowThickness", 0.0),
            cut_rotation: parse_f64(attrs, "cutRotation", 0.0),
            cut_face: non_empty(attrs, "cutFace"),
            fill_mesh: non_empty(attrs, "fillMesh"),
            dirty: parse_flag(attrs, "__dirty"),
            mirror_from: non_empty(attrs, "__mirrorFromPartId"),
            mirrored_by: non_empty(attrs, "__mirroredByPartId"),
        }
    }
}

/// A skeleton node: a radius-tagged 3D position on a part.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// The node id.
    pub id: String,
    /// `partId`: owning part.
    pub part_id: String,
    /// `radius` (default 0).
    pub radius: f64,
    /// `x`/`y`/`z` raw document coordinates (default 0); the engine recenters
    /// them around the canvas origin.
    pub x: f64,
    /// See [`NodeRecord::x`].
    pub y: f64,
    /// See [`NodeRecord::x`].
    pub z: f64,
    /// `cutFace`: per-node cross-section override.
    pub cut_face: Option<String>,
    /// `cutRotation`: per-node rotation override, only meaningful alongside
    /// a per-node `cutFace`.
    pub cut_rotation: Option<f64>,
}

impl NodeRecord {
    /// Parses one node entity.
    pub fn parse(id: &str, attrs: &AttributeMap) -> Self {
        let cut_face = non_empty(attrs, "cutFace");
        let cut_rotation = if cut_face.is_some() {
            Some(parse_f64(attrs, "cutRotation", 0.0))
        } else {
            None
        };
        Self {
            id: id.to_string(),
            part_id: attribute(attrs, "partId").to_string(),
            radius: parse_f64(attrs, "radius", 0.0),
            x: parse_f64(attrs, "x", 0.0),
            y: parse_f64(attrs, "y", 0.0),
            z: parse_f64(attrs, "z", 0.0),
            cut_face,
            cut_rotation,
        }
    }
}

/// A skeleton edge joining two nodes of one part.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    /// The edge id.
    pub id: String,
    /// `partId`: owning part.
    pub part_id: String,
    /// `from` node id.
    pub from: String,
    /// `to` node id.
    pub to: String,
}

impl EdgeRecord {
    /// Parses one edge entity.
    pub fn parse(id: &str, attrs: &AttributeMap) -> Self {
        Self {
            id: id.to_string(),
            part_id: attribute(attrs, "partId").to_string(),
            from: attribute(attrs, "from").to_string(),
            to: attribute(attrs, "to").to_string(),
        }
    }
}

/// A component: either a link to one part or a group of child components.
#[derive(Debug, Clone)]
pub struct ComponentRecord {
    /// The component id ([`ROOT_COMPONENT_ID`] for the root).
    pub id: String,
    /// `linkData` when `linkDataType == "partId"`: the linked part.
    pub link_part: Option<String>,
    /// `children`: comma-joined child component ids, in document order.
    pub children: Vec<String>,
    /// `combineMode` (default `Normal`); the legacy `inverse` flag maps to
    /// `Inversion`.
    pub combine_mode: CombineMode,
    /// `__dirty` (default false).
    pub dirty: bool,
}

impl ComponentRecord {
    /// Parses one component entity.
    pub fn parse(id: &str, attrs: &AttributeMap) -> Self {
        let link_part = if attribute(attrs, "linkDataType") == "partId" {
            non_empty(attrs, "linkData")
        } else {
            None
        };
        let mut combine_mode = CombineMode::parse(attribute(attrs, "combineMode"));
        if combine_mode == CombineMode::Normal && parse_flag(attrs, "inverse") {
            combine_mode = CombineMode::Inversion;
        }
        let children = attribute(attrs, "children")
            .split(',')
            .filter(|child| !child.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            id: id.to_string(),
            link_part,
            children,
            combine_mode,
            dirty: parse_flag(attrs, "__dirty"),
        }
    }
}

/// The fully-typed snapshot the engine works against.
///
/// Built once per generation from a [`Snapshot`]; includes the part→node and
/// part→edge indexes every later stage needs.
#[derive(Debug, Clone, Default)]
pub struct ParsedSnapshot {
    /// Canvas profile origin (`originX`, `originY`, `originZ`).
    pub origin: DVec3,
    /// Typed parts by id.
    pub parts: BTreeMap<String, PartRecord>,
    /// Typed nodes by id.
    pub nodes: BTreeMap<String, NodeRecord>,
    /// Typed edges by id.
    pub edges: BTreeMap<String, EdgeRecord>,
    /// Typed components by id, the root included under
    /// [`ROOT_COMPONENT_ID`].
    pub components: BTreeMap<String, ComponentRecord>,
    /// Node ids per part, in id order.
    pub part_node_ids: BTreeMap<String, Vec<String>>,
    /// Edge ids per part, in id order.
    pub part_edge_ids: BTreeMap<String, Vec<String>>,
}

impl ParsedSnapshot {
    /// Parses a snapshot into typed records and indexes.
    pub fn parse(snapshot: &Snapshot) -> Self {
        let mut parsed = Self {
            origin: DVec3::new(
                parse_f64(&snapshot.canvas, "originX", 0.0),
                parse_f64(&snapshot.canvas, "originY", 0.0),
                parse_f64(&snapshot.canvas, "originZ", 0.0),
            ),
            ..Self::default()
        };
        for (id, attrs) in &snapshot.parts {
            parsed.parts.insert(id.clone(), PartRecord::parse(id, attrs));
        }
        for (id, attrs) in &snapshot.nodes {
            let record = NodeRecord::parse(id, attrs);
            if record.part_id.is_empty() {
                tracing::warn!(node = id.as_str(), "node without partId skipped");
                continue;
            }
            parsed
                .part_node_ids
                .entry(record.part_id.clone())
                .or_default()
                .push(id.clone());
            parsed.nodes.insert(id.clone(), record);
        }
        for (id, attrs) in &snapshot.edges {
            let record = EdgeRecord::parse(id, attrs);
            if record.part_id.is_empty() {
                tracing::warn!(edge = id.as_str(), "edge without partId skipped");
                continue;
            }
            parsed
                .part_edge_ids
                .entry(record.part_id.clone())
                .or_default()
                .push(id.clone());
            parsed.edges.insert(id.clone(), record);
        }
        for (id, attrs) in &snapshot.components {
            parsed
                .components
                .insert(id.clone(), ComponentRecord::parse(id, attrs));
        }
        parsed.components.insert(
            ROOT_COMPONENT_ID.to_string(),
            ComponentRecord::parse(ROOT_COMPONENT_ID, &snapshot.root_component),
        );
        parsed
    }

    /// Looks up a component record.
    pub fn component(&self, component_id: &str) -> Option<&ComponentRecord> {
        self.components.get(component_id)
    }

    /// Looks up a part record.
    pub fn part(&self, part_id: &str) -> Option<&PartRecord> {
        self.parts.get(part_id)
    }

    /// Returns the nodes of a part, in id order.
    pub fn part_nodes(&self, part_id: &str) -> Vec<&NodeRecord> {
        self.part_node_ids
            .get(part_id)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Returns the edges of a part, in id order.
    pub fn part_edges(&self, part_id: &str) -> Vec<&EdgeRecord> {
        self.part_edge_ids
            .get(part_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_part_record_defaults() {
        let record = PartRecord::parse("p1", &AttributeMap::new());
        assert!(!record.disabled);
        assert_eq!(record.target, PartTarget::Model);
        assert_eq!(record.roughness, 1.0);
        assert_eq!(record.deform_thickness, 1.0);
        assert!(record.cut_face.is_none());
        assert!(!record.dirty);
    }

    #[test]
    fn test_part_record_parses_attributes() {
        let record = PartRecord::parse(
            "p1",
            &attrs(&[
                ("disabled", "true"),
                ("target", "CutFace"),
                ("cutRotation", "45"),
                ("color", "#ff0000"),
                ("__dirty", "true"),
            ]),
        );
        assert!(record.disabled);
        assert_eq!(record.target, PartTarget::CutFace);
        assert_eq!(record.cut_rotation, 45.0);
        assert_eq!(record.color.unwrap().r, 1.0);
        assert!(record.dirty);
    }

    #[test]
    fn test_malformed_number_falls_back_to_default() {
        let record = PartRecord::parse("p1", &attrs(&[("roughness", "abc")]));
        assert_eq!(record.roughness, 1.0);
    }

    #[test]
    fn test_component_record_legacy_inverse_flag() {
        let record = ComponentRecord::parse("c1", &attrs(&[("inverse", "true")]));
        assert_eq!(record.combine_mode, CombineMode::Inversion);
    }

    #[test]
    fn test_component_record_children_order() {
        let record =
            ComponentRecord::parse("c1", &attrs(&[("children", "b,,a,c")]));
        assert_eq!(record.children, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_parsed_snapshot_indexes() {
        let mut snapshot = Snapshot::default();
        snapshot
            .parts
            .insert("p1".to_string(), AttributeMap::new());
        snapshot.nodes.insert(
            "n1".to_string(),
            attrs(&[("partId", "p1"), ("radius", "0.5"), ("x", "1")]),
        );
        snapshot.nodes.insert(
            "n2".to_string(),
            attrs(&[("partId", "p1"), ("radius", "0.5"), ("x", "2")]),
        );
        snapshot.edges.insert(
            "e1".to_string(),
            attrs(&[("partId", "p1"), ("from", "n1"), ("to", "n2")]),
        );
        // A node without a part reference is skipped from the indexes.
        snapshot
            .nodes
            .insert("orphan".to_string(), AttributeMap::new());

        let parsed = ParsedSnapshot::parse(&snapshot);
        assert_eq!(parsed.part_nodes("p1").len(), 2);
        assert_eq!(parsed.part_edges("p1").len(), 1);
        assert!(parsed.nodes.get("orphan").is_none());
        assert!(parsed.component(ROOT_COMPONENT_ID).is_some());
    }
}
