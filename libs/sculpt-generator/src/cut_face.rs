//! # Cross-Section Template Resolution
//!
//! Resolves a part's `cutFace` attribute into a 2D template polygon:
//! either a named built-in, or a template traced from another part's node
//! ring. Tracing starts from a deterministic ring vertex so repeated
//! generations walk the ring in the same order.

use glam::DVec2;
use sculpt_snapshot::{CutFaceTemplate, ParsedSnapshot};
use std::collections::BTreeMap;

/// Direction the trace start point is chosen against.
const REFERENCE_DIRECTION: DVec2 = DVec2::new(-1.0, -1.0);

/// Resolves a cut-face attribute into a template polygon.
///
/// A value naming an existing part traces that part's node ring; anything
/// else (or a trace yielding fewer than three points) falls back to the
/// named built-in template, defaulting to the quad.
pub fn resolve_template(parsed: &ParsedSnapshot, cut_face: Option<&str>) -> Vec<DVec2> {
    let cut_face = cut_face.unwrap_or("");
    let mut template = Vec::new();
    if parsed.parts.contains_key(cut_face) {
        template = trace_part_template(parsed, cut_face);
    }
    if template.len() < 3 {
        let named = CutFaceTemplate::parse(cut_face).unwrap_or(CutFaceTemplate::Quad);
        template = named.points();
    }
    template
}

/// Traces a template from a linked part's nodes and edges.
///
/// Nodes project onto the main profile plane (recentering around the canvas
/// origin, Y up). The walk starts at the endpoint — or, for a closed ring,
/// the node — whose direction from the centroid is closest in angle to the
/// fixed reference direction, then follows neighbor links.
fn trace_part_template(parsed: &ParsedSnapshot, part_id: &str) -> Vec<DVec2> {
    // Node id → (radius, projected position).
    let mut node_map: BTreeMap<String, (f64, DVec2)> = BTreeMap::new();
    for node in parsed.part_nodes(part_id) {
        let projected = DVec2::new(
            node.x - parsed.origin.x,
            parsed.origin.y - node.y,
        );
        node_map.insert(node.id.clone(), (node.radius, projected));
    }
    let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for edge in parsed.part_edges(part_id) {
        if !node_map.contains_key(&edge.from) || !node_map.contains_key(&edge.to) {
            tracing::warn!(edge = edge.id.as_str(), "edge endpoint not found");
            continue;
        }
        links.entry(edge.from.clone()).or_default().push(edge.to.clone());
        links.entry(edge.to.clone()).or_default().push(edge.from.clone());
    }

    // Candidate start points: open-chain endpoints, or every node of a ring.
    let mut candidates: Vec<(String, DVec2)> = links
        .iter()
        .filter(|(_, neighbors)| neighbors.len() == 1)
        .filter_map(|(id, _)| node_map.get(id).map(|(_, p)| (id.clone(), *p)))
        .collect();
    let is_ring = candidates.is_empty();
    if is_ring {
        candidates = node_map
            .iter()
            .map(|(id, (_, p))| (id.clone(), *p))
            .collect();
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let centroid =
        candidates.iter().map(|(_, p)| *p).sum::<DVec2>() / candidates.len() as f64;
    let reference = REFERENCE_DIRECTION.normalize();
    let mut start = candidates[0].0.clone();
    let mut smallest_angle = f64::MAX;
    for (id, position) in &candidates {
        let direction = *position - centroid;
        if direction.length_squared() < f64::EPSILON {
            continue;
        }
        let angle = reference
            .dot(direction.normalize())
            .clamp(-1.0, 1.0)
            .acos();
        if angle < smallest_angle {
            smallest_angle = angle;
            start = id.clone();
        }
    }

    // Walk neighbor-to-neighbor from the start.
    let mut ordered: Vec<(f64, DVec2)> = Vec::new();
    let mut visited: std::collections::BTreeSet<String> = Default::default();
    let mut current = Some(start);
    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            break;
        }
        let Some(&(radius, position)) = node_map.get(&id) else {
            break;
        };
        ordered.push((radius, position));
        if let Some(neighbors) = links.get(&id) {
            current = neighbors
                .iter()
                .find(|n| !visited.contains(*n))
                .cloned();
        }
    }

    template_from_traced_nodes(&ordered, is_ring)
}

/// Converts traced nodes into a normalized template polygon.
///
/// A ring uses the node positions directly; an open chain becomes a band
/// outline, each node contributing an upper and a lower offset point. The
/// result is recentered and scaled into the unit box the built-in
/// templates use.
fn template_from_traced_nodes(nodes: &[(f64, DVec2)], is_ring: bool) -> Vec<DVec2> {
    if nodes.len() < 2 {
        return Vec::new();
    }
    let mut points: Vec<DVec2> = if is_ring {
        nodes.iter().map(|(_, p)| *p).collect()
    } else {
        let mut outline: Vec<DVec2> =
            nodes.iter().map(|(r, p)| DVec2::new(p.x, p.y + r)).collect();
        outline.extend(nodes.iter().rev().map(|(r, p)| DVec2::new(p.x, p.y - r)));
        outline
    };
    if points.len() < 3 {
        return Vec::new();
    }

    let centroid = points.iter().copied().sum::<DVec2>() / points.len() as f64;
    let mut largest = 0.0_f64;
    for p in &points {
        largest = largest.max((*p - centroid).abs().max_element());
    }
    if largest < f64::EPSILON {
        return Vec::new();
    }
    for p in &mut points {
        *p = (*p - centroid) / largest;
    }

    // Keep the winding counter-clockwise like the built-in templates.
    let mut doubled_area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        doubled_area += a.x * b.y - b.x * a.y;
    }
    if doubled_area < 0.0 {
        points.reverse();
    }
    points
}
