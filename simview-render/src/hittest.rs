//! Point-containment queries over the SVG tree.
//!
//! Depth-first walk from the document root.  Each node dispatches on a
//! closed [`NodeKind`]; unsupported element kinds short-circuit their
//! branch and contribute no matches.  Only axis-aligned `scale(...)`
//! transforms are honoured — `rotate`/`translate`/anything else is an
//! error, not a silent miss.
//!
//! Containment is boundary inclusive: a point exactly on an edge counts
//! as under the shape.

use simview_core::{Point, SvgElement};

use crate::surface::SurfaceError;

/// Closed set of element kinds the hit-tester understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Svg,
    Group,
    Rect,
    Circle,
    Unsupported,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "svg" => Self::Svg,
            "g" => Self::Group,
            "rect" => Self::Rect,
            "circle" => Self::Circle,
            _ => Self::Unsupported,
        }
    }
}

/// Outcome of testing one node: whether the point is inside, and the
/// point expressed in the coordinate space the node's children see.
struct Containment {
    hit: bool,
    child_point: Point,
}

/// Per-axis scale factors parsed from a `transform` attribute.
///
/// Fails on any transform component other than `scale`.
fn parse_scale(transform: Option<&str>) -> Result<(f64, f64), SurfaceError> {
    let Some(transform) = transform else {
        return Ok((1.0, 1.0));
    };
    let mut scale = (1.0, 1.0);
    for part in transform.split(')') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, args) = part
            .split_once('(')
            .ok_or_else(|| SurfaceError::MalformedTransform(transform.to_string()))?;
        match name.trim() {
            "scale" => {
                let values: Vec<f64> = args
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<f64>()
                            .map_err(|_| SurfaceError::MalformedTransform(transform.to_string()))
                    })
                    .collect::<Result<_, _>>()?;
                scale = match values.as_slice() {
                    [s] => (*s, *s),
                    [sx, sy] => (*sx, *sy),
                    _ => {
                        return Err(SurfaceError::MalformedTransform(transform.to_string()))
                    }
                };
            }
            other => {
                return Err(SurfaceError::NotSupported(format!(
                    "transform component `{other}` (only axis-aligned scale is supported)"
                )));
            }
        }
    }
    Ok(scale)
}

fn missing(node: &SvgElement, attr: &'static str) -> SurfaceError {
    SurfaceError::MissingAttribute {
        tag: node.tag.clone(),
        id: node.id().unwrap_or("<missing id>").to_string(),
        attr,
    }
}

/// `<svg>` containers offset and scale the point into their own space.
///
/// Each axis is only constrained when the corresponding offset attribute
/// is declared; the root of a document always declares all four.
fn test_svg(node: &SvgElement, point: Point) -> Result<Containment, SurfaceError> {
    let (sx, sy) = parse_scale(node.attr("transform"))?;
    let mut local = point;
    let mut hit = true;

    if let Some(x) = node.length("x")? {
        local.x = (local.x - x) / sx;
        hit &= local.x >= 0.0;
        if let Some(width) = node.length("width")? {
            hit &= local.x <= width;
        }
    }
    if let Some(y) = node.length("y")? {
        local.y = (local.y - y) / sy;
        hit &= local.y >= 0.0;
        if let Some(height) = node.length("height")? {
            hit &= local.y <= height;
        }
    }
    Ok(Containment {
        hit,
        child_point: local,
    })
}

/// Groups pass the point through untouched.  A `transform` attribute on a
/// group is out of scope and rejected rather than half-applied.
fn test_group(node: &SvgElement, point: Point) -> Result<Containment, SurfaceError> {
    if node.attr("transform").is_some() {
        return Err(SurfaceError::NotSupported(
            "transform attribute on <g> elements".to_string(),
        ));
    }
    Ok(Containment {
        hit: true,
        child_point: point,
    })
}

fn test_rect(node: &SvgElement, point: Point) -> Result<Containment, SurfaceError> {
    let (sx, sy) = parse_scale(node.attr("transform"))?;
    let x = node.length("x")?.ok_or_else(|| missing(node, "x"))?;
    let y = node.length("y")?.ok_or_else(|| missing(node, "y"))?;
    let width = node.length("width")?.ok_or_else(|| missing(node, "width"))?;
    let height = node
        .length("height")?
        .ok_or_else(|| missing(node, "height"))?;

    let local_x = (point.x - x) / sx;
    let local_y = (point.y - y) / sy;
    let hit = local_x >= 0.0 && local_x <= width && local_y >= 0.0 && local_y <= height;
    // Shapes are leaves: children (if any) see the parent-space point.
    Ok(Containment {
        hit,
        child_point: point,
    })
}

fn test_circle(node: &SvgElement, point: Point) -> Result<Containment, SurfaceError> {
    let (sx, sy) = parse_scale(node.attr("transform"))?;
    let cx = node.length("cx")?.ok_or_else(|| missing(node, "cx"))?;
    let cy = node.length("cy")?.ok_or_else(|| missing(node, "cy"))?;
    let r = node.length("r")?.ok_or_else(|| missing(node, "r"))?;

    let dx = (point.x - cx) / sx;
    let dy = (point.y - cy) / sy;
    let hit = dx * dx + dy * dy <= r * r;
    Ok(Containment {
        hit,
        child_point: point,
    })
}

/// Ids of every supported element whose bounds contain `point`, in
/// root-to-leaf order.  Elements without an `id` still have their
/// children visited; they just contribute nothing to the result.
pub fn elements_under(root: &SvgElement, point: Point) -> Result<Vec<String>, SurfaceError> {
    let mut result = Vec::new();
    visit(root, point, &mut result)?;
    Ok(result)
}

fn visit(node: &SvgElement, point: Point, result: &mut Vec<String>) -> Result<(), SurfaceError> {
    let containment = match NodeKind::from_tag(&node.tag) {
        NodeKind::Svg => test_svg(node, point)?,
        NodeKind::Group => test_group(node, point)?,
        NodeKind::Rect => test_rect(node, point)?,
        NodeKind::Circle => test_circle(node, point)?,
        NodeKind::Unsupported => {
            log::debug!("skipping unsupported element <{}> during hit test", node.tag);
            return Ok(());
        }
    };
    if !containment.hit {
        return Ok(());
    }
    if let Some(id) = node.id() {
        result.push(id.to_string());
    }
    for child in &node.children {
        visit(child, containment.child_point, result)?;
    }
    Ok(())
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use simview_core::SvgDocument;

    fn doc(source: &str) -> SvgDocument {
        SvgDocument::from_str(source).unwrap()
    }

    fn hits(source: &str, x: f64, y: f64) -> Vec<String> {
        elements_under(doc(source).root(), Point::new(x, y)).unwrap()
    }

    const RECT_DOC: &str = r#"
        <svg width="640" height="480">
            <rect id="r1" x="0" y="0" width="100" height="100"/>
        </svg>"#;

    #[test]
    fn test_rect_inside() {
        assert_eq!(hits(RECT_DOC, 50.0, 50.0), vec!["r1"]);
    }

    #[test]
    fn test_rect_outside() {
        assert!(hits(RECT_DOC, 150.0, 150.0).is_empty());
    }

    #[test]
    fn test_rect_boundary_inclusive() {
        assert_eq!(hits(RECT_DOC, 100.0, 100.0), vec!["r1"]);
        assert_eq!(hits(RECT_DOC, 0.0, 0.0), vec!["r1"]);
    }

    #[test]
    fn test_circle_containment() {
        let source = r#"
            <svg width="640" height="480">
                <circle id="c1" cx="50" cy="50" r="40"/>
            </svg>"#;
        assert_eq!(hits(source, 50.0, 50.0), vec!["c1"]);
        // Exactly on the rim.
        assert_eq!(hits(source, 90.0, 50.0), vec!["c1"]);
        assert!(hits(source, 91.0, 50.0).is_empty());
    }

    #[test]
    fn test_group_and_child_root_to_leaf_order() {
        let source = r#"
            <svg width="640" height="480">
                <g id="group1">
                    <rect id="child1" x="0" y="0" width="100" height="100"/>
                </g>
            </svg>"#;
        assert_eq!(hits(source, 50.0, 50.0), vec!["group1", "child1"]);
    }

    #[test]
    fn test_anonymous_group_skipped_but_children_visited() {
        let source = r#"
            <svg width="640" height="480">
                <g>
                    <rect id="child1" x="0" y="0" width="100" height="100"/>
                </g>
            </svg>"#;
        assert_eq!(hits(source, 50.0, 50.0), vec!["child1"]);
    }

    #[test]
    fn test_root_id_is_reported_first() {
        let source = r#"
            <svg id="root" width="640" height="480" x="0" y="0">
                <rect id="r1" x="0" y="0" width="100" height="100"/>
            </svg>"#;
        assert_eq!(hits(source, 50.0, 50.0), vec!["root", "r1"]);
    }

    #[test]
    fn test_nested_svg_offsets_point() {
        let source = r#"
            <svg width="640" height="480">
                <svg id="inner" x="100" y="100" width="200" height="200">
                    <rect id="r1" x="0" y="0" width="50" height="50"/>
                </svg>
            </svg>"#;
        // (120, 120) window point lands at (20, 20) inside the nested svg.
        assert_eq!(hits(source, 120.0, 120.0), vec!["inner", "r1"]);
        // Inside the nested svg but past the rect.
        assert_eq!(hits(source, 180.0, 180.0), vec!["inner"]);
        assert!(hits(source, 50.0, 50.0).is_empty());
    }

    #[test]
    fn test_nested_svg_scale_transform() {
        let source = r#"
            <svg width="640" height="480">
                <svg id="inner" x="0" y="0" width="100" height="100" transform="scale(2)">
                    <rect id="r1" x="0" y="0" width="50" height="50"/>
                </svg>
            </svg>"#;
        // (80, 80) divided by scale 2 → (40, 40), inside the rect.
        assert_eq!(hits(source, 80.0, 80.0), vec!["inner", "r1"]);
        // (120, 120) → (60, 60): inside the svg, outside the rect.
        assert_eq!(hits(source, 120.0, 120.0), vec!["inner"]);
    }

    #[test]
    fn test_unsupported_element_branch_pruned() {
        let source = r#"
            <svg width="640" height="480">
                <path id="p1" d="M 0 0 L 100 100"/>
                <rect id="r1" x="0" y="0" width="100" height="100"/>
            </svg>"#;
        // The path would contain the point but is not a supported kind.
        assert_eq!(hits(source, 50.0, 50.0), vec!["r1"]);
    }

    #[test]
    fn test_rotate_transform_is_rejected() {
        let source = r#"
            <svg width="640" height="480">
                <rect id="r1" x="0" y="0" width="100" height="100" transform="rotate(45)"/>
            </svg>"#;
        let err = elements_under(doc(source).root(), Point::new(50.0, 50.0)).unwrap_err();
        assert!(matches!(err, SurfaceError::NotSupported(_)));
    }

    #[test]
    fn test_group_transform_is_rejected() {
        let source = r#"
            <svg width="640" height="480">
                <g id="g1" transform="scale(2)">
                    <rect id="r1" x="0" y="0" width="100" height="100"/>
                </g>
            </svg>"#;
        let err = elements_under(doc(source).root(), Point::new(50.0, 50.0)).unwrap_err();
        assert!(matches!(err, SurfaceError::NotSupported(_)));
    }

    #[test]
    fn test_rect_missing_geometry_is_an_error() {
        let source = r#"
            <svg width="640" height="480">
                <rect id="r1" x="0" y="0" width="100"/>
            </svg>"#;
        let err = elements_under(doc(source).root(), Point::new(50.0, 50.0)).unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::MissingAttribute { attr: "height", .. }
        ));
    }

    #[test]
    fn test_parse_scale_variants() {
        assert_eq!(parse_scale(None).unwrap(), (1.0, 1.0));
        assert_eq!(parse_scale(Some("scale(2)")).unwrap(), (2.0, 2.0));
        assert_eq!(parse_scale(Some("scale(2, 3)")).unwrap(), (2.0, 3.0));
        assert_eq!(parse_scale(Some("scale(2 3)")).unwrap(), (2.0, 3.0));
        assert!(matches!(
            parse_scale(Some("translate(1, 2)")),
            Err(SurfaceError::NotSupported(_))
        ));
        assert!(matches!(
            parse_scale(Some("matrix(1,0,0,1,0,0)")),
            Err(SurfaceError::NotSupported(_))
        ));
    }

    #[test]
    fn test_parse_scale_rejects_malformed_syntax() {
        assert!(matches!(
            parse_scale(Some("scale 2")),
            Err(SurfaceError::MalformedTransform(_))
        ));
        assert!(matches!(
            parse_scale(Some("scale(two)")),
            Err(SurfaceError::MalformedTransform(_))
        ));
        assert!(matches!(
            parse_scale(Some("scale(1, 2, 3)")),
            Err(SurfaceError::MalformedTransform(_))
        ));
    }
}
