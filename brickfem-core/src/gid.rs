//! GiD `.msh` import and export.
//!
//! A file holds one or more `MESH` sections:
//!
//! ```text
//! MESH dimension 3 ElemType Tetrahedra Nnode 4
//! Coordinates
//!     1   0.0 0.0 0.0
//!     ...
//! end coordinates
//! Elements
//!     1   1 2 3 4   [material]
//!     ...
//! end elements
//! ```
//!
//! Node ids are arbitrary positive integers shared by all sections. Sections
//! whose element type is not a 4- or 10-node tetrahedron are skipped.

use crate::error::{Error, Result};
use crate::mesh::{ElementType, Mesh};
use crate::types::Point3;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    Header,
    Coordinates,
    Elements,
}

struct Section {
    element_type: Option<ElementType>,
}

/// Parse the content of a GiD mesh file.
pub fn parse_gid(content: &str) -> Result<Mesh> {
    let mut point_ids: HashMap<u64, usize> = HashMap::new();
    let mut points: Vec<Point3> = Vec::new();
    // (line, type, raw node ids)
    let mut raw_convexes: Vec<(usize, ElementType, Vec<u64>)> = Vec::new();

    let mut section: Option<Section> = None;
    let mut block = Block::Header;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw_line.find('#') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();

        match block {
            Block::Coordinates if lower.starts_with("end") => {
                block = Block::Header;
            }
            Block::Elements if lower.starts_with("end") => {
                block = Block::Header;
            }
            Block::Coordinates => {
                let (id, coords) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
                let id = match id.parse::<u64>() {
                    Ok(id) if id >= 1 => id,
                    _ => return Err(import_error(line_no, "node ids must be positive integers")),
                };
                let fields = parse_numbers::<f64>(coords, line_no)?;
                if !(2..=3).contains(&fields.len()) {
                    return Err(import_error(line_no, "coordinate line needs an id and 2 or 3 values"));
                }
                let z = fields.get(2).copied().unwrap_or(0.0);
                let point = Point3::new(fields[0], fields[1], z);
                if point_ids.insert(id, points.len()).is_some() {
                    return Err(import_error(line_no, &format!("duplicate node id {}", id)));
                }
                points.push(point);
            }
            Block::Elements => {
                let Some(Section { element_type }) = &section else {
                    return Err(import_error(line_no, "elements outside of a MESH section"));
                };
                let Some(element_type) = *element_type else {
                    continue;
                };
                let fields = parse_numbers::<u64>(line, line_no)?;
                let n = element_type.n_nodes();
                if fields.len() < n + 1 {
                    return Err(import_error(
                        line_no,
                        &format!("element line needs an id and {} node ids", n),
                    ));
                }
                raw_convexes.push((line_no, element_type, fields[1..=n].to_vec()));
            }
            Block::Header => {
                if lower.starts_with("mesh") {
                    section = Some(parse_header(line, line_no)?);
                } else if lower.starts_with("coordinates") {
                    block = Block::Coordinates;
                } else if lower.starts_with("elements") {
                    block = Block::Elements;
                } else {
                    return Err(import_error(line_no, &format!("unexpected line '{}'", line)));
                }
            }
        }
    }

    if block != Block::Header {
        return Err(import_error(content.lines().count(), "unterminated block"));
    }

    let mut mesh = Mesh::with_capacity(points.len(), raw_convexes.len());
    for p in points {
        mesh.add_point(p);
    }
    for (line_no, element_type, ids) in raw_convexes {
        let nodes = ids
            .iter()
            .map(|id| {
                point_ids
                    .get(id)
                    .copied()
                    .ok_or_else(|| import_error(line_no, &format!("unknown node id {}", id)))
            })
            .collect::<Result<Vec<_>>>()?;
        mesh.add_convex(element_type, nodes)?;
    }

    debug!(
        points = mesh.nbpts(),
        convexes = mesh.nbcvs(),
        "parsed GiD mesh"
    );
    Ok(mesh)
}

/// Read a GiD mesh file from disk.
pub fn import_gid(path: impl AsRef<Path>) -> Result<Mesh> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_gid(&content)
}

/// Render a mesh in GiD format, one `MESH` section per convex type.
pub fn write_gid(mesh: &Mesh) -> Result<String> {
    let mut out = String::new();
    let mut first = true;
    for (element_type, nnode) in [(ElementType::Tet4, 4), (ElementType::Tet10, 10)] {
        let convexes: Vec<_> = mesh
            .convexes()
            .iter()
            .filter(|c| c.element_type == element_type)
            .collect();
        if convexes.is_empty() {
            continue;
        }
        writeln!(out, "MESH dimension 3 ElemType Tetrahedra Nnode {}", nnode)?;
        writeln!(out, "Coordinates")?;
        if first {
            for (i, p) in mesh.pts().iter().enumerate() {
                writeln!(out, "{:8} {:.17e} {:.17e} {:.17e}", i + 1, p[0], p[1], p[2])?;
            }
            first = false;
        }
        writeln!(out, "end coordinates")?;
        writeln!(out)?;
        writeln!(out, "Elements")?;
        for (i, convex) in convexes.iter().enumerate() {
            write!(out, "{:8}", i + 1)?;
            for &n in &convex.nodes {
                write!(out, " {}", n + 1)?;
            }
            writeln!(out)?;
        }
        writeln!(out, "end elements")?;
        writeln!(out)?;
    }
    Ok(out)
}

/// Write a mesh to disk in GiD format.
pub fn save_gid(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path.as_ref(), write_gid(mesh)?)?;
    Ok(())
}

fn parse_header(line: &str, line_no: usize) -> Result<Section> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let value_of = |key: &str| {
        tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case(key))
            .and_then(|i| tokens.get(i + 1))
            .copied()
    };

    let elem_type = value_of("elemtype")
        .ok_or_else(|| import_error(line_no, "MESH header without ElemType"))?;
    let nnode: usize = value_of("nnode")
        .ok_or_else(|| import_error(line_no, "MESH header without Nnode"))?
        .parse()
        .map_err(|_| import_error(line_no, "Nnode is not an integer"))?;

    let element_type = match (elem_type.to_ascii_lowercase().as_str(), nnode) {
        ("tetrahedra", 4) => Some(ElementType::Tet4),
        ("tetrahedra", 10) => Some(ElementType::Tet10),
        _ => {
            warn!(
                line = line_no,
                "skipping GiD section with ElemType {} Nnode {}", elem_type, nnode
            );
            None
        }
    };
    Ok(Section { element_type })
}

fn parse_numbers<T: std::str::FromStr>(line: &str, line_no: usize) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<T>()
                .map_err(|_| import_error(line_no, &format!("invalid number '{}'", tok)))
        })
        .collect()
}

fn import_error(line: usize, message: &str) -> Error {
    Error::Import {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TWO_TETS: &str = "\
# two tetrahedra sharing a face
MESH dimension 3 ElemType Tetrahedra Nnode 4
Coordinates
   10  0.0 0.0 0.0
   20  1.0 0.0 0.0
   30  0.0 1.0 0.0
   40  0.0 0.0 1.0
   50  1.0 1.0 1.0
end coordinates

Elements
   1  10 20 30 40  1
   2  20 30 40 50  1
end elements
";

    #[test]
    fn test_parse_arbitrary_ids() {
        let mesh = parse_gid(TWO_TETS).unwrap();
        assert_eq!(mesh.nbpts(), 5);
        assert_eq!(mesh.nbcvs(), 2);
        assert_eq!(mesh.convexes()[1].nodes, vec![1, 2, 3, 4]);
        assert_eq!(mesh.boundary_faces().len(), 6);
    }

    #[test]
    fn test_large_node_ids_stay_distinct() {
        // 2^53 and 2^53 + 1 collapse to the same f64
        let content = TWO_TETS
            .replace("   40  0.0", "   9007199254740992  0.0")
            .replace("   50  1.0", "   9007199254740993  1.0")
            .replace("10 20 30 40  1", "10 20 30 9007199254740992  1")
            .replace("20 30 40 50  1", "20 30 9007199254740992 9007199254740993  1");
        let mesh = parse_gid(&content).unwrap();
        assert_eq!(mesh.nbpts(), 5);
        assert_eq!(mesh.convexes()[1].nodes, vec![1, 2, 3, 4]);

        let bad = TWO_TETS.replace("   40  0.0", "   4.5  0.0");
        assert!(matches!(parse_gid(&bad), Err(Error::Import { .. })));
    }

    #[test]
    fn test_skips_other_sections() {
        let content = format!(
            "{}\nMESH dimension 3 ElemType Triangle Nnode 3\nCoordinates\nend coordinates\nElements\n 1 10 20 30\nend elements\n",
            TWO_TETS
        );
        let mesh = parse_gid(&content).unwrap();
        assert_eq!(mesh.nbcvs(), 2);
    }

    #[test]
    fn test_quadratic_tetrahedron() {
        let mut content = String::from("MESH dimension 3 ElemType Tetrahedra Nnode 10\nCoordinates\n");
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mut pts = corners.to_vec();
        for (i, j) in crate::element::tet10::TET10_EDGES {
            pts.push((corners[i] + corners[j]) * 0.5);
        }
        for (i, p) in pts.iter().enumerate() {
            content.push_str(&format!("{} {} {} {}\n", i + 1, p[0], p[1], p[2]));
        }
        content.push_str("end coordinates\nElements\n1 1 2 3 4 5 6 7 8 9 10\nend elements\n");

        let mesh = parse_gid(&content).unwrap();
        assert_eq!(mesh.convexes()[0].element_type, ElementType::Tet10);
        assert_relative_eq!(mesh.convex_volume(0).unwrap(), 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let bad = TWO_TETS.replace("   2  20 30 40 50  1", "   2  20 30 40 99  1");
        match parse_gid(&bad) {
            Err(Error::Import { line, .. }) => assert_eq!(line, 13),
            other => panic!("expected import error, got {:?}", other.map(|m| m.nbcvs())),
        }

        let bad = TWO_TETS.replace("1.0 1.0 1.0", "1.0 x 1.0");
        assert!(matches!(parse_gid(&bad), Err(Error::Import { line: 8, .. })));

        let unterminated = TWO_TETS.replace("end elements\n", "");
        assert!(parse_gid(&unterminated).is_err());
    }

    #[test]
    fn test_write_then_parse() {
        let mesh =
            Mesh::regular_simplices(Point3::zeros(), Point3::new(1.0, 2.0, 1.0), [2, 1, 1]).unwrap();
        let back = parse_gid(&write_gid(&mesh).unwrap()).unwrap();
        assert_eq!(back.nbpts(), mesh.nbpts());
        assert_eq!(back.nbcvs(), mesh.nbcvs());
        for (a, b) in back.pts().iter().zip(mesh.pts()) {
            assert_relative_eq!(a, b, epsilon = 1e-15);
        }
    }
}
