//! Integration methods on a mesh ("mesh ims").

use crate::element::gauss::{gauss_tet_for_degree, gauss_tri_for_degree, GaussPoint};
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Highest exactness degree of the available tetrahedral rules.
pub const MAX_DEGREE: usize = 5;

/// A tetrahedral quadrature rule of given exactness, `IM_TETRAHEDRON(k)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationMethod {
    degree: usize,
}

impl IntegrationMethod {
    /// Rule exact for polynomials of degree `degree` (1 to 5).
    pub fn tetrahedron(degree: usize) -> Result<Self> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(Error::InvalidParameter(format!(
                "IM_TETRAHEDRON({}) is not available (1 to {})",
                degree, MAX_DEGREE
            )));
        }
        Ok(Self { degree })
    }

    /// Exactness degree.
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IM_TETRAHEDRON({})", self.degree)
    }
}

impl FromStr for IntegrationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let degree = compact
            .strip_prefix("IM_TETRAHEDRON(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| {
                Error::InvalidParameter(format!("cannot parse integration method '{}'", s))
            })?;
        Self::tetrahedron(degree)
    }
}

/// An integration method attached to a mesh.
#[derive(Debug, Clone)]
pub struct MeshIm {
    mesh: Arc<Mesh>,
    method: IntegrationMethod,
    volume_rule: Vec<GaussPoint>,
    face_rule: Vec<GaussPoint>,
}

impl MeshIm {
    /// Use `method` on every convex of `mesh`.
    pub fn new(mesh: Arc<Mesh>, method: IntegrationMethod) -> Self {
        Self {
            mesh,
            volume_rule: gauss_tet_for_degree(method.degree),
            face_rule: gauss_tri_for_degree(method.degree),
            method,
        }
    }

    /// The underlying mesh.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// The integration method.
    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// Points of the tetrahedral rule (weights sum to 1/6).
    pub fn volume_points(&self) -> &[GaussPoint] {
        &self.volume_rule
    }

    /// Points of the matching triangle rule (weights sum to 1/2).
    pub fn face_points(&self) -> &[GaussPoint] {
        &self.face_rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point3;

    #[test]
    fn test_parse_method() {
        let im: IntegrationMethod = "IM_TETRAHEDRON(5)".parse().unwrap();
        assert_eq!(im.degree(), 5);
        assert_eq!(im.to_string(), "IM_TETRAHEDRON(5)");
        assert!("IM_TETRAHEDRON(8)".parse::<IntegrationMethod>().is_err());
        assert!("IM_HEXAHEDRON(2)".parse::<IntegrationMethod>().is_err());
    }

    #[test]
    fn test_rules_follow_degree() {
        let mesh = Arc::new(
            Mesh::regular_simplices(Point3::zeros(), Point3::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap(),
        );
        let mim = MeshIm::new(mesh, IntegrationMethod::tetrahedron(5).unwrap());
        assert_eq!(mim.volume_points().len(), 14);
        assert_eq!(mim.face_points().len(), 6);
        let mim = MeshIm::new(mim.mesh().clone(), IntegrationMethod::tetrahedron(2).unwrap());
        assert_eq!(mim.volume_points().len(), 4);
    }
}
