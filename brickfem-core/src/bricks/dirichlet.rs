//! Prescribed displacement `u = r` on a boundary region.
//!
//! Penalized mode adds `c ∫Γ (u − r) · v` with a large coefficient `c`.
//! Eliminated mode removes the boundary dofs from the system and sets them
//! to their prescribed value before the solve.

use crate::assembly::assemble_faces;
use crate::bricks::face_quadrature;
use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::mesh::Face;
use crate::model::{expect_len, unknown_param, Brick, BrickContext};
use crate::sparse::LocalContribution;
use nalgebra::{DMatrix, DVector};
use std::str::FromStr;

/// Penalization coefficient used unless changed through `penalization_coeff`.
pub const DEFAULT_PENALIZATION: f64 = 1e9;

/// How the condition is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirichletMode {
    Penalized,
    Eliminated,
}

impl FromStr for DirichletMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "penalized" | "penalization" => Ok(DirichletMode::Penalized),
            "eliminated" | "elimination" => Ok(DirichletMode::Eliminated),
            _ => Err(Error::InvalidParameter(format!("unknown Dirichlet mode '{}'", s))),
        }
    }
}

/// Dirichlet condition on the faces of a region.
#[derive(Debug, Clone)]
pub struct Dirichlet {
    region: usize,
    mode: DirichletMode,
    coeff: f64,
    /// Either 3 constant components or one value per displacement dof.
    r: Vec<f64>,
}

impl Dirichlet {
    pub fn penalized(region: usize) -> Self {
        Self::new(region, DirichletMode::Penalized)
    }

    pub fn eliminated(region: usize) -> Self {
        Self::new(region, DirichletMode::Eliminated)
    }

    pub fn new(region: usize, mode: DirichletMode) -> Self {
        Self {
            region,
            mode,
            coeff: DEFAULT_PENALIZATION,
            r: vec![0.0; 3],
        }
    }

    pub fn mode(&self) -> DirichletMode {
        self.mode
    }

    fn prescribed(&self, dof: usize) -> f64 {
        if self.r.len() == 3 {
            self.r[dof % 3]
        } else {
            self.r[dof]
        }
    }

    fn region_faces<'m>(&self, mfu: &'m MeshFem) -> Result<&'m [Face]> {
        let faces = mfu.mesh().region(self.region)?.faces();
        if faces.is_empty() {
            return Err(Error::Brick(format!(
                "Dirichlet region {} has no faces",
                self.region
            )));
        }
        Ok(faces)
    }

    fn check_r(&self, mfu: &MeshFem) -> Result<()> {
        expect_len("R", &self.r, &[3, mfu.nbdof()])
    }
}

impl Brick for Dirichlet {
    fn name(&self) -> &str {
        "Dirichlet condition"
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn is_coercive(&self) -> bool {
        true
    }

    fn param_list(&self) -> Vec<&'static str> {
        vec!["R", "penalization_coeff"]
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "R" => Ok(self.r.clone()),
            "penalization_coeff" => Ok(vec![self.coeff]),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()> {
        match name {
            "R" => {
                if values.is_empty() {
                    return Err(Error::InvalidParameter("R cannot be empty".into()));
                }
                self.r = values.to_vec();
            }
            "penalization_coeff" => {
                expect_len(name, values, &[1])?;
                if values[0] <= 0.0 {
                    return Err(Error::InvalidParameter(format!(
                        "penalization coefficient must be positive, got {}",
                        values[0]
                    )));
                }
                self.coeff = values[0];
            }
            _ => return Err(unknown_param(self, name)),
        }
        Ok(())
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        let mfu = ctx.mfu;
        let faces = self.region_faces(mfu)?;
        self.check_r(mfu)?;
        if self.mode == DirichletMode::Eliminated {
            return Ok(Vec::new());
        }

        let mesh = mfu.mesh();
        let u = ctx.u();
        assemble_faces(faces, |face| {
            let (_, points) = face_quadrature(ctx.mim, mesh, face)?;
            let cv = face.convex;
            let n = mfu.nb_dof_of_convex(cv);
            let n_nodes = n / 3;
            let mut ke = DMatrix::zeros(n, n);

            for (l, w) in &points {
                let phi = mfu.shape_functions(l);
                for a in 0..n_nodes {
                    for b in 0..n_nodes {
                        let m = self.coeff * w * phi[a] * phi[b];
                        for i in 0..3 {
                            ke[(a * 3 + i, b * 3 + i)] += m;
                        }
                    }
                }
            }

            let dofs = mfu.cell_dofs(cv);
            let gap = DVector::from_iterator(
                n,
                dofs.iter().map(|&d| u[d] - self.prescribed(d)),
            );
            let re = &ke * gap;
            Ok(LocalContribution::square(dofs, ke, re))
        })
    }

    fn constraints(&self, mfu: &MeshFem) -> Result<Vec<(usize, f64)>> {
        if self.mode == DirichletMode::Penalized {
            return Ok(Vec::new());
        }
        let faces = self.region_faces(mfu)?;
        self.check_r(mfu)?;
        let q = mfu.qdim();
        let mut fixed = Vec::new();
        for &face in faces {
            for b in mfu.basic_dofs_on_face(face) {
                for c in 0..q {
                    let dof = b * q + c;
                    fixed.push((dof, self.prescribed(dof)));
                }
            }
        }
        fixed.sort_unstable_by_key(|&(dof, _)| dof);
        fixed.dedup_by_key(|&mut (dof, _)| dof);
        Ok(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bricks::testing::dense_system;
    use crate::fem::FemKind;
    use crate::integration::{IntegrationMethod, MeshIm};
    use crate::mesh::{Mesh, MeshRegion};
    use crate::types::Point3;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn bottom_tagged_box(degree: usize) -> (Arc<MeshFem>, Arc<MeshIm>) {
        let mut mesh =
            Mesh::regular_simplices(Point3::zeros(), Point3::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap();
        let bottom = mesh.points_where(|p| p[1].abs() < 1e-9);
        let faces = mesh.faces_from_pid(&bottom);
        mesh.set_region(2, MeshRegion::from_faces(faces));
        mesh.set_region(3, MeshRegion::from_convexes([0]));
        let mesh = Arc::new(mesh);
        let mfu = Arc::new(MeshFem::new(mesh.clone(), FemKind::Pk { degree }, 3).unwrap());
        let mim = Arc::new(MeshIm::new(mesh, IntegrationMethod::tetrahedron(5).unwrap()));
        (mfu, mim)
    }

    #[test]
    fn test_penalized_mass_and_gap() {
        let (mfu, mim) = bottom_tagged_box(2);
        let mut brick = Dirichlet::penalized(2);
        brick.set_param("penalization_coeff", &[10.0]).unwrap();
        brick.set_param("R", &[0.0, 0.5, 0.0]).unwrap();

        let (k, r) = dense_system(&brick, &mfu, &mim, &vec![0.0; mfu.nbdof()]);
        // the face mass of one component sums to the face area
        let mut total = 0.0;
        for i in (1..mfu.nbdof()).step_by(3) {
            for j in (1..mfu.nbdof()).step_by(3) {
                total += k[(i, j)];
            }
        }
        assert_relative_eq!(total, 10.0, epsilon = 1e-9);
        let ry: f64 = r.iter().skip(1).step_by(3).sum();
        assert_relative_eq!(ry, -5.0, epsilon = 1e-9);

        // the prescribed displacement itself gives no residual
        let u: Vec<f64> = (0..mfu.nbdof()).map(|d| if d % 3 == 1 { 0.5 } else { 0.0 }).collect();
        let (_, r) = dense_system(&brick, &mfu, &mim, &u);
        assert!(r.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_eliminated_constraints() {
        let (mfu, _) = bottom_tagged_box(2);
        let mut brick = Dirichlet::eliminated(2);
        brick.set_param("R", &[1.0, 2.0, 3.0]).unwrap();
        let fixed = brick.constraints(&mfu).unwrap();
        // 5 × 5 P2 nodes on the bottom plane
        assert_eq!(fixed.len(), 25 * 3);
        for (dof, value) in fixed {
            assert!(mfu.dof_coordinates(dof)[1].abs() < 1e-12);
            assert_relative_eq!(value, (dof % 3 + 1) as f64);
        }
        assert!(Dirichlet::penalized(2).constraints(&mfu).unwrap().is_empty());
    }

    #[test]
    fn test_region_without_faces_is_rejected() {
        let (mfu, _) = bottom_tagged_box(1);
        assert!(Dirichlet::eliminated(3).constraints(&mfu).is_err());
        assert!(Dirichlet::eliminated(9).constraints(&mfu).is_err());
    }

    #[test]
    fn test_params() {
        let mut brick = Dirichlet::penalized(2);
        assert_eq!(brick.param("penalization_coeff").unwrap(), vec![DEFAULT_PENALIZATION]);
        assert!(brick.set_param("penalization_coeff", &[-1.0]).is_err());
        assert!(brick.set_param("H", &[1.0]).is_err());
        assert_eq!("Eliminated".parse::<DirichletMode>().unwrap(), DirichletMode::Eliminated);
    }
}
