//! Model bricks.
//!
//! - [`IsotropicLinearizedElasticity`], [`NonlinearElasticity`] - material laws
//! - [`LinearIncompressibility`], [`NonlinearIncompressibility`] - pressure terms
//! - [`SourceTerm`] - volume or boundary loads
//! - [`Dirichlet`] - prescribed displacements, penalised or eliminated

mod dirichlet;
mod elasticity;
mod incompressibility;
mod source;

pub use dirichlet::{Dirichlet, DirichletMode, DEFAULT_PENALIZATION};
pub use elasticity::{IsotropicLinearizedElasticity, NonlinearElasticity};
pub use incompressibility::{LinearIncompressibility, NonlinearIncompressibility};
pub use source::SourceTerm;

use crate::element::{face_to_barycentric, Geometry};
use crate::error::Result;
use crate::integration::MeshIm;
use crate::mesh::{Face, Mesh};

/// Quadrature of a convex: barycentric points with physical weights.
pub(crate) fn convex_quadrature(
    mim: &MeshIm,
    mesh: &Mesh,
    cv: usize,
) -> Result<(Geometry, Vec<([f64; 4], f64)>)> {
    let geometry = mesh.convex_geometry(cv)?;
    let jac = geometry.det().abs();
    let points = mim
        .volume_points()
        .iter()
        .map(|gp| (gp.coords, gp.weight * jac))
        .collect();
    Ok((geometry, points))
}

/// Quadrature of a convex face, lifted to barycentric points of the convex.
pub(crate) fn face_quadrature(
    mim: &MeshIm,
    mesh: &Mesh,
    face: Face,
) -> Result<(Geometry, Vec<([f64; 4], f64)>)> {
    let geometry = mesh.convex_geometry(face.convex)?;
    // reference triangle has area 1/2
    let scale = 2.0 * geometry.face_area(face.face);
    let points = mim
        .face_points()
        .iter()
        .map(|gp| (face_to_barycentric(face.face, &gp.coords), gp.weight * scale))
        .collect();
    Ok((geometry, points))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::fem::{FemKind, MeshFem};
    use crate::integration::{IntegrationMethod, MeshIm};
    use crate::mesh::Mesh;
    use crate::model::{Brick, BrickContext};
    use crate::sparse::{scatter, SparseVector, TripletMatrix};
    use crate::types::Point3;
    use nalgebra::DMatrix;
    use std::sync::Arc;

    /// Unit cube split into `n³` Kuhn cubes with a Pk displacement space.
    pub fn unit_box(n: usize, degree: usize) -> (Arc<MeshFem>, Arc<MeshIm>) {
        let mesh = Arc::new(
            Mesh::regular_simplices(Point3::zeros(), Point3::new(1.0, 1.0, 1.0), [n, n, n]).unwrap(),
        );
        let mfu = Arc::new(MeshFem::new(mesh.clone(), FemKind::Pk { degree }, 3).unwrap());
        let mim = Arc::new(MeshIm::new(mesh, IntegrationMethod::tetrahedron(5).unwrap()));
        (mfu, mim)
    }

    /// Dense tangent and residual of a single brick.
    pub fn dense_system(
        brick: &dyn Brick,
        mfu: &MeshFem,
        mim: &MeshIm,
        state: &[f64],
    ) -> (DMatrix<f64>, Vec<f64>) {
        let ctx = BrickContext {
            mfu,
            mim,
            state,
            mixed_offset: mfu.nbdof(),
        };
        let contributions = brick.assemble(&ctx).unwrap();
        let n = state.len();
        let mut k = TripletMatrix::new(n, n);
        let mut r = SparseVector::zeros(n);
        scatter(&contributions, &mut k, &mut r);
        (DMatrix::from(&k.to_csr().unwrap()), r.into_vec())
    }

    /// Compare the tangent with central differences of the residual.
    pub fn check_tangent(brick: &dyn Brick, mfu: &MeshFem, mim: &MeshIm, state: &[f64]) {
        let (k, _) = dense_system(brick, mfu, mim, state);
        let h = 1e-6;
        let scale = k.amax().max(1e-12);
        for col in (0..state.len()).step_by(5) {
            let mut plus = state.to_vec();
            let mut minus = state.to_vec();
            plus[col] += h;
            minus[col] -= h;
            let (_, rp) = dense_system(brick, mfu, mim, &plus);
            let (_, rm) = dense_system(brick, mfu, mim, &minus);
            for row in 0..state.len() {
                let fd = (rp[row] - rm[row]) / (2.0 * h);
                assert!(
                    (fd - k[(row, col)]).abs() <= 1e-5 * scale,
                    "tangent mismatch at ({}, {}): {} vs {}",
                    row,
                    col,
                    k[(row, col)],
                    fd
                );
            }
        }
    }
}
