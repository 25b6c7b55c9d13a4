//! Volumic or boundary source term `−∫ f · v`.

use crate::assembly::{assemble_convexes, assemble_faces};
use crate::bricks::{convex_quadrature, face_quadrature};
use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::model::{expect_len, unknown_param, Brick, BrickContext};
use crate::sparse::LocalContribution;
use crate::types::Vec3;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Load density on a mesh region.
///
/// Faces of the region receive a surface load, convexes a volume load. The
/// density is a constant vector, or a field on the data fem `mfd` with
/// components interleaved per basic dof.
#[derive(Debug, Clone)]
pub struct SourceTerm {
    region: usize,
    mfd: Option<Arc<MeshFem>>,
    data: Vec<f64>,
}

impl SourceTerm {
    /// Constant density on `region`, initially zero.
    pub fn new(region: usize) -> Self {
        Self {
            region,
            mfd: None,
            data: vec![0.0; 3],
        }
    }

    /// Density described on a scalar data fem.
    pub fn with_data_fem(region: usize, mfd: Arc<MeshFem>) -> Self {
        let data = vec![0.0; 3 * mfd.nb_basic_dof()];
        Self {
            region,
            mfd: Some(mfd),
            data,
        }
    }

    fn density(&self, cv: usize, l: &[f64; 4]) -> Vec3 {
        match &self.mfd {
            Some(mfd) if self.data.len() != 3 => {
                let psi = mfd.shape_functions(l);
                let mut f = Vec3::zeros();
                for (&b, s) in mfd.basic_dofs(cv).iter().zip(psi) {
                    for c in 0..3 {
                        f[c] += s * self.data[b * 3 + c];
                    }
                }
                f
            }
            _ => Vec3::new(self.data[0], self.data[1], self.data[2]),
        }
    }

    fn load_vector(&self, mfu: &MeshFem, cv: usize, points: &[([f64; 4], f64)]) -> LocalContribution {
        let n = mfu.nb_dof_of_convex(cv);
        let mut fe = DVector::zeros(n);
        for (l, w) in points {
            let f = self.density(cv, l);
            for (a, phi) in mfu.shape_functions(l).iter().enumerate() {
                for i in 0..3 {
                    fe[a * 3 + i] -= w * phi * f[i];
                }
            }
        }
        LocalContribution::square(mfu.cell_dofs(cv), DMatrix::zeros(0, 0), fe)
    }
}

impl Brick for SourceTerm {
    fn name(&self) -> &str {
        "source term"
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn is_coercive(&self) -> bool {
        true
    }

    fn param_list(&self) -> Vec<&'static str> {
        vec!["source_term"]
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "source_term" => Ok(self.data.clone()),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()> {
        match name {
            "source_term" => {
                match &self.mfd {
                    Some(mfd) => expect_len(name, values, &[3, 3 * mfd.nb_basic_dof()])?,
                    None => expect_len(name, values, &[3])?,
                }
                self.data = values.to_vec();
                Ok(())
            }
            _ => Err(unknown_param(self, name)),
        }
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        let mfu = ctx.mfu;
        let mesh = mfu.mesh();
        let region = mesh.region(self.region)?;
        if region.is_empty() {
            return Err(Error::Brick(format!("source region {} is empty", self.region)));
        }
        if let Some(mfd) = &self.mfd {
            if !Arc::ptr_eq(mfd.mesh(), mesh) {
                return Err(Error::Brick("source data fem lives on another mesh".into()));
            }
        }

        let mut contributions = assemble_faces(region.faces(), |face| {
            let (_, points) = face_quadrature(ctx.mim, mesh, face)?;
            Ok(self.load_vector(mfu, face.convex, &points))
        })?;
        contributions.extend(assemble_convexes(region.convexes(), |cv| {
            let (_, points) = convex_quadrature(ctx.mim, mesh, cv)?;
            Ok(self.load_vector(mfu, cv, &points))
        })?);
        Ok(contributions)
    }
}
