//! Legacy VTK export of slices.
//!
//! Writes an `UNSTRUCTURED_GRID` of triangles with point data. In binary
//! mode the arrays are big-endian `float` / `int`, as the legacy format
//! requires.

use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::slice::Slice;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// VTK triangle cell type.
const VTK_TRIANGLE: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VtkFormat {
    #[default]
    Ascii,
    Binary,
}

impl FromStr for VtkFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(VtkFormat::Ascii),
            "binary" => Ok(VtkFormat::Binary),
            _ => Err(Error::InvalidParameter(format!("unknown VTK format '{}'", s))),
        }
    }
}

/// A field written as point data.
#[derive(Debug, Clone, Copy)]
pub struct VtkField<'a> {
    pub mf: &'a MeshFem,
    pub values: &'a [f64],
    pub name: &'a str,
}

impl<'a> VtkField<'a> {
    pub fn new(mf: &'a MeshFem, values: &'a [f64], name: &'a str) -> Self {
        Self { mf, values, name }
    }
}

struct Writer<W: Write> {
    out: W,
    format: VtkFormat,
}

impl<W: Write> Writer<W> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// One row of floats: space separated in ASCII, raw bytes in binary.
    fn floats(&mut self, values: &[f64]) -> Result<()> {
        match self.format {
            VtkFormat::Ascii => {
                let row: Vec<String> = values.iter().map(|v| format!("{:e}", *v as f32)).collect();
                writeln!(self.out, "{}", row.join(" "))?;
            }
            VtkFormat::Binary => {
                for v in values {
                    self.out.write_all(&(*v as f32).to_be_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn ints(&mut self, values: &[i32]) -> Result<()> {
        match self.format {
            VtkFormat::Ascii => {
                let row: Vec<String> = values.iter().map(i32::to_string).collect();
                writeln!(self.out, "{}", row.join(" "))?;
            }
            VtkFormat::Binary => {
                for v in values {
                    self.out.write_all(&v.to_be_bytes())?;
                }
            }
        }
        Ok(())
    }

    /// Binary arrays end with a newline before the next keyword.
    fn end_array(&mut self) -> Result<()> {
        if self.format == VtkFormat::Binary {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn to_index(i: usize) -> Result<i32> {
    i32::try_from(i).map_err(|_| Error::Export(format!("index {} does not fit a VTK int", i)))
}

/// Write `slice` with its point fields into `out`.
pub fn write_slice<W: Write>(
    out: W,
    slice: &Slice,
    fields: &[VtkField<'_>],
    format: VtkFormat,
    title: &str,
) -> Result<()> {
    let n_nodes = slice.nodes().len();
    let n_triangles = slice.triangles().len();

    // interpolate everything up front so nothing is written on error
    let mut data = Vec::with_capacity(fields.len());
    for field in fields {
        let q = field.mf.qdim();
        if q != 1 && q != 3 {
            return Err(Error::Export(format!(
                "field '{}' has qdim {}, only scalars and 3D vectors are supported",
                field.name, q
            )));
        }
        data.push((field, slice.interpolate(field.mf, field.values)?));
    }

    let mut w = Writer { out, format };
    w.line("# vtk DataFile Version 2.0")?;
    w.line(title.lines().next().unwrap_or(""))?;
    w.line(match format {
        VtkFormat::Ascii => "ASCII",
        VtkFormat::Binary => "BINARY",
    })?;
    w.line("DATASET UNSTRUCTURED_GRID")?;

    w.line(&format!("POINTS {} float", n_nodes))?;
    for node in slice.nodes() {
        w.floats(node.point.as_slice())?;
    }
    w.end_array()?;

    w.line(&format!("CELLS {} {}", n_triangles, 4 * n_triangles))?;
    for t in slice.triangles() {
        w.ints(&[3, to_index(t[0])?, to_index(t[1])?, to_index(t[2])?])?;
    }
    w.end_array()?;

    w.line(&format!("CELL_TYPES {}", n_triangles))?;
    for _ in 0..n_triangles {
        w.ints(&[VTK_TRIANGLE])?;
    }
    w.end_array()?;

    if !data.is_empty() {
        w.line(&format!("POINT_DATA {}", n_nodes))?;
    }
    for (field, values) in data {
        let name = field.name.replace(' ', "_");
        if field.mf.qdim() == 1 {
            w.line(&format!("SCALARS {} float 1", name))?;
            w.line("LOOKUP_TABLE default")?;
            for v in values {
                w.floats(&[v])?;
            }
        } else {
            w.line(&format!("VECTORS {} float", name))?;
            for v in values.chunks(3) {
                w.floats(v)?;
            }
        }
        w.end_array()?;
    }

    w.out.flush()?;
    Ok(())
}

/// Export `slice` to a VTK file.
pub fn export_slice(
    path: impl AsRef<Path>,
    slice: &Slice,
    fields: &[VtkField<'_>],
    format: VtkFormat,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_slice(BufWriter::new(file), slice, fields, format, "Exported by brickfem")?;
    info!(
        path = %path.display(),
        nodes = slice.nodes().len(),
        fields = fields.len(),
        "exported VTK slice"
    );
    Ok(())
}
