use super::{PointTable, Record, RecordFormat};
use crate::errors::{util::decode_error, BenchError, BenchResult};
use ndarray::Array2;
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const VERTEX: &str = "vertex";

/// Stanford `.ply` point clouds, ascii or binary. Only the scalar properties
/// of the `vertex` element are kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlyFormat;

impl RecordFormat for PlyFormat {
    fn extension(&self) -> &'static str {
        "ply"
    }

    fn decode(&self, path: &Path, mut bytes: &[u8]) -> BenchResult<Record> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser
            .read_ply(&mut bytes)
            .map_err(|e| decode_error(path, e))?;

        let element = ply.header.elements.get(VERTEX).ok_or_else(|| {
            decode_error(path, "no vertex element in header")
        })?;
        let columns: Vec<String> = element
            .properties
            .values()
            .filter(|property| matches!(property.data_type, PropertyType::Scalar(_)))
            .map(|property| property.name.clone())
            .collect();

        let vertices = ply.payload.get(VERTEX).map(Vec::as_slice).unwrap_or_default();
        let mut data = Array2::<f64>::zeros((vertices.len(), columns.len()));
        for (row, vertex) in vertices.iter().enumerate() {
            for (col, name) in columns.iter().enumerate() {
                let value = vertex
                    .get(name)
                    .and_then(scalar_value)
                    .ok_or_else(|| decode_error(path, format!("vertex {} lacks '{}'", row, name)))?;
                data[[row, col]] = value;
            }
        }

        PointTable::new(columns, data).map(Record::Points)
    }
}

fn scalar_value(property: &Property) -> Option<f64> {
    let value = match *property {
        Property::Char(v) => f64::from(v),
        Property::UChar(v) => f64::from(v),
        Property::Short(v) => f64::from(v),
        Property::UShort(v) => f64::from(v),
        Property::Int(v) => f64::from(v),
        Property::UInt(v) => f64::from(v),
        Property::Float(v) => f64::from(v),
        Property::Double(v) => v,
        _ => return None,
    };
    Some(value)
}

/// Write a point table as an ascii PLY file with float32 properties.
///
/// Parent directories must already exist.
pub fn write_points<P: AsRef<Path>>(path: P, table: &PointTable) -> BenchResult<()> {
    let path = path.as_ref();
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;

    let mut element = ElementDef::new(VERTEX.to_string());
    for name in table.columns() {
        element.properties.add(PropertyDef::new(
            name.clone(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    ply.header.elements.add(element);

    let vertices = table
        .data()
        .rows()
        .into_iter()
        .map(|row| {
            let mut vertex = DefaultElement::new();
            for (name, value) in table.columns().iter().zip(row.iter()) {
                vertex.insert(name.clone(), Property::Float(*value as f32));
            }
            vertex
        })
        .collect();
    ply.payload.insert(VERTEX.to_string(), vertices);
    ply.make_consistent()
        .map_err(|e| BenchError::Other(format!("inconsistent point cloud: {:?}", e)))?;

    let mut out = BufWriter::new(File::create(path)?);
    Writer::<DefaultElement>::new().write_ply(&mut out, &mut ply)?;
    out.flush()?;
    tracing::trace!(path = %path.display(), points = table.len(), "wrote point cloud");
    Ok(())
}

/// Write a point table, creating the parent directory first.
pub(crate) fn write_points_creating_dirs(path: &Path, table: &PointTable) -> BenchResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_points(path, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_file;
    use ndarray::array;

    #[test]
    fn test_round_trip_through_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let table = PointTable::from_coordinates(array![
            [0.0, 1.0, 2.0],
            [10.5, 11.25, 12.0],
            [63.0, 0.0, 31.0]
        ]);

        write_points(&path, &table).unwrap();
        let loaded = load_file(&path).unwrap();
        let points = loaded.as_points().unwrap();

        assert_eq!(points.columns(), table.columns());
        for (a, b) in points.data().iter().zip(table.data().iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_reads_ascii_header_with_colors() {
        let ply = "ply\n\
                   format ascii 1.0\n\
                   element vertex 2\n\
                   property float x\n\
                   property float y\n\
                   property float z\n\
                   property uchar red\n\
                   end_header\n\
                   1 2 3 255\n\
                   4 5 6 0\n";
        let record = PlyFormat.decode(Path::new("x/a.ply"), ply.as_bytes()).unwrap();
        let points = record.as_points().unwrap();
        assert_eq!(points.columns(), &["x", "y", "z", "red"]);
        assert_eq!(points.column("red").unwrap().to_vec(), vec![255.0, 0.0]);
        assert_eq!(points.coordinates().unwrap(), array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_missing_vertex_element() {
        let ply = "ply\nformat ascii 1.0\nelement face 0\nproperty list uchar int vertex_index\nend_header\n";
        assert!(PlyFormat.decode(Path::new("x/a.ply"), ply.as_bytes()).is_err());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bypass_dna").join("x_hat").join("a.ply");
        let table = PointTable::from_coordinates(array![[1.0, 1.0, 1.0]]);
        write_points_creating_dirs(&path, &table).unwrap();
        assert!(path.is_file());
    }
}
