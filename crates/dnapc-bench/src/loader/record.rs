use crate::errors::{BenchError, BenchResult};
use ndarray::{s, Array2, ArrayD, ArrayView1, Axis, IxDyn};
use serde_pickle::Value;

/// Point set decoded from a point-cloud file: one row per point, one named
/// column per vertex property.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl PointTable {
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> BenchResult<Self> {
        if columns.len() != data.ncols() {
            return Err(BenchError::ShapeMismatch {
                expected: vec![data.nrows(), columns.len()],
                actual: data.shape().to_vec(),
            });
        }
        Ok(Self { columns, data })
    }

    /// Name the first three columns `x`, `y`, `z` and any further ones by index.
    pub fn from_coordinates(data: Array2<f64>) -> Self {
        let columns = (0..data.ncols())
            .map(|i| match i {
                0 => "x".to_string(),
                1 => "y".to_string(),
                2 => "z".to_string(),
                n => format!("c{}", n),
            })
            .collect();
        Self { columns, data }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.data.column(index))
    }

    /// The `x`, `y`, `z` columns as an `n × 3` array.
    pub fn coordinates(&self) -> BenchResult<Array2<f64>> {
        let mut out = Array2::zeros((self.len(), 3));
        for (i, axis) in ["x", "y", "z"].iter().enumerate() {
            let column = self.column(axis).ok_or_else(|| {
                BenchError::Other(format!("point table has no '{}' column", axis))
            })?;
            out.slice_mut(s![.., i]).assign(&column);
        }
        Ok(out)
    }
}

/// Decoded payload of one benchmark file.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Numeric array (`npy`).
    Array(ArrayD<f64>),
    /// Generic serialized object (`pkl`).
    Object(Value),
    /// Point set (`ply`).
    Points(PointTable),
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Array(_) => "array",
            Record::Object(_) => "object",
            Record::Points(_) => "points",
        }
    }

    /// Shape of the numeric content; objects report the shape of their
    /// numeric conversion, or an empty shape when they have none.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Record::Array(array) => array.shape().to_vec(),
            Record::Points(table) => table.data().shape().to_vec(),
            Record::Object(value) => object_to_array(value)
                .map(|array| array.shape().to_vec())
                .unwrap_or_default(),
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            Record::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&PointTable> {
        match self {
            Record::Points(table) => Some(table),
            _ => None,
        }
    }

    /// Numeric view of the record as an owned array.
    pub fn to_array(&self) -> BenchResult<ArrayD<f64>> {
        match self {
            Record::Array(array) => Ok(array.clone()),
            Record::Points(table) => Ok(table.data().clone().into_dyn()),
            Record::Object(value) => object_to_array(value).ok_or_else(|| {
                BenchError::Other("object record has no rectangular numeric content".to_string())
            }),
        }
    }

    /// Drop every axis of length one. Only arrays have axes to drop.
    pub fn squeeze(self) -> Record {
        match self {
            Record::Array(array) => Record::Array(squeeze(array)),
            other => other,
        }
    }
}

pub(crate) fn squeeze(mut array: ArrayD<f64>) -> ArrayD<f64> {
    for axis in (0..array.ndim()).rev() {
        if array.len_of(Axis(axis)) == 1 {
            array = array.index_axis_move(Axis(axis), 0);
        }
    }
    array
}

fn object_to_array(value: &Value) -> Option<ArrayD<f64>> {
    let mut nested = Nested::default();
    nested.visit(value, 0)?;
    ArrayD::from_shape_vec(IxDyn(&nested.shape), nested.data).ok()
}

#[derive(Default)]
struct Nested {
    shape: Vec<usize>,
    leaf_depth: Option<usize>,
    data: Vec<f64>,
}

impl Nested {
    fn visit(&mut self, value: &Value, depth: usize) -> Option<()> {
        match value {
            Value::List(items) | Value::Tuple(items) => {
                if self.leaf_depth.is_some_and(|leaf| depth >= leaf) {
                    return None;
                }
                match self.shape.get(depth) {
                    Some(&len) if len != items.len() => return None,
                    Some(_) => {}
                    None => self.shape.push(items.len()),
                }
                items.iter().try_for_each(|item| self.visit(item, depth + 1))
            }
            scalar => {
                let number = match scalar {
                    Value::F64(v) => *v,
                    Value::I64(v) => *v as f64,
                    Value::Bool(v) => f64::from(u8::from(*v)),
                    _ => return None,
                };
                match self.leaf_depth {
                    Some(leaf) if leaf != depth => return None,
                    Some(_) => {}
                    None if self.shape.len() != depth => return None,
                    None => self.leaf_depth = Some(depth),
                }
                self.data.push(number);
                Some(())
            }
        }
    }
}
