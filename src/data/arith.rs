use ndarray::{Array1, ArrayD, IxDyn};
use serde_json::Value;

use super::model::Data;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Binary operations on y
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulus: the result takes the sign of the divisor.
    Rem,
    FloorDiv,
    Pow,
}

impl BinaryOp {
    /// Past-tense verb used in error messages ("cannot be added").
    pub fn verb(self) -> &'static str {
        match self {
            BinaryOp::Add => "added",
            BinaryOp::Sub => "subtracted",
            BinaryOp::Mul => "multiplied",
            BinaryOp::Div => "divided",
            BinaryOp::Rem => "divided mod",
            BinaryOp::FloorDiv => "floor division",
            BinaryOp::Pow => "exponentiated",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => floored_rem(a, b),
            BinaryOp::FloorDiv => (a / b).floor(),
            BinaryOp::Pow => a.powf(b),
        }
    }
}

fn floored_rem(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// Operand – anything y can be combined with
// ---------------------------------------------------------------------------

/// Right-hand side of an arithmetic operation.
///
/// * `Data` must share the exact x values of the left side; its y is used.
/// * `Scalar` is broadcast over y.
/// * `Array` of size 1 is broadcast; otherwise it must be 1-D with one value per row.
/// * `Value` is untyped input (numbers, numeric strings, nested arrays) coerced
///   to an `Array` when the operation runs.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    Data(&'a Data),
    Scalar(f64),
    Array(ArrayD<f64>),
    Value(Value),
}

impl<'a> From<&'a Data> for Operand<'a> {
    fn from(d: &'a Data) -> Self {
        Operand::Data(d)
    }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl From<Vec<f64>> for Operand<'_> {
    fn from(v: Vec<f64>) -> Self {
        Operand::Array(Array1::from_vec(v).into_dyn())
    }
}

impl From<&[f64]> for Operand<'_> {
    fn from(v: &[f64]) -> Self {
        Operand::Array(Array1::from_vec(v.to_vec()).into_dyn())
    }
}

impl From<Array1<f64>> for Operand<'_> {
    fn from(v: Array1<f64>) -> Self {
        Operand::Array(v.into_dyn())
    }
}

impl From<ArrayD<f64>> for Operand<'_> {
    fn from(v: ArrayD<f64>) -> Self {
        Operand::Array(v)
    }
}

impl From<Value> for Operand<'_> {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

/// A validated operand, ready to combine with y.
enum Rhs {
    Scalar(f64),
    Column(Array1<f64>),
}

impl Data {
    fn check_operand(&self, operand: Operand<'_>, op: BinaryOp) -> Result<Rhs> {
        let array = match operand {
            Operand::Data(other) => {
                return if self.x() == other.x() {
                    Ok(Rhs::Column(other.y().to_owned()))
                } else {
                    Err(DataError::MismatchedAxis {
                        operation: op.verb().to_string(),
                    })
                };
            }
            Operand::Scalar(v) => return Ok(Rhs::Scalar(v)),
            Operand::Array(a) => a,
            Operand::Value(v) => coerce_value(&v).map_err(|found| DataError::Type {
                operation: op.verb().to_string(),
                found,
            })?,
        };

        if array.len() == 1 {
            let v = array.iter().next().copied().unwrap_or(f64::NAN);
            return Ok(Rhs::Scalar(v));
        }
        if array.ndim() != 1 {
            return Err(DataError::shape(format!(
                "Array to be {} with Data is of the wrong dimension. Its shape is {:?}",
                op.verb(),
                array.shape()
            )));
        }
        if array.len() != self.len() {
            return Err(DataError::shape(format!(
                "Array to be {} with Data is of the wrong length. Its length is {} \
                 while the Data is {}",
                op.verb(),
                array.len(),
                self.len()
            )));
        }
        Ok(Rhs::Column(array.iter().copied().collect()))
    }

    fn combine(&self, op: BinaryOp, rhs: Rhs, reflected: bool) -> Data {
        let y = self.y();
        let new_y: Array1<f64> = match rhs {
            Rhs::Scalar(b) if reflected => y.mapv(|a| op.apply(b, a)),
            Rhs::Scalar(b) => y.mapv(|a| op.apply(a, b)),
            Rhs::Column(b) => y
                .iter()
                .zip(b.iter())
                .map(|(&a, &b)| if reflected { op.apply(b, a) } else { op.apply(a, b) })
                .collect(),
        };
        self.with_y(new_y)
    }

    /// `y ∘ operand`, with x carried through unchanged.
    pub fn apply<'a>(&self, op: BinaryOp, operand: impl Into<Operand<'a>>) -> Result<Data> {
        let rhs = self.check_operand(operand.into(), op)?;
        Ok(self.combine(op, rhs, false))
    }

    /// `lhs ∘ y`, the reflected form of [`apply`](Self::apply) (e.g. `10 - y`).
    pub fn reflected<'a>(&self, op: BinaryOp, lhs: impl Into<Operand<'a>>) -> Result<Data> {
        let rhs = self.check_operand(lhs.into(), op)?;
        Ok(self.combine(op, rhs, true))
    }
}

#[allow(clippy::should_implement_trait)]
impl Data {
    pub fn add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Add, rhs)
    }

    pub fn sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Sub, rhs)
    }

    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Mul, rhs)
    }

    pub fn div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Div, rhs)
    }

    pub fn rem<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Rem, rhs)
    }

    pub fn floor_div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::FloorDiv, rhs)
    }

    pub fn pow<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Data> {
        self.apply(BinaryOp::Pow, rhs)
    }

    pub fn neg(&self) -> Data {
        self.apply_y(|v| -v)
    }

    /// Identity on y; returns a copy.
    pub fn pos(&self) -> Data {
        self.clone()
    }

    pub fn abs(&self) -> Data {
        self.apply_y(f64::abs)
    }
}

// ---------------------------------------------------------------------------
// Untyped operand coercion
// ---------------------------------------------------------------------------

/// Coerce a JSON value into an array, or name the type that could not be coerced.
fn coerce_value(value: &Value) -> std::result::Result<ArrayD<f64>, String> {
    let mut shape = Vec::new();
    let mut leaf_depth = None;
    let mut flat = Vec::new();
    collect_numbers(value, 0, &mut shape, &mut leaf_depth, &mut flat)?;
    ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|_| "ragged array".to_string())
}

fn collect_numbers(
    value: &Value,
    depth: usize,
    shape: &mut Vec<usize>,
    leaf_depth: &mut Option<usize>,
    flat: &mut Vec<f64>,
) -> std::result::Result<(), String> {
    if let Value::Array(items) = value {
        if shape.len() == depth {
            shape.push(items.len());
        } else if shape.get(depth) != Some(&items.len()) {
            return Err("ragged array".to_string());
        }
        for item in items {
            collect_numbers(item, depth + 1, shape, leaf_depth, flat)?;
        }
        return Ok(());
    }

    if *leaf_depth.get_or_insert(depth) != depth {
        return Err("ragged array".to_string());
    }
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(v) => {
            flat.push(v);
            Ok(())
        }
        None => Err(json_type_name(value).to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Operator sugar for the infallible cases
// ---------------------------------------------------------------------------

impl std::ops::Neg for Data {
    type Output = Data;

    fn neg(self) -> Data {
        Data::neg(&self)
    }
}

impl std::ops::Neg for &Data {
    type Output = Data;

    fn neg(self) -> Data {
        Data::neg(self)
    }
}

macro_rules! scalar_ops {
    ($($trait:ident $method:ident => $op:expr;)*) => {
        $(
            impl std::ops::$trait<f64> for &Data {
                type Output = Data;

                fn $method(self, rhs: f64) -> Data {
                    self.apply_y(|v| $op.apply(v, rhs))
                }
            }

            impl std::ops::$trait<f64> for Data {
                type Output = Data;

                fn $method(self, rhs: f64) -> Data {
                    self.apply_y(|v| $op.apply(v, rhs))
                }
            }
        )*
    };
}

scalar_ops! {
    Add add => BinaryOp::Add;
    Sub sub => BinaryOp::Sub;
    Mul mul => BinaryOp::Mul;
    Div div => BinaryOp::Div;
    Rem rem => BinaryOp::Rem;
}

macro_rules! reflected_scalar_ops {
    ($($trait:ident $method:ident => $op:expr;)*) => {
        $(
            impl std::ops::$trait<&Data> for f64 {
                type Output = Data;

                fn $method(self, rhs: &Data) -> Data {
                    rhs.apply_y(|v| $op.apply(self, v))
                }
            }

            impl std::ops::$trait<Data> for f64 {
                type Output = Data;

                fn $method(self, rhs: Data) -> Data {
                    rhs.apply_y(|v| $op.apply(self, v))
                }
            }
        )*
    };
}

reflected_scalar_ops! {
    Add add => BinaryOp::Add;
    Sub sub => BinaryOp::Sub;
    Mul mul => BinaryOp::Mul;
    Div div => BinaryOp::Div;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use serde_json::json;
    use statrs::assert_almost_eq;

    fn sample() -> Data {
        Data::from_rows(&[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]])
    }

    #[test]
    fn scalar_round_trip() {
        let d = sample();
        let back = d.add(2.5).unwrap().sub(2.5).unwrap();
        assert_eq!(back.x(), d.x());
        for (a, b) in back.y().iter().zip(d.y().iter()) {
            assert_almost_eq!(*a, *b, 1e-12);
        }
    }

    #[test]
    fn data_operands_need_same_x() {
        let a = sample();
        let b = a.mul(2.0).unwrap();
        assert_eq!(a.add(&b).unwrap().y(), array![3.0, 6.0, 9.0]);

        let shifted = a.apply_x(|x| x + 0.5);
        let err = a.add(&shifted).unwrap_err();
        match err {
            DataError::MismatchedAxis { operation } => assert_eq!(operation, "added"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn array_operands() {
        let d = sample();
        assert_eq!(d.mul(vec![1.0, 0.0, -1.0]).unwrap().y(), array![1.0, 0.0, -3.0]);
        assert_eq!(d.mul(vec![3.0]).unwrap().y(), array![3.0, 6.0, 9.0]);
        assert!(matches!(d.mul(vec![1.0, 2.0]), Err(DataError::Shape(_))));

        let matrix = Array2::<f64>::zeros((3, 2)).into_dyn();
        assert!(matches!(d.add(matrix), Err(DataError::Shape(_))));
    }

    #[test]
    fn json_operands_are_coerced() {
        let d = sample();
        assert_eq!(d.add(json!(1)).unwrap().y(), array![2.0, 3.0, 4.0]);
        assert_eq!(d.add(json!("0.5")).unwrap().y(), array![1.5, 2.5, 3.5]);
        assert_eq!(d.sub(json!([1, 1, 1])).unwrap().y(), array![0.0, 1.0, 2.0]);
        assert!(matches!(d.add(json!([[1, 2], [3, 4]])), Err(DataError::Shape(_))));

        match d.div(json!("volts")).unwrap_err() {
            DataError::Type { operation, found } => {
                assert_eq!(operation, "divided");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(d.add(json!({"a": 1})), Err(DataError::Type { .. })));
        assert!(matches!(d.add(json!([1, [2]])), Err(DataError::Type { .. })));
    }

    #[test]
    fn reflected_forms() {
        let d = sample();
        assert_eq!(d.reflected(BinaryOp::Sub, 10.0).unwrap().y(), array![9.0, 8.0, 7.0]);
        assert_eq!(d.reflected(BinaryOp::Pow, 2.0).unwrap().y(), array![2.0, 4.0, 8.0]);
        assert_eq!((6.0 / &d).y(), array![6.0, 3.0, 2.0]);
        assert_eq!((1.0 - d.clone()).y(), array![0.0, -1.0, -2.0]);
    }

    #[test]
    fn floored_modulus_and_division() {
        let d = Data::from_rows(&[[0.0, -7.0], [1.0, 7.0]]);
        assert_eq!(d.rem(3.0).unwrap().y(), array![2.0, 1.0]);
        assert_eq!(d.rem(-3.0).unwrap().y(), array![-1.0, -2.0]);
        assert_eq!(d.floor_div(2.0).unwrap().y(), array![-4.0, 3.0]);
        assert!(d.rem(0.0).unwrap().y()[0].is_nan());
    }

    #[test]
    fn unary() {
        let d = Data::from_rows(&[[0.0, -1.5], [1.0, 2.0]]);
        assert_eq!(d.neg().y(), array![1.5, -2.0]);
        assert_eq!((-&d).y(), array![1.5, -2.0]);
        assert_eq!(d.abs().y(), array![1.5, 2.0]);
        assert_eq!(d.pos(), d);
    }

    #[test]
    fn operators_leave_operands_untouched() {
        let d = sample();
        let before = d.clone();
        let _ = &d + 1.0;
        let _ = d.pow(2.0).unwrap();
        assert_eq!(d, before);
        assert_eq!((&d * 2.0).x(), d.x());
    }
}
