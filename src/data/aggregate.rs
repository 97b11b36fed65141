use super::model::Data;
use crate::error::{DataError, Result};

/// Sum of the y values of containers that share the same x values.
pub fn sum_data(data_list: &[Data]) -> Result<Data> {
    let (first, rest) = data_list
        .split_first()
        .ok_or_else(|| DataError::value("cannot sum an empty list of Data"))?;
    rest.iter().try_fold(first.clone(), |total, data| total.add(data))
}

/// Mean of the y values of containers that share the same x values.
pub fn mean(data_list: &[Data]) -> Result<Data> {
    let total = sum_data(data_list)?;
    total.div(data_list.len() as f64)
}
