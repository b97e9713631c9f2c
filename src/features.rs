//! Feature vector assembly from named record fields.
//!
//! The engine never reads files or parses text; it consumes records
//! through the [`Record`] trait and turns them into fixed-order numeric
//! vectors. The same ordered field list must be used at training and at
//! inference time; the builder is what pins that order down.

use crate::error::{Error, Result};

/// A data record exposing named numeric fields.
///
/// Implemented by whatever ingestion layer feeds the engine (a delimited
/// text reader, an in-memory table, a test fixture).
pub trait Record {
    /// Value of the named field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<f64>;
}

/// Owned `(name, value)` record, the simplest [`Record`] carrier.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: Vec<(String, f64)>,
}

impl FieldMap {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from parallel name and value slices.
    ///
    /// Fails with `DimensionMismatch` when the slices disagree in length.
    pub fn from_row(names: &[String], values: &[f64]) -> Result<Self> {
        if names.len() != values.len() {
            return Err(Error::DimensionMismatch {
                expected: names.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            fields: names.iter().cloned().zip(values.iter().copied()).collect(),
        })
    }

    /// Add or overwrite a field.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }
}

impl Record for FieldMap {
    fn field(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Assembles ordered feature vectors from named record fields.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    fields: Vec<String>,
}

impl FeatureVectorBuilder {
    /// Create a builder over an ordered list of field names.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// The ordered field names.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Dimension of every vector this builder produces.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.fields.len()
    }

    /// Assemble one feature vector, fields in declaration order.
    ///
    /// Fails with `MissingField` on the first absent field. No side
    /// effects; the record is only read.
    pub fn build<R: Record>(&self, record: &R) -> Result<Vec<f64>> {
        self.fields
            .iter()
            .map(|name| {
                record.field(name).ok_or_else(|| Error::MissingField {
                    field: name.clone(),
                })
            })
            .collect()
    }

    /// Assemble one feature vector destined for a model of dimension
    /// `expected_dimension`.
    ///
    /// Fails with `DimensionMismatch` before touching the record when the
    /// builder's field count disagrees with the model's declared
    /// dimension, catching a training/inference schema drift up front.
    pub fn build_for<R: Record>(&self, record: &R, expected_dimension: usize) -> Result<Vec<f64>> {
        if self.dimension() != expected_dimension {
            return Err(Error::DimensionMismatch {
                expected: expected_dimension,
                found: self.dimension(),
            });
        }
        self.build(record)
    }

    /// Assemble vectors for a whole batch of records.
    pub fn build_all<R: Record>(&self, records: &[R]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.build(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, f64)]) -> FieldMap {
        let mut map = FieldMap::new();
        for (name, value) in pairs {
            map.insert(*name, *value);
        }
        map
    }

    #[test]
    fn test_build_preserves_field_order() {
        let builder =
            FeatureVectorBuilder::new(vec!["alcohol".into(), "hue".into(), "proline".into()]);
        let rec = record(&[("hue", 1.0), ("proline", 750.0), ("alcohol", 13.2)]);

        let vector = builder.build(&rec).unwrap();
        assert_eq!(vector, vec![13.2, 1.0, 750.0]);
    }

    #[test]
    fn test_build_missing_field() {
        let builder = FeatureVectorBuilder::new(vec!["alcohol".into(), "ash".into()]);
        let rec = record(&[("alcohol", 13.2)]);

        let err = builder.build(&rec).unwrap_err();
        assert_eq!(
            err,
            Error::MissingField {
                field: "ash".into()
            }
        );
    }

    #[test]
    fn test_build_for_checks_dimension_first() {
        let builder = FeatureVectorBuilder::new(vec!["alcohol".into(), "ash".into()]);
        let rec = record(&[("alcohol", 13.2), ("ash", 2.4)]);

        assert_eq!(builder.build_for(&rec, 2).unwrap(), vec![13.2, 2.4]);

        // Wrong declared dimension fails even though the record is fine.
        let err = builder.build_for(&rec, 3).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_build_all() {
        let builder = FeatureVectorBuilder::new(vec!["x".into(), "y".into()]);
        let records = vec![record(&[("x", 0.0), ("y", 1.0)]), record(&[("x", 2.0), ("y", 3.0)])];

        let vectors = builder.build_all(&records).unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_field_map_from_row_length_mismatch() {
        let names = vec!["x".to_string(), "y".to_string()];
        assert!(FieldMap::from_row(&names, &[1.0]).is_err());
    }
}
