//! Dense coordinate tuple sets decoded from VPF coordinate strings.
//!
//! A coordinate file is a headerless run of `count x arity` consecutive
//! IEEE floats (single- or double-precision); count and arity come from
//! the caller's schema knowledge. The first two values of each tuple are
//! conventionally X (longitude) and Y (latitude), the optional third Z.

use std::io::{Read, Seek};

use serde::Serialize;

use crate::error::{Result, VpfError};
use crate::io::VpfReader;

/// Scalar encoding of a tuple set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Precision {
    Single,
    Double,
}

/// Flat scalar storage in the file's native precision.
#[derive(Debug, Clone, PartialEq)]
enum TupleData {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

/// An immutable, ordered sequence of fixed-arity numeric tuples.
///
/// All tuples share one arity, fixed at construction. Tuple indexes are
/// 0-based; axis indexes run `0..arity`. Accessors panic on out-of-range
/// indexes (slice semantics).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTupleSet {
    arity: usize,
    data: TupleData,
}

impl CoordinateTupleSet {
    /// Bulk-read `count x arity` single-precision scalars.
    ///
    /// Fails without returning a partial set if the stream ends early.
    pub fn read_single<R: Read + Seek>(
        count: usize,
        arity: usize,
        reader: &mut VpfReader<R>,
    ) -> Result<Self> {
        Self::check_arity(arity)?;
        let mut values = Vec::with_capacity(count * arity);
        for _ in 0..count * arity {
            values.push(reader.read_f32()?);
        }
        Ok(Self {
            arity,
            data: TupleData::Single(values),
        })
    }

    /// Bulk-read `count x arity` double-precision scalars.
    pub fn read_double<R: Read + Seek>(
        count: usize,
        arity: usize,
        reader: &mut VpfReader<R>,
    ) -> Result<Self> {
        Self::check_arity(arity)?;
        let mut values = Vec::with_capacity(count * arity);
        for _ in 0..count * arity {
            values.push(reader.read_f64()?);
        }
        Ok(Self {
            arity,
            data: TupleData::Double(values),
        })
    }

    fn check_arity(arity: usize) -> Result<()> {
        if arity == 0 {
            return Err(VpfError::InvalidFormat(
                "Coordinate tuple arity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        match &self.data {
            TupleData::Single(v) => v.len() / self.arity,
            TupleData::Double(v) => v.len() / self.arity,
        }
    }

    /// True if the set holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalars per tuple (2 for 2D, 3 for 3D).
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Native encoding of the set.
    pub fn precision(&self) -> Precision {
        match &self.data {
            TupleData::Single(_) => Precision::Single,
            TupleData::Double(_) => Precision::Double,
        }
    }

    fn scalar(&self, flat: usize) -> f64 {
        match &self.data {
            TupleData::Single(v) => f64::from(v[flat]),
            TupleData::Double(v) => v[flat],
        }
    }

    fn scalar_f32(&self, flat: usize) -> f32 {
        match &self.data {
            TupleData::Single(v) => v[flat],
            TupleData::Double(v) => v[flat] as f32,
        }
    }

    /// One scalar, widened to f64.
    pub fn value(&self, tuple: usize, axis: usize) -> f64 {
        assert!(
            axis < self.arity,
            "axis {} out of range for arity {}",
            axis,
            self.arity
        );
        self.scalar(tuple * self.arity + axis)
    }

    /// One scalar in native precision (doubles truncate to f32).
    pub fn value_f32(&self, tuple: usize, axis: usize) -> f32 {
        assert!(
            axis < self.arity,
            "axis {} out of range for arity {}",
            axis,
            self.arity
        );
        self.scalar_f32(tuple * self.arity + axis)
    }

    /// X (first axis), widened.
    pub fn x(&self, tuple: usize) -> f64 {
        self.value(tuple, 0)
    }

    /// Y (second axis), widened.
    pub fn y(&self, tuple: usize) -> f64 {
        self.value(tuple, 1)
    }

    /// Z (third axis), widened; 0.0 for sets with arity < 3.
    pub fn z(&self, tuple: usize) -> f64 {
        if self.arity < 3 {
            debug_assert!(tuple < self.len(), "tuple index out of bounds");
            0.0
        } else {
            self.value(tuple, 2)
        }
    }

    pub fn x_f32(&self, tuple: usize) -> f32 {
        self.value_f32(tuple, 0)
    }

    pub fn y_f32(&self, tuple: usize) -> f32 {
        self.value_f32(tuple, 1)
    }

    /// Z in native precision; 0.0 for sets with arity < 3.
    pub fn z_f32(&self, tuple: usize) -> f32 {
        if self.arity < 3 {
            debug_assert!(tuple < self.len(), "tuple index out of bounds");
            0.0
        } else {
            self.value_f32(tuple, 2)
        }
    }

    /// Full tuple, widened.
    pub fn tuple(&self, tuple: usize) -> Vec<f64> {
        (0..self.arity).map(|axis| self.value(tuple, axis)).collect()
    }

    /// Full tuple in native precision.
    pub fn tuple_f32(&self, tuple: usize) -> Vec<f32> {
        (0..self.arity)
            .map(|axis| self.value_f32(tuple, axis))
            .collect()
    }
}
