//! Named internal state variables.
//!
//! A [`History`] is an ordered list of typed slots over one flat buffer. The
//! slot layout is fixed once the composing models have populated it: names
//! keep their offset and kind for the lifetime of the instance, and the
//! rate vectors returned by the models line up positionally with
//! [`History::as_vector`].
use std::collections::HashMap;

use nalgebra::DVector;
use strum_macros::Display;

use crate::error::{KinematicsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum HistoryKind {
    #[strum(serialize = "scalar")]
    Scalar,
    #[strum(serialize = "tensor")]
    Tensor(usize),
}

impl HistoryKind {
    pub fn size(&self) -> usize {
        match self {
            HistoryKind::Scalar => 1,
            HistoryKind::Tensor(dim) => *dim,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySlot {
    pub name: String,
    pub kind: HistoryKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    slots: Vec<HistorySlot>,
    index: HashMap<String, usize>,
    data: Vec<f64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scalar and returns its offset.
    pub fn add_scalar(&mut self, name: &str) -> Result<usize> {
        self.add(name, HistoryKind::Scalar)
    }

    /// Registers a tensor with `dim` packed components and returns its offset.
    pub fn add_tensor(&mut self, name: &str, dim: usize) -> Result<usize> {
        self.add(name, HistoryKind::Tensor(dim))
    }

    fn add(&mut self, name: &str, kind: HistoryKind) -> Result<usize> {
        if self.index.contains_key(name) {
            return Err(KinematicsError::DuplicateName(name.to_string()));
        }
        let offset = self.data.len();
        self.index.insert(name.to_string(), self.slots.len());
        self.slots.push(HistorySlot {
            name: name.to_string(),
            kind,
            offset,
        });
        self.data.resize(offset + kind.size(), 0.0);
        Ok(offset)
    }

    fn slot(&self, name: &str) -> Result<&HistorySlot> {
        self.index
            .get(name)
            .map(|&i| &self.slots[i])
            .ok_or_else(|| KinematicsError::UnknownName(name.to_string()))
    }

    fn checked(&self, name: &str, scalar: bool) -> Result<&HistorySlot> {
        let slot = self.slot(name)?;
        match (slot.kind, scalar) {
            (HistoryKind::Scalar, true) | (HistoryKind::Tensor(_), false) => Ok(slot),
            (actual, true) => Err(KinematicsError::TypeMismatch {
                name: name.to_string(),
                requested: HistoryKind::Scalar,
                actual,
            }),
            (actual, false) => Err(KinematicsError::TypeMismatch {
                name: name.to_string(),
                requested: HistoryKind::Tensor(0),
                actual,
            }),
        }
    }

    pub fn get_scalar(&self, name: &str) -> Result<f64> {
        let slot = self.checked(name, true)?;
        Ok(self.data[slot.offset])
    }

    pub fn set_scalar(&mut self, name: &str, value: f64) -> Result<()> {
        let offset = self.checked(name, true)?.offset;
        self.data[offset] = value;
        Ok(())
    }

    pub fn get_tensor(&self, name: &str) -> Result<&[f64]> {
        let slot = self.checked(name, false)?;
        Ok(&self.data[slot.offset..slot.offset + slot.kind.size()])
    }

    pub fn set_tensor(&mut self, name: &str, values: &[f64]) -> Result<()> {
        let slot = self.checked(name, false)?;
        let (offset, size) = (slot.offset, slot.kind.size());
        if values.len() != size {
            return Err(KinematicsError::shape(format!("{size} components for `{name}`"), values.len()));
        }
        self.data[offset..offset + size].copy_from_slice(values);
        Ok(())
    }

    pub fn offset(&self, name: &str) -> Result<usize> {
        Ok(self.slot(name)?.offset)
    }

    pub fn kind(&self, name: &str) -> Result<HistoryKind> {
        Ok(self.slot(name)?.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn scalar_at(&self, offset: usize) -> f64 {
        self.data[offset]
    }

    /// Total number of packed components.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    pub fn slots(&self) -> &[HistorySlot] {
        &self.slots
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.data)
    }

    pub fn set_vector(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(KinematicsError::shape(self.data.len(), values.len()));
        }
        self.data.copy_from_slice(values);
        Ok(())
    }

    /// Copy with the same layout and new values.
    pub fn with_vector(&self, values: &[f64]) -> Result<History> {
        let mut copy = self.clone();
        copy.set_vector(values)?;
        Ok(copy)
    }

    /// Copy with the same layout and every value set to zero.
    pub fn zeroed(&self) -> History {
        let mut copy = self.clone();
        copy.data.iter_mut().for_each(|v| *v = 0.0);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> History {
        let mut h = History::new();
        h.add_scalar("strength").unwrap();
        h.add_tensor("backstress", 6).unwrap();
        h.add_scalar("damage").unwrap();
        h
    }

    #[test]
    fn offsets_follow_registration_order() {
        let h = populated();
        assert_eq!(h.offset("strength").unwrap(), 0);
        assert_eq!(h.offset("backstress").unwrap(), 1);
        assert_eq!(h.offset("damage").unwrap(), 7);
        assert_eq!(h.size(), 8);
        assert_eq!(h.names().collect::<Vec<_>>(), vec!["strength", "backstress", "damage"]);
    }

    #[test]
    fn values_land_in_the_flat_vector() {
        let mut h = populated();
        h.set_scalar("strength", 35.0).unwrap();
        h.set_tensor("backstress", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        h.set_scalar("damage", 0.25).unwrap();
        assert_eq!(h.as_slice(), &[35.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.25]);
        assert_eq!(h.get_tensor("backstress").unwrap()[5], 6.0);
        assert_eq!(h.scalar_at(7), 0.25);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut h = populated();
        assert_eq!(h.add_scalar("strength"), Err(KinematicsError::DuplicateName("strength".into())));
        assert!(matches!(h.add_tensor("damage", 3), Err(KinematicsError::DuplicateName(_))));
        assert_eq!(h.size(), 8);
    }

    #[test]
    fn lookups_check_name_and_kind() {
        let mut h = populated();
        assert!(matches!(h.get_scalar("missing"), Err(KinematicsError::UnknownName(_))));
        assert!(matches!(h.get_tensor("strength"), Err(KinematicsError::TypeMismatch { .. })));
        assert!(matches!(h.set_scalar("backstress", 1.0), Err(KinematicsError::TypeMismatch { .. })));
        assert!(matches!(h.set_tensor("backstress", &[1.0; 3]), Err(KinematicsError::Shape { .. })));
    }

    #[test]
    fn copies_keep_the_layout() {
        let mut h = populated();
        h.set_scalar("strength", 2.0).unwrap();
        let zero = h.zeroed();
        assert_eq!(zero.slots(), h.slots());
        assert!(zero.as_slice().iter().all(|v| *v == 0.0));
        let other = h.with_vector(&[1.0; 8]).unwrap();
        assert_eq!(other.get_scalar("damage").unwrap(), 1.0);
        assert!(h.with_vector(&[1.0; 3]).is_err());
    }
}
