// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative register maps.
//!
//! A [`RegisterMap`] describes one contiguous range that is fetched with a
//! single request and lists the fields found in it. The actual tables of the
//! Tracer charge controllers live in [`catalog`].

pub mod catalog;

use crate::{
    codec::Rule,
    frame::{Address, AddressSpace, Quantity},
};

/// A named value inside a register range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub name: &'static str,
    /// Index of the first word relative to the start of the range.
    pub offset: usize,
    pub rule: Rule,
}

impl Field {
    #[must_use]
    pub const fn new(name: &'static str, offset: usize, rule: Rule) -> Self {
        Self { name, offset, rule }
    }

    /// Index one past the last word the field consumes.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.rule.span()
    }
}

/// A contiguous register range read in one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterMap {
    /// Key of the diagnostic entry that replaces the fields on failure.
    pub key: &'static str,
    pub space: AddressSpace,
    pub address: Address,
    pub count: Quantity,
    pub fields: &'static [Field],
}

impl RegisterMap {
    /// Whether every field fits into the range.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.end() <= usize::from(self.count))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CENTI;

    const FIELDS: &[Field] = &[
        Field::new("a", 0, Rule::Signed16(CENTI)),
        Field::new("b", 1, Rule::Composite32(CENTI)),
    ];

    #[test]
    fn consistency() {
        let map = RegisterMap {
            key: "test",
            space: AddressSpace::Input,
            address: 0,
            count: 3,
            fields: FIELDS,
        };
        assert!(map.is_consistent());
        let map = RegisterMap { count: 2, ..map };
        assert!(!map.is_consistent());
        assert_eq!(map.field_names().collect::<Vec<_>>(), ["a", "b"]);
    }
}
