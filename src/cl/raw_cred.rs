use super::attribute::{AttrCount, AttrType, AttrValue, Attribute};
use crate::bn::BigNumber;
use crate::errors::prelude::*;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Attributes of one credential, keyed by index with a name lookup.
///
/// Value sequences handed to the credential manager are always ordered by
/// attribute index, independent of insertion or update order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCred {
    attrs: BTreeMap<usize, Attribute>,
    indices: HashMap<String, usize>,
    attr_count: AttrCount,
}

impl RawCred {
    pub fn new(attr_count: AttrCount) -> RawCred {
        RawCred {
            attrs: BTreeMap::new(),
            indices: HashMap::new(),
            attr_count,
        }
    }

    /// Builds an empty credential from parsed schema attributes.
    pub fn from_attrs(attrs: &[Attribute], attr_count: AttrCount) -> AnonCredsResult<RawCred> {
        let mut raw_cred = RawCred::new(attr_count);
        for attr in attrs {
            raw_cred.insert(attr.clone())?;
        }
        Ok(raw_cred)
    }

    /// Adds an attribute without a value.
    pub fn add_empty_attr(
        &mut self,
        name: &str,
        index: usize,
        known: bool,
        attr_type: AttrType,
    ) -> AnonCredsResult<()> {
        self.insert(Attribute::new(name, index, known, attr_type))
    }

    pub fn insert(&mut self, attr: Attribute) -> AnonCredsResult<()> {
        self.validate_attr(&attr)?;
        self.indices.insert(attr.name().to_string(), attr.index());
        self.attrs.insert(attr.index(), attr);
        Ok(())
    }

    fn validate_attr(&self, attr: &Attribute) -> AnonCredsResult<()> {
        let attr_err = |msg: &str| err_msg(AnonCredsErrorKind::Attribute, msg.to_string());

        if attr.is_known() && self.count_known() >= self.attr_count.known {
            return Err(attr_err("Known attributes exhausted"));
        }
        if !attr.is_known() && self.count_committed() >= self.attr_count.committed {
            return Err(attr_err("Committed attributes exhausted"));
        }
        if attr.name().is_empty() {
            return Err(attr_err("Attribute's name cannot be empty"));
        }
        if self.indices.contains_key(attr.name()) {
            return Err(attr_err(&format!("Duplicate attribute '{}'", attr.name())));
        }
        if self.attrs.contains_key(&attr.index()) {
            return Err(attr_err(&format!("Duplicate attribute index {}", attr.index())));
        }
        Ok(())
    }

    fn count_known(&self) -> usize {
        self.attrs.values().filter(|a| a.is_known()).count()
    }

    fn count_committed(&self) -> usize {
        self.attrs.values().filter(|a| !a.is_known()).count()
    }

    pub fn attr_count(&self) -> AttrCount {
        self.attr_count
    }

    pub fn get_attr(&self, name: &str) -> AnonCredsResult<&Attribute> {
        self.indices
            .get(name)
            .and_then(|i| self.attrs.get(i))
            .ok_or_else(|| {
                err_msg(
                    AnonCredsErrorKind::Attribute,
                    format!("No attribute '{}' in this credential", name),
                )
            })
    }

    pub fn update_attr<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> AnonCredsResult<()> {
        let index = *self.indices.get(name).ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::Attribute,
                format!("No attribute '{}' in this credential", name),
            )
        })?;
        match self.attrs.get_mut(&index) {
            Some(attr) => attr.update_value(value.into()),
            None => Err(err_msg(
                AnonCredsErrorKind::InvalidState,
                format!("Attribute '{}' indexed but not stored", name),
            )),
        }
    }

    /// Fails naming the first attribute, by index, that has no value.
    pub fn missing_attrs(&self) -> AnonCredsResult<()> {
        match self.attrs.values().find(|a| !a.has_value()) {
            Some(attr) => {
                debug!("Attribute '{}' is missing a value", attr.name());
                Err(err_msg(
                    AnonCredsErrorKind::Attribute,
                    format!("Attribute '{}' is missing a value", attr.name()),
                ))
            }
            None => Ok(()),
        }
    }

    /// Attributes in index order.
    pub fn attrs(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values()
    }

    pub fn known_attrs(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values().filter(|a| a.is_known())
    }

    pub fn committed_attrs(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values().filter(|a| !a.is_known())
    }

    pub fn known_values(&self) -> AnonCredsResult<Vec<BigNumber>> {
        self.known_attrs().map(Attribute::internal_value).collect()
    }

    pub fn committed_values(&self) -> AnonCredsResult<Vec<BigNumber>> {
        self.committed_attrs().map(Attribute::internal_value).collect()
    }

    /// Position of the named attribute inside its Known or Committed
    /// partition, together with the partition flag.
    pub fn partition_position(&self, name: &str) -> AnonCredsResult<(bool, usize)> {
        let attr = self.get_attr(name)?;
        let position = if attr.is_known() {
            self.known_attrs().position(|a| a.name() == name)
        } else {
            self.committed_attrs().position(|a| a.name() == name)
        };
        position
            .map(|p| (attr.is_known(), p))
            .ok_or_else(|| err_msg(AnonCredsErrorKind::InvalidState, "Attribute not in partition"))
    }
}

impl fmt::Display for RawCred {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<&str> = self.attrs.values().map(|a| a.name()).collect();
        write!(f, "RawCred {{ attrs: {:?}, count: {} }}", names, self.attr_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_attribute_name_fails() {
        let mut rc = RawCred::new(AttrCount::new(1, 1, 1));
        assert!(rc.add_empty_attr("", 0, true, AttrType::Int64).is_err());
    }

    #[test]
    fn exceeding_known_count_fails() {
        let mut rc = RawCred::new(AttrCount::new(0, 0, 0));
        let err = rc.add_empty_attr("a", 0, true, AttrType::Int64).unwrap_err();
        assert_eq!(AnonCredsErrorKind::Attribute, err.kind());
    }

    #[test]
    fn exceeding_committed_count_fails() {
        let mut rc = RawCred::new(AttrCount::new(0, 0, 0));
        assert!(rc.add_empty_attr("a", 0, false, AttrType::Int64).is_err());
    }

    #[test]
    fn add_attr_works() {
        let mut rc = RawCred::new(AttrCount::new(1, 0, 0));
        rc.add_empty_attr("Age", 0, true, AttrType::Int64).unwrap();
        assert_eq!(1, rc.attrs().count());
    }

    #[test]
    fn duplicate_name_or_index_fails() {
        let mut rc = RawCred::new(AttrCount::new(2, 1, 0));
        rc.add_empty_attr("a", 0, true, AttrType::Int64).unwrap();
        assert!(rc.add_empty_attr("a", 1, false, AttrType::Int64).is_err());
        assert!(rc.add_empty_attr("b", 0, true, AttrType::Int64).is_err());
    }

    #[test]
    fn get_unknown_attribute_fails() {
        let rc = RawCred::new(AttrCount::new(1, 0, 0));
        assert!(rc.get_attr("test").is_err());
    }

    #[test]
    fn update_attr_checks_name_and_type() {
        let mut rc = RawCred::new(AttrCount::new(1, 0, 0));
        rc.add_empty_attr("age", 0, true, AttrType::Int64).unwrap();

        assert!(rc.update_attr("height", 180).is_err());
        assert!(rc.update_attr("age", "old").is_err());
        rc.update_attr("age", 30).unwrap();
        assert_eq!(
            &AttrValue::Int(30),
            rc.get_attr("age").unwrap().value().unwrap()
        );
    }

    #[test]
    fn missing_attrs_names_first_empty_attribute() {
        let mut rc = RawCred::new(AttrCount::new(2, 0, 0));
        rc.add_empty_attr("b", 1, true, AttrType::Int64).unwrap();
        rc.add_empty_attr("a", 0, true, AttrType::Int64).unwrap();
        rc.update_attr("b", 2).unwrap();

        let err = rc.missing_attrs().unwrap_err();
        assert_eq!(AnonCredsErrorKind::Attribute, err.kind());
        assert!(err.message().contains("'a'"));

        rc.update_attr("a", 1).unwrap();
        rc.missing_attrs().unwrap();
    }

    #[test]
    fn values_are_ordered_by_index() {
        let mut rc = RawCred::new(AttrCount::new(2, 2, 0));
        rc.add_empty_attr("k2", 3, true, AttrType::Int64).unwrap();
        rc.add_empty_attr("c1", 1, false, AttrType::Int64).unwrap();
        rc.add_empty_attr("k1", 0, true, AttrType::Int64).unwrap();
        rc.add_empty_attr("c2", 2, false, AttrType::Int64).unwrap();

        rc.update_attr("c2", 22).unwrap();
        rc.update_attr("k2", 12).unwrap();
        rc.update_attr("c1", 21).unwrap();
        rc.update_attr("k1", 11).unwrap();

        let known: Vec<i64> = rc.known_values().unwrap().iter().map(|v| v.to_i64().unwrap()).collect();
        let committed: Vec<i64> = rc.committed_values().unwrap().iter().map(|v| v.to_i64().unwrap()).collect();
        assert_eq!(vec![11, 12], known);
        assert_eq!(vec![21, 22], committed);

        assert_eq!((true, 1), rc.partition_position("k2").unwrap());
        assert_eq!((false, 0), rc.partition_position("c1").unwrap());
        assert_eq!((false, 1), rc.partition_position("c2").unwrap());
    }
}
