use crate::bn::BigNumber;
use crate::errors::prelude::*;

use serde_json::Value;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of Known, Committed and Hidden attributes of a credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrCount {
    pub known: usize,
    pub committed: usize,
    pub hidden: usize,
}

impl AttrCount {
    pub fn new(known: usize, committed: usize, hidden: usize) -> AttrCount {
        AttrCount {
            known,
            committed,
            hidden,
        }
    }
}

impl fmt::Display for AttrCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "known: {}, committed: {}, hidden: {}",
            self.known, self.committed, self.hidden
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "string")]
    String,
}

impl FromStr for AttrType {
    type Err = AnonCredsError;

    fn from_str(s: &str) -> AnonCredsResult<AttrType> {
        match s {
            "int64" => Ok(AttrType::Int64),
            "string" => Ok(AttrType::String),
            other => Err(err_msg(
                AnonCredsErrorKind::Config,
                format!("Unsupported attribute type: {}", other),
            )),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttrType::Int64 => write!(f, "int64"),
            AttrType::String => write!(f, "string"),
        }
    }
}

/// Relation between a reference value and the attribute value. `Gte` holds
/// when `reference >= value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrCond {
    Lt,
    Lte,
    Gt,
    Gte,
    Equal,
    None,
}

impl FromStr for AttrCond {
    type Err = AnonCredsError;

    fn from_str(s: &str) -> AnonCredsResult<AttrCond> {
        match s {
            "lt" => Ok(AttrCond::Lt),
            "lte" => Ok(AttrCond::Lte),
            "gt" => Ok(AttrCond::Gt),
            "gte" => Ok(AttrCond::Gte),
            "equal" => Ok(AttrCond::Equal),
            "none" => Ok(AttrCond::None),
            other => Err(err_msg(
                AnonCredsErrorKind::Config,
                format!("Invalid condition '{}'", other),
            )),
        }
    }
}

impl fmt::Display for AttrCond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AttrCond::Lt => "lt",
            AttrCond::Lte => "lte",
            AttrCond::Gt => "gt",
            AttrCond::Gte => "gte",
            AttrCond::Equal => "equal",
            AttrCond::None => "none",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Text(String),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Int(_) => AttrType::Int64,
            AttrValue::Text(_) => AttrType::String,
        }
    }

    /// Integers map directly, text maps to its UTF-8 bytes read as a
    /// big-endian number.
    pub fn to_internal(&self) -> AnonCredsResult<BigNumber> {
        match self {
            AttrValue::Int(v) => Ok(BigNumber::from_i64(*v)),
            AttrValue::Text(s) => BigNumber::from_bytes(s.as_bytes()),
        }
    }

    pub fn from_internal(attr_type: AttrType, value: &BigNumber) -> AnonCredsResult<AttrValue> {
        match attr_type {
            AttrType::Int64 => Ok(AttrValue::Int(value.to_i64()?)),
            AttrType::String if value.is_zero() => Ok(AttrValue::Text(String::new())),
            AttrType::String => String::from_utf8(value.to_bytes()?)
                .map(AttrValue::Text)
                .map_err(|err| {
                    err_msg(
                        AnonCredsErrorKind::Attribute,
                        format!("Value is not valid UTF-8 text: {}", err),
                    )
                }),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> AttrValue {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> AttrValue {
        AttrValue::Int(i64::from(v))
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> AttrValue {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> AttrValue {
        AttrValue::Text(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One named, typed slot of a credential schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    index: usize,
    known: bool,
    cond: AttrCond,
    attr_type: AttrType,
    value: Option<AttrValue>,
}

impl Attribute {
    pub fn new(name: &str, index: usize, known: bool, attr_type: AttrType) -> Attribute {
        Attribute {
            name: name.to_string(),
            index,
            known,
            cond: AttrCond::None,
            attr_type,
            value: None,
        }
    }

    pub fn with_cond(mut self, cond: AttrCond) -> Attribute {
        self.cond = cond;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn cond(&self) -> AttrCond {
        self.cond
    }

    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }

    pub fn value(&self) -> Option<&AttrValue> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn update_value(&mut self, value: AttrValue) -> AnonCredsResult<()> {
        if value.attr_type() != self.attr_type {
            return Err(err_msg(
                AnonCredsErrorKind::Attribute,
                format!(
                    "Attribute '{}' expects {} value, got {}",
                    self.name,
                    self.attr_type,
                    value.attr_type()
                ),
            ));
        }
        self.value = Some(value);
        Ok(())
    }

    /// Big number encoding of the current value.
    pub fn internal_value(&self) -> AnonCredsResult<BigNumber> {
        match self.value {
            Some(ref value) => value.to_internal(),
            None => Err(err_msg(
                AnonCredsErrorKind::Attribute,
                format!("Attribute '{}' has no value", self.name),
            )),
        }
    }

    /// Evaluates the configured condition with `reference` on the left hand
    /// side. Text attributes support only `equal`.
    pub fn validate_against(&self, reference: &AttrValue) -> AnonCredsResult<bool> {
        trace!(
            "Attribute::validate_against: >>> name: {:?}, cond: {}, reference: {:?}",
            self.name,
            self.cond,
            reference
        );

        let value = self.value.as_ref().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::Attribute,
                format!("Attribute '{}' has no value", self.name),
            )
        })?;

        let res = match (value, reference) {
            (AttrValue::Int(value), AttrValue::Int(reference)) => match self.cond {
                AttrCond::Gt => reference > value,
                AttrCond::Gte => reference >= value,
                AttrCond::Lt => reference < value,
                AttrCond::Lte => reference <= value,
                AttrCond::Equal => reference == value,
                AttrCond::None => return Err(invalid_condition(&self.name, self.cond)),
            },
            (AttrValue::Text(value), AttrValue::Text(reference)) => match self.cond {
                AttrCond::Equal => reference == value,
                cond => return Err(invalid_condition(&self.name, cond)),
            },
            _ => {
                return Err(err_msg(
                    AnonCredsErrorKind::Attribute,
                    format!(
                        "Value provided for '{}' is not {}",
                        self.name, self.attr_type
                    ),
                ))
            }
        };

        trace!("Attribute::validate_against: <<< res: {}", res);

        Ok(res)
    }
}

fn invalid_condition(name: &str, cond: AttrCond) -> AnonCredsError {
    err_msg(
        AnonCredsErrorKind::Condition,
        format!("Invalid condition '{}' for attribute '{}'", cond, name),
    )
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = if self.known { "known" } else { "committed" };
        write!(
            f,
            "{} ({}), type = {}, cond = {}",
            self.name, tag, self.attr_type, self.cond
        )
    }
}

/// Attribute declaration as found in the server configuration.
///
/// Fields are kept loosely typed so that malformed declarations surface as
/// configuration errors naming the offending attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    #[serde(default)]
    pub index: Option<Value>,
    #[serde(default, rename = "type")]
    pub attr_type: Option<String>,
    #[serde(default)]
    pub known: Option<Value>,
    #[serde(default)]
    pub cond: Option<String>,
}

/// Turns a name -> declaration map into attributes ordered by index.
pub fn parse_attrs(
    specs: &BTreeMap<String, AttrSpec>,
) -> AnonCredsResult<(Vec<Attribute>, AttrCount)> {
    trace!("parse_attrs: >>> specs: {:?}", specs);

    let mut attrs: Vec<Option<Attribute>> = vec![None; specs.len()];
    let mut count = AttrCount::default();

    for (name, spec) in specs {
        let config_err = |msg: &str| {
            err_msg(
                AnonCredsErrorKind::Config,
                format!("Attribute '{}': {}", name, msg),
            )
        };

        let index = spec
            .index
            .as_ref()
            .ok_or_else(|| config_err("missing index"))?
            .as_u64()
            .ok_or_else(|| config_err("index must be a non-negative integer"))?
            as usize;
        if index >= attrs.len() {
            return Err(config_err("index too large for the number of attributes"));
        }
        if attrs[index].is_some() {
            return Err(config_err("duplicate index"));
        }

        let attr_type = spec
            .attr_type
            .as_ref()
            .ok_or_else(|| config_err("missing type specifier"))?
            .parse::<AttrType>()?;

        let known = match spec.known {
            None => true,
            Some(Value::Bool(known)) => known,
            Some(Value::String(ref known)) => known
                .parse::<bool>()
                .map_err(|_| config_err("known must be true or false"))?,
            Some(_) => return Err(config_err("known must be true or false")),
        };

        let cond = match spec.cond {
            Some(ref cond) => cond.parse::<AttrCond>()?,
            None => AttrCond::None,
        };

        if known {
            count.known += 1;
        } else {
            count.committed += 1;
        }

        attrs[index] = Some(Attribute::new(name, index, known, attr_type).with_cond(cond));
    }

    // every slot is filled: indices are unique and below the attribute count
    let attrs: Vec<Attribute> = attrs.into_iter().flatten().collect();

    trace!("parse_attrs: <<< count: {}", count);

    Ok((attrs, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(json: &str) -> BTreeMap<String, AttrSpec> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parse_attrs_orders_by_index() {
        let specs = spec(
            r#"{
                "name": {"index": 2, "type": "string", "known": "true"},
                "age": {"index": 0, "type": "int64", "cond": "gte"},
                "gender": {"index": 1, "type": "string", "known": false}
            }"#,
        );
        let (attrs, count) = parse_attrs(&specs).unwrap();

        let names: Vec<&str> = attrs.iter().map(|a| a.name()).collect();
        assert_eq!(vec!["age", "gender", "name"], names);
        assert_eq!(AttrCount::new(2, 1, 0), count);
        assert_eq!(AttrCond::Gte, attrs[0].cond());
        assert_eq!(AttrCond::None, attrs[2].cond());
        assert!(!attrs[1].is_known());
    }

    #[test]
    fn parse_attrs_rejects_bad_specs() {
        let cases = vec![
            r#"{"a": {"type": "string"}}"#,
            r#"{"a": {"index": "0", "type": "string"}}"#,
            r#"{"a": {"index": 1, "type": "string"}}"#,
            r#"{"a": {"index": 0, "type": "string"}, "b": {"index": 0, "type": "int64"}}"#,
            r#"{"a": {"index": 0, "type": "float"}}"#,
            r#"{"a": {"index": 0}}"#,
            r#"{"a": {"index": 0, "type": "int64", "known": "maybe"}}"#,
            r#"{"a": {"index": 0, "type": "int64", "cond": "between"}}"#,
        ];
        for case in cases {
            let err = parse_attrs(&spec(case)).unwrap_err();
            assert_eq!(AnonCredsErrorKind::Config, err.kind(), "{}", case);
        }
    }

    #[test]
    fn update_value_checks_type() {
        let mut attr = Attribute::new("age", 0, true, AttrType::Int64);
        assert!(!attr.has_value());
        assert!(attr.internal_value().is_err());

        let err = attr.update_value("old".into()).unwrap_err();
        assert_eq!(AnonCredsErrorKind::Attribute, err.kind());

        attr.update_value(42.into()).unwrap();
        assert_eq!(BigNumber::from_u32(42).unwrap(), attr.internal_value().unwrap());
    }

    #[test]
    fn internal_value_follows_value() {
        let mut attr = Attribute::new("name", 0, true, AttrType::String);
        attr.update_value("Jack".into()).unwrap();
        let jack = attr.internal_value().unwrap();
        assert_eq!(BigNumber::from_bytes(b"Jack").unwrap(), jack);

        attr.update_value("Jim".into()).unwrap();
        assert_ne!(jack, attr.internal_value().unwrap());
        assert_eq!(
            AttrValue::Text("Jim".to_string()),
            AttrValue::from_internal(AttrType::String, &attr.internal_value().unwrap()).unwrap()
        );
    }

    #[test]
    fn internal_encoding_decodes() {
        let value = AttrValue::Int(-1512643000);
        let internal = value.to_internal().unwrap();
        assert_eq!(value, AttrValue::from_internal(AttrType::Int64, &internal).unwrap());

        let empty = AttrValue::Text(String::new());
        let internal = empty.to_internal().unwrap();
        assert_eq!(empty, AttrValue::from_internal(AttrType::String, &internal).unwrap());
    }

    #[test]
    fn validate_against_int_conditions() {
        let mut attr = Attribute::new("date_from", 0, true, AttrType::Int64);
        attr.update_value(1512643000.into()).unwrap();

        let cases = vec![
            (AttrCond::Gte, 1512643000, true),
            (AttrCond::Gte, 1512642999, false),
            (AttrCond::Gt, 1512643000, false),
            (AttrCond::Lt, 1512642999, true),
            (AttrCond::Lte, 1512643001, false),
            (AttrCond::Equal, 1512643000, true),
        ];
        for (cond, reference, expected) in cases {
            let attr = attr.clone().with_cond(cond);
            assert_eq!(
                expected,
                attr.validate_against(&AttrValue::Int(reference)).unwrap(),
                "{} {}",
                cond,
                reference
            );
        }

        let attr = attr.with_cond(AttrCond::None);
        assert!(attr.validate_against(&AttrValue::Int(0)).is_err());
    }

    #[test]
    fn validate_against_text_requires_equal() {
        let mut attr = Attribute::new("name", 0, true, AttrType::String).with_cond(AttrCond::Equal);
        attr.update_value("Jack".into()).unwrap();

        assert!(attr.validate_against(&"Jack".into()).unwrap());
        assert!(!attr.validate_against(&"Jim".into()).unwrap());
        assert_eq!(
            AnonCredsErrorKind::Attribute,
            attr.validate_against(&AttrValue::Int(1)).unwrap_err().kind()
        );

        let attr = attr.with_cond(AttrCond::Lt);
        assert!(attr.validate_against(&"Jack".into()).is_err());
    }

    #[test]
    fn attr_value_json_is_untagged() {
        let values: BTreeMap<String, AttrValue> =
            serde_json::from_str(r#"{"date_from": 1512643000, "name": "Jack"}"#).unwrap();
        assert_eq!(AttrValue::Int(1512643000), values["date_from"]);
        assert_eq!(AttrValue::Text("Jack".to_string()), values["name"]);
    }
}
