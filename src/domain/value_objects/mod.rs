//! Value Objects for the catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::barcode::{self, EAN13_LEN, PRODUCT_CODE_LEN, UPC_LEN};
use crate::error::{CatalogError, Result};

/// 5-digit product code
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductCode(String);

impl ProductCode {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        barcode::expect_digits(&value, PRODUCT_CODE_LEN)?;
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// 12-digit UPC-A with a valid check digit
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Upc(String);

impl Upc {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_upc(&value)?;
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// 13-digit EAN-13 with a valid check digit
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ean13(String);

impl Ean13 {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_ean13(&value)?;
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
impl fmt::Display for Upc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
impl fmt::Display for Ean13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

pub fn validate_upc(value: &str) -> Result<()> {
    validate_barcode(value, UPC_LEN)
}

pub fn validate_ean13(value: &str) -> Result<()> {
    validate_barcode(value, EAN13_LEN)
}

fn validate_barcode(value: &str, len: usize) -> Result<()> {
    barcode::expect_digits(value, len)?;
    if !barcode::verify_check_digit(value)? {
        return Err(CatalogError::InvalidInput(format!("{value:?} has a wrong check digit")));
    }
    Ok(())
}

/// Kind of a gallery entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Image => "image", Self::Video => "video" }
    }
}

impl FromStr for MediaType {
    type Err = CatalogError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(CatalogError::InvalidMediaType(other.to_string())),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
