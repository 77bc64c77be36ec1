//! Product code and UPC-A / EAN-13 barcode generation
//!
//! A variant carries three codes: a random 5-digit product code, a 12-digit
//! UPC-A (`producer(6) + product(5) + check`) and a 13-digit EAN-13
//! (`country(3) + producer(6) + product[..3] + check`).

use rand::Rng;

use crate::error::{CatalogError, Result};

pub const DEFAULT_PRODUCER_CODE: &str = "123456";
pub const DEFAULT_COUNTRY_CODE: &str = "869";

pub const PRODUCT_CODE_LEN: usize = 5;
pub const UPC_LEN: usize = 12;
pub const EAN13_LEN: usize = 13;

const PRODUCT_CODE_MIN: u32 = 10_000;
const PRODUCT_CODE_MAX: u32 = 99_999;

/// Producer and country prefixes used when generating codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeSettings {
    pub producer_code: String,
    pub country_code: String,
}

impl CodeSettings {
    pub fn new(producer_code: impl Into<String>, country_code: impl Into<String>) -> Result<Self> {
        let settings = Self { producer_code: producer_code.into(), country_code: country_code.into() };
        expect_digits(&settings.producer_code, 6)?;
        expect_digits(&settings.country_code, 3)?;
        Ok(settings)
    }
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self { producer_code: DEFAULT_PRODUCER_CODE.to_string(), country_code: DEFAULT_COUNTRY_CODE.to_string() }
    }
}

/// Uniformly random code in `10000..=99999`. Not unique on its own.
pub fn generate_product_code() -> String {
    rand::thread_rng().gen_range(PRODUCT_CODE_MIN..=PRODUCT_CODE_MAX).to_string()
}

/// GS1 modulo-10 check digit.
///
/// Weights alternate 3, 1, 3, ... starting from the rightmost digit, so the
/// digit next to the check position always carries weight 3. For an even
/// length base (EAN-13) that puts weight 1 on even indices and 3 on odd ones;
/// for an odd length base (UPC-A) it is the other way round.
pub fn check_digit(digits: &str) -> Result<u8> {
    if digits.is_empty() {
        return Err(CatalogError::InvalidInput("empty digit string".into()));
    }
    let mut total: u32 = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let d = c
            .to_digit(10)
            .ok_or_else(|| CatalogError::InvalidInput(format!("non-digit character {c:?} in {digits:?}")))?;
        total = (total + if i % 2 == 0 { d * 3 } else { d }) % 10;
    }
    Ok(((10 - total) % 10) as u8)
}

pub fn generate_upc(product_code: &str, producer_code: &str) -> Result<String> {
    let base = format!("{producer_code}{product_code}");
    append_check_digit(base, UPC_LEN)
}

/// Only the first three characters of `product_code` enter the EAN-13.
pub fn generate_ean13(product_code: &str, producer_code: &str, country_code: &str) -> Result<String> {
    let prefix: String = product_code.chars().take(3).collect();
    let base = format!("{country_code}{producer_code}{prefix}");
    append_check_digit(base, EAN13_LEN)
}

/// True when the last digit of `code` is the check digit of the rest.
pub fn verify_check_digit(code: &str) -> Result<bool> {
    let Some(last) = code.chars().last() else {
        return Err(CatalogError::InvalidInput("empty digit string".into()));
    };
    let body = &code[..code.len() - last.len_utf8()];
    let expected = check_digit(body)?;
    let actual = last
        .to_digit(10)
        .ok_or_else(|| CatalogError::InvalidInput(format!("non-digit character {last:?} in {code:?}")))?;
    Ok(actual == u32::from(expected))
}

fn append_check_digit(mut base: String, total_len: usize) -> Result<String> {
    let actual = base.chars().count();
    if actual != total_len - 1 {
        return Err(CatalogError::InvalidLength { expected: total_len - 1, actual });
    }
    let check = check_digit(&base)?;
    base.push(char::from(b'0' + check));
    Ok(base)
}

pub(crate) fn expect_digits(value: &str, len: usize) -> Result<()> {
    let actual = value.chars().count();
    if actual != len {
        return Err(CatalogError::InvalidLength { expected: len, actual });
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(CatalogError::InvalidInput(format!("{value:?} must contain only numbers")));
    }
    Ok(())
}
