//! Product variant and its generated codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::barcode::{self, CodeSettings};
use crate::domain::value_objects::{Ean13, ProductCode, Upc};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub product_code: Option<String>,
    pub upc_code: Option<String>,
    pub ean13_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductVariant {
    pub fn create(product_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(), product_id, name: name.into(), product_code: None,
            upc_code: None, ean13_code: None, created_at: Utc::now(),
        }
    }

    /// Reject caller-supplied codes that are malformed.
    pub fn validate_codes(&self) -> Result<()> {
        if let Some(code) = &self.product_code { ProductCode::new(code.as_str())?; }
        if let Some(upc) = &self.upc_code { Upc::parse(upc.as_str())?; }
        if let Some(ean) = &self.ean13_code { Ean13::parse(ean.as_str())?; }
        Ok(())
    }

    pub fn has_all_codes(&self) -> bool {
        self.product_code.is_some() && self.upc_code.is_some() && self.ean13_code.is_some()
    }

    /// Fill empty code fields; assigned codes are never touched. Returns
    /// whether anything changed.
    pub fn assign_codes_if_missing(&mut self, settings: &CodeSettings) -> Result<bool> {
        if self.has_all_codes() { return Ok(false); }
        let product_code = match &self.product_code {
            Some(code) => code.clone(),
            None => {
                let code = barcode::generate_product_code();
                self.product_code = Some(code.clone());
                code
            }
        };
        if self.upc_code.is_none() {
            self.upc_code = Some(barcode::generate_upc(&product_code, &settings.producer_code)?);
        }
        if self.ean13_code.is_none() {
            self.ean13_code = Some(barcode::generate_ean13(&product_code, &settings.producer_code, &settings.country_code)?);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::barcode::verify_check_digit;

    #[test]
    fn test_assign_all_codes() {
        let mut v = ProductVariant::create(Uuid::new_v4(), "Red / XL");
        assert!(v.assign_codes_if_missing(&CodeSettings::default()).unwrap());
        let code = v.product_code.clone().unwrap();
        let upc = v.upc_code.clone().unwrap();
        let ean = v.ean13_code.clone().unwrap();
        assert_eq!(upc, format!("123456{code}{}", &upc[11..]));
        assert!(verify_check_digit(&upc).unwrap());
        assert!(ean.starts_with(&format!("869123456{}", &code[..3])));
        assert!(verify_check_digit(&ean).unwrap());
        v.validate_codes().unwrap();
    }

    #[test]
    fn test_existing_codes_kept() {
        let mut v = ProductVariant::create(Uuid::new_v4(), "Blue");
        v.product_code = Some("78901".into());
        v.upc_code = Some("036000291452".into());
        assert!(v.assign_codes_if_missing(&CodeSettings::new("654321", "400").unwrap()).unwrap());
        assert_eq!(v.product_code.as_deref(), Some("78901"));
        assert_eq!(v.upc_code.as_deref(), Some("036000291452"));
        assert_eq!(v.ean13_code.as_deref(), Some(barcode::generate_ean13("78901", "654321", "400").unwrap().as_str()));

        let before = v.clone();
        assert!(!v.assign_codes_if_missing(&CodeSettings::default()).unwrap());
        assert_eq!(v, before);
    }

    #[test]
    fn test_validate_codes_rejects_bad_upc() {
        let mut v = ProductVariant::create(Uuid::new_v4(), "Green");
        v.upc_code = Some("12345".into());
        assert!(v.validate_codes().is_err());
    }
}
