mod client;
mod named;
mod tax_return;
mod value;

pub use client::{Client, ClientField, ClientUpdate, INCOME_SCALE, NewClient, validate_income};
pub use named::{Assistant, Preparer};
pub use tax_return::{NewTaxReturn, TaxReturn, TaxReturnField, TaxReturnUpdate};
