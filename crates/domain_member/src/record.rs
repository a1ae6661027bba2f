//! Extracted member records
//!
//! An [`ExtractedMemberRecord`] is whatever the extraction service managed to
//! read from one PDF. Every field is optional on its own: a contract usually
//! has no ledger, a statement usually has no bank details, and either may be
//! missing fields the other one has.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MemberError;

/// Which upload channel a document came through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Membership contract
    Membership,
    /// Account statement
    Statement,
}

impl SourceRole {
    pub const ALL: [SourceRole; 2] = [SourceRole::Membership, SourceRole::Statement];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceRole::Membership => "membership",
            SourceRole::Statement => "statement",
        }
    }

    /// The other slot
    pub fn sibling(&self) -> SourceRole {
        match self {
            SourceRole::Membership => SourceRole::Statement,
            SourceRole::Statement => SourceRole::Membership,
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceRole {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "membership" | "contract" => Ok(SourceRole::Membership),
            "statement" | "account_statement" => Ok(SourceRole::Statement),
            other => Err(MemberError::UnknownRole(other.to_string())),
        }
    }
}

/// A contribution already paid, as listed on the statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidContribution {
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
}

/// A future or still open contribution ("Forderung") for a billing period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenContribution {
    #[serde(with = "flexible_date")]
    pub period_start: NaiveDate,
    #[serde(with = "flexible_date")]
    pub period_end: NaiveDate,
    #[serde(default)]
    pub description: String,
    /// Amount claimed for the period
    pub claim_amount: Decimal,
    /// Part of the claim not yet settled
    pub open_amount: Decimal,
}

/// Fields read from one source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedMemberRecord {
    pub name: Option<String>,
    #[serde(with = "flexible_date::option")]
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub member_number: Option<String>,
    pub contract_tariff: Option<String>,
    pub contract_price: Option<Decimal>,
    #[serde(with = "flexible_date::option")]
    pub contract_start_date: Option<NaiveDate>,
    /// Free text as printed, e.g. "12 Monate"
    pub contract_duration: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub bank_name: Option<String>,
    pub mandate_reference: Option<String>,
    /// Signed balance; negative means arrears
    pub account_balance: Option<Decimal>,
    pub paid_contributions: Vec<PaidContribution>,
    pub future_contributions: Vec<OpenContribution>,
    pub setup_fee: Option<Decimal>,
    pub administration_fee: Option<Decimal>,
    pub freezing_fee: Option<Decimal>,
}

impl ExtractedMemberRecord {
    /// True when the record carries any ledger lines
    pub fn has_ledger(&self) -> bool {
        !self.paid_contributions.is_empty() || !self.future_contributions.is_empty()
    }

    /// Member number with surrounding whitespace removed, `None` when blank
    pub fn normalized_member_number(&self) -> Option<&str> {
        self.member_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Contract duration in months when the printed text starts with a number
    pub fn contract_duration_months(&self) -> Option<u32> {
        let text = self.contract_duration.as_deref()?.trim();
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

/// Dates arrive either ISO formatted or in the German `dd.mm.yyyy` form
/// printed on the documents. Serialization always writes ISO.
mod flexible_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("Invalid date: {}", raw)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Unreadable dates become `None`; extraction fidelity varies
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            Ok(raw.as_deref().and_then(parse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Membership".parse::<SourceRole>().unwrap(), SourceRole::Membership);
        assert_eq!("statement".parse::<SourceRole>().unwrap(), SourceRole::Statement);
        assert!("invoice".parse::<SourceRole>().is_err());
        assert_eq!(SourceRole::Statement.to_string(), "statement");
        assert_eq!(SourceRole::Membership.sibling(), SourceRole::Statement);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "memberNumber": "123",
            "contractTariff": "Premium",
            "contractPrice": 39.90,
            "contractStartDate": "01.03.2024",
            "birthDate": "not a date",
            "paidContributions": [
                {"date": "2024-03-01", "description": "Beitrag März", "amount": "39.90"}
            ]
        }"#;

        let record: ExtractedMemberRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.member_number.as_deref(), Some("123"));
        assert_eq!(record.contract_price, Some(dec!(39.90)));
        assert_eq!(record.contract_start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(record.birth_date, None);
        assert_eq!(record.paid_contributions.len(), 1);
        assert!(record.has_ledger());
        assert!(record.future_contributions.is_empty());
    }

    #[test]
    fn test_normalized_member_number() {
        let record = ExtractedMemberRecord {
            member_number: Some("  4711 ".to_string()),
            ..Default::default()
        };
        assert_eq!(record.normalized_member_number(), Some("4711"));

        let blank = ExtractedMemberRecord {
            member_number: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.normalized_member_number(), None);
    }

    #[test]
    fn test_contract_duration_months() {
        let record = ExtractedMemberRecord {
            contract_duration: Some("24 Monate".to_string()),
            ..Default::default()
        };
        assert_eq!(record.contract_duration_months(), Some(24));

        let unknown = ExtractedMemberRecord {
            contract_duration: Some("unbefristet".to_string()),
            ..Default::default()
        };
        assert_eq!(unknown.contract_duration_months(), None);
    }
}
