//! Canonical PII label registry.
//!
//! Every span that enters the masking core carries exactly one of these
//! labels. Detector-specific label strings are mapped to canonical labels
//! at the boundary; anything that cannot be mapped is rejected before it
//! reaches the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumIter;

/// Canonical PII category emitted by the masking pipeline.
///
/// The set is closed: spans with labels outside this enum are rejected at
/// the input boundary. Variants serialize to SCREAMING_SNAKE_CASE strings,
/// which are also the label parts of placeholder tags (`[EMAIL_ADDRESS_1]`).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    // Identity
    Person,
    Org,

    // Contact
    EmailAddress,
    UkPhoneNumber,
    IpAddress,

    // Time
    Date,
    DateOfBirth,

    // Geography
    Location,
    UkPostcode,
    UkAddress,

    // Banking
    UkSortCode,
    UkAccountNumber,
    UkIban,

    // Cards
    CreditCardNumber,
    CardExpiry,

    // Opaque identifiers
    TransactionId,
    CustomerReference,
    SessionId,
    SupportTicketNumber,
    AccountId,
    InternalId,
}

impl Label {
    /// Returns the string representation of this label.
    ///
    /// This matches the serialized form and the label part of minted tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Org => "ORG",
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::UkPhoneNumber => "UK_PHONE_NUMBER",
            Self::IpAddress => "IP_ADDRESS",
            Self::Date => "DATE",
            Self::DateOfBirth => "DATE_OF_BIRTH",
            Self::Location => "LOCATION",
            Self::UkPostcode => "UK_POSTCODE",
            Self::UkAddress => "UK_ADDRESS",
            Self::UkSortCode => "UK_SORT_CODE",
            Self::UkAccountNumber => "UK_ACCOUNT_NUMBER",
            Self::UkIban => "UK_IBAN",
            Self::CreditCardNumber => "CREDIT_CARD_NUMBER",
            Self::CardExpiry => "CARD_EXPIRY",
            Self::TransactionId => "TRANSACTION_ID",
            Self::CustomerReference => "CUSTOMER_REFERENCE",
            Self::SessionId => "SESSION_ID",
            Self::SupportTicketNumber => "SUPPORT_TICKET_NUMBER",
            Self::AccountId => "ACCOUNT_ID",
            Self::InternalId => "INTERNAL_ID",
        }
    }

    /// Overlap-resolution priority (higher wins).
    ///
    /// This is the domain policy table: when two candidate spans overlap,
    /// the label with the higher priority is kept regardless of which
    /// detector produced either span or how confident it was. Structured
    /// financial identifiers outrank the broader categories they tend to
    /// be nested inside (an account number inside an IBAN loses to the
    /// IBAN).
    pub fn priority(&self) -> u8 {
        match self {
            Self::UkIban => 120,
            Self::CreditCardNumber => 115,
            Self::UkSortCode => 110,
            Self::UkAccountNumber => 108,
            Self::CardExpiry => 105,

            Self::EmailAddress => 95,
            Self::IpAddress => 95,
            Self::UkPhoneNumber => 92,

            Self::UkAddress => 88,
            Self::UkPostcode => 85,

            Self::TransactionId => 75,
            Self::SupportTicketNumber => 74,
            Self::SessionId => 73,
            Self::CustomerReference => 72,
            Self::AccountId => 71,
            Self::InternalId => 70,

            Self::DateOfBirth => 55,
            Self::Date => 50,
            Self::Person => 40,
            Self::Org => 35,

            // Bare place names carry the least signal of any category;
            // anything overlapping a LOCATION keeps its span instead.
            Self::Location => 0,
        }
    }

    /// Format the placeholder tag for the `n`-th distinct value of this label.
    pub fn tag(&self, n: u32) -> String {
        format!("[{}_{}]", self.as_str(), n)
    }

    /// Parse a placeholder tag like `[EMAIL_ADDRESS_2]` back into its label.
    ///
    /// Returns `None` if the string is not a well-formed tag.
    pub fn from_tag(tag: &str) -> Option<Label> {
        let inner = tag.strip_prefix('[')?.strip_suffix(']')?;
        let (label_part, counter) = inner.rsplit_once('_')?;
        counter.parse::<u32>().ok()?;
        label_part.parse().ok()
    }

    /// Map a detector-emitted label string to its canonical label.
    ///
    /// Detector vocabularies are looser than the canonical registry
    /// (e.g. `"email"`, `"mobile"`, `"city"`). Matching is case-insensitive.
    /// Returns `None` for anything outside the known vocabulary; callers
    /// must reject such detections at the boundary.
    pub fn from_detector(raw: &str) -> Option<Label> {
        let key = raw.trim().to_lowercase();
        let label = match key.as_str() {
            // People & orgs
            "person" | "name" | "first_name" | "last_name" => Self::Person,
            "organization" | "organisation" | "company" | "org" => Self::Org,

            // Contact
            "email" | "email_address" => Self::EmailAddress,
            "phone" | "phone_number" | "mobile" => Self::UkPhoneNumber,

            // Network
            "ip" | "ip_address" => Self::IpAddress,

            // Dates
            "date" | "date_time" | "datetime" => Self::Date,
            "date_of_birth" | "dob" => Self::DateOfBirth,

            // Geography: full addresses are their own PII type; individual
            // place names fall back to LOCATION.
            "address" | "street_address" | "full_address" => Self::UkAddress,
            "location" | "city" | "town" | "state" | "province" | "region" | "country"
            | "place" => Self::Location,
            "postcode" | "uk_postcode" => Self::UkPostcode,

            // Banking
            "uk_iban" | "iban" => Self::UkIban,
            "sort_code" | "uk_sort_code" => Self::UkSortCode,
            "account_number" | "uk_account_number" => Self::UkAccountNumber,

            // Cards
            "credit_card_number" | "card_number" => Self::CreditCardNumber,
            "card_expiry" | "expiry" | "expiration_date" => Self::CardExpiry,

            // Opaque identifiers
            "transaction_id" => Self::TransactionId,
            "support_ticket_number" => Self::SupportTicketNumber,
            "session_id" => Self::SessionId,
            "customer_reference" => Self::CustomerReference,
            "account_id" => Self::AccountId,
            "internal_id" => Self::InternalId,

            _ => return None,
        };
        Some(label)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSON" => Ok(Self::Person),
            "ORG" => Ok(Self::Org),
            "EMAIL_ADDRESS" => Ok(Self::EmailAddress),
            "UK_PHONE_NUMBER" => Ok(Self::UkPhoneNumber),
            "IP_ADDRESS" => Ok(Self::IpAddress),
            "DATE" => Ok(Self::Date),
            "DATE_OF_BIRTH" => Ok(Self::DateOfBirth),
            "LOCATION" => Ok(Self::Location),
            "UK_POSTCODE" => Ok(Self::UkPostcode),
            "UK_ADDRESS" => Ok(Self::UkAddress),
            "UK_SORT_CODE" => Ok(Self::UkSortCode),
            "UK_ACCOUNT_NUMBER" => Ok(Self::UkAccountNumber),
            "UK_IBAN" => Ok(Self::UkIban),
            "CREDIT_CARD_NUMBER" => Ok(Self::CreditCardNumber),
            "CARD_EXPIRY" => Ok(Self::CardExpiry),
            "TRANSACTION_ID" => Ok(Self::TransactionId),
            "CUSTOMER_REFERENCE" => Ok(Self::CustomerReference),
            "SESSION_ID" => Ok(Self::SessionId),
            "SUPPORT_TICKET_NUMBER" => Ok(Self::SupportTicketNumber),
            "ACCOUNT_ID" => Ok(Self::AccountId),
            "INTERNAL_ID" => Ok(Self::InternalId),
            _ => Err(()),
        }
    }
}
