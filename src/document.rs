//! Document types persisted by the approval core
use super::error::ValidationError;
use super::workflow::{self, ExitStage, Outcome, PaymentStage, StageFlow};
use chrono::{DateTime, TimeZone, Utc};
use uuid7::uuid7;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The two concrete document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Payment,
    Exit,
}

impl DocKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Payment => "payment order",
            Self::Exit => "exit permit",
        }
    }
}

/// Set once when a document moves to `Rejected`; never cleared and
/// never overwritten by a later rejection.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct RejectionInfo {
    #[n(0)]
    pub reason: String,
    #[n(1)]
    pub rejected_by: String,
    #[n(2)]
    pub rejected_at: TimeStamp<Utc>,
}

impl RejectionInfo {
    pub fn new(reason: &str, rejected_by: &str) -> Self {
        Self {
            reason: reason.to_string(),
            rejected_by: rejected_by.to_string(),
            rejected_at: TimeStamp::new(),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    #[n(0)]
    pub id: String, // uuid7, immutable
    #[n(1)]
    pub tracking_number: u32, // assigned once at creation, immutable
    #[n(2)]
    pub stage: PaymentStage,
    #[n(3)]
    pub payee: String,
    #[n(4)]
    pub amount: u64,
    #[n(5)]
    pub description: String,
    #[n(6)]
    pub bank: Option<String>,
    #[n(7)]
    pub rejection: Option<RejectionInfo>,
    #[n(8)]
    pub created_by: String,
    #[n(9)]
    pub created_at: TimeStamp<Utc>,
}

impl PaymentOrder {
    pub fn new(
        tracking_number: u32,
        payee: &str,
        amount: u64,
        description: &str,
        created_by: &str,
    ) -> Self {
        Self {
            id: uuid7().to_string(),
            tracking_number,
            stage: PaymentStage::first(),
            payee: payee.to_string(),
            amount,
            description: description.to_string(),
            bank: None,
            rejection: None,
            created_by: created_by.to_string(),
            created_at: TimeStamp::new(),
        }
    }
    pub fn set_bank(mut self, bank: Option<String>) -> Self {
        self.bank = bank;
        self
    }
    /// Checks payload fields before the order is first persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        if self.payee.trim().is_empty() {
            return Err(ValidationError::EmptyPayee);
        }
        Ok(())
    }

    pub fn advance(&mut self) -> Outcome {
        let (stage, outcome) = workflow::advance(self.stage);
        self.stage = stage;
        outcome
    }

    pub fn reject(&mut self, reason: &str, principal: &str) -> Outcome {
        let (stage, outcome) = workflow::reject(self.stage);
        if outcome == Outcome::Rejected {
            self.stage = stage;
            if self.rejection.is_none() {
                self.rejection = Some(RejectionInfo::new(reason, principal));
            }
        }
        outcome
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ExitPermit {
    #[n(0)]
    pub id: String, // uuid7, immutable
    #[n(1)]
    pub permit_number: u32, // unique within the company partition
    #[n(2)]
    pub stage: ExitStage,
    #[n(3)]
    pub company: String, // numbering partition key
    #[n(4)]
    pub recipient: String,
    #[n(5)]
    pub item_name: String,
    #[n(6)]
    pub count: u32,
    #[n(7)]
    pub driver: Option<String>,
    #[n(8)]
    pub plate: Option<String>,
    #[n(9)]
    pub rejection: Option<RejectionInfo>,
    #[n(10)]
    pub created_by: String,
    #[n(11)]
    pub created_at: TimeStamp<Utc>,
}

impl ExitPermit {
    pub fn new(
        permit_number: u32,
        company: &str,
        count: u32,
        item_name: &str,
        recipient: &str,
        created_by: &str,
    ) -> Self {
        Self {
            id: uuid7().to_string(),
            permit_number,
            stage: ExitStage::first(),
            company: company.to_string(),
            recipient: recipient.to_string(),
            item_name: item_name.to_string(),
            count,
            driver: None,
            plate: None,
            rejection: None,
            created_by: created_by.to_string(),
            created_at: TimeStamp::new(),
        }
    }
    pub fn set_driver(mut self, driver: Option<String>) -> Self {
        self.driver = driver;
        self
    }
    pub fn set_plate(mut self, plate: Option<String>) -> Self {
        self.plate = plate;
        self
    }
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::ZeroCount);
        }
        if self.item_name.trim().is_empty() {
            return Err(ValidationError::EmptyItem);
        }
        if self.recipient.trim().is_empty() {
            return Err(ValidationError::EmptyRecipient);
        }
        Ok(())
    }

    pub fn advance(&mut self) -> Outcome {
        let (stage, outcome) = workflow::advance(self.stage);
        self.stage = stage;
        outcome
    }

    pub fn reject(&mut self, reason: &str, principal: &str) -> Outcome {
        let (stage, outcome) = workflow::reject(self.stage);
        if outcome == Outcome::Rejected {
            self.stage = stage;
            if self.rejection.is_none() {
                self.rejection = Some(RejectionInfo::new(reason, principal));
            }
        }
        outcome
    }
}
