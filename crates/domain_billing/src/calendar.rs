//! Payment calendar projection
//!
//! The projector picks exactly one of two sources:
//!
//! 1. The statement's ledger (paid + open contributions), when any line
//!    exists. Lines are passed through verbatim, in document order.
//! 2. Otherwise a synthesized schedule of `months` periods starting at the
//!    contract start date, each billing the contract price.
//!
//! Synthesized periods are status-tagged relative to their position, not to
//! today's date: the first is `Due`, the next two `Upcoming`, the rest
//! `Future`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{add_months, Currency, DateRange, Money};
use domain_member::{ExtractedMemberRecord, OpenContribution, PaidContribution};

use crate::balance::BalanceStanding;
use crate::error::BillingError;

/// Number of periods after the first one that count as upcoming
const UPCOMING_PERIODS: u32 = 2;

/// Position-based status of a synthesized period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Due,
    Upcoming,
    Future,
}

impl PeriodStatus {
    fn for_index(index: u32) -> Self {
        match index {
            0 => PeriodStatus::Due,
            i if i <= UPCOMING_PERIODS => PeriodStatus::Upcoming,
            _ => PeriodStatus::Future,
        }
    }
}

/// One synthesized billing period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedPeriod {
    pub index: u32,
    pub due_date: NaiveDate,
    /// From the due date up to the day before the next due date
    pub covers: DateRange,
    pub amount: Money,
    pub status: PeriodStatus,
}

/// A paid ledger line, verbatim from the statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidEntry {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

/// An open or future ledger line, verbatim from the statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEntry {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub description: String,
    pub claim_amount: Money,
    pub open_amount: Money,
}

/// The billing calendar shown to the user and materialized on commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillingCalendar {
    /// Real entries from the account statement
    Ledger {
        paid: Vec<PaidEntry>,
        open: Vec<OpenEntry>,
    },
    /// Generated preview, never billing history
    Projected {
        periods: Vec<ProjectedPeriod>,
    },
    /// Neither ledger lines nor start date and price were extracted
    Unavailable,
}

impl BillingCalendar {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, BillingCalendar::Ledger { .. })
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, BillingCalendar::Projected { .. })
    }

    pub fn periods(&self) -> &[ProjectedPeriod] {
        match self {
            BillingCalendar::Projected { periods } => periods,
            _ => &[],
        }
    }

    /// Sum of paid ledger lines; zero for non-ledger calendars
    pub fn total_paid(&self, currency: Currency) -> Result<Money, BillingError> {
        match self {
            BillingCalendar::Ledger { paid, .. } => {
                Ok(Money::try_sum(currency, paid.iter().map(|e| &e.amount))?)
            }
            _ => Ok(Money::zero(currency)),
        }
    }

    /// Sum of open amounts; zero for non-ledger calendars
    pub fn total_open(&self, currency: Currency) -> Result<Money, BillingError> {
        match self {
            BillingCalendar::Ledger { open, .. } => {
                Ok(Money::try_sum(currency, open.iter().map(|e| &e.open_amount))?)
            }
            _ => Ok(Money::zero(currency)),
        }
    }
}

/// One-off fees printed on the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Setup,
    Administration,
    Freezing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub kind: FeeKind,
    pub amount: Money,
}

/// Everything the billing confirmation step displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub calendar: BillingCalendar,
    pub is_preview: bool,
    pub balance: Option<BalanceStanding>,
    pub fees: Vec<FeeLine>,
    pub total_paid: Money,
    pub total_open: Money,
}

/// Builds billing calendars from canonical member data
#[derive(Debug, Clone)]
pub struct PaymentCalendarProjector {
    currency: Currency,
    months: u32,
}

impl PaymentCalendarProjector {
    /// # Arguments
    ///
    /// * `currency` - Currency of all extracted amounts
    /// * `months` - Number of periods to synthesize when there is no ledger
    pub fn new(currency: Currency, months: u32) -> Self {
        Self { currency, months }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Projects the calendar for a merged record
    pub fn project(&self, record: &ExtractedMemberRecord) -> Result<BillingCalendar, BillingError> {
        if record.has_ledger() {
            return Ok(self.ledger(&record.paid_contributions, &record.future_contributions));
        }

        match (record.contract_start_date, record.contract_price) {
            (Some(start), Some(price)) => self.synthesize(start, price),
            _ => {
                tracing::debug!("No ledger and no contract start/price; calendar unavailable");
                Ok(BillingCalendar::Unavailable)
            }
        }
    }

    /// Calendar plus balance, fees and totals
    pub fn view(&self, record: &ExtractedMemberRecord) -> Result<CalendarView, BillingError> {
        let calendar = self.project(record)?;
        let total_paid = calendar.total_paid(self.currency)?;
        let total_open = calendar.total_open(self.currency)?;

        let fees = [
            (FeeKind::Setup, record.setup_fee),
            (FeeKind::Administration, record.administration_fee),
            (FeeKind::Freezing, record.freezing_fee),
        ]
        .into_iter()
        .filter_map(|(kind, amount)| {
            amount.map(|a| FeeLine {
                kind,
                amount: self.money(a),
            })
        })
        .collect();

        Ok(CalendarView {
            is_preview: calendar.is_preview(),
            calendar,
            balance: record
                .account_balance
                .map(|b| BalanceStanding::from_balance(self.money(b))),
            fees,
            total_paid,
            total_open,
        })
    }

    fn ledger(&self, paid: &[PaidContribution], open: &[OpenContribution]) -> BillingCalendar {
        BillingCalendar::Ledger {
            paid: paid
                .iter()
                .map(|line| PaidEntry {
                    date: line.date,
                    description: line.description.clone(),
                    amount: self.money(line.amount),
                })
                .collect(),
            open: open
                .iter()
                .map(|line| OpenEntry {
                    period_start: line.period_start,
                    period_end: line.period_end,
                    description: line.description.clone(),
                    claim_amount: self.money(line.claim_amount),
                    open_amount: self.money(line.open_amount),
                })
                .collect(),
        }
    }

    fn synthesize(&self, start: NaiveDate, price: Decimal) -> Result<BillingCalendar, BillingError> {
        let amount = self.money(price);
        let periods = (0..self.months)
            .map(|index| {
                let due_date = add_months(start, index)?;
                let next_due = add_months(start, index + 1)?;
                let last_day = next_due.pred_opt().unwrap_or(due_date);
                Ok(ProjectedPeriod {
                    index,
                    due_date,
                    covers: DateRange::new(due_date, last_day)?,
                    amount,
                    status: PeriodStatus::for_index(index),
                })
            })
            .collect::<Result<Vec<_>, BillingError>>()?;

        tracing::debug!(periods = periods.len(), %start, "Synthesized billing preview");
        Ok(BillingCalendar::Projected { periods })
    }

    fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }
}
