//! Display convention for the statement's account balance

use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// Sign interpretation of the extracted account balance
///
/// Display only: a non-negative balance is a credit, a negative one arrears.
/// The carried amount is always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "standing", content = "amount", rename_all = "snake_case")]
pub enum BalanceStanding {
    Credit(Money),
    Arrears(Money),
}

impl BalanceStanding {
    pub fn from_balance(balance: Money) -> Self {
        if balance.is_negative() {
            BalanceStanding::Arrears(balance.abs())
        } else {
            BalanceStanding::Credit(balance)
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            BalanceStanding::Credit(m) | BalanceStanding::Arrears(m) => *m,
        }
    }

    pub fn is_arrears(&self) -> bool {
        matches!(self, BalanceStanding::Arrears(_))
    }
}
