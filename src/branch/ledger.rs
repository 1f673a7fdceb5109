/// Ledger is one branch's replica of the account balance.
///
/// Deposit and withdraw commute, so replicas converge regardless of the order in which
/// propagated updates land. There is no overdraft check; the balance may go negative.
#[derive(Debug)]
pub(crate) struct Ledger {
    balance: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum LedgerError {
    #[error("Amount must be non-negative, got {0}")]
    NegativeAmount(i64),
    #[error("Balance would overflow")]
    Overflow,
}

impl Ledger {
    pub(crate) fn new(initial_balance: i64) -> Self {
        Ledger {
            balance: initial_balance,
        }
    }

    pub(crate) fn balance(&self) -> i64 {
        self.balance
    }

    pub(crate) fn deposit(&mut self, amount: i64) -> Result<i64, LedgerError> {
        self.balance = self.balance_after_deposit(amount)?;
        Ok(self.balance)
    }

    pub(crate) fn withdraw(&mut self, amount: i64) -> Result<i64, LedgerError> {
        self.balance = self.balance_after_withdraw(amount)?;
        Ok(self.balance)
    }

    /// The balance a deposit would produce. Nothing is applied.
    pub(crate) fn balance_after_deposit(&self, amount: i64) -> Result<i64, LedgerError> {
        Self::check_amount(amount)?;
        self.balance.checked_add(amount).ok_or(LedgerError::Overflow)
    }

    /// The balance a withdrawal would produce. Nothing is applied.
    pub(crate) fn balance_after_withdraw(&self, amount: i64) -> Result<i64, LedgerError> {
        Self::check_amount(amount)?;
        self.balance.checked_sub(amount).ok_or(LedgerError::Overflow)
    }

    fn check_amount(amount: i64) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_and_withdraw() {
        let mut ledger = Ledger::new(100);
        assert_eq!(ledger.deposit(50), Ok(150));
        assert_eq!(ledger.withdraw(30), Ok(120));
        assert_eq!(ledger.balance(), 120);
    }

    #[test]
    fn withdraw_may_overdraw() {
        let mut ledger = Ledger::new(10);
        assert_eq!(ledger.withdraw(25), Ok(-15));
    }

    #[test]
    fn negative_amount_rejected_without_mutation() {
        let mut ledger = Ledger::new(100);
        assert_eq!(ledger.deposit(-1), Err(LedgerError::NegativeAmount(-1)));
        assert_eq!(ledger.withdraw(-5), Err(LedgerError::NegativeAmount(-5)));
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn overflow_rejected_without_mutation() {
        let mut ledger = Ledger::new(i64::MAX - 1);
        assert_eq!(ledger.deposit(2), Err(LedgerError::Overflow));
        assert_eq!(ledger.balance(), i64::MAX - 1);
    }

    #[test]
    fn balance_after_does_not_apply() {
        let ledger = Ledger::new(100);
        assert_eq!(ledger.balance_after_deposit(50), Ok(150));
        assert_eq!(ledger.balance_after_withdraw(130), Ok(-30));
        assert_eq!(ledger.balance_after_deposit(-3), Err(LedgerError::NegativeAmount(-3)));
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn order_of_operations_does_not_matter() {
        // (is_deposit, amount)
        let ops = vec![(true, 50), (false, 30), (true, 7), (false, 100), (true, 1)];

        let mut forward = Ledger::new(100);
        for (is_deposit, amount) in ops.iter() {
            apply(&mut forward, *is_deposit, *amount);
        }

        let mut backward = Ledger::new(100);
        for (is_deposit, amount) in ops.iter().rev() {
            apply(&mut backward, *is_deposit, *amount);
        }

        assert_eq!(forward.balance(), backward.balance());
        assert_eq!(forward.balance(), 100 + 50 - 30 + 7 - 100 + 1);
    }

    fn apply(ledger: &mut Ledger, is_deposit: bool, amount: i64) {
        if is_deposit {
            ledger.deposit(amount).unwrap();
        } else {
            ledger.withdraw(amount).unwrap();
        }
    }
}
