use chrono::{DateTime, Utc};
use herald_domain::domain_event::DomainEvent;
use herald_macros::DomainEvent;
use std::sync::Arc;

#[derive(Debug)]
struct Account {
    opened_at: DateTime<Utc>,
}

#[derive(Debug, DomainEvent)]
#[event(name = "bank.opened", occurred_at = account.opened_at)]
struct Opened {
    account: Arc<Account>,
}

fn main() {
    let at = Utc::now();
    let ev = Opened {
        account: Arc::new(Account { opened_at: at }),
    };
    assert_eq!(ev.occurred_at(), at);
}
