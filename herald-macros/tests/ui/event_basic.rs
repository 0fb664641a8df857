use chrono::{DateTime, Utc};
use herald_domain::domain_event::DomainEvent;
use herald_macros::DomainEvent;

#[derive(Debug, DomainEvent)]
#[event(name = "bank.opened")]
struct Opened {
    account_id: String,
    occurred_at: DateTime<Utc>,
}

fn main() {
    let ev = Opened {
        account_id: "a-1".into(),
        occurred_at: Utc::now(),
    };
    assert_eq!(ev.name(), "bank.opened");
    let _ = ev.account_id;
}
