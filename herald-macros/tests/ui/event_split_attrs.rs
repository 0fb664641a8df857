use chrono::{DateTime, Utc};
use herald_domain::domain_event::DomainEvent;
use herald_macros::DomainEvent;

#[derive(Debug, DomainEvent)]
#[event(name = "bank.closed")]
#[event(occurred_at = closed_at)]
struct Closed {
    closed_at: DateTime<Utc>,
}

fn main() {
    let ev = Closed { closed_at: Utc::now() };
    let erased: &dyn DomainEvent = &ev;
    assert!(erased.is::<Closed>());
}
