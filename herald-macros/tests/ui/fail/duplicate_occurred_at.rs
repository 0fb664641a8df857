use herald_macros::DomainEvent;

#[derive(DomainEvent)]
#[event(name = "a", occurred_at = at, occurred_at = at)]
struct Twice {
    at: chrono::DateTime<chrono::Utc>,
}

fn main() {}
