use herald_macros::DomainEvent;

#[derive(DomainEvent)]
#[event(name = "x", occurred_at = meta.at)]
struct Orphan {
    at: chrono::DateTime<chrono::Utc>,
}

fn main() {}
