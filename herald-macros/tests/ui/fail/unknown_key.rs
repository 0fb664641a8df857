use herald_macros::DomainEvent;

#[derive(DomainEvent)]
#[event(name = "x", version = 2)]
struct Versioned {
    occurred_at: chrono::DateTime<chrono::Utc>,
}

fn main() {}
