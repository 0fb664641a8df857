use herald_macros::DomainEvent;

#[derive(DomainEvent)]
#[event(name = "a")]
#[event(name = "b")]
struct Renamed {
    occurred_at: chrono::DateTime<chrono::Utc>,
}

fn main() {}
