use herald_macros::DomainEvent;

#[derive(DomainEvent)]
#[event(name = "")]
struct Anonymous {
    occurred_at: chrono::DateTime<chrono::Utc>,
}

fn main() {}
