/// Decides whether a user message is on topic before any completion is
/// requested.
pub trait DomainFilter: Send + Sync {
    fn is_in_scope(&self, text: &str) -> bool;
}
