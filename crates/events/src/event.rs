/// A domain-agnostic ledger event.
///
/// Events are:
/// - **immutable** (treat them as facts emitted by the contract)
/// - **versioned** (schema evolution)
/// - read from an **append-only** log
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "registry.item.stored").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;
}
