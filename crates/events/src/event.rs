/// A message that knows the topic it is announced under.
///
/// Events are:
/// - **immutable** once published (handlers only get `&self`)
/// - **named** by a stable, case-sensitive topic (e.g. `"basket:updated"`)
pub trait Event: Clone + core::fmt::Debug + 'static {
    /// Topic this event is published under.
    fn topic(&self) -> &'static str;
}
