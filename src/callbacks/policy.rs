//! Policy traits customizing dispatch behavior
//!
//! Policies are stateless marker types plugged into [`CallbackList`] and
//! [`EventQueue`] as a type parameter. The default policy invokes every
//! listener and offers no key extraction.
//!
//! [`CallbackList`]: crate::callbacks::CallbackList
//! [`EventQueue`]: crate::queue::EventQueue

/// Controls whether an invocation keeps going after each listener returns.
///
/// Consulted by `invoke` after every successful listener call; returning
/// false halts the remaining listeners for that invocation. The arguments
/// themselves carry whatever state the decision needs.
pub trait ListPolicy<A> {
    fn can_continue_invoking(_args: &A) -> bool {
        true
    }
}

/// Extracts the event key from an argument payload, for queues whose event
/// identity travels inside the payload instead of alongside it.
///
/// # Example
///
/// ```rust
/// use eventq::{EventExtractor, ListPolicy};
///
/// struct SensorReading {
///     channel: u32,
///     value: f64,
/// }
///
/// struct ChannelKey;
///
/// impl ListPolicy<SensorReading> for ChannelKey {}
///
/// impl EventExtractor<u32, SensorReading> for ChannelKey {
///     fn event_of(
///         args: &SensorReading,
///     ) -> Result<u32, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(args.channel)
///     }
/// }
/// # let _ = SensorReading { channel: 0, value: 0.0 };
/// ```
pub trait EventExtractor<K, A> {
    fn event_of(args: &A) -> Result<K, Box<dyn std::error::Error + Send + Sync>>;
}

/// Default policy: every listener runs, no key extraction.
pub struct DefaultPolicy;

impl<A> ListPolicy<A> for DefaultPolicy {}
