//! Amplifier mute control

/// Audio amplifier driver.
///
/// The amplifier has a single mute line; both operations are synchronous.
pub trait Amplifier {
    /// Error type returned by amplifier operations.
    type Error: core::fmt::Debug;

    /// Mute the amplifier output.
    fn mute(&mut self) -> Result<(), Self::Error>;

    /// Unmute the amplifier output.
    fn unmute(&mut self) -> Result<(), Self::Error>;
}
