//! I2S sample transmitter abstraction

/// Completion events raised by the I2S driver from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferEvent {
    /// Receive FIFO full (not expected on a transmit-only link).
    RxFull,
    /// Transmit FIFO drained.
    TxEmpty,
    /// The whole buffer handed to [`SampleTransmitter::write`] has been sent.
    EndTransfer,
    /// Bus or DMA error.
    Error,
}

impl TransferEvent {
    /// `true` for the events that free the buffer currently on the bus.
    pub fn is_completion(self) -> bool {
        matches!(self, Self::TxEmpty | Self::EndTransfer)
    }
}

/// Sample output towards the amplifier.
pub trait SampleTransmitter {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start transmitting `samples`.
    ///
    /// Returns once the transfer is accepted; completion is reported as a
    /// [`TransferEvent`].
    fn write(&mut self, samples: &[u8]) -> Result<(), Self::Error>;
}
