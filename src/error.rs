//! Unified error taxonomy for the pipeline and its peripheral contracts.
//!
//! None of these are fatal: every fallible boundary either clears local state and
//! continues (capture faults), degrades output (signal loss), or retries at the next
//! idle window (nvram writes). The device stays responsive to the console and IR
//! inputs regardless of which of these fires.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum PipelineError {
    /// Line DMA FIFO overflow or a decoder-reported line error.
    CaptureFault,
    /// The decoder's status register has reported signal loss for five
    /// consecutive checks.
    SignalLost,
    /// The nonvolatile parameter store failed to commit a write.
    NvramWrite,
    /// A decoded parameter block failed its validity byte or CRC check.
    NvramCorrupt,
    /// An IR frame's address or data byte did not match its bitwise complement.
    IrFrameCheck,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            | Self::CaptureFault => "capture fault: line buffer discarded",
            | Self::SignalLost => "video signal lost",
            | Self::NvramWrite => "nvram write failed",
            | Self::NvramCorrupt => "nvram block failed validity/CRC check",
            | Self::IrFrameCheck => "IR frame failed inverse-complement check",
        };
        f.write_str(msg)
    }
}

pub type Result<T> = core::result::Result<T, PipelineError>;
