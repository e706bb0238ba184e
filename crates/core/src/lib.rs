//! Core protocol types for LoRaTx: the on-wire transaction header and the
//! device-side transaction generator.

pub mod generator;
pub mod header;

pub use generator::{GeneratorConfig, PacketKind, SendStep, StopPolicy, TransactionGenerator};
pub use header::TransactionHeader;

/// Device identifier, unique per end device for the whole run.
pub type DeviceId = u32;

/// Per-device transaction counter, starts at 0 and increments by 1.
pub type TransactionId = u16;

/// Position of a packet within its transaction. Data packets occupy
/// `0..packets_per_transaction`, the two signature parts the next two ids.
pub type PacketId = u16;
