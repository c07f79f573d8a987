//! APPA link hardware abstraction
//!
//! This crate defines the byte-stream traits the protocol engine talks
//! through. A serial port driver, a BLE bridge or a test double implements
//! them; everything above stays the same.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  appa-core (link, meter session)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  appa-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ serial port   │       │  BLE bridge   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`uart::Uart`] - Both halves with one error type

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

// Re-export key traits at crate root for convenience
pub use uart::{DataBits, Parity, StopBits, Uart, UartConfig, UartRx, UartTx};
