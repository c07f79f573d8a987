//! APPA multimeter communication protocol
//!
//! This crate implements the binary protocol spoken by APPA digital
//! multimeters (and their BENNING, Sefram, RS PRO and Voltcraft rebrands)
//! over their optical serial and BLE links. It covers framing, checksums,
//! the command size table and the typed request/response layouts.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌──────┬──────┬─────────┬────────┬─────────────┬──────────┐
//! │ 0x55 │ 0x55 │ COMMAND │ LENGTH │ PAYLOAD     │ CHECKSUM │
//! │ 1B   │ 1B   │ 1B      │ 1B     │ 0–64B       │ 1B       │
//! └──────┴──────┴─────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The host sends a request and the meter answers with a frame carrying the
//! same command, or with a SUCCESS/FAILURE acknowledge. Multi-byte integers
//! are little-endian.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod checksum;
pub mod command;
pub mod display;
pub mod frame;
pub mod messages;
pub mod model;

pub use checksum::{checksum, Checksum};
pub use command::{Command, Direction, SizeRule};
pub use display::{
    DataContent, DisplayReading, DisplayResponse, Dot, FunctionCode, Severity, Unit, WordCode,
    WORD_CODE_THRESHOLD,
};
pub use frame::{
    Frame, FrameError, FrameParser, ParseState, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
    START_BYTE,
};
pub use messages::{
    CodecError, InformationResponse, ReadMemoryRequest, Request, Response, DEFAULT_VENDOR,
};
pub use model::{ModelFamily, ModelId};
