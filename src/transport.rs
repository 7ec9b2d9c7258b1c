// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Downstream transport interface.
//!
//! The library computes payload bytes only. Framing them into Art-Net or
//! DMX packets and sending them belongs to a [`DmxTransport`]
//! implementation. Sending is fire-and-forget: implementations must not
//! block the caller, which is a fixture controller in the middle of a fade.
//!
//! Two implementations are provided:
//!
//! - [`ChannelTransport`] queues frames on an unbounded channel for a
//!   sender task to drain
//! - [`MemoryTransport`] records frames and keeps an image of each universe

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::fixture::UNIVERSE_SIZE;

/// Receives encoded fixture payloads.
pub trait DmxTransport: Send + Sync + 'static {
    /// Writes `payload` at `start_channel` (1-based) of `universe`.
    fn send(&self, universe: u16, start_channel: u16, payload: &[u8]);
}

impl<T: DmxTransport + ?Sized> DmxTransport for Arc<T> {
    fn send(&self, universe: u16, start_channel: u16, payload: &[u8]) {
        (**self).send(universe, start_channel, payload);
    }
}

/// A payload addressed to a span of channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    /// Target universe.
    pub universe: u16,
    /// First channel (1-based).
    pub start_channel: u16,
    /// Channel values in channel order.
    pub payload: Vec<u8>,
}

/// Transport that queues frames on an unbounded `tokio` channel.
///
/// # Examples
///
/// ```
/// use dmx_fader::transport::{ChannelTransport, DmxTransport};
///
/// let (transport, mut frames) = ChannelTransport::unbounded();
/// transport.send(0, 1, &[255, 0]);
///
/// let frame = frames.try_recv().unwrap();
/// assert_eq!(frame.payload, vec![255, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<DmxFrame>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver its frames arrive on.
    #[must_use]
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<DmxFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the receiver was dropped.
    pub fn try_send(&self, frame: DmxFrame) -> Result<(), TransportError> {
        self.sender.send(frame).map_err(|_| TransportError::Closed)
    }
}

impl DmxTransport for ChannelTransport {
    fn send(&self, universe: u16, start_channel: u16, payload: &[u8]) {
        let frame = DmxFrame {
            universe,
            start_channel,
            payload: payload.to_vec(),
        };
        if let Err(e) = self.try_send(frame) {
            tracing::warn!(universe, start_channel, error = %e, "Dropping DMX frame");
        }
    }
}

/// Transport that records every frame in memory.
///
/// Besides the frame log it keeps a 512 byte image per universe, updated
/// by every frame, which is what a receiving node would output.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    frames: Mutex<Vec<DmxFrame>>,
    universes: Mutex<HashMap<u16, Vec<u8>>>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every frame sent so far.
    #[must_use]
    pub fn frames(&self) -> Vec<DmxFrame> {
        self.frames.lock().clone()
    }

    /// Removes and returns every frame sent so far.
    pub fn take_frames(&self) -> Vec<DmxFrame> {
        std::mem::take(&mut *self.frames.lock())
    }

    /// Returns the number of frames sent so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns the 512 channel image of a universe, if anything was sent to it.
    #[must_use]
    pub fn universe(&self, universe: u16) -> Option<Vec<u8>> {
        self.universes.lock().get(&universe).cloned()
    }

    /// Returns `len` channel values starting at `start_channel` (1-based).
    ///
    /// Channels never written read as 0.
    #[must_use]
    pub fn channels(&self, universe: u16, start_channel: u16, len: usize) -> Vec<u8> {
        let image = self
            .universe(universe)
            .unwrap_or_else(|| vec![0; usize::from(UNIVERSE_SIZE)]);
        let start = usize::from(start_channel.saturating_sub(1));
        let end = (start + len).min(image.len());
        image.get(start..end).map(<[u8]>::to_vec).unwrap_or_default()
    }
}

impl DmxTransport for MemoryTransport {
    fn send(&self, universe: u16, start_channel: u16, payload: &[u8]) {
        {
            let mut universes = self.universes.lock();
            let image = universes
                .entry(universe)
                .or_insert_with(|| vec![0; usize::from(UNIVERSE_SIZE)]);
            let start = usize::from(start_channel.saturating_sub(1));
            for (slot, value) in image.iter_mut().skip(start).zip(payload) {
                *slot = *value;
            }
        }
        self.frames.lock().push(DmxFrame {
            universe,
            start_channel,
            payload: payload.to_vec(),
        });
    }
}
