//! Write-enable handshake as a typestate machine
//!
//! ```text
//! Idle --enable (wait idle, WREN, confirm WEL)--> Enabled
//! Enabled --issue (program/erase opcode)--> Busy
//! Busy --finish (wait idle, WRDI)--> Idle
//! ```
//!
//! A program or erase opcode can only be sent from `Enabled`, and the only
//! way to reach `Enabled` is a confirmed write enable. A failed transition
//! consumes the cycle, so nothing more is sent for that command.

use core::marker::PhantomData;

use super::spi25::{wait_idle, write_disable, write_enable, PollPolicy};
use crate::channel::FrameChannel;
use crate::error::Result;
use crate::spi::FlashCommand;

/// State of a write cycle, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// No write in flight, WEL clear
    Idle,
    /// WEL confirmed set
    Enabled,
    /// Program/erase opcode sent, WIP may be set
    Busy,
}

mod sealed {
    pub trait Sealed {}
}

/// Typestate marker of a [`WriteCycle`]
pub trait State: sealed::Sealed {
    /// Runtime name of the state
    const STATE: WriteState;
}

/// Marker: ready for write enable
#[derive(Debug)]
pub struct Idle;
/// Marker: write enable latched
#[derive(Debug)]
pub struct Enabled;
/// Marker: opcode sent, device working
#[derive(Debug)]
pub struct Busy;

impl sealed::Sealed for Idle {}
impl sealed::Sealed for Enabled {}
impl sealed::Sealed for Busy {}

impl State for Idle {
    const STATE: WriteState = WriteState::Idle;
}
impl State for Enabled {
    const STATE: WriteState = WriteState::Enabled;
}
impl State for Busy {
    const STATE: WriteState = WriteState::Busy;
}

/// One program or erase command with its handshake
pub struct WriteCycle<'c, C: FrameChannel + ?Sized, S: State> {
    channel: &'c mut C,
    policy: PollPolicy,
    _state: PhantomData<S>,
}

impl<'c, C: FrameChannel + ?Sized, S: State> WriteCycle<'c, C, S> {
    /// Current state
    pub fn state(&self) -> WriteState {
        S::STATE
    }

    fn into_state<T: State>(self) -> WriteCycle<'c, C, T> {
        log::trace!("write cycle {:?} -> {:?}", S::STATE, T::STATE);
        WriteCycle {
            channel: self.channel,
            policy: self.policy,
            _state: PhantomData,
        }
    }
}

impl<'c, C: FrameChannel + ?Sized> WriteCycle<'c, C, Idle> {
    /// Start a cycle on `channel`
    ///
    /// `policy` bounds both the wait before write enable and the wait for
    /// the opcode to complete.
    pub fn new(channel: &'c mut C, policy: PollPolicy) -> Self {
        Self {
            channel,
            policy,
            _state: PhantomData,
        }
    }

    /// Wait idle, send WREN and confirm WEL
    pub fn enable(mut self) -> Result<WriteCycle<'c, C, Enabled>> {
        write_enable(&mut *self.channel, self.policy)?;
        Ok(self.into_state())
    }

    /// Run the whole cycle for `cmd`
    pub fn run(self, cmd: &mut FlashCommand<'_>) -> Result<()> {
        self.enable()?.issue(cmd)?.finish()?;
        Ok(())
    }
}

impl<'c, C: FrameChannel + ?Sized> WriteCycle<'c, C, Enabled> {
    /// Send the program or erase opcode
    pub fn issue(mut self, cmd: &mut FlashCommand<'_>) -> Result<WriteCycle<'c, C, Busy>> {
        cmd.execute(&mut *self.channel)?;
        Ok(self.into_state())
    }
}

impl<'c, C: FrameChannel + ?Sized> WriteCycle<'c, C, Busy> {
    /// Wait for WIP to clear, then send Write Disable
    pub fn finish(mut self) -> Result<WriteCycle<'c, C, Idle>> {
        wait_idle(&mut *self.channel, self.policy)?;
        write_disable(&mut *self.channel)?;
        Ok(self.into_state())
    }
}
