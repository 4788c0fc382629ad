// Copyright 2019-2020 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

#![allow(clippy::identity_op)]

use core::convert::{TryFrom, TryInto};
use num_enum::{TryFromPrimitive, IntoPrimitive};
use rtt_target::rprintln;

use crate::{swd, jtag, pins::{DebugPort, PortMode, Direction}};

#[derive(Copy, Clone, TryFromPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u8)]
enum Command {
    DAP_Info                = 0x00,
    DAP_HostStatus          = 0x01,
    DAP_Connect             = 0x02,
    DAP_Disconnect          = 0x03,
    DAP_TransferConfigure   = 0x04,
    DAP_Transfer            = 0x05,
    DAP_WriteABORT          = 0x08,
    DAP_Delay               = 0x09,
    DAP_ResetTarget         = 0x0A,

    DAP_SWJ_Pins            = 0x10,
    DAP_SWJ_Clock           = 0x11,
    DAP_SWJ_Sequence        = 0x12,

    DAP_SWD_Configure       = 0x13,
    DAP_SWD_Sequence        = 0x1D,

    Unimplemented           = 0xFF,
}

#[derive(Copy, Clone, IntoPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u8)]
enum ResponseStatus {
    DAP_OK                  = 0x00,
    DAP_ERROR               = 0xFF,
}

#[derive(Copy, Clone, TryFromPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u8)]
enum DAPInfoID {
    Vendor                  = 0x01,
    Product                 = 0x02,
    Serial                  = 0x03,
    ProtocolVersion         = 0x04,
    TargetDeviceVendor      = 0x05,
    TargetDeviceName        = 0x06,
    TargetBoardVendor       = 0x07,
    TargetBoardName         = 0x08,
    ProductFirmwareVersion  = 0x09,
    Capabilities            = 0xF0,
    TestDomainTimer         = 0xF1,
    UARTReceiveBufferSize   = 0xFB,
    UARTTransmitBufferSize  = 0xFC,
    SWOTraceBufferSize      = 0xFD,
    MaxPacketCount          = 0xFE,
    MaxPacketSize           = 0xFF,
}

#[derive(Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
enum HostStatusType {
    Connect = 0,
    Running = 1,
}

#[derive(Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
enum ConnectPort {
    Default = 0,
    SWD     = 1,
    JTAG    = 2,
}

struct Request<'a> {
    command: Command,
    data: &'a [u8],
}

impl <'a> Request<'a> {
    pub fn from_report(report: &'a [u8]) -> Option<Self> {
        if report.is_empty() {
            return None;
        }
        let command = Command::try_from(report[0]).ok()?;
        Some(Request { command, data: &report[1..] })
    }

    /// Returns 0 if the field is missing: a short packet is handled
    /// best-effort, with undefined fields read as zero rather than aborting.
    pub fn next_u8(&mut self) -> u8 {
        let value = self.data.get(0).copied().unwrap_or(0);
        self.data = if self.data.is_empty() { self.data } else { &self.data[1..] };
        value
    }

    pub fn next_u16(&mut self) -> u16 {
        if self.data.len() < 2 {
            self.data = &[];
            return 0;
        }
        let value = u16::from_le_bytes(self.data[0..2].try_into().unwrap());
        self.data = &self.data[2..];
        value
    }

    pub fn next_u32(&mut self) -> u32 {
        if self.data.len() < 4 {
            self.data = &[];
            return 0;
        }
        let value = u32::from_le_bytes(self.data[0..4].try_into().unwrap());
        self.data = &self.data[4..];
        value
    }

    pub fn rest(&self) -> &'a [u8] {
        self.data
    }
}

struct ResponseWriter<'a> {
    buf: &'a mut [u8],
    idx: usize,
}

impl <'a> ResponseWriter<'a> {
    pub fn new(command: Command, buf: &'a mut [u8]) -> Self {
        buf[0] = command as u8;
        ResponseWriter { buf, idx: 1 }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf[self.idx] = value;
        self.idx += 1;
    }

    pub fn write_u16(&mut self, value: u16) {
        let value = value.to_le_bytes();
        self.buf[self.idx..self.idx+2].copy_from_slice(&value);
        self.idx += 2;
    }

    pub fn write_u32(&mut self, value: u32) {
        let value = value.to_le_bytes();
        self.buf[self.idx..self.idx+4].copy_from_slice(&value);
        self.idx += 4;
    }

    pub fn write_slice(&mut self, data: &[u8]) {
        self.buf[self.idx..self.idx + data.len()].copy_from_slice(data);
        self.idx += data.len();
    }

    /// Write a DAP_Info string response: a length byte counting the NUL
    /// terminator, then the string bytes, then the NUL.
    pub fn write_info_string(&mut self, s: &str) {
        self.write_u8((s.len() + 1) as u8);
        self.write_slice(s.as_bytes());
        self.write_u8(0);
    }

    pub fn write_ok(&mut self) {
        self.write_u8(ResponseStatus::DAP_OK.into());
    }

    pub fn write_err(&mut self) {
        self.write_u8(ResponseStatus::DAP_ERROR.into());
    }

    pub fn write_u8_at(&mut self, idx: usize, value: u8) {
        self.buf[idx] = value;
    }

    pub fn write_u16_at(&mut self, idx: usize, value: u16) {
        let value = value.to_le_bytes();
        self.buf[idx..idx+2].copy_from_slice(&value);
    }

    pub fn mut_at(&mut self, idx: usize) -> &mut u8 {
        &mut self.buf[idx]
    }

    pub fn read_u8_at(&self, idx: usize) -> u8 {
        self.buf[idx]
    }

    pub fn finished(self) -> &'a [u8] {
        &self.buf[..self.idx]
    }
}

/// Probe-wide state, owned by the dispatcher and mutated only from
/// command-handling context.
struct ProbeState {
    mode: ConnectPort,
    clock_khz: u32,
    retry_match: usize,
}

/// The CMSIS-DAP command dispatcher and handler set (C4+C5), parameterised
/// over the platform's `DebugPort` implementation so it is testable against
/// a mock (see `crate::mock`).
pub struct DAP<'a, P: DebugPort> {
    pins: &'a P,
    swd: swd::SWD<'a, P>,
    jtag: jtag::JTAG<'a, P>,
    rbuf: [u8; 64],
    state: ProbeState,
}

impl <'a, P: DebugPort> DAP<'a, P> {
    pub fn new(pins: &'a P) -> Self {
        DAP {
            pins,
            swd: swd::SWD::new(pins),
            jtag: jtag::JTAG::new(pins),
            rbuf: [0u8; 64],
            state: ProbeState { mode: ConnectPort::Default, clock_khz: 0, retry_match: 0 },
        }
    }

    /// Process a new CMSIS-DAP command from `report`.
    ///
    /// Returns Some(response) if a response should be transmitted. Unknown
    /// command IDs are filtered out by `Request::from_report` already; this
    /// only needs to cover the `Unimplemented` arm for IDs the probe
    /// recognises but does not execute.
    pub fn process_command(&mut self, report: &[u8]) -> Option<&[u8]> {
        let req = match Request::from_report(report) {
            Some(req) => req,
            None => {
                if report.is_empty() {
                    return None;
                }
                // Unknown command ID: echo it back with DAP_ERROR.
                self.rbuf[0] = report[0];
                self.rbuf[1] = ResponseStatus::DAP_ERROR.into();
                return Some(&self.rbuf[..2]);
            },
        };
        match req.command {
            Command::DAP_Info => self.process_info(req),
            Command::DAP_HostStatus => self.process_host_status(req),
            Command::DAP_Connect => self.process_connect(req),
            Command::DAP_Disconnect => self.process_disconnect(req),
            Command::DAP_TransferConfigure => self.process_transfer_configure(req),
            Command::DAP_Transfer => self.process_transfer(req),
            Command::DAP_WriteABORT => self.process_write_abort(req),
            Command::DAP_Delay => self.process_delay(req),
            Command::DAP_ResetTarget => self.process_reset_target(req),
            Command::DAP_SWJ_Pins => self.process_swj_pins(req),
            Command::DAP_SWJ_Clock => self.process_swj_clock(req),
            Command::DAP_SWJ_Sequence => self.process_swj_sequence(req),
            Command::DAP_SWD_Configure => self.process_swd_configure(req),
            Command::DAP_SWD_Sequence => self.process_swd_sequence(req),
            Command::Unimplemented => {
                let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
                resp.write_err();
                Some(resp)
            },
        }.map(|resp| resp.finished())
    }

    fn process_info(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        match DAPInfoID::try_from(req.next_u8()) {
            Ok(DAPInfoID::Vendor) => resp.write_info_string("Cowlab"),
            Ok(DAPInfoID::Product) => resp.write_info_string("Cowprobe CMSIS-DAP"),
            Ok(DAPInfoID::Serial) => {
                let id = crate::hal::unique_id::get_hex_id();
                // SAFETY: get_hex_id() only ever produces ASCII hex digits.
                let serial = unsafe { core::str::from_utf8_unchecked(&id) };
                resp.write_info_string(serial);
            },
            Ok(DAPInfoID::ProtocolVersion) => resp.write_info_string("1.0.0"),
            Ok(DAPInfoID::ProductFirmwareVersion) => resp.write_info_string(crate::GIT_VERSION),
            Ok(DAPInfoID::TargetDeviceVendor)
            | Ok(DAPInfoID::TargetDeviceName)
            | Ok(DAPInfoID::TargetBoardVendor)
            | Ok(DAPInfoID::TargetBoardName) => resp.write_info_string(""),
            Ok(DAPInfoID::Capabilities) => {
                resp.write_u8(1);
                // Bit 0: SWD supported. Bit 1: JTAG supported.
                resp.write_u8(0b0000_0011);
            },
            Ok(DAPInfoID::TestDomainTimer) => {
                resp.write_u8(8);
                resp.write_u32(0);
                resp.write_u32(0);
            },
            Ok(DAPInfoID::UARTReceiveBufferSize)
            | Ok(DAPInfoID::UARTTransmitBufferSize)
            | Ok(DAPInfoID::SWOTraceBufferSize) => {
                resp.write_u8(4);
                resp.write_u32(0);
            },
            Ok(DAPInfoID::MaxPacketCount) => {
                resp.write_u8(1);
                resp.write_u8(1);
            },
            Ok(DAPInfoID::MaxPacketSize) => {
                resp.write_u8(2);
                resp.write_u16(64);
            },
            Err(_) => return None,
        }
        Some(resp)
    }

    fn process_host_status(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        // Accepted, but this probe has no host-indicator LEDs wired up.
        let _status_type = req.next_u8();
        let _status_status = req.next_u8();
        resp.write_u8(0);
        Some(resp)
    }

    fn process_connect(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let port = req.next_u8();
        match ConnectPort::try_from(port) {
            Ok(ConnectPort::Default) | Ok(ConnectPort::SWD) => {
                self.pins.set_port_mode(PortMode::Swd);
                self.swd.idle();
                self.swd.retry_count = 16;
                self.state.mode = ConnectPort::SWD;
                resp.write_u8(ConnectPort::SWD as u8);
            },
            Ok(ConnectPort::JTAG) => {
                self.pins.set_port_mode(PortMode::Jtag);
                self.state.mode = ConnectPort::JTAG;
                resp.write_u8(ConnectPort::JTAG as u8);
            },
            _ => {
                resp.write_u8(0);
            }
        }
        Some(resp)
    }

    fn process_disconnect(&mut self, _req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(_req.command, &mut self.rbuf);
        self.pins.set_port_mode(PortMode::HiZ);
        self.state.mode = ConnectPort::Default;
        resp.write_ok();
        Some(resp)
    }

    fn process_write_abort(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let _idx = req.next_u8();
        let word = req.next_u32();
        // The ABORT register shares DP address 0 with DPIDR (read vs write).
        match self.swd.write_dp_raw(0, word) {
            Ok(_) => resp.write_ok(),
            Err(e) => {
                rprintln!("DAP_WriteABORT: SWD write failed: {:?}", e);
                resp.write_err();
            },
        }
        Some(resp)
    }

    fn process_delay(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let delay_us = req.next_u16() as u32;
        // Cycles-per-microsecond at 48MHz core clock.
        self.pins.spin_cycles(48 * delay_us);
        resp.write_ok();
        Some(resp)
    }

    fn process_reset_target(&mut self, _req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(_req.command, &mut self.rbuf);
        resp.write_ok();
        // "No device specific reset sequence is implemented"
        resp.write_u8(0);
        Some(resp)
    }

    fn process_swj_pins(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let output = req.next_u8();
        let mask = req.next_u8();
        let wait_us = req.next_u32();

        const SWCLK_POS: u8 = 0;
        const SWDIO_POS: u8 = 1;
        const TDI_POS: u8 = 2;
        const TDO_POS: u8 = 3;
        const NTRST_POS: u8 = 5;
        const NRESET_POS: u8 = 7;

        if mask & (1 << SWCLK_POS) != 0 {
            self.pins.d2().set_bool(output & (1 << SWCLK_POS) != 0);
        }
        if mask & (1 << SWDIO_POS) != 0 {
            self.pins.swdio_direction(Direction::Out);
            self.pins.d1().set_bool(output & (1 << SWDIO_POS) != 0);
        }
        if mask & (1 << TDI_POS) != 0 {
            self.pins.d0().set_bool(output & (1 << TDI_POS) != 0);
        }
        if mask & (1 << TDO_POS) != 0 {
            self.pins.d3().set_bool(output & (1 << TDO_POS) != 0);
        }
        if mask & (1 << NRESET_POS) != 0 {
            if output & (1 << NRESET_POS) == 0 {
                self.pins.d3().set_direction(Direction::Out);
                self.pins.d3().set_low();
            } else {
                self.pins.d3().set_direction(Direction::In);
            }
        }

        self.pins.spin_cycles(48 * wait_us);

        let state =
            ((self.pins.d2().is_high() as u8) << SWCLK_POS) |
            ((self.pins.d1().is_high() as u8) << SWDIO_POS) |
            ((self.pins.d0().is_high() as u8) << TDI_POS)   |
            ((self.pins.d3().is_high() as u8) << TDO_POS)   |
            (1                                << NTRST_POS) |
            ((self.pins.d3().is_high() as u8) << NRESET_POS);
        resp.write_u8(state);
        Some(resp)
    }

    fn process_swj_clock(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let clock_hz = req.next_u32();
        if clock_hz == 0 {
            resp.write_err();
            return Some(resp);
        }
        self.state.clock_khz = clock_hz / 1000;
        // Core runs at 48MHz; derive a half-cycle NOP count from the
        // requested bus clock, floored at 1 so the loop never vanishes.
        let bit_delay = core::cmp::max(1, 24_000 / core::cmp::max(1, self.state.clock_khz));
        self.swd.bit_delay = bit_delay;
        self.jtag.bit_delay = bit_delay;
        resp.write_ok();
        Some(resp)
    }

    fn process_swj_sequence(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let nbits: usize = match req.next_u8() {
            0 => 256,
            n => n as usize,
        };
        let nbytes = (nbits + 7) / 8;
        let seq = req.rest();
        if seq.len() < nbytes {
            resp.write_err();
            return Some(resp);
        }

        self.pins.swdio_direction(Direction::Out);
        let mut bits_left = nbits;
        for &byte in &seq[..nbytes] {
            let mut byte = byte;
            let n = core::cmp::min(8, bits_left);
            for _ in 0..n {
                self.swd_clock_bit(byte & 1 != 0);
                byte >>= 1;
            }
            bits_left -= n;
        }

        resp.write_ok();
        Some(resp)
    }

    /// Clock one bit out on SWDIO/TMS with a single SWCLK toggle, shared by
    /// `DAP_SWJ_Sequence` (which does not go through the `swd` module since
    /// it operates before/outside of a registered SWD transaction).
    fn swd_clock_bit(&self, bit: bool) {
        self.pins.d1().set_bool(bit);
        self.pins.d2().set_low();
        self.pins.spin_cycles(self.swd.bit_delay);
        self.pins.d2().set_high();
        self.pins.spin_cycles(self.swd.bit_delay);
    }

    fn process_swd_configure(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let config = req.next_u8();
        let turnaround = (config & 0b011) as u32 + 1;
        self.swd.turnaround = turnaround;
        self.swd.data_phase = (config & 0b100) != 0;
        resp.write_ok();
        Some(resp)
    }

    /// `DAP_SWD_Sequence` (0x1D): a bitstream of sequence count, per-sequence
    /// info byte (bit-count, capture flag), and TDI-style payload bytes, but
    /// adapted to a single bidirectional SWDIO line instead of separate
    /// TDI/TDO.
    fn process_swd_sequence(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        resp.write_ok();

        let nseqs = req.next_u8();
        let mut data = req.rest();

        for _ in 0..nseqs {
            if data.is_empty() { break; }
            let info = data[0];
            data = &data[1..];
            let input = info & 0b1000_0000 != 0;
            let nbits = match info & 0b0011_1111 {
                0 => 64,
                n => n as usize,
            };
            let nbytes = (nbits + 7) / 8;

            if input {
                self.pins.swdio_direction(Direction::In);
                let mut bits_left = nbits;
                for _ in 0..nbytes {
                    let n = core::cmp::min(8, bits_left);
                    let mut byte = 0u8;
                    for i in 0..n {
                        if self.swd_clock_read_bit() {
                            byte |= 1 << i;
                        }
                    }
                    resp.write_u8(byte);
                    bits_left -= n;
                }
            } else {
                if data.len() < nbytes { break; }
                self.pins.swdio_direction(Direction::Out);
                let mut bits_left = nbits;
                for &byte in &data[..nbytes] {
                    let mut byte = byte;
                    let n = core::cmp::min(8, bits_left);
                    for _ in 0..n {
                        self.swd_clock_bit(byte & 1 != 0);
                        byte >>= 1;
                    }
                    bits_left -= n;
                }
                data = &data[nbytes..];
            }
        }

        // Restore SWDIO to output at the end.
        self.pins.swdio_direction(Direction::Out);
        self.swd.idle();

        Some(resp)
    }

    fn swd_clock_read_bit(&self) -> bool {
        self.pins.d2().set_low();
        self.pins.spin_cycles(self.swd.bit_delay);
        let bit = self.pins.d1().is_high();
        self.pins.d2().set_high();
        self.pins.spin_cycles(self.swd.bit_delay);
        bit
    }

    fn process_transfer_configure(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);

        self.swd.idle_cycles = req.next_u8() as u32;
        self.swd.retry_count = req.next_u16() as usize;
        self.state.retry_match = req.next_u16() as usize;

        resp.write_ok();
        Some(resp)
    }

    fn process_transfer(&mut self, mut req: Request) -> Option<ResponseWriter> {
        let mut resp = ResponseWriter::new(req.command, &mut self.rbuf);
        let _idx = req.next_u8();
        let ntransfers = req.next_u8();
        let mut match_mask = 0xFFFF_FFFFu32;

        // Skip two bytes in resp to reserve space for final status,
        // which we update while processing.
        resp.write_u16(0);

        for transfer_idx in 0..ntransfers {
            resp.write_u8_at(1, transfer_idx + 1);

            let transfer_req = req.next_u8();
            let apndp   = (transfer_req & (1<<0)) != 0;
            let rnw     = (transfer_req & (1<<1)) != 0;
            let a       = (transfer_req & (3<<2)) >> 2;
            let vmatch  = (transfer_req & (1<<4)) != 0;
            let mmask   = (transfer_req & (1<<5)) != 0;

            if rnw {
                let mut read_value = if apndp {
                    // Posted read: issue the AP read, then drain via RDBUFF.
                    if self.swd.read_ap(a).check(resp.mut_at(2)).is_none() {
                        break;
                    }
                    match self.swd.read_dp(swd::DPRegister::RDBUFF).check(resp.mut_at(2)) {
                        Some(v) => v,
                        None => break,
                    }
                } else {
                    match self.swd.read_dp_raw(a).check(resp.mut_at(2)) {
                        Some(v) => v,
                        None => break,
                    }
                };

                if vmatch {
                    let target_value = req.next_u32();
                    let mut match_tries = 0;
                    while (read_value & match_mask) != target_value {
                        match_tries += 1;
                        if match_tries > self.state.retry_match {
                            break;
                        }

                        read_value = if apndp {
                            match self.swd.read_ap(a).check(resp.mut_at(2)) {
                                Some(v) => v,
                                None => break,
                            }
                        } else {
                            match self.swd.read_dp_raw(a).check(resp.mut_at(2)) {
                                Some(v) => v,
                                None => break,
                            }
                        };
                    }

                    if (read_value & match_mask) != target_value {
                        resp.write_u8_at(2, resp.read_u8_at(2) | (1<<4));
                        break;
                    }
                } else {
                    resp.write_u32(read_value);
                }
            } else {
                if mmask {
                    match_mask = req.next_u32();
                    continue;
                }

                let write_value = req.next_u32();
                let result = if apndp {
                    self.swd.write_ap(a, write_value)
                } else {
                    self.swd.write_dp_raw(a, write_value)
                };
                if result.check(resp.mut_at(2)).is_none() {
                    break;
                }
            }
        }

        Some(resp)
    }
}

trait CheckResult<T> {
    /// Check result of an SWD transfer, updating the response status byte.
    ///
    /// Returns Some(T) on successful transfer, None on error.
    fn check(self, resp: &mut u8) -> Option<T>;
}

impl<T> CheckResult<T> for swd::Result<T> {
    fn check(self, resp: &mut u8) -> Option<T> {
        match self {
            Ok(v) => {
                *resp = 1;
                Some(v)
            },
            Err(swd::Error::AckWait) => {
                *resp = 2;
                None
            },
            Err(swd::Error::AckFault) => {
                *resp = 4;
                None
            },
            Err(e) => {
                rprintln!("DAP_Transfer: SWD error: {:?}", e);
                *resp = (1<<3) | 7;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPort;

    #[test]
    fn info_packet_size() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        let resp = dap.process_command(&[0x00, 0xFF]).unwrap();
        assert_eq!(resp, &[0x00, 0x02, 0x40, 0x00]);
    }

    #[test]
    fn info_packet_count() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        let resp = dap.process_command(&[0x00, 0xFE]).unwrap();
        assert_eq!(resp, &[0x00, 0x01, 0x01]);
    }

    #[test]
    fn info_capabilities() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        let resp = dap.process_command(&[0x00, 0xF0]).unwrap();
        assert_eq!(resp, &[0x00, 0x01, 0x03]);
    }

    #[test]
    fn connect_default_and_jtag_and_unknown() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        assert_eq!(dap.process_command(&[0x02, 0x00]).unwrap(), &[0x02, 0x01]);
        assert_eq!(dap.process_command(&[0x02, 0x02]).unwrap(), &[0x02, 0x02]);
        assert_eq!(dap.process_command(&[0x02, 99]).unwrap(), &[0x02, 0x00]);
    }

    #[test]
    fn disconnect_response() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        assert_eq!(dap.process_command(&[0x03]).unwrap(), &[0x03, 0x00]);
    }

    #[test]
    fn unknown_command_is_dap_error() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        assert_eq!(dap.process_command(&[0x7F]).unwrap(), &[0x7F, 0xFF]);
    }

    #[test]
    fn swj_sequence_50_bit_line_reset() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        let req = [0x12, 0x32, 0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF];
        assert_eq!(dap.process_command(&req).unwrap(), &[0x12, 0x00]);
    }

    #[test]
    fn swj_clock_sets_bit_delay() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        let req = [0x11, 0x00, 0xE4, 0x0C, 0x00];
        assert_eq!(dap.process_command(&req).unwrap(), &[0x11, 0x00]);
        assert!(dap.swd.bit_delay >= 1);
    }

    #[test]
    fn round_trip_command_id() {
        let port = MockPort::new();
        let mut dap = DAP::new(&port);
        for cmd in [0x00u8, 0x01, 0x02, 0x03, 0x0A, 0x13] {
            let resp = dap.process_command(&[cmd, 0x00, 0x00, 0x00, 0x00]).unwrap();
            assert_eq!(resp[0], cmd);
        }
    }
}
