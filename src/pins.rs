// Abstract debug-port pin interface (C1).
//
// `swd` and `jtag` are written against this trait rather than against
// `stm32ral` directly, so the wire engines can be driven by a recording mock
// in tests (see the `#[cfg(test)]` modules in `swd.rs`/`jtag.rs`) and so a
// future port to a different MCU only needs a new `DebugPort` impl in `hal`.

/// One of the four electrical pins on the debug connector.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Port-wide electrical mode. `HiZ` is the reset/disconnected state: all
/// four pins tri-stated.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum PortMode {
    HiZ,
    Swd,
    Jtag,
}

/// A single debug-port pin.
pub trait DebugPin {
    fn set_high(&self);
    fn set_low(&self);
    fn is_high(&self) -> bool;
    fn set_direction(&self, dir: Direction);

    fn set_bool(&self, level: bool) {
        if level {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// The four-pin debug port plus its port-mode switch and bit-bang timing
/// primitive.
///
/// D0=TDI, D1=SWDIO/TMS, D2=SWCLK/TCK, D3=nRESET/TDO.
pub trait DebugPort {
    type Pin: DebugPin;

    fn d0(&self) -> &Self::Pin;
    fn d1(&self) -> &Self::Pin;
    fn d2(&self) -> &Self::Pin;
    fn d3(&self) -> &Self::Pin;

    /// Switch the whole port (including external direction buffers) to the
    /// given mode. Must apply buffer-then-pin (entering output) or
    /// pin-then-buffer (entering input) ordering with a spin_cycles(1)
    /// delay between the two steps, to avoid bus contention.
    fn set_port_mode(&self, mode: PortMode);

    /// Switch D1 (SWDIO) direction mid-turnaround. Kept distinct from
    /// `set_port_mode` because it happens on every SWD transaction, not
    /// just on mode transitions.
    fn swdio_direction(&self, dir: Direction);

    /// Busy-wait for approximately `n` core cycles. The wire engines call
    /// this once per clock half-edge with `n = bit_delay`.
    fn spin_cycles(&self, n: u32);
}
