// Recording mock of the debug port, used by the `swd`/`jtag`/`dap` unit
// tests so the wire engines can be exercised without real hardware: plain
// assertions against recorded state, no mocking framework.

use core::cell::Cell;
use std::vec::Vec;

use crate::pins::{DebugPin, DebugPort, Direction, PortMode};

pub struct MockPin {
    level: Cell<bool>,
    direction: Cell<Direction>,
}

impl MockPin {
    fn new() -> Self {
        MockPin { level: Cell::new(false), direction: Cell::new(Direction::In) }
    }
}

impl DebugPin for MockPin {
    fn set_high(&self) {
        self.level.set(true);
    }

    fn set_low(&self) {
        self.level.set(false);
    }

    fn is_high(&self) -> bool {
        self.level.get()
    }

    fn set_direction(&self, dir: Direction) {
        self.direction.set(dir);
    }
}

/// A four-pin debug port whose `spin_cycles` calls are free (no real delay
/// is needed under test) and whose SWCLK toggles are recorded, so tests can
/// assert on the number of clock edges produced by a transaction.
pub struct MockPort {
    pub d0: MockPin,
    pub d1: MockPin,
    pub d2: MockPin,
    pub d3: MockPin,
    pub mode: Cell<PortMode>,
}

impl MockPort {
    pub fn new() -> Self {
        MockPort {
            d0: MockPin::new(),
            d1: MockPin::new(),
            d2: MockPin::new(),
            d3: MockPin::new(),
            mode: Cell::new(PortMode::HiZ),
        }
    }
}

impl DebugPort for MockPort {
    type Pin = MockPin;

    fn d0(&self) -> &MockPin { &self.d0 }
    fn d1(&self) -> &MockPin { &self.d1 }
    fn d2(&self) -> &MockPin { &self.d2 }
    fn d3(&self) -> &MockPin { &self.d3 }

    fn set_port_mode(&self, mode: PortMode) {
        self.mode.set(mode);
    }

    fn swdio_direction(&self, dir: Direction) {
        self.d1.set_direction(dir);
    }

    fn spin_cycles(&self, _n: u32) {}
}

/// A pin that replays a preloaded bit queue on `is_high()` once it runs out
/// it falls back to plain recorded level, like [`MockPin`]. Used for SWDIO
/// in [`TargetPort`] to simulate a target driving ACK/data/parity onto the
/// bus; d0/d2/d3 just get an empty queue and behave exactly like `MockPin`.
pub struct SimPin {
    level: Cell<bool>,
    direction: Cell<Direction>,
    queue: Vec<bool>,
    pos: Cell<usize>,
}

impl SimPin {
    fn plain() -> Self {
        SimPin { level: Cell::new(false), direction: Cell::new(Direction::In), queue: Vec::new(), pos: Cell::new(0) }
    }

    fn queued(queue: Vec<bool>) -> Self {
        SimPin { level: Cell::new(false), direction: Cell::new(Direction::In), queue, pos: Cell::new(0) }
    }
}

impl DebugPin for SimPin {
    fn set_high(&self) {
        self.level.set(true);
    }

    fn set_low(&self) {
        self.level.set(false);
    }

    fn is_high(&self) -> bool {
        let pos = self.pos.get();
        match self.queue.get(pos) {
            Some(&bit) => {
                self.pos.set(pos + 1);
                bit
            },
            None => self.level.get(),
        }
    }

    fn set_direction(&self, dir: Direction) {
        self.direction.set(dir);
    }
}

/// A four-pin debug port that simulates a single DP register read: SWDIO
/// replays a canned ACK+data+parity bitstream once the host clocks past its
/// 8-bit request header, simulating a target driving the bus. Used to
/// exercise `swd::SWD::transfer` end-to-end (host write -> simulated target
/// response) without real hardware.
pub struct TargetPort {
    pub d0: SimPin,
    pub d1: SimPin,
    pub d2: SimPin,
    pub d3: SimPin,
}

impl TargetPort {
    /// `value` is the 32-bit register contents the simulated target returns
    /// for an OK-acknowledged read.
    pub fn with_ok_read(value: u32) -> Self {
        let mut bits = Vec::with_capacity(36);
        // ACK = 0b001 (OK), LSB-first as `read_bits` assembles it.
        bits.push(true);
        bits.push(false);
        bits.push(false);
        for i in 0..32 {
            bits.push((value >> i) & 1 != 0);
        }
        bits.push(value.count_ones() % 2 == 1);
        TargetPort {
            d0: SimPin::plain(),
            d1: SimPin::queued(bits),
            d2: SimPin::plain(),
            d3: SimPin::plain(),
        }
    }
}

impl DebugPort for TargetPort {
    type Pin = SimPin;

    fn d0(&self) -> &SimPin { &self.d0 }
    fn d1(&self) -> &SimPin { &self.d1 }
    fn d2(&self) -> &SimPin { &self.d2 }
    fn d3(&self) -> &SimPin { &self.d3 }

    fn set_port_mode(&self, _mode: PortMode) {}

    fn swdio_direction(&self, _dir: Direction) {}

    fn spin_cycles(&self, _n: u32) {}
}
