// Copyright 2019 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

use stm32ral::{write_reg, flash};

pub struct Flash {
    flash: flash::Instance,
}

impl Flash {
    pub fn new(flash: flash::Instance) -> Self {
        Flash { flash }
    }

    /// Set up flash peripheral, with prefetch enabled
    /// and waitstate suitable for 48MHz operation.
    pub fn setup(&self) {
        // Enable prefetch buffer and set suitable wait states for 48MHz operation
        write_reg!(flash, self.flash, ACR, PRFTBE: Enabled, LATENCY: WS1);
    }
}
