// Copyright 2019-2020 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

use crate::{hal, dap, pins::DebugPort};

/// Requests decoded from a USB interrupt by the USB-class front-end (C6)
/// and handed to the application event loop.
#[derive(Copy, Clone)]
pub enum Request {
    DAPCommand(([u8; 64], usize)),
    Suspend,
}

pub struct App<'a, P: DebugPort> {
    flash: &'a hal::flash::Flash,
    rcc: &'a hal::rcc::RCC,
    nvic: &'a hal::nvic::NVIC,
    pins: &'a P,
    usb: &'a mut hal::usb::USB,
    dap: &'a mut dap::DAP<'a, P>,
}

impl<'a, P: DebugPort> App<'a, P> {
    pub fn new(flash: &'a hal::flash::Flash, rcc: &'a hal::rcc::RCC,
               nvic: &'a hal::nvic::NVIC, pins: &'a P,
               usb: &'a mut hal::usb::USB, dap: &'a mut dap::DAP<'a, P>)
        -> Self
    {
        App { flash, rcc, nvic, pins, usb, dap }
    }

    pub fn setup(&mut self) {
        // Configure flash latency to 1 wait state with prefetch
        self.flash.setup();
        // Configure system clock to HSI48 and enable CRS and peripheral clocks
        self.rcc.setup();
        // Enable SEVONPEND
        self.nvic.setup();
        // Configure GPIOs to their Hi-Z boot state
        self.pins.set_port_mode(crate::pins::PortMode::HiZ);
        // Configure USB peripheral and connect to host
        self.usb.setup();
    }

    pub fn poll(&mut self) {
        if self.nvic.usb_pending() {
            // Handle USB interrupts
            if let Some(req) = self.usb.interrupt() {
                self.process_request(req);
            }
            self.nvic.unpend_usb();
        } else {
            // Sleep until an interrupt occurs
            cortex_m::asm::wfe();
        }
    }

    fn process_request(&mut self, req: Request) {
        match req {
            Request::DAPCommand((report, n)) => {
                let response = self.dap.process_command(&report[..n]);
                if let Some(data) = response {
                    self.usb.dap_reply(data);
                }
            },
            Request::Suspend => {
                self.pins.set_port_mode(crate::pins::PortMode::HiZ);
            },
        };
    }
}
