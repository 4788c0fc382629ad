#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

#[cfg(not(test))]
use cortex_m_rt::entry;
#[cfg(not(test))]
use panic_rtt_target as _;
#[cfg(not(test))]
use rtt_target::{rtt_init_print, rprintln};

pub mod hal;
pub mod pins;
pub mod swd;
pub mod jtag;
pub mod dap;
pub mod app;

#[cfg(test)]
mod mock;

#[cfg(not(test))]
use app::App;

pub const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[cfg(not(test))]
#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("cowprobe firmware {}", GIT_VERSION);

    // Obtain all required HAL instances
    let flash = hal::flash::Flash::new(stm32ral::flash::Flash::take().unwrap());
    let rcc = hal::rcc::RCC::new(stm32ral::rcc::RCC::take().unwrap(),
                                 stm32ral::crs::CRS::take().unwrap());
    let nvic = hal::nvic::NVIC::new(stm32ral::nvic::NVIC::take().unwrap(),
                                    stm32ral::scb::SCB::take().unwrap());
    let gpioa = hal::gpio::GPIO::new(stm32ral::gpio::GPIOA::take().unwrap());
    let mut usb = hal::usb::USB::new(stm32ral::usb::USB::take().unwrap());

    // Define the debug-port pinout: D0=TDI, D1=SWDIO/TMS, D2=SWCLK/TCK,
    // D3=nRESET/TDO, plus a status LED.
    let pins = hal::gpio::Pins::new(
        gpioa.pin(0),
        gpioa.pin(1),
        gpioa.pin(2),
        gpioa.pin(3),
        gpioa.pin(9),
    );

    let mut dap = dap::DAP::new(&pins);

    // Create App instance with the HAL instances
    let mut app = App::new(&flash, &rcc, &nvic, &pins, &mut usb, &mut dap);

    // Initialise application, including system peripherals
    app.setup();

    loop {
        // Process events
        app.poll();
    }
}
