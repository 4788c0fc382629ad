// Copyright 2019 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

pub mod flash;
pub mod rcc;
pub mod nvic;
pub mod gpio;
pub mod usb;
pub mod unique_id;
