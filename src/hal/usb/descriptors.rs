// Copyright 2019 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

use core::mem::size_of;
use super::packets::*;

pub static STRING_LANGS: [u16; 1] = [0x0409];
pub static STRING_MFN: &str = "Cowlab";
pub static STRING_PRD: &str = "Cowprobe CMSIS-DAP";

const VENDOR_ID: u16 = 0x2E8A;
// Placeholder PID; the original firmware selects this from a PID-MAP macro
// keyed on the build variant. We only build the one variant.
const PRODUCT_ID: u16 = 0x000C;
const DEVICE_ID: u16 = 0x0100;

pub static DEVICE_DESCRIPTOR: DeviceDescriptor = DeviceDescriptor {
    bLength: size_of::<DeviceDescriptor>() as u8,
    bDescriptorType: DescriptorType::Device as u8,
    bcdUSB: 0x0200,
    bDeviceClass: 0xFF,
    bDeviceSubClass: 0,
    bDeviceProtocol: 0,
    bMaxPacketSize0: 64,
    idVendor: VENDOR_ID,
    idProduct: PRODUCT_ID,
    bcdDevice: DEVICE_ID,
    iManufacturer: 1,
    iProduct: 2,
    iSerialNumber: 3,
    bNumConfigurations: 1,
};

pub static CONFIGURATION_DESCRIPTOR: ConfigurationDescriptor = ConfigurationDescriptor {
    bLength: size_of::<ConfigurationDescriptor>() as u8,
    bDescriptorType: DescriptorType::Configuration as u8,
    wTotalLength: (size_of::<ConfigurationDescriptor>() + size_of::<InterfaceDescriptor>() +
                   size_of::<EndpointDescriptor>() * NUM_ENDPOINTS) as u16,
    bNumInterfaces: 1,
    bConfigurationValue: 1,
    iConfiguration: 0,
    bmAttributes: 0b1000_0000,
    bMaxPower: 50,
};

pub static INTERFACE_DESCRIPTOR: InterfaceDescriptor = InterfaceDescriptor {
    bLength: size_of::<InterfaceDescriptor>() as u8,
    bDescriptorType: DescriptorType::Interface as u8,
    bInterfaceNumber: 0,
    bAlternateSetting: 0,
    bNumEndpoints: 2,
    bInterfaceClass: 0xFF,
    bInterfaceSubClass: 0,
    bInterfaceProtocol: 0,
    iInterface: 0,
};

const NUM_ENDPOINTS: usize = 2;

// OpenOCD requires the bulk-OUT endpoint to appear before bulk-IN in the
// descriptor. Addresses are fixed at 0x07 (OUT) / 0x88 (IN), rather than a
// matched IN/OUT pair sharing one endpoint number, since the two directions
// live on independent hardware channels (see buffers.rs).
pub static ENDPOINT_DESCRIPTORS: [EndpointDescriptor; NUM_ENDPOINTS] = [
    // Bulk OUT: host -> probe command reports
    EndpointDescriptor {
        bLength: size_of::<EndpointDescriptor>() as u8,
        bDescriptorType: DescriptorType::Endpoint as u8,
        bEndpointAddress: 0x07,
        bmAttributes: 0b00_00_00_10,
        wMaxPacketSize: 64,
        bInterval: 0,
    },

    // Bulk IN: probe -> host responses
    EndpointDescriptor {
        bLength: size_of::<EndpointDescriptor>() as u8,
        bDescriptorType: DescriptorType::Endpoint as u8,
        bEndpointAddress: 0x88,
        bmAttributes: 0b00_00_00_10,
        wMaxPacketSize: 64,
        bInterval: 0,
    },
];
