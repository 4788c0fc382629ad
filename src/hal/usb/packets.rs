// Copyright 2019-2020 Adam Greig
// Dual licensed under the Apache 2.0 and MIT licenses.

use core::convert::TryFrom;
use num_enum::TryFromPrimitive;
use super::buffers::*;

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct SetupPID {
    pub bmRequestType: u8,
    pub bRequest: u8,
    pub wValue: u16,
    pub wIndex: u16,
    pub wLength: u16,
}

#[derive(TryFromPrimitive)]
#[repr(u8)]
pub enum StandardRequest {
    ClearFeature = 1,
    GetConfiguration = 8,
    GetDescriptor = 6,
    GetInterface = 10,
    GetStatus = 0,
    SetAddress = 5,
    SetConfiguration = 9,
    SetDescriptor = 7,
    SetFeature = 3,
    SetInterface = 11,
    SynchFrame = 12,
}

#[derive(TryFromPrimitive)]
#[repr(u8)]
pub enum DescriptorType {
    Device = 1,
    Configuration = 2,
    String = 3,
    Interface = 4,
    Endpoint = 5,
}

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct DeviceDescriptor {
    pub bLength: u8,
    pub bDescriptorType: u8,
    pub bcdUSB: u16,
    pub bDeviceClass: u8,
    pub bDeviceSubClass: u8,
    pub bDeviceProtocol: u8,
    pub bMaxPacketSize0: u8,
    pub idVendor: u16,
    pub idProduct: u16,
    pub bcdDevice: u16,
    pub iManufacturer: u8,
    pub iProduct: u8,
    pub iSerialNumber: u8,
    pub bNumConfigurations: u8,
}

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct ConfigurationDescriptor {
    pub bLength: u8,
    pub bDescriptorType: u8,
    pub wTotalLength: u16,
    pub bNumInterfaces: u8,
    pub bConfigurationValue: u8,
    pub iConfiguration: u8,
    pub bmAttributes: u8,
    pub bMaxPower: u8,
}

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct InterfaceDescriptor {
    pub bLength: u8,
    pub bDescriptorType: u8,
    pub bInterfaceNumber: u8,
    pub bAlternateSetting: u8,
    pub bNumEndpoints: u8,
    pub bInterfaceClass: u8,
    pub bInterfaceSubClass: u8,
    pub bInterfaceProtocol: u8,
    pub iInterface: u8,
}

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct EndpointDescriptor {
    pub bLength: u8,
    pub bDescriptorType: u8,
    pub bEndpointAddress: u8,
    pub bmAttributes: u8,
    pub wMaxPacketSize: u16,
    pub bInterval: u8,
}

#[allow(non_snake_case)]
#[repr(C)]
#[repr(packed)]
pub struct StringDescriptor {
    pub bLength: u8,
    pub bDescriptorType: u8,
    pub bString: [u8; 62],
}

#[derive(TryFromPrimitive)]
#[repr(u8)]
#[allow(unused)]
pub enum SetupDirection {
    HostToDevice = 0,
    DeviceToHost = 1,
}

#[derive(PartialEq,TryFromPrimitive)]
#[repr(u8)]
pub enum SetupType {
    Standard = 0,
    Class = 1,
    Vendor = 2,
    Reserved = 3,
}

#[derive(TryFromPrimitive)]
#[repr(u8)]
#[allow(unused)]
pub enum SetupRecipient {
    Device = 0,
    Interface = 1,
    Endpoint = 2,
    Other = 3,
    Unknown,
}

impl SetupPID {
    pub fn from_buf(buf: &EPBuf) -> Self {
        let [req_type, req] = buf.rx[0].to_le_bytes();
        SetupPID {
            bmRequestType: req_type,
            bRequest: req,
            wValue: buf.rx[1],
            wIndex: buf.rx[2],
            wLength: buf.rx[3],
        }
    }

    #[allow(unused)]
    pub fn setup_direction(&self) -> SetupDirection {
        let x = (self.bmRequestType & (0b1 << 7)) >> 5;
        SetupDirection::try_from(x).unwrap()
    }

    pub fn setup_type(&self) -> SetupType {
        let x = (self.bmRequestType & (0b11 << 5)) >> 5;
        SetupType::try_from(x).unwrap()
    }

    #[allow(unused)]
    pub fn setup_recipient(&self) -> SetupRecipient {
        let x = self.bmRequestType & 0b11111;
        SetupRecipient::try_from(x).unwrap_or(SetupRecipient::Unknown)
    }
}

/// Trait for structs which can be safely cast to &[u8].
///
/// Traits implementing ToBytes must be repr(packed).
pub unsafe trait ToBytes: Sized {
    fn to_bytes(&self) -> &[u8] {
        // UNSAFE: We return a non-mutable slice into this packed struct's
        // memory at the length of the struct, with a lifetime bound to &self.
        unsafe {
            core::slice::from_raw_parts(self as *const _ as *const u8,
                                        core::mem::size_of::<Self>())
        }
    }
}

unsafe impl ToBytes for DeviceDescriptor {}
unsafe impl ToBytes for ConfigurationDescriptor {}
unsafe impl ToBytes for InterfaceDescriptor {}
unsafe impl ToBytes for EndpointDescriptor {}
unsafe impl ToBytes for StringDescriptor {}
