#[allow(non_snake_case)]
#[repr(C)]
#[derive(Clone, Copy)]
pub struct BTableRow {
    pub ADDR_TX: u16,
    pub COUNT_TX: u16,
    pub ADDR_RX: u16,
    pub COUNT_RX: u16,
}

#[repr(C)]
pub struct EPBuf {
    pub tx: [u16; 32],
    pub rx: [u16; 32],
}

pub const USB_SRAM: u32 = 0x4000_6000;

#[link_section=".usbram"]
pub static mut EP0BUF: EPBuf = EPBuf::new();

// EP1 carries the CMSIS-DAP bulk-OUT direction (host -> probe command
// reports); EP2 carries the bulk-IN direction (probe -> host responses).
// The two live on separate hardware channels (and separate logical
// addresses, 0x07 and 0x88) since a single STM32 EPnR channel's EA field
// is shared between its TX and RX halves and cannot address them
// differently.
#[link_section=".usbram"]
pub static mut EP1BUF: EPBuf = EPBuf::new();

#[link_section=".usbram"]
pub static mut EP2BUF: EPBuf = EPBuf::new();

#[link_section=".usbram"]
pub static mut BTABLE: [BTableRow; 8] = [BTableRow::new(); 8];

impl EPBuf {
    pub const fn new() -> Self {
        EPBuf {
            tx: [0u16; 32], rx: [0u16; 32]
        }
    }

    /// Copy `data` into the tx buffer
    pub fn write_tx(&mut self, data: &[u8]) {
        let data_u16 = unsafe {
            core::slice::from_raw_parts(&data[0] as *const _ as *const u16, data.len() / 2)
        };
        for idx in 0..data_u16.len() {
            unsafe { core::ptr::write_volatile(&mut self.tx[idx], data_u16[idx]) };
        }
    }

    /// Copy the rx buffer into `data`, using `row.rx_count()` to determine
    /// how many bytes were actually received. Returns the number of bytes copied.
    pub fn read_rx(&self, row: &BTableRow, data: &mut [u8; 64]) -> usize {
        let n = row.rx_count();
        let nwords = (n + 1) / 2;
        for idx in 0..nwords {
            let word = unsafe { core::ptr::read_volatile(&self.rx[idx]) };
            let [lo, hi] = word.to_le_bytes();
            data[idx * 2] = lo;
            if idx * 2 + 1 < n {
                data[idx * 2 + 1] = hi;
            }
        }
        n
    }
}

impl BTableRow {
    pub const fn new() -> Self {
        BTableRow { ADDR_TX: 0, COUNT_TX: 0, ADDR_RX: 0, COUNT_RX: 0 }
    }

    /// Record `buf`'s tx/rx offsets into USB packet memory, so the
    /// peripheral knows where to read/write this endpoint's data.
    pub fn write(&mut self, buf: &EPBuf) {
        self.ADDR_TX = (&buf.tx as *const _ as u32 - USB_SRAM) as u16;
        self.ADDR_RX = (&buf.rx as *const _ as u32 - USB_SRAM) as u16;
    }

    /// Set the COUNT_TX field to `n`
    pub fn tx_count(&mut self, n: usize) {
        self.COUNT_TX = n as u16;
    }

    /// Configure the maximum receive buffer size the peripheral will accept
    /// into this row's RX buffer, using 32-byte blocks (BL_SIZE=1). `size`
    /// must be a nonzero multiple of 32; 64 bytes covers one full CMSIS-DAP
    /// command report.
    pub fn set_rx_buffer_size(&mut self, size: usize) {
        debug_assert!(size > 0 && size % 32 == 0);
        let num_block = (size / 32) as u16;
        self.COUNT_RX = (1 << 15) | (num_block << 10);
    }

    /// Get the current COUNT_RX value
    #[allow(unused)]
    pub fn rx_count(&self) -> usize {
        (self.COUNT_RX & 0x3FF) as usize
    }
}
