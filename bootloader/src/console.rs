//! Boot console
//!
//! Human-readable diagnostics over the firmware text output protocol,
//! UTF-16 converted in a fixed on-stack buffer. Available from the first
//! instruction of `efi_main` until ExitBootServices.

use core::fmt;

use spin::Mutex;

#[repr(C)]
pub struct SimpleTextOutputProtocol {
    pub reset: extern "efiapi" fn(*mut SimpleTextOutputProtocol, bool) -> usize,
    pub output_string: extern "efiapi" fn(*mut SimpleTextOutputProtocol, *const u16) -> usize,
    _test_string: usize,
    _query_mode: usize,
    _set_mode: usize,
    _set_attribute: usize,
    _clear_screen: usize,
    _set_cursor_position: usize,
    _enable_cursor: usize,
    _mode: *const (),
}

struct Console {
    out: *mut SimpleTextOutputProtocol,
}

// The boot stage is single-threaded; the lock only serializes re-entrancy.
unsafe impl Send for Console {}

static CONSOLE: Mutex<Option<Console>> = Mutex::new(None);

pub fn init(out: *mut SimpleTextOutputProtocol) {
    *CONSOLE.lock() = Some(Console { out });
}

impl Console {
    fn flush(&mut self, buffer: &mut [u16; 64], used: &mut usize) {
        buffer[*used] = 0;
        (unsafe { &*self.out }.output_string)(self.out, buffer.as_ptr());
        *used = 0;
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut buffer = [0u16; 64];
        let mut used = 0;

        for ch in s.chars() {
            if used + 2 >= buffer.len() {
                self.flush(&mut buffer, &mut used);
            }
            if ch == '\n' {
                buffer[used] = b'\r' as u16;
                used += 1;
            }
            // Anything outside the basic plane is noise this early in boot.
            buffer[used] = if (ch as u32) < 0x1_0000 { ch as u16 } else { b'?' as u16 };
            used += 1;
        }

        if used > 0 {
            self.flush(&mut buffer, &mut used);
        }
        Ok(())
    }
}

pub fn write_fmt(args: fmt::Arguments) {
    use fmt::Write;
    if let Some(console) = CONSOLE.lock().as_mut() {
        let _ = console.write_fmt(args);
    }
}

macro_rules! println {
    () => {
        $crate::console::write_fmt(core::format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::console::write_fmt(core::format_args!("{}\n", core::format_args!($($arg)*)))
    };
}

pub(crate) use println;
